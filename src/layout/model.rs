//! Builds the node/link/category model from a graph document and its
//! constraint configuration.

use std::collections::HashMap;

use log::{debug, warn};
use thiserror::Error;

use super::config::{ConstraintKind, GraphConfig, LayoutSettings};
use super::document::{GraphDocument, ObjectDescriptor, doc_references};
use super::geometry::Rect;
use super::label::{LabelBox, MeasureText, truncate_label};

pub const DEFAULT_LINK_COLOR: &str = "green";

/// ColorBrewer Set3, 12 classes.
const SET3: &[&str] = &[
	"#8dd3c7", "#ffffb3", "#bebada", "#fb8072", "#80b1d3", "#fdb462", "#b3de69", "#fccde5",
	"#d9d9d9", "#bc80bd", "#ccebc5", "#ffed6f",
];

/// Non-fatal problems found in an otherwise usable document.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DataError {
	#[error("Unrecognized dependency: '{object}' depends on '{dependency}'")]
	UnknownDependency { object: String, dependency: String },
	#[error("Object \"{object}\" links to unrecognized object \"{target}\"")]
	UnknownReference { object: String, target: String },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionConstraint {
	pub weight: f64,
	/// Absolute canvas coordinates; `None` leaves that axis alone.
	pub x: Option<f64>,
	pub y: Option<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct Node {
	pub name: String,
	pub kind: String,
	pub group: Option<String>,
	pub depends: Vec<String>,
	pub depended_on_by: Vec<String>,
	pub docs: String,
	pub category: usize,
	pub label: String,
	pub x: f64,
	pub y: f64,
	pub bounds: Rect,
	pub extent: Rect,
	pub position_constraints: Vec<PositionConstraint>,
	pub strength: f64,
	pub width: f64,
	pub link_widths: Vec<(String, f64)>,
	pub link_colors: Vec<(String, String)>,
	pub link_strengths: Vec<(String, f64)>,
	pub fixed: bool,
	pub dragged: bool,
}

impl Node {
	fn from_object(object: &ObjectDescriptor) -> Self {
		Self {
			name: object.name.clone(),
			kind: object.kind.clone(),
			group: object.group.clone(),
			depends: object.depends.clone(),
			docs: object.docs.clone(),
			label: object.name.clone(),
			strength: 1.0,
			width: 1.0,
			..Default::default()
		}
	}

	fn apply(&mut self, kind: &ConstraintKind, canvas: (f64, f64)) {
		match kind {
			ConstraintKind::Position { weight, x, y } => {
				self.position_constraints.push(PositionConstraint {
					weight: *weight,
					x: x.map(|x| x * canvas.0),
					y: y.map(|y| y * canvas.1),
				})
			}
			ConstraintKind::Strength { strength } => self.strength = *strength,
			ConstraintKind::Width { width } => self.width = *width,
			ConstraintKind::LinkWidth { target, width } => {
				self.link_widths.push((target.clone(), *width))
			}
			ConstraintKind::LinkColor { target, color } => {
				self.link_colors.push((target.clone(), color.clone()))
			}
			ConstraintKind::LinkStrength { target, strength } => {
				self.link_strengths.push((target.clone(), *strength))
			}
		}
	}

	/// World-space collision rectangle.
	pub fn world_extent(&self) -> Rect {
		self.extent.translate(self.x, self.y)
	}

	/// World-space label box.
	pub fn world_bounds(&self) -> Rect {
		self.bounds.translate(self.x, self.y)
	}
}

fn lookup<'a, T>(table: &'a [(String, T)], name: &str) -> Option<&'a T> {
	table.iter().rev().find(|(key, _)| key == name).map(|(_, v)| v)
}

#[derive(Clone, Debug, PartialEq)]
pub struct Link {
	/// The dependency.
	pub source: usize,
	/// The dependent.
	pub target: usize,
	pub width: f64,
	pub color: String,
	pub strength: f64,
	/// Endpoint clipped at the target's label box.
	pub x2: f64,
	pub y2: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Category {
	pub key: String,
	pub kind: String,
	pub type_name: String,
	pub group: Option<String>,
	pub count: usize,
	pub color: String,
}

impl Category {
	pub fn key_for(kind: &str, group: Option<&str>) -> String {
		format!("{}:{}", kind, group.unwrap_or_default())
	}

	/// Legend text, e.g. `Func: main`.
	pub fn legend_label(&self) -> String {
		match self.group.as_deref() {
			Some(group) if !group.is_empty() => format!("{}: {}", self.type_name, group),
			_ => self.type_name.clone(),
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct GraphModel {
	pub nodes: Vec<Node>,
	pub links: Vec<Link>,
	pub categories: Vec<Category>,
	pub errors: Vec<DataError>,
	index: HashMap<String, usize>,
}

impl GraphModel {
	pub fn index_of(&self, name: &str) -> Option<usize> {
		self.index.get(name).copied()
	}

	pub fn node(&self, name: &str) -> Option<&Node> {
		self.index_of(name).map(|idx| &self.nodes[idx])
	}

	/// `{idx} ∪ depends ∪ dependedOnBy`, as node indices.
	pub fn neighborhood(&self, idx: usize) -> Vec<usize> {
		let Some(node) = self.nodes.get(idx) else {
			return Vec::new();
		};
		let mut out = vec![idx];
		out.extend(
			node.depends
				.iter()
				.chain(&node.depended_on_by)
				.filter_map(|name| self.index_of(name)),
		);
		out.sort_unstable();
		out.dedup();
		out
	}

	/// Truncates labels and derives node boxes from measured label sizes.
	pub fn fit_labels(&mut self, settings: &LayoutSettings, measure: &impl MeasureText) {
		for node in &mut self.nodes {
			node.label = truncate_label(&node.name, settings.max_line_chars);
			let label = LabelBox::fit(&node.label, settings, measure);
			node.bounds = label.bounds;
			node.extent = label.extent;
		}
	}

	pub fn category_color(&self, node: &Node) -> &str {
		self.categories
			.get(node.category)
			.map_or(SET3[0], |c| c.color.as_str())
	}
}

fn palette(num_colors: usize) -> &'static [&'static str] {
	&SET3[..num_colors.clamp(3, SET3.len())]
}

/// Builds nodes, links and categories for a canvas of `canvas` width/height.
pub fn build_graph(
	document: &GraphDocument,
	config: &GraphConfig,
	canvas: (f64, f64),
) -> GraphModel {
	let mut model = GraphModel::default();

	for object in document.data.values() {
		let mut node = Node::from_object(object);
		config
			.constraints
			.iter()
			.filter(|rule| rule.has.matches(object))
			.for_each(|rule| node.apply(&rule.kind, canvas));
		model.index.insert(node.name.clone(), model.nodes.len());
		model.nodes.push(node);
	}

	link_dependencies(&mut model);
	check_doc_references(&mut model);
	assign_categories(&mut model, config);

	for err in &model.errors {
		warn!("{err}");
	}
	debug!(
		"built graph: {} nodes, {} links, {} categories",
		model.nodes.len(),
		model.links.len(),
		model.categories.len()
	);
	model
}

fn link_dependencies(model: &mut GraphModel) {
	for target in 0..model.nodes.len() {
		for dep in model.nodes[target].depends.clone() {
			let Some(source) = model.index_of(&dep) else {
				model.errors.push(DataError::UnknownDependency {
					object: model.nodes[target].name.clone(),
					dependency: dep,
				});
				continue;
			};

			let dependent = model.nodes[target].name.clone();
			model.nodes[source].depended_on_by.push(dependent.clone());

			let from = &model.nodes[source];
			let link = Link {
				source,
				target,
				width: lookup(&from.link_widths, &dependent).copied().unwrap_or(from.width),
				color: lookup(&from.link_colors, &dependent)
					.cloned()
					.unwrap_or_else(|| DEFAULT_LINK_COLOR.to_string()),
				strength: lookup(&from.link_strengths, &dependent)
					.copied()
					.unwrap_or(from.strength),
				x2: 0.0,
				y2: 0.0,
			};
			model.links.push(link);
		}
	}
}

fn check_doc_references(model: &mut GraphModel) {
	let mut missing = Vec::new();
	for node in &model.nodes {
		for name in doc_references(&node.docs) {
			if !model.index.contains_key(name) {
				missing.push(DataError::UnknownReference {
					object: node.name.clone(),
					target: name.to_string(),
				});
			}
		}
	}
	model.errors.extend(missing);
}

fn assign_categories(model: &mut GraphModel, config: &GraphConfig) {
	let colors = palette(config.graph.num_colors);
	let mut by_key: HashMap<String, usize> = HashMap::new();

	for node in &mut model.nodes {
		let key = Category::key_for(&node.kind, node.group.as_deref());
		let idx = *by_key.entry(key.clone()).or_insert_with(|| {
			let idx = model.categories.len();
			model.categories.push(Category {
				key,
				kind: node.kind.clone(),
				type_name: config.type_name(&node.kind).to_string(),
				group: node.group.clone(),
				count: 0,
				color: colors[idx % colors.len()].to_string(),
			});
			idx
		});
		model.categories[idx].count += 1;
		node.category = idx;
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;
	use crate::layout::config::{ConstraintRule, Predicate};

	fn object(name: &str, kind: &str, depends: &[&str]) -> ObjectDescriptor {
		ObjectDescriptor {
			name: name.into(),
			kind: kind.into(),
			group: Some("g".into()),
			depends: depends.iter().map(|d| d.to_string()).collect(),
			..Default::default()
		}
	}

	fn document(objects: Vec<ObjectDescriptor>) -> GraphDocument {
		GraphDocument {
			errors: Vec::new(),
			data: objects.into_iter().map(|o| (o.name.clone(), o)).collect(),
		}
	}

	fn rule(has: Predicate, kind: ConstraintKind) -> ConstraintRule {
		ConstraintRule { has, kind }
	}

	fn named(name: &str) -> Predicate {
		Predicate {
			name: Some(name.into()),
			..Default::default()
		}
	}

	fn abc() -> GraphDocument {
		document(vec![
			object("A", "Block", &[]),
			object("B", "Block", &["A"]),
			object("C", "Block", &["A"]),
		])
	}

	#[test]
	fn inverse_relation_links_and_categories() {
		let model = build_graph(&abc(), &GraphConfig::default(), (800.0, 600.0));

		assert_eq!(model.node("A").unwrap().depended_on_by, ["B", "C"]);
		assert!(model.node("B").unwrap().depended_on_by.is_empty());
		assert!(model.node("C").unwrap().depended_on_by.is_empty());

		let pairs: Vec<_> = model
			.links
			.iter()
			.map(|l| (model.nodes[l.source].name.as_str(), model.nodes[l.target].name.as_str()))
			.collect();
		assert_eq!(pairs, [("A", "B"), ("A", "C")]);
		assert!(model.links.iter().all(|l| l.color == DEFAULT_LINK_COLOR));

		assert_eq!(model.categories.len(), 1);
		assert_eq!(model.categories[0].key, "Block:g");
		assert_eq!(model.categories[0].count, 3);
		assert!(model.errors.is_empty());
	}

	#[test]
	fn document_depended_on_by_is_ignored() {
		let mut doc = abc();
		doc.data.get_mut("B").unwrap().depended_on_by = vec!["C".into()];
		let model = build_graph(&doc, &GraphConfig::default(), (800.0, 600.0));
		assert!(model.node("B").unwrap().depended_on_by.is_empty());
	}

	#[test]
	fn dangling_dependency_is_reported_and_skipped() {
		let doc = document(vec![object("A", "Block", &[]), object("B", "Block", &["A", "Z"])]);
		let model = build_graph(&doc, &GraphConfig::default(), (800.0, 600.0));

		assert_eq!(model.links.len(), 1);
		assert_eq!(
			model.errors,
			[DataError::UnknownDependency {
				object: "B".into(),
				dependency: "Z".into()
			}]
		);
		assert_eq!(
			model.errors[0].to_string(),
			"Unrecognized dependency: 'B' depends on 'Z'"
		);
	}

	#[test]
	fn unknown_doc_reference_is_reported() {
		let mut doc = abc();
		doc.data.get_mut("B").unwrap().docs = concat!(
			r#"<a class="select-object" data-name="A">A</a> "#,
			r#"<a class="select-object" data-name="Q">Q</a>"#,
		)
		.into();
		let model = build_graph(&doc, &GraphConfig::default(), (800.0, 600.0));
		assert_eq!(
			model.errors,
			[DataError::UnknownReference {
				object: "B".into(),
				target: "Q".into()
			}]
		);
	}

	#[test]
	fn later_scalar_rules_win() {
		let config = GraphConfig {
			constraints: vec![
				rule(named("A"), ConstraintKind::Strength { strength: 0.2 }),
				rule(Predicate::default(), ConstraintKind::Width { width: 3.0 }),
				rule(named("A"), ConstraintKind::Strength { strength: 0.7 }),
				rule(named("nope"), ConstraintKind::Width { width: 9.0 }),
			],
			..Default::default()
		};
		let model = build_graph(&abc(), &config, (800.0, 600.0));
		let a = model.node("A").unwrap();
		assert_eq!(a.strength, 0.7);
		assert_eq!(a.width, 3.0);
		assert_eq!(model.node("B").unwrap().strength, 1.0);
	}

	#[test]
	fn position_rules_scale_to_canvas() {
		let config = GraphConfig {
			constraints: vec![
				rule(
					named("A"),
					ConstraintKind::Position {
						weight: 0.1,
						x: Some(0.5),
						y: Some(0.25),
					},
				),
				rule(
					named("A"),
					ConstraintKind::Position {
						weight: 0.3,
						x: None,
						y: Some(1.0),
					},
				),
			],
			..Default::default()
		};
		let model = build_graph(&abc(), &config, (800.0, 600.0));
		assert_eq!(
			model.node("A").unwrap().position_constraints,
			[
				PositionConstraint {
					weight: 0.1,
					x: Some(400.0),
					y: Some(150.0)
				},
				PositionConstraint {
					weight: 0.3,
					x: None,
					y: Some(600.0)
				},
			]
		);
	}

	#[test]
	fn link_overrides_are_keyed_by_dependent_on_the_source() {
		let config = GraphConfig {
			constraints: vec![
				rule(named("A"), ConstraintKind::Width { width: 2.0 }),
				rule(named("A"), ConstraintKind::LinkWidth { target: "B".into(), width: 5.0 }),
				rule(
					named("A"),
					ConstraintKind::LinkColor {
						target: "B".into(),
						color: "red".into(),
					},
				),
				rule(
					named("A"),
					ConstraintKind::LinkStrength {
						target: "B".into(),
						strength: 0.25,
					},
				),
				// Keyed on the dependent's own table: never consulted for B→? links it consumes.
				rule(
					named("B"),
					ConstraintKind::LinkColor {
						target: "A".into(),
						color: "blue".into(),
					},
				),
			],
			..Default::default()
		};
		let model = build_graph(&abc(), &config, (800.0, 600.0));

		let to_b = &model.links[0];
		assert_eq!((to_b.width, to_b.color.as_str(), to_b.strength), (5.0, "red", 0.25));

		let to_c = &model.links[1];
		assert_eq!(
			(to_c.width, to_c.color.as_str(), to_c.strength),
			(2.0, DEFAULT_LINK_COLOR, 1.0)
		);
	}

	#[test]
	fn last_matching_override_wins() {
		let config = GraphConfig {
			constraints: vec![
				rule(
					named("A"),
					ConstraintKind::LinkColor {
						target: "B".into(),
						color: "red".into(),
					},
				),
				rule(
					named("A"),
					ConstraintKind::LinkColor {
						target: "B".into(),
						color: "black".into(),
					},
				),
			],
			..Default::default()
		};
		let model = build_graph(&abc(), &config, (800.0, 600.0));
		assert_eq!(model.links[0].color, "black");
	}

	#[test]
	fn categories_carry_short_names_and_cycle_colors() {
		let mut config = GraphConfig::default();
		config.graph.num_colors = 3;
		config.types.insert(
			"Function".into(),
			crate::layout::config::TypeInfo {
				short: "Func".into(),
			},
		);
		let mut objects: Vec<_> = (0..4)
			.map(|i| ObjectDescriptor {
				name: format!("n{i}"),
				kind: "Function".into(),
				group: Some(format!("g{i}")),
				..Default::default()
			})
			.collect();
		objects.push(ObjectDescriptor {
			name: "z".into(),
			kind: "Block".into(),
			..Default::default()
		});
		let model = build_graph(&document(objects), &config, (800.0, 600.0));

		assert_eq!(model.categories.len(), 5);
		assert_eq!(model.categories[0].legend_label(), "Func: g0");
		assert_eq!(model.categories[4].key, "Block:");
		assert_eq!(model.categories[4].legend_label(), "Block");
		assert_eq!(model.categories[3].color, model.categories[0].color);
		assert_ne!(model.categories[1].color, model.categories[0].color);
	}

	#[test]
	fn nodes_and_categories_follow_document_order() {
		let doc = GraphDocument::from_json(
			r#"{"errors": [], "data": {
				"zeta": {"name": "zeta", "type": "Block"},
				"alpha": {"name": "alpha", "type": "Helper"},
				"mid": {"name": "mid", "type": "Block", "depends": ["alpha"]}
			}}"#,
		)
		.unwrap();
		let model = build_graph(&doc, &GraphConfig::default(), (800.0, 600.0));

		let names: Vec<_> = model.nodes.iter().map(|n| n.name.as_str()).collect();
		assert_eq!(names, ["zeta", "alpha", "mid"]);
		let keys: Vec<_> = model.categories.iter().map(|c| c.key.as_str()).collect();
		assert_eq!(keys, ["Block:", "Helper:"]);
		assert_eq!(model.categories[0].color, SET3[0]);
	}

	#[test]
	fn neighborhood_covers_both_directions() {
		let model = build_graph(&abc(), &GraphConfig::default(), (800.0, 600.0));
		let a = model.index_of("A").unwrap();
		let b = model.index_of("B").unwrap();
		let c = model.index_of("C").unwrap();
		assert_eq!(model.neighborhood(a), [a, b, c]);
		assert_eq!(model.neighborhood(b), [a, b]);
		assert!(model.neighborhood(99).is_empty());
	}

	proptest! {
		#[test]
		fn depended_on_by_is_exact_inverse(
			edges in prop::collection::vec((0usize..8, 0usize..10), 0..30),
		) {
			let names: Vec<String> = (0..8).map(|i| format!("n{i}")).collect();
			let mut objects: Vec<ObjectDescriptor> =
				names.iter().map(|n| object(n, "Block", &[])).collect();
			for (from, to) in &edges {
				// Indices >= 8 produce dangling names.
				objects[*from].depends.push(format!("n{to}"));
			}
			let model = build_graph(&document(objects), &GraphConfig::default(), (100.0, 100.0));

			for node in &model.nodes {
				let mut expected: Vec<&str> = model
					.nodes
					.iter()
					.flat_map(|other| {
						other
							.depends
							.iter()
							.filter(|d| **d == node.name)
							.map(|_| other.name.as_str())
					})
					.collect();
				let mut actual: Vec<&str> =
					node.depended_on_by.iter().map(String::as_str).collect();
				expected.sort_unstable();
				actual.sort_unstable();
				prop_assert_eq!(expected, actual);
			}

			let dangling = edges.iter().filter(|(_, to)| *to >= 8).count();
			prop_assert_eq!(model.links.len(), edges.len() - dangling);
			prop_assert_eq!(model.errors.len(), dangling);
		}
	}
}
