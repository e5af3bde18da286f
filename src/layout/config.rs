//! Configuration document consumed alongside the graph: layout tuning, type
//! display names and constraint rules.

use std::collections::HashMap;

use serde::Deserialize;

use super::document::ObjectDescriptor;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
	pub title: Option<String>,
	pub graph: LayoutSettings,
	pub types: HashMap<String, TypeInfo>,
	pub constraints: Vec<ConstraintRule>,
}

pub const DEFAULT_TITLE: &str = "Dependency Graph";

impl GraphConfig {
	pub fn from_json(text: &str) -> serde_json::Result<Self> {
		serde_json::from_str(text)
	}

	/// Document title, or [`DEFAULT_TITLE`] when unset or blank.
	pub fn page_title(&self) -> &str {
		self.title
			.as_deref()
			.map(str::trim)
			.filter(|t| !t.is_empty())
			.unwrap_or(DEFAULT_TITLE)
	}

	/// Short display name of a type, falling back to the raw type string.
	pub fn type_name<'a>(&'a self, kind: &'a str) -> &'a str {
		self.types
			.get(kind)
			.map(|info| info.short.as_str())
			.filter(|short| !short.is_empty())
			.unwrap_or(kind)
	}
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TypeInfo {
	/// Legend name for the type.
	pub short: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Sides {
	pub left: f64,
	pub right: f64,
	pub top: f64,
	pub bottom: f64,
}

impl Sides {
	pub const fn new(left: f64, right: f64, top: f64, bottom: f64) -> Self {
		Self {
			left,
			right,
			top,
			bottom,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutSettings {
	pub link_distance: f64,
	/// Negative values repel.
	pub charge: f64,
	pub gravity: f64,
	/// Warm-up ticks run before collision avoidance engages.
	pub ticks_without_collisions: usize,
	pub max_line_chars: usize,
	pub num_colors: usize,
	pub label_padding: Sides,
	pub label_margin: Sides,
}

impl Default for LayoutSettings {
	fn default() -> Self {
		Self {
			link_distance: 100.0,
			charge: -1000.0,
			gravity: 0.1,
			ticks_without_collisions: 100,
			max_line_chars: 32,
			num_colors: 12,
			label_padding: Sides::new(2.0, 2.0, 2.0, 2.0),
			label_margin: Sides::new(3.0, 3.0, 2.0, 2.0),
		}
	}
}

/// Exact-match filter over the matchable object fields. Absent keys match
/// anything.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Predicate {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default, rename = "type")]
	pub kind: Option<String>,
	#[serde(default)]
	pub group: Option<String>,
}

impl Predicate {
	pub fn matches(&self, object: &ObjectDescriptor) -> bool {
		fn field_eq(expected: &Option<String>, actual: Option<&str>) -> bool {
			expected.as_deref().is_none_or(|e| actual == Some(e))
		}
		field_eq(&self.name, Some(&object.name))
			&& field_eq(&self.kind, Some(&object.kind))
			&& field_eq(&self.group, object.group.as_deref())
	}
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ConstraintRule {
	#[serde(default)]
	pub has: Predicate,
	#[serde(flatten)]
	pub kind: ConstraintKind,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ConstraintKind {
	/// `x`/`y` are fractions of the canvas size.
	Position {
		weight: f64,
		#[serde(default)]
		x: Option<f64>,
		#[serde(default)]
		y: Option<f64>,
	},
	Strength {
		strength: f64,
	},
	Width {
		width: f64,
	},
	LinkWidth {
		target: String,
		width: f64,
	},
	LinkColor {
		target: String,
		color: String,
	},
	LinkStrength {
		target: String,
		strength: f64,
	},
}
