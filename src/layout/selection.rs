//! Selection and highlight state. Pure state transitions over a built model;
//! the rendering layer queries `is_node_active` / `is_link_active`.

use std::collections::HashSet;

use log::debug;

use super::model::{GraphModel, Link};

/// Grace period before a hover-out clears the highlight, in seconds.
pub const HOVER_OUT_DELAY: f64 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionChange {
	Selected(usize),
	Deselected,
	Unchanged,
}

#[derive(Clone, Debug, Default)]
pub struct Selection {
	selected: Option<usize>,
	highlighted: Option<usize>,
	active: HashSet<usize>,
	hover_out: Option<f64>,
}

impl Selection {
	pub fn selected(&self) -> Option<usize> {
		self.selected
	}

	pub fn highlighted(&self) -> Option<usize> {
		self.highlighted
	}

	pub fn has_highlight(&self) -> bool {
		self.highlighted.is_some()
	}

	/// Selects `idx`, or clears the selection if it is already selected.
	/// Out-of-range indices are ignored.
	pub fn select(&mut self, model: &GraphModel, idx: usize) -> SelectionChange {
		if idx >= model.nodes.len() {
			return SelectionChange::Unchanged;
		}
		if self.selected == Some(idx) {
			self.deselect();
			return SelectionChange::Deselected;
		}
		self.deselect();
		self.selected = Some(idx);
		self.highlight(model, Some(idx));
		debug!("selected {}", model.nodes[idx].name);
		SelectionChange::Selected(idx)
	}

	/// Like [`Selection::select`]; unknown names are a no-op.
	pub fn select_by_name(&mut self, model: &GraphModel, name: &str) -> SelectionChange {
		match model.index_of(name) {
			Some(idx) => self.select(model, idx),
			None => {
				debug!("ignoring selection of unknown object {name:?}");
				SelectionChange::Unchanged
			}
		}
	}

	pub fn deselect(&mut self) {
		self.selected = None;
		self.highlighted = None;
		self.active.clear();
		self.hover_out = None;
	}

	fn highlight(&mut self, model: &GraphModel, idx: Option<usize>) {
		self.hover_out = None;
		self.highlighted = idx;
		self.active = idx
			.map(|i| model.neighborhood(i).into_iter().collect())
			.unwrap_or_default();
	}

	/// Highlights the hovered node's neighborhood unless a selection is active.
	/// Cancels any pending hover-out.
	pub fn hover_enter(&mut self, model: &GraphModel, idx: usize) {
		if self.selected.is_some() || idx >= model.nodes.len() {
			return;
		}
		self.highlight(model, Some(idx));
	}

	/// Schedules the highlight to clear after [`HOVER_OUT_DELAY`].
	pub fn hover_leave(&mut self) {
		if self.selected.is_none() && self.highlighted.is_some() {
			self.hover_out = Some(HOVER_OUT_DELAY);
		}
	}

	pub fn hover_pending(&self) -> bool {
		self.hover_out.is_some()
	}

	/// Runs the hover-out timer forward by `dt` seconds.
	pub fn advance(&mut self, dt: f64) {
		let Some(remaining) = self.hover_out else {
			return;
		};
		if remaining - dt <= 0.0 {
			self.hover_out = None;
			self.highlighted = None;
			self.active.clear();
		} else {
			self.hover_out = Some(remaining - dt);
		}
	}

	pub fn is_node_active(&self, idx: usize) -> bool {
		self.highlighted.is_none() || self.active.contains(&idx)
	}

	/// Links stay active only when they touch the highlighted node.
	pub fn is_link_active(&self, link: &Link) -> bool {
		self.highlighted
			.is_none_or(|h| link.source == h || link.target == h)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::layout::config::GraphConfig;
	use crate::layout::document::{GraphDocument, ObjectDescriptor};
	use crate::layout::model::build_graph;

	fn model() -> GraphModel {
		let objects = [("A", vec![]), ("B", vec!["A"]), ("C", vec!["A"]), ("D", vec!["C"])];
		let doc = GraphDocument {
			errors: Vec::new(),
			data: objects
				.into_iter()
				.map(|(name, deps)| {
					(
						name.to_string(),
						ObjectDescriptor {
							name: name.into(),
							kind: "Block".into(),
							depends: deps.into_iter().map(Into::into).collect(),
							..Default::default()
						},
					)
				})
				.collect(),
		};
		build_graph(&doc, &GraphConfig::default(), (800.0, 600.0))
	}

	fn active_names(selection: &Selection, model: &GraphModel) -> Vec<String> {
		(0..model.nodes.len())
			.filter(|&i| selection.is_node_active(i))
			.map(|i| model.nodes[i].name.clone())
			.collect()
	}

	#[test]
	fn nothing_is_dimmed_without_a_focus() {
		let model = model();
		let selection = Selection::default();
		assert_eq!(active_names(&selection, &model), ["A", "B", "C", "D"]);
		assert!(model.links.iter().all(|l| selection.is_link_active(l)));
	}

	#[test]
	fn selecting_activates_neighborhood() {
		let model = model();
		let mut selection = Selection::default();
		let b = model.index_of("B").unwrap();
		assert_eq!(selection.select(&model, b), SelectionChange::Selected(b));
		assert_eq!(active_names(&selection, &model), ["A", "B"]);

		let c = model.index_of("C").unwrap();
		selection.select(&model, c);
		assert_eq!(selection.selected(), Some(c));
		assert_eq!(active_names(&selection, &model), ["A", "C", "D"]);

		let active_links: Vec<_> = model
			.links
			.iter()
			.filter(|l| selection.is_link_active(l))
			.map(|l| (model.nodes[l.source].name.as_str(), model.nodes[l.target].name.as_str()))
			.collect();
		assert_eq!(active_links, [("A", "C"), ("C", "D")]);
	}

	#[test]
	fn selecting_twice_toggles_off() {
		let model = model();
		let mut selection = Selection::default();
		selection.select(&model, 0);
		assert_eq!(selection.select(&model, 0), SelectionChange::Deselected);
		assert_eq!(selection.selected(), None);
		assert!(!selection.has_highlight());
	}

	#[test]
	fn unknown_names_are_ignored() {
		let model = model();
		let mut selection = Selection::default();
		selection.select_by_name(&model, "A");
		assert_eq!(selection.select_by_name(&model, "missing"), SelectionChange::Unchanged);
		assert_eq!(selection.select(&model, 42), SelectionChange::Unchanged);
		assert_eq!(selection.selected(), model.index_of("A"));
	}

	#[test]
	fn hover_is_suppressed_while_selected() {
		let model = model();
		let mut selection = Selection::default();
		selection.select(&model, 0);
		selection.hover_enter(&model, 3);
		assert_eq!(selection.highlighted(), Some(0));
		selection.hover_leave();
		assert!(!selection.hover_pending());
	}

	#[test]
	fn hover_out_is_debounced() {
		let model = model();
		let mut selection = Selection::default();
		selection.hover_enter(&model, 1);
		selection.hover_leave();
		selection.advance(0.2);
		assert_eq!(selection.highlighted(), Some(1));
		selection.advance(0.2);
		assert_eq!(selection.highlighted(), None);
		assert!(selection.is_node_active(3));
	}

	#[test]
	fn new_hover_cancels_pending_clear() {
		let model = model();
		let mut selection = Selection::default();
		selection.hover_enter(&model, 1);
		selection.hover_leave();
		selection.advance(0.2);
		selection.hover_enter(&model, 2);
		selection.advance(1.0);
		assert_eq!(selection.highlighted(), Some(2));
	}
}
