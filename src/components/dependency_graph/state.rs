use log::info;

use super::types::{DragState, PanState, ViewTransform};
use crate::layout::{
	MeasureText, Selection, SelectionChange, Simulation, SimulationStatus, build_graph,
};
use crate::loader::GraphInput;

/// Space kept free around the layout area, in pixels.
pub const GRAPH_MARGIN: f64 = 20.0;
/// Pointer travel under which a background press still counts as a click.
const CLICK_SLOP: f64 = 3.0;
const HIGHLIGHT_SPEED: f64 = 10.0;

/// Everything the canvas needs between frames: layout, selection and view.
pub struct GraphSession {
	pub simulation: Simulation,
	pub selection: Selection,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hovered: Option<usize>,
	pub highlight_t: f64,
	pub width: f64,
	pub height: f64,
}

impl GraphSession {
	pub fn new(input: &GraphInput, width: f64, height: f64, measure: &impl MeasureText) -> Self {
		let area = (
			(width - 2.0 * GRAPH_MARGIN).max(1.0),
			(height - 2.0 * GRAPH_MARGIN).max(1.0),
		);
		let settings = input.config.graph.clone();
		let mut model = build_graph(&input.document, &input.config, area);
		model.fit_labels(&settings, measure);

		let mut simulation = Simulation::new(model, settings, area);
		simulation.start();
		info!("graph session ready ({width}x{height})");

		Self {
			simulation,
			selection: Selection::default(),
			transform: ViewTransform {
				x: GRAPH_MARGIN,
				y: GRAPH_MARGIN,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hovered: None,
			highlight_t: 0.0,
			width,
			height,
		}
	}

	pub fn data_errors(&self) -> Vec<String> {
		self.simulation
			.model()
			.errors
			.iter()
			.map(ToString::to_string)
			.collect()
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.transform.to_graph(sx, sy);
		self.simulation.node_at(gx, gy)
	}

	pub fn press(&mut self, sx: f64, sy: f64) {
		if let Some(idx) = self.node_at_position(sx, sy) {
			let node = &self.simulation.model().nodes[idx];
			self.drag = DragState {
				active: true,
				start_x: sx,
				start_y: sy,
				node_start_x: node.x,
				node_start_y: node.y,
			};
			self.simulation.drag_start(idx);
		} else {
			self.pan = PanState {
				active: true,
				moved: false,
				start_x: sx,
				start_y: sy,
				transform_start_x: self.transform.x,
				transform_start_y: self.transform.y,
			};
		}
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		if self.drag.active {
			let (dx, dy) = (
				(sx - self.drag.start_x) / self.transform.k,
				(sy - self.drag.start_y) / self.transform.k,
			);
			self.simulation
				.drag_to(self.drag.node_start_x + dx, self.drag.node_start_y + dy);
		} else if self.pan.active {
			let (dx, dy) = (sx - self.pan.start_x, sy - self.pan.start_y);
			if dx.abs() > CLICK_SLOP || dy.abs() > CLICK_SLOP {
				self.pan.moved = true;
			}
			self.transform.x = self.pan.transform_start_x + dx;
			self.transform.y = self.pan.transform_start_y + dy;
		} else {
			let hit = self.node_at_position(sx, sy);
			self.set_hover(hit);
		}
	}

	/// Ends a press. Returns the docs to show when a node became selected.
	pub fn release(&mut self) -> Option<String> {
		let mut docs = None;
		if self.drag.active {
			if let Some(idx) = self.simulation.drag_end() {
				docs = self.select(idx);
			}
		} else if self.pan.active && !self.pan.moved {
			self.selection.deselect();
		}
		self.drag = DragState::default();
		self.pan = PanState::default();
		docs
	}

	pub fn leave(&mut self) {
		if self.drag.active {
			self.simulation.drag_end();
		}
		self.drag = DragState::default();
		self.pan = PanState::default();
		self.set_hover(None);
	}

	pub fn zoom(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(0.1, 10.0);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	fn set_hover(&mut self, node: Option<usize>) {
		if self.hovered == node {
			return;
		}
		self.hovered = node;
		match node {
			Some(idx) => self.selection.hover_enter(self.simulation.model(), idx),
			None => self.selection.hover_leave(),
		}
	}

	/// Toggles selection of `idx`; returns its docs when it became selected.
	pub fn select(&mut self, idx: usize) -> Option<String> {
		match self.selection.select(self.simulation.model(), idx) {
			SelectionChange::Selected(idx) => {
				self.ensure_visible(idx);
				Some(self.simulation.model().nodes[idx].docs.clone())
			}
			SelectionChange::Deselected | SelectionChange::Unchanged => None,
		}
	}

	pub fn select_by_name(&mut self, name: &str) -> Option<String> {
		let idx = self.simulation.model().index_of(name)?;
		self.select(idx)
	}

	/// Recentres the view on `idx` if its box is partly off screen.
	fn ensure_visible(&mut self, idx: usize) {
		let node = &self.simulation.model().nodes[idx];
		let rect = node.world_extent();
		let (left, top) = self.transform.to_screen(rect.left, rect.top);
		let (right, bottom) = self.transform.to_screen(rect.right, rect.bottom);
		if left >= 0.0 && top >= 0.0 && right <= self.width && bottom <= self.height {
			return;
		}
		self.transform.x = self.width / 2.0 - node.x * self.transform.k;
		self.transform.y = self.height / 2.0 - node.y * self.transform.k;
	}

	pub fn tick(&mut self, dt: f64) -> SimulationStatus {
		self.selection.advance(dt);
		if self.selection.has_highlight() {
			self.highlight_t += (1.0 - self.highlight_t) * (HIGHLIGHT_SPEED * dt).min(1.0);
		} else {
			self.highlight_t = 0.0;
		}
		self.simulation.tick()
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::layout::document::ObjectDescriptor;
	use crate::layout::{GraphConfig, GraphDocument};

	struct Fixed;

	impl MeasureText for Fixed {
		fn text_width(&self, text: &str) -> f64 {
			text.len() as f64 * 7.0
		}

		fn line_height(&self) -> f64 {
			13.0
		}
	}

	fn session() -> GraphSession {
		let data = [("A", vec![]), ("B", vec!["A"]), ("C", vec!["A"])]
			.into_iter()
			.map(|(name, deps)| {
				(
					name.to_string(),
					ObjectDescriptor {
						name: name.into(),
						kind: "Block".into(),
						depends: deps.into_iter().map(Into::into).collect(),
						docs: format!("<p>{name}</p>"),
						..Default::default()
					},
				)
			})
			.collect();
		let input = GraphInput {
			document: GraphDocument {
				errors: Vec::new(),
				data,
			},
			config: GraphConfig::default(),
		};
		GraphSession::new(&input, 840.0, 640.0, &Fixed)
	}

	fn screen_pos(s: &GraphSession, idx: usize) -> (f64, f64) {
		let node = &s.simulation.model().nodes[idx];
		s.transform.to_screen(node.x, node.y)
	}

	#[test]
	fn click_on_node_selects_and_returns_docs() {
		let mut s = session();
		let (x, y) = screen_pos(&s, 1);
		s.press(x, y);
		assert_eq!(s.release().as_deref(), Some("<p>B</p>"));
		assert_eq!(s.selection.selected(), Some(1));
		assert!(!s.simulation.model().nodes[1].fixed);
	}

	#[test]
	fn background_click_deselects_but_pan_does_not() {
		let mut s = session();
		s.select(0);
		s.press(-500.0, -500.0);
		s.pointer_move(-400.0, -500.0);
		s.release();
		assert_eq!(s.selection.selected(), Some(0));

		s.press(-500.0, -500.0);
		s.release();
		assert_eq!(s.selection.selected(), None);
	}

	#[test]
	fn dragging_pins_without_selecting() {
		let mut s = session();
		let (x, y) = screen_pos(&s, 2);
		s.press(x, y);
		s.pointer_move(x + 60.0, y + 60.0);
		assert_eq!(s.release(), None);
		assert_eq!(s.selection.selected(), None);
		assert!(s.simulation.model().nodes[2].fixed);
	}

	#[test]
	fn selecting_by_unknown_name_is_ignored() {
		let mut s = session();
		assert_eq!(s.select_by_name("nope"), None);
		assert_eq!(s.select_by_name("C").as_deref(), Some("<p>C</p>"));
	}

	#[test]
	fn hover_highlight_fades_in_and_clears_after_grace() {
		let mut s = session();
		let (x, y) = screen_pos(&s, 0);
		s.pointer_move(x, y);
		s.tick(0.05);
		assert!(s.highlight_t > 0.0);
		s.pointer_move(-900.0, -900.0);
		s.tick(0.1);
		assert!(s.selection.has_highlight());
		s.tick(0.3);
		assert!(!s.selection.has_highlight());
		assert_eq!(s.highlight_t, 0.0);
	}

	#[test]
	fn zoom_keeps_pointer_fixed() {
		let mut s = session();
		let before = s.transform.to_graph(300.0, 200.0);
		s.zoom(300.0, 200.0, -1.0);
		let after = s.transform.to_graph(300.0, 200.0);
		assert!((before.0 - after.0).abs() < 1e-9);
		assert!((before.1 - after.1).abs() < 1e-9);
		assert!(s.transform.k > 1.0);
	}
}
