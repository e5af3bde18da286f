//! Force simulation driver. The `force_graph` engine supplies charge
//! repulsion and velocity integration; this driver layers link springs,
//! gravity, positional pull, collision avoidance and link clipping on top,
//! and owns the alpha cooling schedule.

use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, ForceGraph, NodeData, SimulationParameters};
use log::{debug, info};

use super::collision::resolve_collisions;
use super::config::LayoutSettings;
use super::geometry::clip_to_border;
use super::model::{GraphModel, Node};

/// Engine time step per tick, in seconds.
pub const TICK_DT: f32 = 0.016;
pub const START_ALPHA: f64 = 0.1;
/// Alpha used when a drag wakes a settled simulation.
pub const RESUME_ALPHA: f64 = 0.025;
const ALPHA_DECAY: f64 = 0.99;
const ALPHA_MIN: f64 = 0.005;
/// Maps configured charge (d3 units, negative repels) onto engine charge.
const CHARGE_SCALE: f64 = 0.15;
const NODE_MASS: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationStatus {
	Running,
	Settled,
}

#[derive(Clone, Copy, Debug)]
struct DragOrigin {
	idx: usize,
	x: f64,
	y: f64,
	was_fixed: bool,
}

pub struct Simulation {
	model: GraphModel,
	engine: ForceGraph<usize, ()>,
	handles: Vec<DefaultNodeIdx>,
	degrees: Vec<f64>,
	settings: LayoutSettings,
	center: (f64, f64),
	alpha: f64,
	prevent_collisions: bool,
	ticks: usize,
	drag: Option<DragOrigin>,
}

/// Blends a node toward each of its constraint targets in order, each with
/// weight `constraint.weight * alpha`.
pub fn apply_position_constraints(node: &mut Node, alpha: f64) {
	for c in &node.position_constraints {
		let w = c.weight * alpha;
		if let Some(x) = c.x {
			node.x = x * w + node.x * (1.0 - w);
		}
		if let Some(y) = c.y {
			node.y = y * w + node.y * (1.0 - w);
		}
	}
}

impl Simulation {
	/// Places nodes on a circle around the canvas centre and loads them into
	/// the engine. Call [`Simulation::start`] to begin cooling.
	pub fn new(mut model: GraphModel, settings: LayoutSettings, size: (f64, f64)) -> Self {
		let mut engine = ForceGraph::new(SimulationParameters {
			force_charge: ((-settings.charge).max(0.0) * CHARGE_SCALE) as f32,
			force_spring: 0.0,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		});
		let center = (size.0 / 2.0, size.1 / 2.0);
		let radius = size.0.min(size.1) / 3.0;
		let count = model.nodes.len().max(1) as f64;

		let mut handles = Vec::with_capacity(model.nodes.len());
		for (i, node) in model.nodes.iter_mut().enumerate() {
			let angle = (i as f64) * 2.0 * PI / count;
			node.x = center.0 + radius * angle.cos();
			node.y = center.1 + radius * angle.sin();
			handles.push(engine.add_node(NodeData {
				x: node.x as f32,
				y: node.y as f32,
				mass: NODE_MASS,
				is_anchor: node.fixed,
				user_data: i,
			}));
		}

		let mut degrees = vec![0.0; model.nodes.len()];
		for link in &model.links {
			degrees[link.source] += 1.0;
			degrees[link.target] += 1.0;
		}

		Self {
			model,
			engine,
			handles,
			degrees,
			settings,
			center,
			alpha: 0.0,
			prevent_collisions: false,
			ticks: 0,
			drag: None,
		}
	}

	pub fn model(&self) -> &GraphModel {
		&self.model
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn ticks(&self) -> usize {
		self.ticks
	}

	pub fn collisions_enabled(&self) -> bool {
		self.prevent_collisions
	}

	pub fn status(&self) -> SimulationStatus {
		if self.alpha > 0.0 {
			SimulationStatus::Running
		} else {
			SimulationStatus::Settled
		}
	}

	/// Heats the simulation and runs the warm-up ticks with collision
	/// avoidance off.
	pub fn start(&mut self) {
		self.alpha = START_ALPHA;
		self.prevent_collisions = false;
		for _ in 0..self.settings.ticks_without_collisions {
			if self.tick() == SimulationStatus::Settled {
				break;
			}
		}
		self.prevent_collisions = true;
		info!(
			"layout warmed up: {} nodes, {} ticks, alpha {:.4}",
			self.model.nodes.len(),
			self.ticks,
			self.alpha
		);
	}

	/// Advances one step. Does nothing once settled.
	pub fn tick(&mut self) -> SimulationStatus {
		if self.alpha <= 0.0 {
			return SimulationStatus::Settled;
		}
		self.ticks += 1;
		let alpha = self.alpha;

		self.engine.update(TICK_DT * (alpha / START_ALPHA) as f32);
		self.pull_positions();
		self.apply_links(alpha);
		self.apply_gravity(alpha);
		for node in self.model.nodes.iter_mut().filter(|n| !n.fixed) {
			apply_position_constraints(node, alpha);
		}
		if self.prevent_collisions {
			self.avoid_collisions();
		}
		self.push_positions();
		self.clip_links();

		self.alpha *= ALPHA_DECAY;
		if self.alpha < ALPHA_MIN {
			self.alpha = 0.0;
			info!("layout settled after {} ticks", self.ticks);
			return SimulationStatus::Settled;
		}
		SimulationStatus::Running
	}

	fn pull_positions(&mut self) {
		let nodes = &mut self.model.nodes;
		self.engine.visit_nodes(|n| {
			let node = &mut nodes[n.data.user_data];
			if !node.fixed {
				node.x = n.x() as f64;
				node.y = n.y() as f64;
			}
		});
	}

	fn push_positions(&mut self) {
		let nodes = &self.model.nodes;
		self.engine.visit_nodes_mut(|n| {
			let node = &nodes[n.data.user_data];
			n.data.x = node.x as f32;
			n.data.y = node.y as f32;
			n.data.is_anchor = node.fixed;
		});
	}

	fn apply_links(&mut self, alpha: f64) {
		let distance = self.settings.link_distance;
		let nodes = &mut self.model.nodes;
		for link in &self.model.links {
			let (s, t) = (link.source, link.target);
			if s == t {
				continue;
			}
			let (dx, dy) = (nodes[t].x - nodes[s].x, nodes[t].y - nodes[s].y);
			let len = (dx * dx + dy * dy).sqrt();
			if len == 0.0 {
				continue;
			}
			let f = alpha * link.strength * (len - distance) / len;
			let (dx, dy) = (dx * f, dy * f);
			let k = self.degrees[s] / (self.degrees[s] + self.degrees[t]);
			if !nodes[t].fixed {
				nodes[t].x -= dx * k;
				nodes[t].y -= dy * k;
			}
			if !nodes[s].fixed {
				nodes[s].x += dx * (1.0 - k);
				nodes[s].y += dy * (1.0 - k);
			}
		}
	}

	fn apply_gravity(&mut self, alpha: f64) {
		let k = alpha * self.settings.gravity;
		let (cx, cy) = self.center;
		for node in self.model.nodes.iter_mut().filter(|n| !n.fixed) {
			node.x += (cx - node.x) * k;
			node.y += (cy - node.y) * k;
		}
	}

	fn avoid_collisions(&mut self) {
		let pinned: Vec<(usize, f64, f64)> = self
			.model
			.nodes
			.iter()
			.enumerate()
			.filter(|(_, n)| n.fixed)
			.map(|(i, n)| (i, n.x, n.y))
			.collect();
		resolve_collisions(&mut self.model.nodes);
		for (i, x, y) in pinned {
			self.model.nodes[i].x = x;
			self.model.nodes[i].y = y;
		}
	}

	fn clip_links(&mut self) {
		let nodes = &self.model.nodes;
		for link in &mut self.model.links {
			let (s, t) = (&nodes[link.source], &nodes[link.target]);
			(link.x2, link.y2) = if link.source == link.target {
				(t.x, t.y)
			} else {
				clip_to_border(s.x, s.y, t.x, t.y, &t.bounds)
			};
		}
	}

	/// Pixels a node must travel before a press counts as a drag. Hotter
	/// layouts need a larger move.
	pub fn drag_threshold(&self) -> f64 {
		(5.0 + 150.0 * self.alpha).clamp(5.0, 20.0)
	}

	/// Pins `idx` for the duration of a drag.
	pub fn drag_start(&mut self, idx: usize) {
		let Some(node) = self.model.nodes.get_mut(idx) else {
			return;
		};
		self.drag = Some(DragOrigin {
			idx,
			x: node.x,
			y: node.y,
			was_fixed: node.fixed,
		});
		node.fixed = true;
		node.dragged = false;
		self.sync_node(idx);
	}

	/// Moves the dragged node. Once it has travelled past the threshold it
	/// counts as dragged and wakes a settled layout.
	pub fn drag_to(&mut self, x: f64, y: f64) {
		let Some(origin) = self.drag else {
			return;
		};
		let threshold = self.drag_threshold();
		let node = &mut self.model.nodes[origin.idx];
		node.x = x;
		node.y = y;
		if (origin.x - x).abs() >= threshold || (origin.y - y).abs() >= threshold {
			node.dragged = true;
		}
		if node.dragged && self.alpha <= 0.0 {
			debug!("drag resumed layout");
			self.alpha = RESUME_ALPHA;
		}
		self.sync_node(origin.idx);
		self.clip_links();
	}

	/// Ends a drag. Returns the node index when the press never became a drag
	/// (a click); a real drag leaves the node pinned.
	pub fn drag_end(&mut self) -> Option<usize> {
		let origin = self.drag.take()?;
		let node = &mut self.model.nodes[origin.idx];
		let clicked = !node.dragged;
		if clicked {
			node.fixed = origin.was_fixed;
		}
		node.dragged = false;
		self.sync_node(origin.idx);
		clicked.then_some(origin.idx)
	}

	pub fn dragging(&self) -> Option<usize> {
		self.drag.map(|d| d.idx)
	}

	fn sync_node(&mut self, idx: usize) {
		let (Some(node), Some(&handle)) = (self.model.nodes.get(idx), self.handles.get(idx)) else {
			return;
		};
		let (x, y, fixed) = (node.x as f32, node.y as f32, node.fixed);
		self.engine.visit_nodes_mut(|n| {
			if n.index() == handle {
				n.data.x = x;
				n.data.y = y;
				n.data.is_anchor = fixed;
			}
		});
	}

	/// Topmost node whose label box contains the world point.
	pub fn node_at(&self, x: f64, y: f64) -> Option<usize> {
		self.model
			.nodes
			.iter()
			.rposition(|n| n.world_bounds().contains(x, y))
	}
}
