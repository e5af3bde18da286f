//! Rectangle collision avoidance. Each pass nudges overlapping pairs apart by
//! half the smallest separating translation, so overlaps shrink over repeated
//! ticks rather than being solved exactly.

use super::geometry::Rect;
use super::model::Node;

const MAX_DEPTH: usize = 12;
const BUCKET_SIZE: usize = 4;

/// Point quadtree over node centres, storing node indices.
#[derive(Debug)]
pub struct Quadtree {
	root: Quad,
}

#[derive(Debug)]
struct Quad {
	area: Rect,
	points: Vec<(f64, f64, usize)>,
	children: Option<Box<[Quad; 4]>>,
}

impl Quad {
	fn new(area: Rect) -> Self {
		Self {
			area,
			points: Vec::new(),
			children: None,
		}
	}

	fn insert(&mut self, x: f64, y: f64, idx: usize, depth: usize) {
		if let Some(children) = self.children.as_mut() {
			let q = Self::quadrant(&self.area, x, y);
			children[q].insert(x, y, idx, depth + 1);
			return;
		}
		self.points.push((x, y, idx));
		if self.points.len() > BUCKET_SIZE && depth < MAX_DEPTH {
			self.split(depth);
		}
	}

	fn split(&mut self, depth: usize) {
		let Rect {
			left,
			top,
			right,
			bottom,
		} = self.area;
		let (mx, my) = ((left + right) / 2.0, (top + bottom) / 2.0);
		let mut children = Box::new([
			Quad::new(Rect::new(left, top, mx, my)),
			Quad::new(Rect::new(mx, top, right, my)),
			Quad::new(Rect::new(left, my, mx, bottom)),
			Quad::new(Rect::new(mx, my, right, bottom)),
		]);
		for (x, y, idx) in self.points.drain(..) {
			let q = Self::quadrant(&self.area, x, y);
			children[q].insert(x, y, idx, depth + 1);
		}
		self.children = Some(children);
	}

	fn quadrant(area: &Rect, x: f64, y: f64) -> usize {
		let (mx, my) = ((area.left + area.right) / 2.0, (area.top + area.bottom) / 2.0);
		usize::from(x >= mx) + 2 * usize::from(y >= my)
	}

	fn visit(&self, query: &Rect, out: &mut Vec<usize>) {
		if !overlaps_inclusive(&self.area, query) {
			return;
		}
		out.extend(
			self.points
				.iter()
				.filter(|(x, y, _)| query.contains(*x, *y))
				.map(|(_, _, idx)| *idx),
		);
		if let Some(children) = &self.children {
			for child in children.iter() {
				child.visit(query, out);
			}
		}
	}
}

fn overlaps_inclusive(a: &Rect, b: &Rect) -> bool {
	a.left <= b.right && b.left <= a.right && a.top <= b.bottom && b.top <= a.bottom
}

impl Quadtree {
	pub fn build(points: impl IntoIterator<Item = (f64, f64)>) -> Self {
		let points: Vec<_> = points.into_iter().collect();
		let mut area = Rect::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
		for &(x, y) in &points {
			area.left = area.left.min(x);
			area.top = area.top.min(y);
			area.right = area.right.max(x);
			area.bottom = area.bottom.max(y);
		}
		// Square it so quadrants stay square.
		let size = area.width().max(area.height()).max(1.0);
		let mut root = Quad::new(Rect::new(area.left, area.top, area.left + size, area.top + size));
		for (idx, (x, y)) in points.into_iter().enumerate() {
			root.insert(x, y, idx, 0);
		}
		Self { root }
	}

	/// Indices of the points inside `query`, edges included.
	pub fn query(&self, query: &Rect) -> Vec<usize> {
		let mut out = Vec::new();
		self.root.visit(query, &mut out);
		out
	}
}

/// Translation to apply to the first rectangle; the second one moves by the
/// negation.
fn separation(o: &Rect, p: &Rect) -> (f64, f64) {
	let push_left = o.right - p.left;
	let push_right = p.right - o.left;
	let push_up = o.bottom - p.top;
	let push_down = p.bottom - o.top;
	let adj = push_left.min(push_right).min(push_up).min(push_down);

	if adj == push_left {
		(-adj / 2.0, 0.0)
	} else if adj == push_right {
		(adj / 2.0, 0.0)
	} else if adj == push_up {
		(0.0, -adj / 2.0)
	} else {
		(0.0, adj / 2.0)
	}
}

/// Pushes overlapping node rectangles apart. Mutates positions in place.
pub fn resolve_collisions(nodes: &mut [Node]) {
	if nodes.len() < 2 {
		return;
	}
	let tree = Quadtree::build(nodes.iter().map(|n| (n.x, n.y)));

	// Largest extent on each side bounds how far away an overlapping centre can be.
	let reach = nodes.iter().fold(Rect::default(), |acc, n| {
		Rect::new(
			acc.left.min(n.extent.left),
			acc.top.min(n.extent.top),
			acc.right.max(n.extent.right),
			acc.bottom.max(n.extent.bottom),
		)
	});

	for i in 0..nodes.len() {
		let own = nodes[i].world_extent();
		let window = Rect::new(
			own.left - reach.right,
			own.top - reach.bottom,
			own.right - reach.left,
			own.bottom - reach.top,
		);
		for j in tree.query(&window) {
			if j == i {
				continue;
			}
			let o = nodes[i].world_extent();
			let p = nodes[j].world_extent();
			if !o.intersects(&p) {
				continue;
			}
			let (dx, dy) = separation(&o, &p);
			nodes[i].x += dx;
			nodes[i].y += dy;
			nodes[j].x -= dx;
			nodes[j].y -= dy;
		}
	}
}
