//! Line segments and axis-aligned rectangles used for link clipping and
//! collision tests.

const PARALLEL_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LineSegment {
	pub x1: f64,
	pub y1: f64,
	pub x2: f64,
	pub y2: f64,
}

/// Where two infinite lines cross, and whether that point lies on each segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection {
	pub x: f64,
	pub y: f64,
	pub on_first: bool,
	pub on_second: bool,
}

impl Intersection {
	pub fn on_both(&self) -> bool {
		self.on_first && self.on_second
	}
}

impl LineSegment {
	pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
		Self { x1, y1, x2, y2 }
	}

	pub fn offset(&self, dx: f64, dy: f64) -> Self {
		Self::new(self.x1 + dx, self.y1 + dy, self.x2 + dx, self.y2 + dy)
	}

	/// Intersects the lines through both segments. Returns `None` for parallel
	/// or degenerate segments.
	pub fn intersect(&self, other: &LineSegment) -> Option<Intersection> {
		let (dx1, dy1) = (self.x2 - self.x1, self.y2 - self.y1);
		let (dx2, dy2) = (other.x2 - other.x1, other.y2 - other.y1);
		let denom = dx1 * dy2 - dy1 * dx2;
		if denom.abs() < PARALLEL_EPSILON {
			return None;
		}

		let (ox, oy) = (other.x1 - self.x1, other.y1 - self.y1);
		let t = (ox * dy2 - oy * dx2) / denom;
		let u = (ox * dy1 - oy * dx1) / denom;
		let within = |v: f64| (0.0..=1.0).contains(&v);

		Some(Intersection {
			x: self.x1 + t * dx1,
			y: self.y1 + t * dy1,
			on_first: within(t),
			on_second: within(u),
		})
	}
}

/// Axis-aligned rectangle stored as its four sides.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
	pub left: f64,
	pub top: f64,
	pub right: f64,
	pub bottom: f64,
}

impl Rect {
	pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
		Self {
			left,
			top,
			right,
			bottom,
		}
	}

	pub fn width(&self) -> f64 {
		self.right - self.left
	}

	pub fn height(&self) -> f64 {
		self.bottom - self.top
	}

	pub fn translate(&self, dx: f64, dy: f64) -> Self {
		Self::new(
			self.left + dx,
			self.top + dy,
			self.right + dx,
			self.bottom + dy,
		)
	}

	pub fn contains(&self, x: f64, y: f64) -> bool {
		x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
	}

	/// Strict overlap: rectangles that only share an edge do not intersect.
	pub fn intersects(&self, other: &Rect) -> bool {
		self.left < other.right
			&& other.left < self.right
			&& self.top < other.bottom
			&& other.top < self.bottom
	}

	/// Sides in clipping order: left, right, top, bottom.
	pub fn edges(&self) -> [LineSegment; 4] {
		[
			LineSegment::new(self.left, self.top, self.left, self.bottom),
			LineSegment::new(self.right, self.top, self.right, self.bottom),
			LineSegment::new(self.left, self.top, self.right, self.top),
			LineSegment::new(self.left, self.bottom, self.right, self.bottom),
		]
	}
}

/// Clips the segment from `(sx, sy)` to `(tx, ty)` at the border of `bounds`
/// placed at the target point. Falls back to the target centre when no side
/// is crossed.
pub fn clip_to_border(sx: f64, sy: f64, tx: f64, ty: f64, bounds: &Rect) -> (f64, f64) {
	let line = LineSegment::new(sx, sy, tx, ty);
	bounds
		.edges()
		.iter()
		.filter_map(|edge| line.intersect(&edge.offset(tx, ty)))
		.find(Intersection::on_both)
		.map_or((tx, ty), |ix| (ix.x, ix.y))
}
