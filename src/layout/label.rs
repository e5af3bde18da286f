//! Label truncation and node box derivation from measured label size.

use super::config::LayoutSettings;
use super::geometry::Rect;

/// Line height as a multiple of the font size.
pub const LINE_SPACING: f64 = 1.1;

/// Measures rendered text. Implemented by the canvas context in the browser.
pub trait MeasureText {
	/// Width of `text` in pixels.
	fn text_width(&self, text: &str) -> f64;
	/// Height of one line of text in pixels.
	fn line_height(&self) -> f64;
}

/// Cuts a name down to `max_chars` characters.
pub fn truncate_label(name: &str, max_chars: usize) -> String {
	match name.char_indices().nth(max_chars) {
		Some((end, _)) => name[..end].to_string(),
		None => name.to_string(),
	}
}

/// Box drawn around a label, and the collision extent around that box. Both
/// are relative to the node centre.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LabelBox {
	pub bounds: Rect,
	pub extent: Rect,
}

impl LabelBox {
	pub fn fit(label: &str, settings: &LayoutSettings, measure: &impl MeasureText) -> Self {
		let (width, height) = (measure.text_width(label), measure.line_height());
		Self::from_size(width, height, settings)
	}

	pub fn from_size(width: f64, height: f64, settings: &LayoutSettings) -> Self {
		let (pad, margin) = (&settings.label_padding, &settings.label_margin);
		let bounds = Rect::new(
			-width / 2.0 - pad.left,
			-height / 2.0 - pad.top,
			width / 2.0 + pad.right,
			height / 2.0 + pad.bottom,
		);
		let extent = Rect::new(
			bounds.left - margin.left,
			bounds.top - margin.top,
			bounds.right + margin.right,
			bounds.bottom + margin.bottom,
		);
		Self { bounds, extent }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct Monospace;

	impl MeasureText for Monospace {
		fn text_width(&self, text: &str) -> f64 {
			text.chars().count() as f64 * 6.0
		}

		fn line_height(&self) -> f64 {
			12.0 * LINE_SPACING
		}
	}

	#[test]
	fn truncates_on_char_boundaries() {
		assert_eq!(truncate_label("main", 32), "main");
		assert_eq!(truncate_label("loop.body.17", 4), "loop");
		assert_eq!(truncate_label("ünïcødé", 3), "ünï");
		assert_eq!(truncate_label("anything", 0), "");
	}

	#[test]
	fn box_adds_padding_then_margin() {
		let settings = LayoutSettings::default();
		let label = LabelBox::fit("abcd", &settings, &Monospace);
		let height = 12.0 * LINE_SPACING;

		assert_eq!(label.bounds.left, -12.0 - 2.0);
		assert_eq!(label.bounds.right, 12.0 + 2.0);
		assert!((label.bounds.height() - (height + 4.0)).abs() < 1e-9);
		assert_eq!(label.extent.left, label.bounds.left - 3.0);
		assert_eq!(label.extent.right, label.bounds.right + 3.0);
		assert_eq!(label.extent.top, label.bounds.top - 2.0);
		assert_eq!(label.extent.bottom, label.bounds.bottom + 2.0);
	}
}
