use web_sys::CanvasRenderingContext2d;

use super::state::{GRAPH_MARGIN, GraphSession};
use crate::layout::label::LINE_SPACING;
use crate::layout::model::{GraphModel, Link, Node};
use crate::layout::MeasureText;

pub const FONT_SIZE: f64 = 12.0;
const LABEL_FONT: &str = "12px sans-serif";
const CORNER_RADIUS: f64 = 5.0;
const ARROW_SIZE: f64 = 6.0;
const DIMMED_ALPHA: f64 = 0.15;

// Legend placement, relative to the graph margin.
const LEGEND_RECT: f64 = 12.0;
const LEGEND_X: f64 = -10.0;
const LEGEND_Y: f64 = 30.0;
const LEGEND_TEXT_DX: f64 = 20.0;
const LEGEND_TEXT_DY: f64 = 10.0;
const LEGEND_LINE_HEIGHT: f64 = 15.0;

impl MeasureText for CanvasRenderingContext2d {
	fn text_width(&self, text: &str) -> f64 {
		self.set_font(LABEL_FONT);
		self.measure_text(text)
			.map(|m| m.width())
			.unwrap_or(text.chars().count() as f64 * FONT_SIZE * 0.6)
	}

	fn line_height(&self) -> f64 {
		FONT_SIZE * LINE_SPACING
	}
}

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub fn render(session: &GraphSession, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#ffffff");
	ctx.fill_rect(0.0, 0.0, session.width, session.height);
	ctx.save();
	let _ = ctx.translate(session.transform.x, session.transform.y);
	let _ = ctx.scale(session.transform.k, session.transform.k);
	draw_links(session, ctx);
	draw_nodes(session, ctx);
	ctx.restore();
	draw_legend(session.simulation.model(), ctx);
}

/// Alpha for an element: dimmed elements fade out as the highlight eases in.
fn element_alpha(session: &GraphSession, active: bool) -> f64 {
	if active {
		1.0
	} else {
		1.0 - (1.0 - DIMMED_ALPHA) * ease_out_cubic(session.highlight_t)
	}
}

fn draw_links(session: &GraphSession, ctx: &CanvasRenderingContext2d) {
	let model = session.simulation.model();
	for link in &model.links {
		let source = &model.nodes[link.source];
		ctx.set_global_alpha(element_alpha(session, session.selection.is_link_active(link)));
		draw_link(ctx, source, link);
	}
	ctx.set_global_alpha(1.0);
}

fn draw_link(ctx: &CanvasRenderingContext2d, source: &Node, link: &Link) {
	let (x1, y1, x2, y2) = (source.x, source.y, link.x2, link.y2);
	let (dx, dy) = (x2 - x1, y2 - y1);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < 0.001 {
		return;
	}
	let (ux, uy) = (dx / dist, dy / dist);

	ctx.set_stroke_style_str(&link.color);
	ctx.set_line_width(link.width);
	ctx.begin_path();
	ctx.move_to(x1, y1);
	ctx.line_to(x2 - ux * ARROW_SIZE, y2 - uy * ARROW_SIZE);
	ctx.stroke();

	let (back_x, back_y) = (x2 - ux * ARROW_SIZE, y2 - uy * ARROW_SIZE);
	let (px, py) = (-uy * ARROW_SIZE * 0.5, ux * ARROW_SIZE * 0.5);
	ctx.set_fill_style_str(&link.color);
	ctx.begin_path();
	ctx.move_to(x2, y2);
	ctx.line_to(back_x + px, back_y + py);
	ctx.line_to(back_x - px, back_y - py);
	ctx.close_path();
	ctx.fill();
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
	let r = r.min(w / 2.0).min(h / 2.0);
	ctx.begin_path();
	ctx.move_to(x + r, y);
	let _ = ctx.arc_to(x + w, y, x + w, y + h, r);
	let _ = ctx.arc_to(x + w, y + h, x, y + h, r);
	let _ = ctx.arc_to(x, y + h, x, y, r);
	let _ = ctx.arc_to(x, y, x + w, y, r);
	ctx.close_path();
}

fn draw_nodes(session: &GraphSession, ctx: &CanvasRenderingContext2d) {
	let model = session.simulation.model();
	let selected = session.selection.selected();
	ctx.set_font(LABEL_FONT);
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");

	for (idx, node) in model.nodes.iter().enumerate() {
		let color = model.category_color(node);
		let b = node.world_bounds();
		ctx.set_global_alpha(element_alpha(session, session.selection.is_node_active(idx)));

		if selected == Some(idx) {
			ctx.set_shadow_color("rgba(0, 0, 180, 0.7)");
			ctx.set_shadow_blur(6.0);
		}
		rounded_rect(ctx, b.left, b.top, b.width(), b.height(), CORNER_RADIUS);
		ctx.set_fill_style_str(color);
		ctx.fill();
		ctx.set_shadow_blur(0.0);
		ctx.set_shadow_color("transparent");

		ctx.set_stroke_style_str(if selected == Some(idx) { "#000000" } else { "#555555" });
		ctx.set_line_width(if selected == Some(idx) { 2.0 } else { 1.0 });
		ctx.stroke();

		ctx.set_fill_style_str("#000000");
		let _ = ctx.fill_text(&node.label, node.x, node.y);
	}
	ctx.set_global_alpha(1.0);
}

fn draw_legend(model: &GraphModel, ctx: &CanvasRenderingContext2d) {
	ctx.set_font(LABEL_FONT);
	ctx.set_text_align("left");
	ctx.set_text_baseline("alphabetic");
	let (x, y) = (GRAPH_MARGIN + LEGEND_X, GRAPH_MARGIN + LEGEND_Y);

	for (i, category) in model.categories.iter().enumerate() {
		let row = y + i as f64 * LEGEND_LINE_HEIGHT;
		ctx.set_fill_style_str(&category.color);
		ctx.fill_rect(x, row, LEGEND_RECT, LEGEND_RECT);
		ctx.set_stroke_style_str("#555555");
		ctx.set_line_width(1.0);
		ctx.stroke_rect(x, row, LEGEND_RECT, LEGEND_RECT);

		ctx.set_fill_style_str("#000000");
		let _ = ctx.fill_text(
			&format!("{} ({})", category.legend_label(), category.count),
			x + LEGEND_TEXT_DX,
			row + LEGEND_TEXT_DY,
		);
	}
}
