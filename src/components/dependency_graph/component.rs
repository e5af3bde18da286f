use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::render;
use super::state::GraphSession;
use crate::loader::GraphInput;

/// Longest frame gap fed to the hover timers, in seconds.
const MAX_FRAME_DT: f64 = 0.25;

/// Size used before the container has been laid out.
const FALLBACK_SIZE: (f64, f64) = (800.0, 600.0);

fn usable_size(width: f64, height: f64) -> (f64, f64) {
	if width > 0.0 && height > 0.0 {
		(width, height)
	} else {
		FALLBACK_SIZE
	}
}

/// The canvas fills its container.
fn canvas_size(canvas: &HtmlCanvasElement) -> (f64, f64) {
	canvas.parent_element().map_or(FALLBACK_SIZE, |p| {
		usable_size(p.client_width() as f64, p.client_height() as f64)
	})
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas
		.get_context("2d")
		.ok()
		.flatten()
		.and_then(|ctx| ctx.dyn_into().ok())
}

fn pointer(ev: &MouseEvent) -> (f64, f64) {
	(ev.offset_x() as f64, ev.offset_y() as f64)
}

/// Canvas that lays out and paints the dependency graph, and turns pointer
/// input into drag, pan, zoom, hover and selection.
#[component]
pub fn DependencyGraphCanvas(
	input: GraphInput,
	/// Names selected from outside the canvas, e.g. docs links.
	#[prop(into)]
	select_request: Signal<Option<String>>,
	/// Receives the docs of a newly selected node.
	on_select: Callback<String>,
	/// Receives data errors found while building the graph.
	on_errors: Callback<Vec<String>>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Rc<RefCell<Option<GraphSession>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (state_init, animate_init) = (state.clone(), animate.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if state_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(ctx) = context_2d(&canvas) else {
			warn!("canvas has no 2d context");
			return;
		};

		let (w, h) = canvas_size(&canvas);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let session = GraphSession::new(&input, w, h, &ctx);
		let errors = session.data_errors();
		*state_init.borrow_mut() = Some(session);
		if !errors.is_empty() {
			on_errors.run(errors);
		}

		let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
		let mut last_frame = js_sys::Date::now();
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			let now = js_sys::Date::now();
			let dt = ((now - last_frame) / 1000.0).clamp(0.0, MAX_FRAME_DT);
			last_frame = now;
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				let (nw, nh) = canvas_size(&canvas);
				if (nw, nh) != (s.width, s.height) {
					canvas.set_width(nw as u32);
					canvas.set_height(nh as u32);
					s.resize(nw, nh);
				}
				s.tick(dt);
				render::render(s, &ctx);
			}
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let (Some(cb), Some(win)) = (animate_init.borrow().as_ref(), web_sys::window()) {
			let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_req = state.clone();
	Effect::new(move |_| {
		let Some(name) = select_request.get() else {
			return;
		};
		let docs = state_req
			.borrow_mut()
			.as_mut()
			.and_then(|s| s.select_by_name(&name));
		if let Some(docs) = docs {
			on_select.run(docs);
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let (x, y) = pointer(&ev);
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.press(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let (x, y) = pointer(&ev);
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.pointer_move(x, y);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		let docs = state_mu.borrow_mut().as_mut().and_then(GraphSession::release);
		if let Some(docs) = docs {
			on_select.run(docs);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.leave();
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let (x, y) = pointer(&ev);
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.zoom(x, y, ev.delta_y());
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="dependency-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
