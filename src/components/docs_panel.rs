use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, MouseEvent};

const OBJECT_LINK: &str = ".select-object";

/// Name carried by the `.select-object` anchor the click landed in, if any.
fn clicked_object(ev: &MouseEvent) -> Option<String> {
	let target: Element = ev.target()?.dyn_into().ok()?;
	target.closest(OBJECT_LINK).ok()??.get_attribute("data-name")
}

/// Side panel showing the selected object's pre-rendered docs.
#[component]
pub fn DocsPanel(
	#[prop(into)] html: Signal<String>,
	open: RwSignal<bool>,
	/// Receives object names clicked in the docs.
	on_select: Callback<String>,
) -> impl IntoView {
	let content_ref = NodeRef::<leptos::html::Div>::new();

	Effect::new(move |_| {
		html.track();
		if let Some(el) = content_ref.get() {
			el.set_scroll_top(0);
		}
	});

	let on_click = move |ev: MouseEvent| {
		if let Some(name) = clicked_object(&ev) {
			ev.prevent_default();
			on_select.run(name);
		}
	};

	view! {
		<div class="docs-panel" style:display=move || if open.get() { "block" } else { "none" }>
			<a
				href="#"
				class="close-docs"
				title="Hide documentation"
				on:click=move |ev: MouseEvent| {
					ev.prevent_default();
					open.set(false);
				}
			>
				"×"
			</a>
			<div
				class="docs"
				node_ref=content_ref
				on:click=on_click
				inner_html=move || html.get()
			/>
		</div>
	}
}
