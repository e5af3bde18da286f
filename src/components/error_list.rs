use leptos::prelude::*;

/// Banner listing data or load errors; renders nothing when empty.
#[component]
pub fn ErrorList(
	#[prop(into)] errors: Signal<Vec<String>>,
	#[prop(default = "Errors")] title: &'static str,
) -> impl IntoView {
	view! {
		<Show when=move || !errors.with(Vec::is_empty)>
			<div class="errors">
				<h2>{title}</h2>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|e| view! { <li>{e}</li> })
							.collect_view()
					}}
				</ul>
			</div>
		</Show>
	}
}
