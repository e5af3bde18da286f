use std::sync::Arc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_meta::Title;
use log::{info, warn};

use crate::components::dependency_graph::DependencyGraphCanvas;
use crate::components::docs_panel::DocsPanel;
use crate::components::error_list::ErrorList;
use crate::loader::{GraphInput, LoadError, load_graph};

/// Errors reported by the document itself. When present they replace the
/// graph entirely.
fn blocking_errors(input: &GraphInput) -> Option<Vec<String>> {
	input
		.document
		.has_errors()
		.then(|| input.document.errors.clone())
}

/// Graph canvas beside the docs panel, or the document's own errors.
fn graph_view(
	input: GraphInput,
	docs: RwSignal<String>,
	panel_open: RwSignal<bool>,
	select_request: RwSignal<Option<String>>,
	data_errors: RwSignal<Vec<String>>,
) -> AnyView {
	let title = input.config.page_title().to_string();
	if let Some(errors) = blocking_errors(&input) {
		return view! {
			<Title text=title />
			<ErrorList errors=errors title="Errors in the graph data" />
		}
		.into_any();
	}

	let on_select = Callback::new(move |html: String| {
		docs.set(html);
		panel_open.set(true);
	});
	let on_errors = Callback::new(move |errors: Vec<String>| data_errors.set(errors));
	let on_docs_link = Callback::new(move |name: String| select_request.set(Some(name)));

	view! {
		<Title text=title />
		<ErrorList errors=data_errors title="Data errors" />
		<div class="graph-layout">
			<div
				class="graph-container"
				style:width=move || if panel_open.get() { "65%" } else { "100%" }
			>
				<DependencyGraphCanvas
					input=input
					select_request=select_request
					on_select=on_select
					on_errors=on_errors
				/>
				<Show when=move || !panel_open.get()>
					<a
						href="#"
						class="show-docs"
						on:click=move |ev| {
							ev.prevent_default();
							panel_open.set(true);
						}
					>
						"Show documentation"
					</a>
				</Show>
			</div>
			<DocsPanel html=docs open=panel_open on_select=on_docs_link />
		</div>
	}
	.into_any()
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let load: RwSignal<Option<Result<GraphInput, Arc<LoadError>>>> = RwSignal::new(None);
	let docs = RwSignal::new(String::new());
	let panel_open = RwSignal::new(true);
	let select_request = RwSignal::new(None::<String>);
	let data_errors = RwSignal::new(Vec::<String>::new());

	spawn_local(async move {
		let result = load_graph().await;
		match &result {
			Ok(input) => {
				if let Some(landing) = input.document.landing_object() {
					info!("showing docs of {}", landing.name);
					docs.set(landing.docs.clone());
				}
			}
			Err(e) => warn!("{e}"),
		}
		load.set(Some(result.map_err(Arc::new)));
	});

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Could not load the graph"</h1>

				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>
			{move || match load.get() {
				None => view! { <p class="loading">"Loading…"</p> }.into_any(),
				Some(result) => {
					result
						.map(|input| {
							graph_view(input, docs, panel_open, select_request, data_errors)
						})
						.into_any()
				}
			}}
		</ErrorBoundary>
	}
}
