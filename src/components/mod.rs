pub mod dependency_graph;
pub mod docs_panel;
pub mod error_list;
