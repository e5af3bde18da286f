//! Graph model, constraint resolution and force layout. Nothing in here
//! touches the DOM.

pub mod collision;
pub mod config;
pub mod document;
pub mod geometry;
pub mod label;
pub mod model;
pub mod selection;
pub mod simulation;

pub use config::GraphConfig;
pub use document::GraphDocument;
pub use label::MeasureText;
pub use model::{DataError, GraphModel, build_graph};
pub use selection::{Selection, SelectionChange};
pub use simulation::{Simulation, SimulationStatus};
