//! Operation trackers: translate one domain-level edit into one well-formed
//! operation and submit it to the engine.
//!
//! Trackers own no history. Each holds a shared handle to the engine and
//! builds the mirrored undo/redo payload pair for its area; no-op edits
//! (empty pixel lists, reselecting the current frame) submit nothing.

pub mod canvas;
pub mod controller;
pub mod cross_area;
pub mod film_strip;

pub use canvas::CanvasOperationTracker;
pub use controller::ControllerPositionOperationTracker;
pub use cross_area::CrossAreaOperationTracker;
pub use film_strip::FilmStripOperationTracker;
