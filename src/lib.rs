//! PIXELPAD-HISTORY - Reversible-operation engine for a pixel/frame sprite editor
//!
//! Command-pattern undo/redo that tracks edits at two granularities at once:
//! a global timeline for the whole editing session, and independent
//! per-(animation, frame) timelines scoped to one drawable surface. The
//! engine drives external state (pixel store, frame container, input layer)
//! purely through registered boolean-returning callbacks, and guarantees
//! that a failed callback leaves history exactly as it was.

// Engine (stacks, reentrancy guard, history bounds)
pub mod manager;

// Operation records and payload sum type
pub mod operation;

// Callback registry and payload routing
pub mod dispatch;

// Per-area operation builders
pub mod trackers;

// Re-export commonly used types
pub use dispatch::{CallbackRegistry, FilmStripCallbacks};
pub use manager::{ExecutionMode, HistoryInfo, UndoRedoManager, DEFAULT_MAX_HISTORY};
pub use operation::{
    FrameKey, Operation, OperationContext, OperationKind, Payload, PixelEdit, Rgb,
};
pub use trackers::{
    CanvasOperationTracker, ControllerPositionOperationTracker, CrossAreaOperationTracker,
    FilmStripOperationTracker,
};
