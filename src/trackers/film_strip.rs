//! Film-strip tracking: frame/animation add, delete, reorder, and frame
//! selection.
//!
//! Every pair is symmetric: an add undoes as a delete, a delete undoes as an
//! add carrying the saved contents, a reorder undoes by swapping indices.
//!
//! Selection is special-cased twice. Selecting the frame that is already
//! current is a deliberate no-op, and because frame creation moves the
//! engine's selection pointer to the new frame, a "select the frame I just
//! created" call compares equal and is elided. The creation already implies
//! the selection, and recording both would cost the user two undos for one
//! perceived action.

use std::rc::Rc;

use log::debug;
use serde_json::Value;

use crate::manager::UndoRedoManager;
use crate::operation::{Operation, OperationKind, Payload};

pub struct FilmStripOperationTracker {
    manager: Rc<UndoRedoManager>,
}

impl FilmStripOperationTracker {
    pub fn new(manager: Rc<UndoRedoManager>) -> Self {
        Self { manager }
    }

    /// Track a frame insertion. Also points the engine's selection at the
    /// new frame, which arms the selection elision above.
    pub fn add_frame_added(&self, frame_index: usize, animation: &str, frame_data: Value) {
        let undo = Payload::FrameDelete {
            frame_index,
            animation: animation.to_string(),
        };
        let redo = Payload::FrameAdd {
            frame_index,
            animation: animation.to_string(),
            frame_data,
        };
        let description = format!("Added frame {frame_index} to '{animation}'");
        self.submit(OperationKind::FrameAdd, description, undo, redo);
        self.manager.set_current_frame(animation, frame_index);
    }

    /// Track a frame deletion; the saved frame contents ride on the undo
    /// side so the frame can be restored.
    pub fn add_frame_deleted(&self, frame_index: usize, animation: &str, frame_data: Value) {
        let undo = Payload::FrameAdd {
            frame_index,
            animation: animation.to_string(),
            frame_data,
        };
        let redo = Payload::FrameDelete {
            frame_index,
            animation: animation.to_string(),
        };
        let description = format!("Deleted frame {frame_index} from '{animation}'");
        self.submit(OperationKind::FrameDelete, description, undo, redo);
    }

    pub fn add_frame_reordered(&self, old_index: usize, new_index: usize, animation: &str) {
        let undo = Payload::FrameReorder {
            old_index: new_index,
            new_index: old_index,
            animation: animation.to_string(),
        };
        let redo = Payload::FrameReorder {
            old_index,
            new_index,
            animation: animation.to_string(),
        };
        let description = format!("Moved frame {old_index} to {new_index} in '{animation}'");
        self.submit(OperationKind::FrameReorder, description, undo, redo);
    }

    pub fn add_animation_added(&self, animation: &str, animation_data: Value) {
        let undo = Payload::AnimationDelete {
            animation: animation.to_string(),
        };
        let redo = Payload::AnimationAdd {
            animation: animation.to_string(),
            animation_data,
        };
        let description = format!("Added animation '{animation}'");
        self.submit(OperationKind::AnimationAdd, description, undo, redo);
    }

    pub fn add_animation_deleted(&self, animation: &str, animation_data: Value) {
        let undo = Payload::AnimationAdd {
            animation: animation.to_string(),
            animation_data,
        };
        let redo = Payload::AnimationDelete {
            animation: animation.to_string(),
        };
        let description = format!("Deleted animation '{animation}'");
        self.submit(OperationKind::AnimationDelete, description, undo, redo);
    }

    /// Track a frame selection, unless the target is already current.
    ///
    /// The first selection of a session has no prior state to restore; it
    /// only moves the pointer and records nothing.
    pub fn add_frame_selection(&self, animation: &str, frame_index: usize) {
        let target = (animation.to_string(), frame_index);
        let previous = match self.manager.current_frame() {
            Some(current) if current == target => {
                debug!("skipping redundant frame selection: {animation}[{frame_index}]");
                return;
            }
            Some(current) => current,
            None => {
                self.manager.set_current_frame(animation, frame_index);
                return;
            }
        };

        let undo = Payload::FrameSelection {
            animation: previous.0,
            frame_index: previous.1,
        };
        let redo = Payload::FrameSelection {
            animation: animation.to_string(),
            frame_index,
        };
        let description = format!("Selected frame {frame_index} in '{animation}'");
        self.submit(OperationKind::FrameSelection, description, undo, redo);
        self.manager.set_current_frame(animation, frame_index);
    }

    fn submit(&self, kind: OperationKind, description: String, undo: Payload, redo: Payload) {
        match Operation::new(kind, description, undo, redo) {
            Ok(op) => self.manager.add_operation(op),
            // Film-strip payloads are structurally non-empty; kept for parity.
            Err(e) => log::error!("dropping malformed film strip operation: {e}"),
        }
    }
}
