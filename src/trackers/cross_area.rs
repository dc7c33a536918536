//! Cross-area tracking: copy/paste of frames and animations between strips.
//!
//! Mirrors the film-strip shapes: a copy undoes by dropping the clipboard, a
//! paste undoes by removing what was pasted. Dispatch for this family is a
//! reserved pass-through until the clipboard gains reversible external state.

use std::rc::Rc;

use serde_json::Value;

use crate::manager::UndoRedoManager;
use crate::operation::{Operation, OperationKind, Payload};

pub struct CrossAreaOperationTracker {
    manager: Rc<UndoRedoManager>,
}

impl CrossAreaOperationTracker {
    pub fn new(manager: Rc<UndoRedoManager>) -> Self {
        Self { manager }
    }

    pub fn add_frame_copied(&self, frame_index: usize, animation: &str, frame_data: Value) {
        let redo = Payload::FrameCopy {
            frame_index,
            animation: animation.to_string(),
            frame_data,
        };
        let description = format!("Copied frame {frame_index} from '{animation}'");
        self.submit(OperationKind::FrameCopy, description, Payload::ClearClipboard, redo);
    }

    pub fn add_frame_pasted(&self, frame_index: usize, animation: &str, frame_data: Value) {
        let undo = Payload::FramePasteRevert {
            frame_index,
            animation: animation.to_string(),
        };
        let redo = Payload::FramePaste {
            frame_index,
            animation: animation.to_string(),
            frame_data,
        };
        let description = format!("Pasted frame to {frame_index} in '{animation}'");
        self.submit(OperationKind::FramePaste, description, undo, redo);
    }

    pub fn add_animation_copied(&self, animation: &str, animation_data: Value) {
        let redo = Payload::AnimationCopy {
            animation: animation.to_string(),
            animation_data,
        };
        let description = format!("Copied animation '{animation}'");
        self.submit(OperationKind::AnimationCopy, description, Payload::ClearClipboard, redo);
    }

    pub fn add_animation_pasted(&self, animation: &str, animation_data: Value) {
        let undo = Payload::AnimationPasteRevert {
            animation: animation.to_string(),
        };
        let redo = Payload::AnimationPaste {
            animation: animation.to_string(),
            animation_data,
        };
        let description = format!("Pasted animation '{animation}'");
        self.submit(OperationKind::AnimationPaste, description, undo, redo);
    }

    fn submit(&self, kind: OperationKind, description: String, undo: Payload, redo: Payload) {
        match Operation::new(kind, description, undo, redo) {
            Ok(op) => self.manager.add_operation(op),
            Err(e) => log::error!("dropping malformed cross-area operation: {e}"),
        }
    }
}
