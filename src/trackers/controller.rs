//! Controller tracking: input-device position and mode changes, scoped by
//! controller id.

use std::rc::Rc;

use crate::manager::UndoRedoManager;
use crate::operation::{Operation, OperationContext, OperationKind, Payload};

pub struct ControllerPositionOperationTracker {
    manager: Rc<UndoRedoManager>,
}

impl ControllerPositionOperationTracker {
    pub fn new(manager: Rc<UndoRedoManager>) -> Self {
        Self { manager }
    }

    /// Track a controller move. Modes are optional context: they travel on
    /// the payloads so the callback can restore mode alongside position.
    pub fn add_controller_position_change(
        &self,
        controller_id: i32,
        old_position: (i32, i32),
        new_position: (i32, i32),
        old_mode: Option<&str>,
        new_mode: Option<&str>,
    ) {
        let undo = Payload::ControllerPosition {
            controller_id,
            position: old_position,
            mode: old_mode.map(str::to_owned),
        };
        let redo = Payload::ControllerPosition {
            controller_id,
            position: new_position,
            mode: new_mode.map(str::to_owned),
        };
        let description = format!(
            "Controller {controller_id} moved from ({}, {}) to ({}, {})",
            old_position.0, old_position.1, new_position.0, new_position.1
        );
        match Operation::new(OperationKind::PositionChange, description, undo, redo) {
            Ok(op) => {
                let op = op.with_context(OperationContext {
                    frame: None,
                    prior_mode: old_mode.map(str::to_owned),
                });
                self.manager.add_operation(op);
            }
            Err(e) => log::error!("dropping malformed controller operation: {e}"),
        }
    }

    pub fn add_controller_mode_change(&self, controller_id: i32, old_mode: &str, new_mode: &str) {
        let undo = Payload::ControllerMode {
            controller_id,
            mode: old_mode.to_string(),
        };
        let redo = Payload::ControllerMode {
            controller_id,
            mode: new_mode.to_string(),
        };
        let description =
            format!("Controller {controller_id} mode changed from {old_mode} to {new_mode}");
        match Operation::new(OperationKind::ModeChange, description, undo, redo) {
            Ok(op) => self.manager.add_operation(op),
            Err(e) => log::error!("dropping malformed controller operation: {e}"),
        }
    }
}
