//! Operation records: one reversible edit with paired undo/redo payloads.
//!
//! The payload is a sum type with one variant per semantic action instead of
//! an open key/value map. The undo and redo sides of a single operation may
//! use different variants (a frame-add undoes as a frame-delete), which lets
//! the dispatch layer match exhaustively on the payload alone.

use std::time::Instant;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// RGB color triple as stored per pixel.
pub type Rgb = (u8, u8, u8);

/// Key addressing one drawable surface: (animation id, frame index).
pub type FrameKey = (String, usize);

/// One pixel edit as reported by the canvas: position plus both colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelEdit {
    pub x: i32,
    pub y: i32,
    pub old_color: Rgb,
    pub new_color: Rgb,
}

impl PixelEdit {
    pub fn new(x: i32, y: i32, old_color: Rgb, new_color: Rgb) -> Self {
        Self { x, y, old_color, new_color }
    }
}

/// Closed set of recordable operation kinds, grouped by family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    // Canvas family
    PixelChange,
    BrushStroke,
    FloodFill,
    ColorChange,

    // Film strip family
    FrameAdd,
    FrameDelete,
    FrameReorder,
    AnimationAdd,
    AnimationDelete,

    // Cross-area family
    FrameCopy,
    FramePaste,
    AnimationCopy,
    AnimationPaste,

    // Controller family
    PositionChange,
    ModeChange,

    // Selection
    FrameSelection,
}

/// Direction-specific action data for one side of an operation.
///
/// Every variant carries exactly the data its dispatch needs; the two
/// canvas variants are the only ones that can be structurally empty and
/// are rejected at operation construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    /// Re-apply the given color to each pixel (canvas family).
    Pixels { pixels: Vec<(i32, i32, Rgb)> },
    /// Re-apply one color to every pixel a fill touched.
    FloodFill {
        start: (i32, i32),
        color: Rgb,
        affected: Vec<(i32, i32)>,
    },

    /// Insert a frame with its saved contents.
    FrameAdd {
        frame_index: usize,
        animation: String,
        frame_data: Value,
    },
    /// Remove a frame.
    FrameDelete { frame_index: usize, animation: String },
    /// Move a frame between two indices.
    FrameReorder {
        old_index: usize,
        new_index: usize,
        animation: String,
    },
    /// Insert an animation with its saved contents.
    AnimationAdd { animation: String, animation_data: Value },
    /// Remove an animation.
    AnimationDelete { animation: String },

    // Cross-area actions (clipboard wiring reserved, see dispatch).
    FrameCopy {
        frame_index: usize,
        animation: String,
        frame_data: Value,
    },
    FramePaste {
        frame_index: usize,
        animation: String,
        frame_data: Value,
    },
    /// Remove a previously pasted frame.
    FramePasteRevert { frame_index: usize, animation: String },
    AnimationCopy { animation: String, animation_data: Value },
    AnimationPaste { animation: String, animation_data: Value },
    /// Remove a previously pasted animation.
    AnimationPasteRevert { animation: String },
    /// Drop the clipboard contents (undo side of a copy).
    ClearClipboard,

    /// Restore a controller to a position (and optionally a mode).
    ControllerPosition {
        controller_id: i32,
        position: (i32, i32),
        mode: Option<String>,
    },
    /// Restore a controller's mode.
    ControllerMode { controller_id: i32, mode: String },

    /// Select one (animation, frame) pair.
    FrameSelection { animation: String, frame_index: usize },
}

impl Payload {
    /// True when the variant carries no effect to apply.
    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Pixels { pixels } => pixels.is_empty(),
            Payload::FloodFill { affected, .. } => affected.is_empty(),
            _ => false,
        }
    }
}

/// Optional metadata attached to an operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationContext {
    /// The (animation, frame) the edit was scoped to, if any.
    pub frame: Option<FrameKey>,
    /// Controller mode in effect before the change, if any.
    pub prior_mode: Option<String>,
}

/// One reversible edit in the history.
///
/// Immutable once built; moves between the undo and redo stacks by value,
/// so it can never be on both at once.
#[derive(Debug, Clone)]
pub struct Operation {
    pub kind: OperationKind,
    pub timestamp: Instant,
    pub description: String,
    pub undo: Payload,
    pub redo: Payload,
    pub context: Option<OperationContext>,
}

impl Operation {
    /// Build a validated operation. An empty payload on either side is a
    /// construction error, never a runtime state.
    pub fn new(
        kind: OperationKind,
        description: impl Into<String>,
        undo: Payload,
        redo: Payload,
    ) -> Result<Self> {
        let description = description.into();
        if undo.is_empty() {
            bail!("operation '{description}' has an empty undo payload");
        }
        if redo.is_empty() {
            bail!("operation '{description}' has an empty redo payload");
        }
        Ok(Self {
            kind,
            timestamp: Instant::now(),
            description,
            undo,
            redo,
            context: None,
        })
    }

    /// Attach context metadata.
    pub fn with_context(mut self, context: OperationContext) -> Self {
        self.context = Some(context);
        self
    }
}
