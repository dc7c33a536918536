//! Canvas-area tracking: pixel edits, brush strokes, flood fills.
//!
//! Pixel edits go to the global timeline via `add_pixel_changes` or, when
//! scoped to one (animation, frame), to that frame's own timeline via
//! `add_frame_pixel_changes`. A drag is accumulated into one brush-stroke
//! operation through `start_brush_stroke` / `add_pixel_change` /
//! `end_brush_stroke` so a whole stroke reverses as a single undo step.

use std::rc::Rc;

use log::{debug, error};

use crate::manager::UndoRedoManager;
use crate::operation::{
    Operation, OperationContext, OperationKind, Payload, PixelEdit, Rgb,
};

/// Stroke being accumulated between start and end.
struct StrokeState {
    brush_size: u32,
    brush_type: String,
    pixels: Vec<PixelEdit>,
}

pub struct CanvasOperationTracker {
    manager: Rc<UndoRedoManager>,
    stroke: Option<StrokeState>,
}

impl CanvasOperationTracker {
    pub fn new(manager: Rc<UndoRedoManager>) -> Self {
        Self { manager, stroke: None }
    }

    /// Begin accumulating a brush stroke. An unfinished previous stroke is
    /// ended (and submitted) first.
    pub fn start_brush_stroke(&mut self, brush_size: u32, brush_type: impl Into<String>) {
        if self.stroke.is_some() {
            self.end_brush_stroke();
        }
        let brush_type = brush_type.into();
        debug!("started brush stroke: {brush_type} (size: {brush_size})");
        self.stroke = Some(StrokeState {
            brush_size,
            brush_type,
            pixels: Vec::new(),
        });
    }

    /// Add one pixel to the stroke in progress. Starts a single-pixel
    /// stroke when none is open.
    pub fn add_pixel_change(&mut self, x: i32, y: i32, old_color: Rgb, new_color: Rgb) {
        if self.stroke.is_none() {
            self.start_brush_stroke(1, "single_pixel");
        }
        if let Some(stroke) = &mut self.stroke {
            stroke.pixels.push(PixelEdit::new(x, y, old_color, new_color));
        }
    }

    /// Close the stroke and submit it as one operation. A stroke that
    /// changed no pixels submits nothing.
    pub fn end_brush_stroke(&mut self) {
        let Some(stroke) = self.stroke.take() else {
            return;
        };
        if stroke.pixels.is_empty() {
            debug!("brush stroke ended with no pixel changes");
            return;
        }
        let description = format!(
            "Brush stroke ({}, {} pixels)",
            stroke.brush_type,
            stroke.pixels.len()
        );
        debug!("ended brush stroke: {description} (size: {})", stroke.brush_size);
        self.submit(OperationKind::BrushStroke, description, &stroke.pixels, None);
    }

    /// Record a list of pixel edits as one operation on the global
    /// timeline. An empty list is a no-op.
    pub fn add_pixel_changes(&self, pixel_edits: Vec<PixelEdit>) {
        if pixel_edits.is_empty() {
            return;
        }
        let description = if pixel_edits.len() == 1 {
            format!("Pixel change at ({}, {})", pixel_edits[0].x, pixel_edits[0].y)
        } else {
            format!("Pixel changes ({} pixels)", pixel_edits.len())
        };
        self.submit(OperationKind::BrushStroke, description, &pixel_edits, None);
    }

    /// Convenience wrapper for a one-pixel edit.
    pub fn add_single_pixel_change(&self, x: i32, y: i32, old_color: Rgb, new_color: Rgb) {
        self.add_pixel_changes(vec![PixelEdit::new(x, y, old_color, new_color)]);
    }

    /// Record pixel edits on the timeline scoped to one (animation, frame).
    pub fn add_frame_pixel_changes(
        &self,
        animation: &str,
        frame_index: usize,
        pixel_edits: Vec<PixelEdit>,
    ) {
        if pixel_edits.is_empty() {
            return;
        }
        let description = format!(
            "{animation}[{frame_index}]: {} pixel changes",
            pixel_edits.len()
        );
        let context = OperationContext {
            frame: Some((animation.to_string(), frame_index)),
            prior_mode: None,
        };
        let undo = Payload::Pixels {
            pixels: pixel_edits.iter().map(|p| (p.x, p.y, p.old_color)).collect(),
        };
        let redo = Payload::Pixels {
            pixels: pixel_edits.iter().map(|p| (p.x, p.y, p.new_color)).collect(),
        };
        match Operation::new(OperationKind::BrushStroke, description, undo, redo) {
            Ok(op) => self
                .manager
                .add_frame_operation(animation, frame_index, op.with_context(context)),
            Err(e) => error!("dropping malformed canvas operation: {e}"),
        }
    }

    /// Record a flood fill: undo re-applies the old color to every affected
    /// pixel, redo re-applies the new one.
    pub fn add_flood_fill(
        &self,
        x: i32,
        y: i32,
        old_color: Rgb,
        new_color: Rgb,
        affected_pixels: Vec<(i32, i32)>,
    ) {
        if affected_pixels.is_empty() {
            return;
        }
        let description = format!("Flood fill at ({x}, {y}) - {} pixels", affected_pixels.len());
        let undo = Payload::FloodFill {
            start: (x, y),
            color: old_color,
            affected: affected_pixels.clone(),
        };
        let redo = Payload::FloodFill {
            start: (x, y),
            color: new_color,
            affected: affected_pixels,
        };
        match Operation::new(OperationKind::FloodFill, description, undo, redo) {
            Ok(op) => self.manager.add_operation(op),
            Err(e) => error!("dropping malformed flood fill operation: {e}"),
        }
    }

    fn submit(
        &self,
        kind: OperationKind,
        description: String,
        pixel_edits: &[PixelEdit],
        context: Option<OperationContext>,
    ) {
        let undo = Payload::Pixels {
            pixels: pixel_edits.iter().map(|p| (p.x, p.y, p.old_color)).collect(),
        };
        let redo = Payload::Pixels {
            pixels: pixel_edits.iter().map(|p| (p.x, p.y, p.new_color)).collect(),
        };
        match Operation::new(kind, description, undo, redo) {
            Ok(op) => {
                let op = match context {
                    Some(ctx) => op.with_context(ctx),
                    None => op,
                };
                self.manager.add_operation(op);
            }
            Err(e) => error!("dropping malformed canvas operation: {e}"),
        }
    }
}
