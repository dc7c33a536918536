//! Dispatch layer: routes a direction-selected payload to the registered
//! external callback and folds the result into one success/failure bool.
//!
//! Callbacks are the engine's only view of the outside world (pixel store,
//! frame container, input layer). They return `true` on success and never
//! raise across the boundary. A dispatch with no registered callback fails
//! cleanly rather than faulting; the exhaustive match on `Payload` means
//! there is no unknown-kind branch at all.

use std::rc::Rc;

use log::{debug, warn};
use serde_json::Value;

use crate::operation::{Payload, Rgb};

/// `(x, y, color) -> bool`, invoked once per affected pixel.
pub type PixelChangeFn = Rc<dyn Fn(i32, i32, Rgb) -> bool>;
/// `(frame_index, animation, frame_data) -> bool`
pub type AddFrameFn = Rc<dyn Fn(usize, &str, &Value) -> bool>;
/// `(frame_index, animation) -> bool`
pub type DeleteFrameFn = Rc<dyn Fn(usize, &str) -> bool>;
/// `(old_index, new_index, animation) -> bool`
pub type ReorderFrameFn = Rc<dyn Fn(usize, usize, &str) -> bool>;
/// `(animation, animation_data) -> bool`
pub type AddAnimationFn = Rc<dyn Fn(&str, &Value) -> bool>;
/// `(animation) -> bool`
pub type DeleteAnimationFn = Rc<dyn Fn(&str) -> bool>;
/// `(animation, frame_index) -> bool`
pub type FrameSelectionFn = Rc<dyn Fn(&str, usize) -> bool>;
/// `(controller_id, position, mode) -> bool`
pub type ControllerPositionFn = Rc<dyn Fn(i32, (i32, i32), Option<&str>) -> bool>;
/// `(controller_id, mode) -> bool`
pub type ControllerModeFn = Rc<dyn Fn(i32, &str) -> bool>;

/// The five film-strip callbacks, each independently optional.
#[derive(Default, Clone)]
pub struct FilmStripCallbacks {
    pub add_frame: Option<AddFrameFn>,
    pub delete_frame: Option<DeleteFrameFn>,
    pub reorder_frame: Option<ReorderFrameFn>,
    pub add_animation: Option<AddAnimationFn>,
    pub delete_animation: Option<DeleteAnimationFn>,
}

/// Registered external callbacks plus the routing logic.
#[derive(Default, Clone)]
pub struct CallbackRegistry {
    pub(crate) pixel_change: Option<PixelChangeFn>,
    pub(crate) film_strip: FilmStripCallbacks,
    pub(crate) frame_selection: Option<FrameSelectionFn>,
    pub(crate) controller_position: Option<ControllerPositionFn>,
    pub(crate) controller_mode: Option<ControllerModeFn>,
}

impl CallbackRegistry {
    /// Apply one payload through the matching callback.
    ///
    /// Canvas payloads invoke the pixel callback once per entry and
    /// short-circuit on the first failure. Cross-area payloads are an
    /// intentional pass-through: the clipboard has no reversible external
    /// state yet, so both directions succeed without side effects.
    pub fn dispatch(&self, payload: &Payload) -> bool {
        match payload {
            Payload::Pixels { pixels } => {
                let Some(cb) = self.pixel_change.clone() else {
                    warn!("no pixel-change callback registered");
                    return false;
                };
                pixels.iter().all(|&(x, y, color)| cb(x, y, color))
            }
            Payload::FloodFill { color, affected, .. } => {
                let Some(cb) = self.pixel_change.clone() else {
                    warn!("no pixel-change callback registered");
                    return false;
                };
                affected.iter().all(|&(x, y)| cb(x, y, *color))
            }

            Payload::FrameAdd { frame_index, animation, frame_data } => {
                match self.film_strip.add_frame.clone() {
                    Some(cb) => cb(*frame_index, animation, frame_data),
                    None => {
                        warn!("no add-frame callback registered");
                        false
                    }
                }
            }
            Payload::FrameDelete { frame_index, animation } => {
                match self.film_strip.delete_frame.clone() {
                    Some(cb) => cb(*frame_index, animation),
                    None => {
                        warn!("no delete-frame callback registered");
                        false
                    }
                }
            }
            Payload::FrameReorder { old_index, new_index, animation } => {
                match self.film_strip.reorder_frame.clone() {
                    Some(cb) => cb(*old_index, *new_index, animation),
                    None => {
                        warn!("no reorder-frame callback registered");
                        false
                    }
                }
            }
            Payload::AnimationAdd { animation, animation_data } => {
                match self.film_strip.add_animation.clone() {
                    Some(cb) => cb(animation, animation_data),
                    None => {
                        warn!("no add-animation callback registered");
                        false
                    }
                }
            }
            Payload::AnimationDelete { animation } => {
                match self.film_strip.delete_animation.clone() {
                    Some(cb) => cb(animation),
                    None => {
                        warn!("no delete-animation callback registered");
                        false
                    }
                }
            }

            Payload::FrameCopy { .. }
            | Payload::FramePaste { .. }
            | Payload::FramePasteRevert { .. }
            | Payload::AnimationCopy { .. }
            | Payload::AnimationPaste { .. }
            | Payload::AnimationPasteRevert { .. }
            | Payload::ClearClipboard => {
                debug!("cross-area payload applied as pass-through");
                true
            }

            Payload::ControllerPosition { controller_id, position, mode } => {
                match self.controller_position.clone() {
                    Some(cb) => cb(*controller_id, *position, mode.as_deref()),
                    None => {
                        warn!("no controller-position callback registered");
                        false
                    }
                }
            }
            Payload::ControllerMode { controller_id, mode } => {
                match self.controller_mode.clone() {
                    Some(cb) => cb(*controller_id, mode),
                    None => {
                        warn!("no controller-mode callback registered");
                        false
                    }
                }
            }

            Payload::FrameSelection { animation, frame_index } => {
                match self.frame_selection.clone() {
                    Some(cb) => cb(animation, *frame_index),
                    None => {
                        warn!("no frame-selection callback registered");
                        false
                    }
                }
            }
        }
    }
}
