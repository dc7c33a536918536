//! Undo/redo engine: owns all stack state and orchestrates add/undo/redo
//! across two granularities at once.
//!
//! Architecture:
//! - One global timeline (undo/redo stacks) spans the editing session.
//! - Independent per-(animation, frame) timelines track edits scoped to one
//!   drawable surface. The two families never share operations.
//! - Undoing pops an operation, tentatively moves it to the opposite stack,
//!   and dispatches it through the callback registry; a failed dispatch
//!   reverses the move, leaving history exactly as it was.
//!
//! All methods take `&self` over per-field interior mutability so that a
//! callback running inside `undo()`/`redo()` can safely re-enter read paths.
//! Recording re-entry is guarded by `ExecutionMode`: while a dispatch is in
//! flight, `add_operation`/`add_frame_operation` become silent no-ops. The
//! mode is entered through a drop guard, so an early return or a panicking
//! callback can never leave the engine locked.

use std::cell::{Cell, RefCell};

use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::dispatch::{
    AddAnimationFn, AddFrameFn, CallbackRegistry, DeleteAnimationFn, DeleteFrameFn,
    FilmStripCallbacks, ReorderFrameFn,
};
use crate::operation::{FrameKey, Operation, Payload, Rgb};
use serde_json::Value;

/// Default bound on each history stack.
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// What the engine is currently executing.
///
/// Replaces the usual pair of `is_undoing`/`is_redoing` booleans with one
/// explicit state, held in a `Cell` and entered via [`ModeGuard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Idle,
    Undoing,
    Redoing,
}

/// Scoped entry into an execution mode; restores the previous mode on drop,
/// including on unwind out of a callback.
struct ModeGuard<'a> {
    mode: &'a Cell<ExecutionMode>,
    prev: ExecutionMode,
}

impl<'a> ModeGuard<'a> {
    fn enter(mode: &'a Cell<ExecutionMode>, next: ExecutionMode) -> Self {
        let prev = mode.replace(next);
        Self { mode, prev }
    }
}

impl Drop for ModeGuard<'_> {
    fn drop(&mut self) {
        self.mode.set(self.prev);
    }
}

/// Read-only snapshot of the global history state, for UI consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryInfo {
    pub undo_count: usize,
    pub redo_count: usize,
    pub can_undo: bool,
    pub can_redo: bool,
    pub next_undo: Option<String>,
    pub next_redo: Option<String>,
    pub max_history: usize,
}

/// The undo/redo engine. Created once per editing session.
pub struct UndoRedoManager {
    max_history: usize,
    undo_stack: RefCell<Vec<Operation>>,
    redo_stack: RefCell<Vec<Operation>>,
    frame_undo_stacks: RefCell<IndexMap<FrameKey, Vec<Operation>>>,
    frame_redo_stacks: RefCell<IndexMap<FrameKey, Vec<Operation>>>,
    current_frame: RefCell<Option<FrameKey>>,
    mode: Cell<ExecutionMode>,
    /// True exactly when no redo has happened since the last new operation;
    /// governs whether the next push clears the global redo stack.
    at_head_of_history: Cell<bool>,
    callbacks: RefCell<CallbackRegistry>,
}

impl Default for UndoRedoManager {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoRedoManager {
    pub fn new() -> Self {
        Self::with_max_history(DEFAULT_MAX_HISTORY)
    }

    pub fn with_max_history(max_history: usize) -> Self {
        debug!("UndoRedoManager initialized with max_history={max_history}");
        Self {
            max_history,
            undo_stack: RefCell::new(Vec::new()),
            redo_stack: RefCell::new(Vec::new()),
            frame_undo_stacks: RefCell::new(IndexMap::new()),
            frame_redo_stacks: RefCell::new(IndexMap::new()),
            current_frame: RefCell::new(None),
            mode: Cell::new(ExecutionMode::Idle),
            at_head_of_history: Cell::new(true),
            callbacks: RefCell::new(CallbackRegistry::default()),
        }
    }

    // ========== Recording ==========

    /// Record an operation on the global timeline.
    ///
    /// Silently dropped while an undo/redo dispatch is in flight: mutations
    /// driven by callbacks must not re-enter the recording path.
    pub fn add_operation(&self, op: Operation) {
        if self.mode.get() != ExecutionMode::Idle {
            debug!("skipping operation add during undo/redo: {}", op.description);
            return;
        }

        {
            let mut redo = self.redo_stack.borrow_mut();
            // A genuinely new branch of history invalidates the old future.
            if !redo.is_empty() && self.at_head_of_history.get() {
                debug!("clearing {} redo operations", redo.len());
                redo.clear();
            }
        }

        let mut undo = self.undo_stack.borrow_mut();
        debug!("added operation: {} (undo stack size: {})", op.description, undo.len() + 1);
        undo.push(op);
        if undo.len() > self.max_history {
            let evicted = undo.remove(0);
            debug!("evicted oldest operation: {}", evicted.description);
        }
        self.at_head_of_history.set(true);
    }

    /// Record an operation on the timeline scoped to one (animation, frame).
    ///
    /// Same reentrancy guard and eviction as [`add_operation`], but the
    /// per-frame redo stack is cleared on every accepted push; the scoped
    /// timelines don't carry the head-of-history refinement.
    ///
    /// [`add_operation`]: Self::add_operation
    pub fn add_frame_operation(&self, animation: &str, frame_index: usize, op: Operation) {
        if self.mode.get() != ExecutionMode::Idle {
            debug!("skipping frame operation add during undo/redo: {}", op.description);
            return;
        }

        let key = frame_key(animation, frame_index);
        self.frame_redo_stacks
            .borrow_mut()
            .entry(key.clone())
            .or_default()
            .clear();

        let mut stacks = self.frame_undo_stacks.borrow_mut();
        let stack = stacks.entry(key).or_default();
        debug!(
            "added frame operation: {} ({}[{}] undo stack size: {})",
            op.description,
            animation,
            frame_index,
            stack.len() + 1
        );
        stack.push(op);
        if stack.len() > self.max_history {
            let evicted = stack.remove(0);
            debug!("evicted oldest frame operation: {}", evicted.description);
        }
    }

    // ========== Queries ==========

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.borrow().is_empty() && self.mode.get() != ExecutionMode::Undoing
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.borrow().is_empty() && self.mode.get() != ExecutionMode::Redoing
    }

    pub fn can_undo_frame(&self, animation: &str, frame_index: usize) -> bool {
        self.mode.get() != ExecutionMode::Undoing
            && self
                .frame_undo_stacks
                .borrow()
                .get(&frame_key(animation, frame_index))
                .is_some_and(|stack| !stack.is_empty())
    }

    pub fn can_redo_frame(&self, animation: &str, frame_index: usize) -> bool {
        self.mode.get() != ExecutionMode::Redoing
            && self
                .frame_redo_stacks
                .borrow()
                .get(&frame_key(animation, frame_index))
                .is_some_and(|stack| !stack.is_empty())
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.borrow().len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.borrow().len()
    }

    pub fn frame_undo_count(&self, animation: &str, frame_index: usize) -> usize {
        self.frame_undo_stacks
            .borrow()
            .get(&frame_key(animation, frame_index))
            .map_or(0, Vec::len)
    }

    pub fn frame_redo_count(&self, animation: &str, frame_index: usize) -> usize {
        self.frame_redo_stacks
            .borrow()
            .get(&frame_key(animation, frame_index))
            .map_or(0, Vec::len)
    }

    /// Description of the operation the next `undo()` would reverse.
    pub fn undo_description(&self) -> Option<String> {
        if !self.can_undo() {
            return None;
        }
        self.undo_stack.borrow().last().map(|op| op.description.clone())
    }

    /// Description of the operation the next `redo()` would re-apply.
    pub fn redo_description(&self) -> Option<String> {
        if !self.can_redo() {
            return None;
        }
        self.redo_stack.borrow().last().map(|op| op.description.clone())
    }

    pub fn get_history_info(&self) -> HistoryInfo {
        HistoryInfo {
            undo_count: self.undo_count(),
            redo_count: self.redo_count(),
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            next_undo: self.undo_description(),
            next_redo: self.redo_description(),
            max_history: self.max_history,
        }
    }

    /// The (animation, frame) the editor currently has selected, as last
    /// reported through selection tracking.
    pub fn current_frame(&self) -> Option<FrameKey> {
        self.current_frame.borrow().clone()
    }

    pub fn set_current_frame(&self, animation: &str, frame_index: usize) {
        *self.current_frame.borrow_mut() = Some(frame_key(animation, frame_index));
    }

    // ========== Undo / Redo ==========

    /// Undo the most recent global operation. Returns false when there is
    /// nothing to undo or the external mutation failed; a failure leaves
    /// both stacks exactly as they were.
    pub fn undo(&self) -> bool {
        if !self.can_undo() {
            debug!("cannot undo: no operations available");
            return false;
        }
        let _mode = ModeGuard::enter(&self.mode, ExecutionMode::Undoing);

        let Some(op) = self.undo_stack.borrow_mut().pop() else {
            return false;
        };
        debug!("undoing operation: {}", op.description);
        let payload = op.undo.clone();
        let description = op.description.clone();
        self.redo_stack.borrow_mut().push(op);

        // The registry is cloned out so no engine borrow is held while the
        // callback runs; it may re-enter queries or swap callbacks.
        let callbacks = self.callbacks.borrow().clone();
        let success = callbacks.dispatch(&payload);

        if success {
            self.at_head_of_history.set(false);
            self.apply_selection(&payload);
            debug!("successfully undone: {description}");
        } else {
            warn!("failed to undo: {description}");
            if let Some(op) = self.redo_stack.borrow_mut().pop() {
                self.undo_stack.borrow_mut().push(op);
            }
        }
        success
    }

    /// Redo the most recently undone global operation. Mirror of [`undo`].
    ///
    /// [`undo`]: Self::undo
    pub fn redo(&self) -> bool {
        if !self.can_redo() {
            debug!("cannot redo: no operations available");
            return false;
        }
        let _mode = ModeGuard::enter(&self.mode, ExecutionMode::Redoing);

        let Some(op) = self.redo_stack.borrow_mut().pop() else {
            return false;
        };
        debug!("redoing operation: {}", op.description);
        let payload = op.redo.clone();
        let description = op.description.clone();
        self.undo_stack.borrow_mut().push(op);

        let callbacks = self.callbacks.borrow().clone();
        let success = callbacks.dispatch(&payload);

        if success {
            // Back at the head once the undone future is fully replayed.
            if self.redo_stack.borrow().is_empty() {
                self.at_head_of_history.set(true);
            }
            self.apply_selection(&payload);
            debug!("successfully redone: {description}");
        } else {
            warn!("failed to redo: {description}");
            if let Some(op) = self.undo_stack.borrow_mut().pop() {
                self.redo_stack.borrow_mut().push(op);
            }
        }
        success
    }

    /// Undo the most recent operation scoped to one (animation, frame).
    /// Never touches the global stacks or the head-of-history state.
    pub fn undo_frame(&self, animation: &str, frame_index: usize) -> bool {
        if !self.can_undo_frame(animation, frame_index) {
            debug!("cannot undo frame {animation}[{frame_index}]: no operations available");
            return false;
        }
        let _mode = ModeGuard::enter(&self.mode, ExecutionMode::Undoing);
        let key = frame_key(animation, frame_index);

        let popped = self
            .frame_undo_stacks
            .borrow_mut()
            .get_mut(&key)
            .and_then(Vec::pop);
        let Some(op) = popped else {
            return false;
        };
        debug!("undoing frame operation: {}", op.description);
        let payload = op.undo.clone();
        let description = op.description.clone();
        self.frame_redo_stacks
            .borrow_mut()
            .entry(key.clone())
            .or_default()
            .push(op);

        let callbacks = self.callbacks.borrow().clone();
        let success = callbacks.dispatch(&payload);

        if !success {
            warn!("failed to undo frame operation: {description}");
            let reverted = self
                .frame_redo_stacks
                .borrow_mut()
                .get_mut(&key)
                .and_then(Vec::pop);
            if let Some(op) = reverted {
                self.frame_undo_stacks
                    .borrow_mut()
                    .entry(key)
                    .or_default()
                    .push(op);
            }
        }
        success
    }

    /// Redo the most recently undone operation scoped to one (animation, frame).
    pub fn redo_frame(&self, animation: &str, frame_index: usize) -> bool {
        if !self.can_redo_frame(animation, frame_index) {
            debug!("cannot redo frame {animation}[{frame_index}]: no operations available");
            return false;
        }
        let _mode = ModeGuard::enter(&self.mode, ExecutionMode::Redoing);
        let key = frame_key(animation, frame_index);

        let popped = self
            .frame_redo_stacks
            .borrow_mut()
            .get_mut(&key)
            .and_then(Vec::pop);
        let Some(op) = popped else {
            return false;
        };
        debug!("redoing frame operation: {}", op.description);
        let payload = op.redo.clone();
        let description = op.description.clone();
        self.frame_undo_stacks
            .borrow_mut()
            .entry(key.clone())
            .or_default()
            .push(op);

        let callbacks = self.callbacks.borrow().clone();
        let success = callbacks.dispatch(&payload);

        if !success {
            warn!("failed to redo frame operation: {description}");
            let reverted = self
                .frame_undo_stacks
                .borrow_mut()
                .get_mut(&key)
                .and_then(Vec::pop);
            if let Some(op) = reverted {
                self.frame_redo_stacks
                    .borrow_mut()
                    .entry(key)
                    .or_default()
                    .push(op);
            }
        }
        success
    }

    /// Drop all history, global and per-frame. Used on document close/reset.
    pub fn clear_history(&self) {
        debug!("clearing undo/redo history");
        self.undo_stack.borrow_mut().clear();
        self.redo_stack.borrow_mut().clear();
        self.frame_undo_stacks.borrow_mut().clear();
        self.frame_redo_stacks.borrow_mut().clear();
        self.at_head_of_history.set(true);
    }

    /// A successful frame-selection dispatch moves the engine's own
    /// selection pointer to the payload's target.
    fn apply_selection(&self, payload: &Payload) {
        if let Payload::FrameSelection { animation, frame_index } = payload {
            *self.current_frame.borrow_mut() = Some((animation.clone(), *frame_index));
        }
    }

    // ========== Callback registration ==========

    pub fn set_pixel_change_callback(&self, cb: impl Fn(i32, i32, Rgb) -> bool + 'static) {
        self.callbacks.borrow_mut().pixel_change = Some(std::rc::Rc::new(cb));
    }

    pub fn set_film_strip_callbacks(&self, callbacks: FilmStripCallbacks) {
        self.callbacks.borrow_mut().film_strip = callbacks;
    }

    pub fn set_frame_selection_callback(&self, cb: impl Fn(&str, usize) -> bool + 'static) {
        self.callbacks.borrow_mut().frame_selection = Some(std::rc::Rc::new(cb));
    }

    pub fn set_controller_position_callback(
        &self,
        cb: impl Fn(i32, (i32, i32), Option<&str>) -> bool + 'static,
    ) {
        self.callbacks.borrow_mut().controller_position = Some(std::rc::Rc::new(cb));
    }

    pub fn set_controller_mode_callback(&self, cb: impl Fn(i32, &str) -> bool + 'static) {
        self.callbacks.borrow_mut().controller_mode = Some(std::rc::Rc::new(cb));
    }
}

fn frame_key(animation: &str, frame_index: usize) -> FrameKey {
    (animation.to_string(), frame_index)
}

// Convenience constructors for film-strip callback boxes.
impl FilmStripCallbacks {
    pub fn add_frame(mut self, cb: impl Fn(usize, &str, &Value) -> bool + 'static) -> Self {
        let cb: AddFrameFn = std::rc::Rc::new(cb);
        self.add_frame = Some(cb);
        self
    }

    pub fn delete_frame(mut self, cb: impl Fn(usize, &str) -> bool + 'static) -> Self {
        let cb: DeleteFrameFn = std::rc::Rc::new(cb);
        self.delete_frame = Some(cb);
        self
    }

    pub fn reorder_frame(mut self, cb: impl Fn(usize, usize, &str) -> bool + 'static) -> Self {
        let cb: ReorderFrameFn = std::rc::Rc::new(cb);
        self.reorder_frame = Some(cb);
        self
    }

    pub fn add_animation(mut self, cb: impl Fn(&str, &Value) -> bool + 'static) -> Self {
        let cb: AddAnimationFn = std::rc::Rc::new(cb);
        self.add_animation = Some(cb);
        self
    }

    pub fn delete_animation(mut self, cb: impl Fn(&str) -> bool + 'static) -> Self {
        let cb: DeleteAnimationFn = std::rc::Rc::new(cb);
        self.delete_animation = Some(cb);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OperationKind;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn pixel_op(n: i32) -> Operation {
        Operation::new(
            OperationKind::BrushStroke,
            format!("Pixel change at ({n}, {n})"),
            Payload::Pixels { pixels: vec![(n, n, (255, 0, 0))] },
            Payload::Pixels { pixels: vec![(n, n, (n as u8 * 10, 0, 0))] },
        )
        .unwrap()
    }

    /// Engine wired to an in-memory pixel store, for round-trip checks.
    fn manager_with_pixel_store() -> (Rc<UndoRedoManager>, Rc<RefCell<HashMap<(i32, i32), Rgb>>>) {
        let manager = Rc::new(UndoRedoManager::new());
        let store: Rc<RefCell<HashMap<(i32, i32), Rgb>>> = Rc::new(RefCell::new(HashMap::new()));
        let probe = Rc::clone(&store);
        manager.set_pixel_change_callback(move |x, y, color| {
            probe.borrow_mut().insert((x, y), color);
            true
        });
        (manager, store)
    }

    #[test]
    fn test_initialization() {
        let manager = UndoRedoManager::new();
        let info = manager.get_history_info();
        assert_eq!(info.undo_count, 0);
        assert_eq!(info.redo_count, 0);
        assert!(!info.can_undo);
        assert!(!info.can_redo);
        assert_eq!(info.max_history, DEFAULT_MAX_HISTORY);
        assert!(manager.current_frame().is_none());
    }

    #[test]
    fn test_add_operation() {
        let manager = UndoRedoManager::new();
        manager.add_operation(pixel_op(1));
        assert_eq!(manager.undo_count(), 1);
        assert_eq!(manager.redo_count(), 0);
        assert!(manager.can_undo());
        assert!(!manager.can_redo());
    }

    #[test]
    fn test_undo_with_no_operations() {
        init_logs();
        let manager = UndoRedoManager::new();
        assert!(!manager.can_undo());
        assert!(!manager.undo());
        assert_eq!(manager.undo_count(), 0);
        assert_eq!(manager.redo_count(), 0);
    }

    #[test]
    fn test_redo_with_no_operations() {
        let manager = UndoRedoManager::new();
        assert!(!manager.can_redo());
        assert!(!manager.redo());
    }

    #[test]
    fn test_five_pixel_round_trip() {
        init_logs();
        let (manager, store) = manager_with_pixel_store();

        for i in 0..5 {
            manager.add_operation(pixel_op(i));
        }
        assert_eq!(manager.undo_count(), 5);
        assert_eq!(manager.redo_count(), 0);

        for i in 0..5 {
            assert!(manager.undo());
            assert_eq!(manager.undo_count(), 4 - i);
            assert_eq!(manager.redo_count(), i + 1);
        }
        for i in 0..5i32 {
            assert_eq!(store.borrow()[&(i, i)], (255, 0, 0));
        }

        for i in 0..5 {
            assert!(manager.redo());
            assert_eq!(manager.undo_count(), i + 1);
            assert_eq!(manager.redo_count(), 4 - i);
        }
        for i in 0..5i32 {
            assert_eq!(store.borrow()[&(i, i)], (i as u8 * 10, 0, 0));
        }
    }

    #[test]
    fn test_bounded_history_evicts_oldest() {
        let manager = UndoRedoManager::with_max_history(3);
        for i in 0..5 {
            manager.add_operation(pixel_op(i));
        }
        assert_eq!(manager.undo_count(), 3);
        assert_eq!(
            manager.undo_description().as_deref(),
            Some("Pixel change at (4, 4)")
        );

        // Drain the stack: only the newest three survive, in LIFO order.
        let seen: Rc<RefCell<Vec<(i32, i32)>>> = Rc::new(RefCell::new(Vec::new()));
        let probe = Rc::clone(&seen);
        manager.set_pixel_change_callback(move |x, y, _| {
            probe.borrow_mut().push((x, y));
            true
        });
        while manager.can_undo() {
            assert!(manager.undo());
        }
        assert_eq!(*seen.borrow(), vec![(4, 4), (3, 3), (2, 2)]);
    }

    #[test]
    fn test_redo_invalidation_at_head() {
        let (manager, _store) = manager_with_pixel_store();

        manager.add_operation(pixel_op(1)); // A
        manager.add_operation(pixel_op(2)); // B
        assert!(manager.undo()); // redo_stack = [B]
        assert!(manager.redo()); // redo emptied, back at head
        assert!(manager.undo()); // redo_stack = [B] again, not at head

        // Not at head: pushing C must preserve the redo stack.
        manager.add_operation(pixel_op(3));
        assert_eq!(manager.redo_count(), 1);

        // The push re-armed the head flag, so the next push clears it.
        manager.add_operation(pixel_op(4));
        assert_eq!(manager.redo_count(), 0);
    }

    #[test]
    fn test_add_after_undo_preserves_redo_until_head() {
        let (manager, _store) = manager_with_pixel_store();

        manager.add_operation(pixel_op(1));
        manager.add_operation(pixel_op(2));
        assert!(manager.undo());
        assert!(manager.undo());
        assert_eq!(manager.redo_count(), 2);

        // Undoing left the head of history, so this add keeps the undone
        // future around.
        manager.add_operation(pixel_op(3));
        assert_eq!(manager.redo_count(), 2);
        assert_eq!(manager.undo_count(), 1);

        // That add re-armed the head flag; the next one drops the stale
        // future.
        manager.add_operation(pixel_op(4));
        assert_eq!(manager.redo_count(), 0);
        assert_eq!(manager.undo_count(), 2);
    }

    #[test]
    fn test_failed_undo_is_atomic() {
        let manager = UndoRedoManager::new();
        manager.set_pixel_change_callback(|_, _, _| false);

        manager.add_operation(pixel_op(1));
        assert!(!manager.undo());
        assert_eq!(manager.undo_count(), 1);
        assert_eq!(manager.redo_count(), 0);
    }

    #[test]
    fn test_failed_redo_is_atomic() {
        let manager = Rc::new(UndoRedoManager::new());
        let fail = Rc::new(Cell::new(false));
        let probe = Rc::clone(&fail);
        manager.set_pixel_change_callback(move |_, _, _| !probe.get());

        manager.add_operation(pixel_op(1));
        assert!(manager.undo());

        fail.set(true);
        assert!(!manager.redo());
        assert_eq!(manager.undo_count(), 0);
        assert_eq!(manager.redo_count(), 1);
    }

    #[test]
    fn test_missing_callback_fails_and_rolls_back() {
        init_logs();
        let manager = UndoRedoManager::new();
        manager.add_operation(pixel_op(1));
        assert!(!manager.undo());
        assert_eq!(manager.undo_count(), 1);
        assert_eq!(manager.redo_count(), 0);
    }

    #[test]
    fn test_reentrant_add_is_dropped() {
        let manager = Rc::new(UndoRedoManager::new());
        let reentrant = Rc::clone(&manager);
        manager.set_pixel_change_callback(move |_, _, _| {
            // A callback-driven mutation trying to record itself.
            reentrant.add_operation(pixel_op(9));
            reentrant.add_frame_operation("walk", 0, pixel_op(9));
            true
        });

        manager.add_operation(pixel_op(1));
        assert!(manager.undo());

        // Only the original operation exists, now on the redo stack.
        assert_eq!(manager.undo_count(), 0);
        assert_eq!(manager.redo_count(), 1);
        assert_eq!(manager.frame_undo_count("walk", 0), 0);
    }

    #[test]
    fn test_reentrant_undo_is_refused() {
        let manager = Rc::new(UndoRedoManager::new());
        let reentrant = Rc::clone(&manager);
        let nested_result = Rc::new(Cell::new(true));
        let nested_probe = Rc::clone(&nested_result);
        manager.set_pixel_change_callback(move |_, _, _| {
            nested_probe.set(reentrant.undo());
            true
        });

        manager.add_operation(pixel_op(1));
        manager.add_operation(pixel_op(2));
        assert!(manager.undo());
        assert!(!nested_result.get());
        assert_eq!(manager.undo_count(), 1);
        assert_eq!(manager.redo_count(), 1);
    }

    #[test]
    fn test_callback_swap_during_dispatch() {
        let manager = Rc::new(UndoRedoManager::new());
        let reentrant = Rc::clone(&manager);
        manager.set_pixel_change_callback(move |_, _, _| {
            // A callback replacing itself mid-dispatch must not deadlock
            // on the registry.
            reentrant.set_pixel_change_callback(|_, _, _| false);
            true
        });

        manager.add_operation(pixel_op(1));
        assert!(manager.undo());

        // The swapped-in callback governs the next dispatch.
        assert!(!manager.redo());
        assert_eq!(manager.redo_count(), 1);
        assert_eq!(manager.undo_count(), 0);
    }

    #[test]
    fn test_mode_restored_after_dispatch() {
        let manager = Rc::new(UndoRedoManager::new());
        manager.set_pixel_change_callback(|_, _, _| true);
        manager.add_operation(pixel_op(1));
        assert!(manager.undo());
        // Recording works again after the dispatch returned.
        manager.add_operation(pixel_op(2));
        assert_eq!(manager.undo_count(), 1);
    }

    #[test]
    fn test_frame_operations_are_independent_of_global() {
        let (manager, _store) = manager_with_pixel_store();

        manager.add_operation(pixel_op(1));
        manager.add_frame_operation("walk", 1, pixel_op(2));

        assert_eq!(manager.undo_count(), 1);
        assert_eq!(manager.frame_undo_count("walk", 1), 1);
        assert!(manager.can_undo());
        assert!(manager.can_undo_frame("walk", 1));
        assert!(!manager.can_undo_frame("run", 1));
        assert!(!manager.can_undo_frame("walk", 2));

        // Frame undo leaves the global stacks untouched.
        assert!(manager.undo_frame("walk", 1));
        assert_eq!(manager.undo_count(), 1);
        assert_eq!(manager.redo_count(), 0);
        assert_eq!(manager.frame_undo_count("walk", 1), 0);
        assert_eq!(manager.frame_redo_count("walk", 1), 1);

        // And global undo leaves the frame stacks untouched.
        assert!(manager.undo());
        assert_eq!(manager.frame_redo_count("walk", 1), 1);
    }

    #[test]
    fn test_frame_undo_redo_round_trip() {
        let (manager, store) = manager_with_pixel_store();

        manager.add_frame_operation("walk", 1, pixel_op(3));
        assert!(manager.undo_frame("walk", 1));
        assert_eq!(store.borrow()[&(3, 3)], (255, 0, 0));
        assert!(manager.can_redo_frame("walk", 1));

        assert!(manager.redo_frame("walk", 1));
        assert_eq!(store.borrow()[&(3, 3)], (30, 0, 0));
        assert_eq!(manager.frame_undo_count("walk", 1), 1);
        assert_eq!(manager.frame_redo_count("walk", 1), 0);
    }

    #[test]
    fn test_frame_undo_with_no_operations() {
        let manager = UndoRedoManager::new();
        assert!(!manager.can_undo_frame("idle", 1));
        assert!(!manager.undo_frame("idle", 1));
        assert!(!manager.can_redo_frame("idle", 1));
        assert!(!manager.redo_frame("idle", 1));
    }

    #[test]
    fn test_frame_add_clears_frame_redo_only() {
        let (manager, _store) = manager_with_pixel_store();

        manager.add_frame_operation("walk", 1, pixel_op(1));
        assert!(manager.undo_frame("walk", 1));
        assert_eq!(manager.frame_redo_count("walk", 1), 1);

        manager.add_frame_operation("walk", 1, pixel_op(2));
        assert_eq!(manager.frame_redo_count("walk", 1), 0);
        assert_eq!(manager.frame_undo_count("walk", 1), 1);
    }

    #[test]
    fn test_failed_frame_undo_is_atomic() {
        let manager = UndoRedoManager::new();
        manager.set_pixel_change_callback(|_, _, _| false);

        manager.add_frame_operation("walk", 1, pixel_op(1));
        assert!(!manager.undo_frame("walk", 1));
        assert_eq!(manager.frame_undo_count("walk", 1), 1);
        assert_eq!(manager.frame_redo_count("walk", 1), 0);
    }

    #[test]
    fn test_selection_undo_moves_current_frame() {
        let manager = Rc::new(UndoRedoManager::new());
        manager.set_frame_selection_callback(|_, _| true);

        let op = Operation::new(
            OperationKind::FrameSelection,
            "Selected frame 2 in 'walk'",
            Payload::FrameSelection { animation: "walk".into(), frame_index: 0 },
            Payload::FrameSelection { animation: "walk".into(), frame_index: 2 },
        )
        .unwrap();
        manager.add_operation(op);
        manager.set_current_frame("walk", 2);

        assert!(manager.undo());
        assert_eq!(manager.current_frame(), Some(("walk".into(), 0)));
        assert!(manager.redo());
        assert_eq!(manager.current_frame(), Some(("walk".into(), 2)));
    }

    #[test]
    fn test_clear_history() {
        let manager = UndoRedoManager::new();
        for i in 0..3 {
            manager.add_operation(pixel_op(i));
        }
        manager.add_frame_operation("walk", 1, pixel_op(7));
        assert_eq!(manager.undo_count(), 3);

        manager.clear_history();
        assert_eq!(manager.undo_count(), 0);
        assert_eq!(manager.redo_count(), 0);
        assert_eq!(manager.frame_undo_count("walk", 1), 0);
        assert!(!manager.can_undo());
        assert!(!manager.can_redo());
    }

    #[test]
    fn test_history_info_descriptions() {
        let (manager, _store) = manager_with_pixel_store();
        manager.add_operation(pixel_op(1));
        manager.add_operation(pixel_op(2));
        assert!(manager.undo());

        let info = manager.get_history_info();
        assert_eq!(info.undo_count, 1);
        assert_eq!(info.redo_count, 1);
        assert_eq!(info.next_undo.as_deref(), Some("Pixel change at (1, 1)"));
        assert_eq!(info.next_redo.as_deref(), Some("Pixel change at (2, 2)"));
    }
}
