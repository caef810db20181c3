/// Selection and hover state shared between the input path and the render pass.
use std::sync::{Arc, Mutex, MutexGuard};

use crate::gizmo::Handle;
use crate::scene::ObjectId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub selected: Option<ObjectId>,
    pub hovered: Option<ObjectId>,
    /// Gizmo handle currently being dragged
    pub active_handle: Option<Handle>,
}

impl SelectionState {
    /// Selects `id`, dropping any drag on the previous selection.
    pub fn select(&mut self, id: Option<ObjectId>) {
        if self.selected != id {
            self.active_handle = None;
        }
        self.selected = id;
    }

    pub fn is_dragging(&self) -> bool {
        self.selected.is_some() && self.active_handle.is_some()
    }
}

/// Cloneable handle to one [`SelectionState`].
///
/// Every multi-field read-modify sequence runs inside [`SharedSelection::update`]
/// while the lock is held.
#[derive(Debug, Clone, Default)]
pub struct SharedSelection {
    inner: Arc<Mutex<SelectionState>>,
}

impl SharedSelection {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SelectionState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Consistent copy of the whole state
    pub fn snapshot(&self) -> SelectionState {
        *self.lock()
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut SelectionState) -> R) -> R {
        let mut state = self.lock();
        f(&mut state)
    }
}
