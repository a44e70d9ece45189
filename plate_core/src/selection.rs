use crate::PlateFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Idle,
    Selecting,
}

/// Rubber-band selection over the active grid.
///
/// The live edit buffer of the app: pointer-down starts it, pointer-enter
/// grows it, pointer-up hands the ordered id list to the commit flow. Ids are
/// kept in drag order with no duplicates, and the whole thing is scoped to
/// the format that was active when the drag began. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    selecting: bool,
    ids: Vec<String>,
    format: Option<PlateFormat>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        if self.selecting {
            SelectionState::Selecting
        } else {
            SelectionState::Idle
        }
    }

    pub fn is_selecting(&self) -> bool {
        self.selecting
    }

    /// Format the current ids belong to, kept until commit or cancel.
    pub fn format(&self) -> Option<PlateFormat> {
        self.format
    }

    /// Ids in drag order. Also non-empty after pointer-up while the commit
    /// flow is still deciding.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|x| x == id)
    }

    /// Idle -> Selecting. Starts a fresh selection with just this well,
    /// discarding anything left over from an uncommitted drag.
    pub fn pointer_down(&mut self, format: PlateFormat, id: &str) {
        self.selecting = true;
        self.format = Some(format);
        self.ids.clear();
        self.ids.push(id.to_string());
    }

    /// Appends a well while dragging. Re-entering a well already in the
    /// selection is a no-op; order is preserved and nothing is ever removed.
    pub fn pointer_enter(&mut self, id: &str) {
        if !self.selecting {
            return;
        }
        if !self.contains(id) {
            self.ids.push(id.to_string());
        }
    }

    /// Selecting -> Idle. Returns the finalized id list if anything was
    /// picked; the selection itself stays around until commit or cancel so
    /// the view can keep highlighting it. Also handles the global pointer-up
    /// (released outside any well).
    pub fn pointer_up(&mut self) -> Option<Vec<String>> {
        if !self.selecting {
            return None;
        }
        self.selecting = false;
        if self.ids.is_empty() {
            None
        } else {
            Some(self.ids.clone())
        }
    }

    /// Drops the selection entirely. Used on explicit cancel and as the
    /// implicit cancel when the active format changes mid-drag.
    pub fn cancel(&mut self) {
        self.selecting = false;
        self.ids.clear();
        self.format = None;
    }
}
