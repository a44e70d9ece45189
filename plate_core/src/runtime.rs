use crate::{
    AssignError, Assignment, LegendEntry, PlateFormat, PlateStore, SelectionController, StyleKey,
    assign, persist, persist::BlobStore, stats,
};

/// One editing session: the store, the live selection and the active format,
/// with a blob store injected for persistence. All mutation funnels through
/// here, and every committed mutation immediately mirrors the full store to
/// storage; persistence hangs off the mutation, not off rendering.
pub struct Runtime {
    pub store: PlateStore,
    pub selection: SelectionController,
    active: PlateFormat,
    blobs: Box<dyn BlobStore>,
}

impl Runtime {
    /// Starts a session from whatever the blob store holds; a missing or
    /// corrupt blob just means an empty layout.
    pub fn new(blobs: Box<dyn BlobStore>) -> Self {
        let store = persist::load(blobs.as_ref());
        Self {
            store,
            selection: SelectionController::new(),
            active: PlateFormat::W96,
            blobs,
        }
    }

    pub fn active(&self) -> PlateFormat {
        self.active
    }

    /// Swaps which grid is active. Grids are untouched; a selection in
    /// flight is implicitly cancelled because its ids belong to the old
    /// format.
    pub fn set_active(&mut self, format: PlateFormat) {
        if format == self.active {
            return;
        }
        self.selection.cancel();
        self.active = format;
    }

    pub fn pointer_down(&mut self, id: &str) {
        self.selection.pointer_down(self.active, id);
    }

    pub fn pointer_enter(&mut self, id: &str) {
        self.selection.pointer_enter(id);
    }

    /// Ends the drag; the returned ids (if any) mean the commit flow should
    /// ask the user for a label.
    pub fn pointer_up(&mut self) -> Option<Vec<String>> {
        self.selection.pointer_up()
    }

    pub fn cancel_selection(&mut self) {
        self.selection.cancel();
    }

    /// Commits a label + style over the retained selection, then persists.
    /// Validation errors leave both the store and the selection untouched so
    /// the dialog can stay open for correction.
    pub fn commit(&mut self, label: &str, style: Option<StyleKey>) -> Result<usize, AssignError> {
        let format = self.selection.format().unwrap_or(self.active);
        let assignment = Assignment::new(label, style);
        let ids: Vec<String> = self.selection.ids().to_vec();
        let written = assign::apply(&mut self.store, format, &ids, &assignment)?;

        log::info!("labeled {written} wells on the {} plate as '{label}'", format.size());
        self.selection.cancel();
        self.persist();
        Ok(written)
    }

    /// Resets the active grid. The caller has already confirmed with the
    /// user; an unconfirmed clear never reaches this.
    pub fn clear_active(&mut self) {
        self.store.clear(self.active);
        self.selection.cancel();
        log::info!("cleared the {} plate", self.active.size());
        self.persist();
    }

    /// Global legend over every grid in the store.
    pub fn legend(&self) -> Vec<LegendEntry> {
        stats::aggregate(&self.store)
    }

    /// Mirrors the store to the blob store. Write failures are logged and
    /// swallowed: the in-memory layout stays valid and the next mutation
    /// retries the write anyway.
    fn persist(&mut self) {
        if let Err(e) = persist::save(&self.store, self.blobs.as_mut()) {
            log::warn!("persisting plate store failed: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, PatternId, persist::STORE_KEY};

    fn runtime() -> Runtime {
        Runtime::new(Box::new(MemoryStore::new()))
    }

    #[test]
    fn drag_commit_updates_store_and_legend() -> anyhow::Result<()> {
        let mut rt = runtime();
        rt.pointer_down("A1");
        rt.pointer_enter("A2");
        let finalized = rt.pointer_up();
        assert_eq!(finalized, Some(vec!["A1".to_string(), "A2".to_string()]));

        let written = rt.commit("Dose", Some(StyleKey::Color("#f59e0b".into())))?;
        assert_eq!(written, 2);
        assert!(rt.selection.ids().is_empty());

        let grid = rt.store.get(PlateFormat::W96);
        assert!(grid.well("A1").unwrap().is_filled());
        assert!(grid.well("A2").unwrap().is_filled());

        let legend = rt.legend();
        assert_eq!(legend.len(), 1);
        assert_eq!(legend[0].label, "Dose");
        assert!(legend[0].count >= 2);
        Ok(())
    }

    #[test]
    fn empty_label_keeps_selection_for_correction() {
        let mut rt = runtime();
        rt.pointer_down("A1");
        rt.pointer_up();

        let before = rt.store.clone();
        assert_eq!(rt.commit("", None), Err(AssignError::EmptyLabel));
        assert_eq!(rt.store, before);
        assert_eq!(rt.selection.ids(), ["A1"]);

        // Correcting the label afterwards works on the same selection.
        assert_eq!(rt.commit("Fixed", None), Ok(1));
    }

    #[test]
    fn switching_format_cancels_a_live_selection() {
        let mut rt = runtime();
        rt.pointer_down("A1");
        rt.pointer_enter("A2");

        rt.set_active(PlateFormat::W6);
        assert!(rt.selection.ids().is_empty());
        assert!(!rt.selection.is_selecting());
        assert_eq!(rt.active(), PlateFormat::W6);
    }

    #[test]
    fn reselecting_the_same_format_keeps_the_selection() {
        let mut rt = runtime();
        rt.pointer_down("A1");
        rt.set_active(PlateFormat::W96);
        assert_eq!(rt.selection.ids(), ["A1"]);
    }

    /// MemoryStore clones don't share state, so restarts are simulated with
    /// a blob store both sessions can see.
    #[derive(Clone, Default)]
    struct SharedStore(std::rc::Rc<std::cell::RefCell<MemoryStore>>);

    impl BlobStore for SharedStore {
        fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
            self.0.borrow().read(key)
        }

        fn write(&mut self, key: &str, blob: &str) -> anyhow::Result<()> {
            self.0.borrow_mut().write(key, blob)
        }
    }

    #[test]
    fn commits_persist_through_a_restart() -> anyhow::Result<()> {
        let blobs = SharedStore::default();

        let mut rt = Runtime::new(Box::new(blobs.clone()));
        rt.pointer_down("A1");
        rt.pointer_up();
        rt.commit("Keep", Some(StyleKey::Pattern(PatternId::Rings)))?;
        assert!(blobs.read(STORE_KEY)?.is_some());
        drop(rt);

        let rt2 = Runtime::new(Box::new(blobs));
        let well = rt2.store.get(PlateFormat::W96).well("A1").unwrap().clone();
        assert_eq!(well.label, "Keep");
        assert_eq!(well.color, StyleKey::Pattern(PatternId::Rings));
        Ok(())
    }

    #[test]
    fn clear_active_resets_only_the_active_grid() -> anyhow::Result<()> {
        let mut rt = runtime();
        rt.pointer_down("A1");
        rt.pointer_up();
        rt.commit("OnNinetySix", None)?;

        rt.set_active(PlateFormat::W6);
        rt.pointer_down("A1");
        rt.pointer_up();
        rt.commit("OnSix", None)?;

        rt.clear_active();
        assert_eq!(rt.store.get(PlateFormat::W6).filled_count(), 0);
        assert_eq!(rt.store.get(PlateFormat::W96).filled_count(), 1);
        Ok(())
    }
}
