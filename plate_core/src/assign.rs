use crate::{PlateFormat, PlateStore, StyleKey, WellStatus};
use thiserror::Error;

/// Validation failures surfaced to the user; the store is untouched and the
/// selection stays active so the input can be corrected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssignError {
    #[error("group name must not be empty")]
    EmptyLabel,
    #[error("nothing selected")]
    EmptySelection,
}

/// What the user picked in the label dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub label: String,
    pub style: StyleKey,
}

impl Assignment {
    /// Falls back to the preset color when no style was picked.
    pub fn new(label: impl Into<String>, style: Option<StyleKey>) -> Self {
        Self {
            label: label.into(),
            style: style.unwrap_or_else(StyleKey::default_color),
        }
    }
}

/// Writes one assignment over the selection in the active grid.
///
/// Every selected well gets the label, style and filled status,
/// unconditionally overwriting whatever was there; unselected wells
/// (including previously filled ones) are untouched. The grid is rebuilt and
/// swapped in via `PlateStore::replace`, so readers only ever see a full
/// before/after state. Returns how many wells were written.
pub fn apply(
    store: &mut PlateStore,
    format: PlateFormat,
    selection: &[String],
    assignment: &Assignment,
) -> Result<usize, AssignError> {
    if assignment.label.is_empty() {
        return Err(AssignError::EmptyLabel);
    }
    if selection.is_empty() {
        return Err(AssignError::EmptySelection);
    }

    let mut grid = store.get(format).clone();
    let mut written = 0;
    for well in &mut grid.wells {
        if selection.iter().any(|id| *id == well.id) {
            well.label = assignment.label.clone();
            well.color = assignment.style.clone();
            well.status = WellStatus::Filled;
            written += 1;
        }
    }
    store.replace(format, grid);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PatternId;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn apply_fills_exactly_the_selection() -> anyhow::Result<()> {
        let mut store = PlateStore::new();
        let n = apply(
            &mut store,
            PlateFormat::W6,
            &ids(&["A1", "A2", "A3"]),
            &Assignment::new("Control", Some(StyleKey::Color("#3b82f6".into()))),
        )?;
        assert_eq!(n, 3);

        let grid = store.get(PlateFormat::W6);
        assert_eq!(grid.filled_count(), 3);
        for id in ["A1", "A2", "A3"] {
            let w = grid.well(id).unwrap();
            assert_eq!(w.label, "Control");
            assert_eq!(w.color, StyleKey::Color("#3b82f6".into()));
            assert!(w.is_filled());
        }
        let untouched = grid.well("B1").unwrap();
        assert!(!untouched.is_filled());
        assert_eq!(untouched.color, StyleKey::blank());
        Ok(())
    }

    #[test]
    fn relabeling_overwrites_without_merging() -> anyhow::Result<()> {
        let mut store = PlateStore::new();
        apply(
            &mut store,
            PlateFormat::W24,
            &ids(&["A1", "A2"]),
            &Assignment::new("Old", Some(StyleKey::Color("#ef4444".into()))),
        )?;
        apply(
            &mut store,
            PlateFormat::W24,
            &ids(&["A2", "B1"]),
            &Assignment::new("New", Some(StyleKey::Pattern(PatternId::DotsSmall))),
        )?;

        let grid = store.get(PlateFormat::W24);
        assert_eq!(grid.well("A1").unwrap().label, "Old");
        assert_eq!(grid.well("A2").unwrap().label, "New");
        assert_eq!(
            grid.well("A2").unwrap().color,
            StyleKey::Pattern(PatternId::DotsSmall)
        );
        assert_eq!(grid.well("B1").unwrap().label, "New");
        Ok(())
    }

    #[test]
    fn empty_label_is_rejected_and_store_untouched() {
        let mut store = PlateStore::new();
        let before = store.clone();

        let err = apply(
            &mut store,
            PlateFormat::W96,
            &ids(&["A1"]),
            &Assignment::new("", None),
        );
        assert_eq!(err, Err(AssignError::EmptyLabel));
        assert_eq!(store, before);
    }

    #[test]
    fn empty_selection_is_rejected() {
        let mut store = PlateStore::new();
        let err = apply(&mut store, PlateFormat::W96, &[], &Assignment::new("X", None));
        assert_eq!(err, Err(AssignError::EmptySelection));
    }

    #[test]
    fn default_style_is_the_preset_color() {
        let a = Assignment::new("Sample", None);
        assert_eq!(a.style, StyleKey::Color("#3b82f6".into()));
    }

    #[test]
    fn selected_ids_missing_from_the_grid_are_skipped() -> anyhow::Result<()> {
        // 6-well plate has no H12; a stale id from a bigger grid must not
        // invent wells.
        let mut store = PlateStore::new();
        let n = apply(
            &mut store,
            PlateFormat::W6,
            &ids(&["A1", "H12"]),
            &Assignment::new("X", None),
        )?;
        assert_eq!(n, 1);
        assert_eq!(store.get(PlateFormat::W6).wells.len(), 6);
        assert_eq!(store.get(PlateFormat::W6).filled_count(), 1);
        Ok(())
    }
}
