use std::collections::{BTreeMap, BTreeSet};

use crate::domain::entities::row::RowId;

/// Tri-state of the header "select all" checkbox for the rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCheckState {
    None,
    Some,
    All,
}

/// Page-independent set of selected row IDs.
///
/// The per-page boolean map a table widget wants is always derived from this
/// set and the rows on screen; it is never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<RowId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> &BTreeSet<RowId> {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &RowId) -> bool {
        self.ids.contains(id)
    }

    /// Returns the new membership of `id`.
    pub fn toggle(&mut self, id: RowId) -> bool {
        if self.deselect(&id) {
            false
        } else {
            self.select(id);
            true
        }
    }

    pub fn select(&mut self, id: RowId) {
        self.ids.insert(id);
    }

    pub fn deselect(&mut self, id: &RowId) -> bool {
        self.ids.remove(id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn row_selection_for_page(&self, page_ids: &[RowId]) -> BTreeMap<usize, bool> {
        page_ids
            .iter()
            .enumerate()
            .filter(|(_, id)| self.ids.contains(id))
            .map(|(index, _)| (index, true))
            .collect()
    }

    /// Applies a table-widget style selection map for the current page.
    ///
    /// Entries set to `true` select, `false` deselect, and page rows that were
    /// selected but are absent from `next` are deselected. IDs on other pages
    /// are left alone.
    pub fn apply_page_selection(&mut self, page_ids: &[RowId], next: &BTreeMap<usize, bool>) {
        for (index, id) in page_ids.iter().enumerate() {
            match next.get(&index) {
                Some(true) => {
                    self.ids.insert(id.clone());
                }
                Some(false) | None => {
                    self.ids.remove(id);
                }
            }
        }
    }

    pub fn page_check_state(&self, page_ids: &[RowId]) -> PageCheckState {
        let selected = page_ids.iter().filter(|id| self.ids.contains(id)).count();
        if selected == 0 {
            PageCheckState::None
        } else if selected == page_ids.len() {
            PageCheckState::All
        } else {
            PageCheckState::Some
        }
    }

    /// Header checkbox: selects every row on the page unless all of them are
    /// already selected, in which case the page is deselected.
    pub fn toggle_page(&mut self, page_ids: &[RowId]) {
        let select = self.page_check_state(page_ids) != PageCheckState::All;
        let next: BTreeMap<usize, bool> = (0..page_ids.len()).map(|index| (index, select)).collect();
        self.apply_page_selection(page_ids, &next);
    }
}
