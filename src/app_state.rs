//! Thread-safe selection + scroll model.
//!
//! Shared between the render loop and the input loop behind a single
//! `parking_lot::Mutex`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::model::{ContainerId, ContainerRecord};

/// A render-dirty flag workers can set to wake the render loop early.
#[derive(Debug, Default)]
pub struct Rerender(AtomicBool);

impl Rerender {
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn set_true(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Read and clear the flag in one step.
    pub fn swap_false(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

struct Inner {
    flat: Vec<ContainerRecord>,
    index_by_id: std::collections::HashMap<ContainerId, usize>,
    selected_index: usize,
    scroll_offset: usize,
    debug_mode: bool,
}

pub struct AppState {
    inner: Mutex<Inner>,
    pub ui_updated: Arc<Rerender>,
}

impl AppState {
    pub fn new(debug_mode: bool) -> Self {
        Self {
            inner: Mutex::new(Inner {
                flat: Vec::new(),
                index_by_id: std::collections::HashMap::new(),
                selected_index: 0,
                scroll_offset: 0,
                debug_mode,
            }),
            ui_updated: Arc::new(Rerender::new()),
        }
    }

    pub fn debug_mode(&self) -> bool {
        self.inner.lock().debug_mode
    }

    /// Rebuild the flat list and id→index map; preserve selection identity
    /// when the previously-selected id is still present.
    pub fn update_containers(&self, flat: Vec<ContainerRecord>) {
        let mut inner = self.inner.lock();

        let previously_selected = inner.flat.get(inner.selected_index).map(|c| c.id.clone());

        let mut index_by_id = std::collections::HashMap::with_capacity(flat.len());
        for (idx, record) in flat.iter().enumerate() {
            index_by_id.insert(record.id.clone(), idx);
        }

        inner.selected_index = previously_selected
            .and_then(|id| index_by_id.get(&id).copied())
            .unwrap_or(0);

        let max_scroll = flat.len().saturating_sub(1);
        inner.scroll_offset = inner.scroll_offset.min(max_scroll);

        inner.flat = flat;
        inner.index_by_id = index_by_id;
        self.ui_updated.set_true();
    }

    pub fn get_selected(&self) -> Option<ContainerRecord> {
        let inner = self.inner.lock();
        inner.flat.get(inner.selected_index).cloned()
    }

    pub fn selected_index(&self) -> usize {
        self.inner.lock().selected_index
    }

    pub fn scroll_offset(&self) -> usize {
        self.inner.lock().scroll_offset
    }

    pub fn flat_len(&self) -> usize {
        self.inner.lock().flat.len()
    }

    /// Clamped, non-wrapping move.
    pub fn move_selection(&self, delta: i32) {
        let mut inner = self.inner.lock();
        if inner.flat.is_empty() {
            inner.selected_index = 0;
            return;
        }
        let max = inner.flat.len() - 1;
        let current = inner.selected_index as i64;
        let next = (current + i64::from(delta)).clamp(0, max as i64);
        inner.selected_index = next as usize;
        drop(inner);
        self.ui_updated.set_true();
    }

    /// Clamped scroll by one project group.
    pub fn scroll_view(&self, delta: i32, project_count: usize) {
        let mut inner = self.inner.lock();
        if project_count == 0 {
            inner.scroll_offset = 0;
            return;
        }
        let max = project_count - 1;
        let current = inner.scroll_offset as i64;
        let next = (current + i64::from(delta)).clamp(0, max as i64);
        inner.scroll_offset = next as usize;
        drop(inner);
        self.ui_updated.set_true();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatters;

    fn record(id: &str, name: &str) -> ContainerRecord {
        ContainerRecord {
            id: ContainerId::new(id),
            name: name.to_owned(),
            project: "proj".to_owned(),
            raw_status: "running".to_owned(),
            health_raw: None,
            started_at: None,
            ports: Vec::new(),
            cpu_display: formatters::dash(),
            memory_display: formatters::dash(),
            prev_cpu_sample: None,
        }
    }

    #[test]
    fn move_selection_never_goes_out_of_bounds() {
        let state = AppState::new(false);
        state.update_containers(vec![record("a", "a"), record("b", "b"), record("c", "c")]);

        for _ in 0..10 {
            state.move_selection(1);
            assert!(state.selected_index() < 3);
        }
        for _ in 0..10 {
            state.move_selection(-1);
            assert!(state.selected_index() < 3);
        }
    }

    /// `B` selected, `AA` appears before it alphabetically; `B` stays selected.
    #[test]
    fn identity_preservation_across_reorder() {
        let state = AppState::new(false);
        state.update_containers(vec![record("idA", "A"), record("idB", "B")]);
        state.move_selection(1);
        assert_eq!(state.get_selected().unwrap().id, ContainerId::new("idB"));

        state.update_containers(vec![
            record("idA", "A"),
            record("idAA", "AA"),
            record("idB", "B"),
        ]);
        assert_eq!(state.get_selected().unwrap().id, ContainerId::new("idB"));
        assert_eq!(state.selected_index(), 2);
    }

    #[test]
    fn selection_resets_to_zero_when_selected_id_vanishes() {
        let state = AppState::new(false);
        state.update_containers(vec![record("idA", "A"), record("idB", "B")]);
        state.move_selection(1);
        state.update_containers(vec![record("idC", "C")]);
        assert_eq!(state.selected_index(), 0);
    }

    #[test]
    fn empty_list_keeps_selection_at_zero() {
        let state = AppState::new(false);
        state.update_containers(Vec::new());
        state.move_selection(1);
        assert_eq!(state.selected_index(), 0);
    }
}
