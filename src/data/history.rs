//! Cursor-bounded view over the loaded observation rows.
//!
//! The rows are immutable after load. Only the cursor moves, and it only
//! moves forward. Each cursor position is published as a fresh
//! [`HistoryWindow`] snapshot so readers never see a half-updated window.

use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::types::ObservationRow;

/// Immutable snapshot: the first `current_index` rows are visible.
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    rows: Arc<[ObservationRow]>,
    current_index: usize,
}

impl HistoryWindow {
    /// Window over `rows` with the cursor clamped to `rows.len()`.
    pub fn new(rows: Arc<[ObservationRow]>, current_index: usize) -> Self {
        let current_index = current_index.min(rows.len());
        Self {
            rows,
            current_index,
        }
    }

    /// Visible rows, oldest first.
    pub fn rows(&self) -> &[ObservationRow] {
        &self.rows[..self.current_index]
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn total_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current_index == 0
    }

    /// No rows left to reveal.
    pub fn is_exhausted(&self) -> bool {
        self.current_index >= self.rows.len()
    }

    pub fn last(&self) -> Option<&ObservationRow> {
        self.rows().last()
    }

    /// Cursor position as a percentage of the dataset (0 when empty).
    pub fn progress(&self) -> f64 {
        if self.rows.is_empty() {
            0.0
        } else {
            self.current_index as f64 / self.rows.len() as f64 * 100.0
        }
    }

    fn advanced(&self, by: usize) -> Self {
        Self::new(Arc::clone(&self.rows), self.current_index.saturating_add(by))
    }
}

/// Atomically published [`HistoryWindow`].
///
/// Readers call [`snapshot`](Self::snapshot); the simulation clock is the
/// only caller of [`advance`](Self::advance).
#[derive(Debug)]
pub struct HistoryStore {
    window: ArcSwap<HistoryWindow>,
}

impl HistoryStore {
    pub fn new(rows: Vec<ObservationRow>, start_index: usize) -> Self {
        Self {
            window: ArcSwap::from_pointee(HistoryWindow::new(rows.into(), start_index)),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }

    /// Current window. Cheap: clones an `Arc`.
    pub fn snapshot(&self) -> Arc<HistoryWindow> {
        self.window.load_full()
    }

    /// Move the cursor forward by one row, clamped to the row count.
    /// Returns the window now visible.
    pub fn advance(&self) -> Arc<HistoryWindow> {
        self.window.rcu(|current| current.advanced(1));
        self.window.load_full()
    }

    pub fn total_rows(&self) -> usize {
        self.window.load().total_rows()
    }
}
