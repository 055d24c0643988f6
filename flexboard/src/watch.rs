//! Re-evaluating bindings when the data they depend on changes.

use log::debug;

use crate::Board;

/// Versions of the parts of a [`Board`] that bindings depend on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Versions {
    pub ids: u64,
    pub metadata: u64,
    pub tags: u64,
    /// Covers binding definitions and inputs selectors, as well as views
    /// being added and removed.
    pub views: u64,
}

/// Watches a [`Board`] and re-evaluates all of its bindings whenever the
/// dataset or the views change.
#[derive(Debug, Default)]
pub struct Watcher {
    seen: Option<Versions>,
}

impl Watcher {
    /// A watcher that hasn't seen any board yet, so its first poll always
    /// evaluates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates every binding on the board if anything changed since the
    /// last poll. Returns whether an evaluation happened.
    pub fn poll(&mut self, board: &mut Board) -> bool {
        let current = board.versions();
        if self.seen == Some(current) {
            return false;
        }
        debug!("Board changed ({:?} -> {:?}), re-evaluating", self.seen, current);
        let evaluated = board.evaluate_all();
        debug!("Re-evaluated {} binding(s)", evaluated);
        // Storing evaluation results writes to the views, which shouldn't
        // count as a change.
        self.seen = Some(board.versions());
        true
    }
}
