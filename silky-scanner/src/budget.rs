use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Verdict for a candidate visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accept,
    RejectDepth,
    RejectPageCap,
    RejectDuplicate,
}

#[derive(Debug, Default)]
struct BudgetState {
    visited: HashSet<String>,
    pages_visited: usize,
    pages_skipped: usize,
}

/// Page/depth limits plus the visited set. A limit of `0` means unlimited.
///
/// `visited` only grows. [`VisitBudget::begin_visit`] is the one place a URL
/// enters it, under the same lock as the admission check, which is what gives
/// at-most-once visitation across concurrent workers.
#[derive(Debug)]
pub struct VisitBudget {
    max_depth: usize,
    max_pages: usize,
    state: Mutex<BudgetState>,
}

impl VisitBudget {
    pub fn new(max_depth: usize, max_pages: usize) -> Self {
        Self {
            max_depth,
            max_pages,
            state: Mutex::new(BudgetState::default()),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(0, 0)
    }

    fn state(&self) -> MutexGuard<'_, BudgetState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self, state: &BudgetState, url: &str, depth: usize) -> Admission {
        if state.visited.contains(url) {
            Admission::RejectDuplicate
        } else if self.max_pages > 0 && state.pages_visited >= self.max_pages {
            Admission::RejectPageCap
        } else if !self.allows_depth(depth) {
            Admission::RejectDepth
        } else {
            Admission::Accept
        }
    }

    /// Checks a candidate without reserving it.
    pub fn admit(&self, url: &str, depth: usize) -> Admission {
        let state = self.state();
        self.check(&state, url, depth)
    }

    /// Admission check and insertion into `visited` as one atomic step.
    pub fn begin_visit(&self, url: &str, depth: usize) -> Admission {
        let mut state = self.state();
        let verdict = self.check(&state, url, depth);
        if verdict == Admission::Accept {
            state.visited.insert(url.to_string());
            state.pages_visited += 1;
        }
        verdict
    }

    pub fn record_skip(&self) {
        self.state().pages_skipped += 1;
    }

    pub fn allows_depth(&self, depth: usize) -> bool {
        self.max_depth == 0 || depth < self.max_depth
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.state().visited.contains(url)
    }

    pub fn is_exhausted(&self) -> bool {
        self.max_pages > 0 && self.state().pages_visited >= self.max_pages
    }

    pub fn pages_visited(&self) -> usize {
        self.state().pages_visited
    }

    pub fn pages_skipped(&self) -> usize {
        self.state().pages_skipped
    }

    pub fn visited_count(&self) -> usize {
        self.state().visited.len()
    }
}

impl Default for VisitBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}
