//! Per-project mutual exclusion
//!
//! Submissions and prompt backfill hold the project's mutex for the whole
//! read-mutate-persist sequence. The lock is in-process only; it does not
//! coordinate separate processes sharing one home directory.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry handing out one mutex per project id.
#[derive(Debug, Default)]
pub(crate) struct ProjectLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ProjectLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Mutex for `project_id`, created on first use.
    pub(crate) fn lock_for(&self, project_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(
            locks
                .entry(project_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().len()
    }
}
