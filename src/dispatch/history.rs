use std::collections::VecDeque;

use crate::spooler::Job;

/// How many finished jobs are kept
pub const HISTORY_LIMIT: usize = 100;

/// Finished jobs, most recent first
#[derive(Debug, Default)]
pub struct History {
    entries: VecDeque<Job>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, job: Job) {
        self.entries.push_front(job);
        self.entries.truncate(HISTORY_LIMIT);
    }

    pub fn list(&self) -> Vec<Job> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every entry, returning how many were dropped
    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        dropped
    }
}
