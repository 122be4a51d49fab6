//! Pending specifiers for the resolver's crawl.
//!
//! A key enters the queue at most once per run: the seen-set is never
//! cleared, so a specifier that has been processed is not expanded again.

use std::collections::{HashSet, VecDeque};

use depsat_core::Specifier;

#[derive(Debug, Default)]
pub struct Worklist {
    queue: VecDeque<Specifier>,
    seen: HashSet<String>,
}

impl Worklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a specifier. Returns `false` if its key was already seen.
    pub fn push(&mut self, specifier: Specifier) -> bool {
        if !self.seen.insert(specifier.key()) {
            return false;
        }
        self.queue.push_back(specifier);
        true
    }

    pub fn pop(&mut self) -> Option<Specifier> {
        self.queue.pop_front()
    }

    /// Entries still waiting.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Every key ever enqueued.
    pub fn seen(&self) -> &HashSet<String> {
        &self.seen
    }
}
