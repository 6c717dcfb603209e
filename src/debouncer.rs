//! Reparse scheduling.
//!
//! Edits arrive in bursts (typing, paste, undo). The first edit arms a
//! timer for its document; further edits while the timer is pending are
//! absorbed by it, so a burst costs one reparse. Each timer remembers the
//! generation of the entry it was armed for, and the session drops timers
//! whose entry has since been replaced or removed.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::document::DocumentId;
use crate::document::entry::Generation;

/// Pending reparse timer for one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReparseTimer {
    pub generation: Generation,
    pub due: Instant,
}

/// Coalesces edit notifications into at most one pending reparse per document.
#[derive(Debug)]
pub struct Debouncer {
    pending: HashMap<DocumentId, ReparseTimer>,
    delay: Duration,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            delay,
        }
    }

    /// Record an edit at `now`.
    ///
    /// An already pending timer for the same entry is left alone. Returns
    /// `true` when a new timer was armed.
    pub fn record_at(&mut self, id: DocumentId, generation: Generation, now: Instant) -> bool {
        if let Some(timer) = self.pending.get(&id)
            && timer.generation == generation
        {
            return false;
        }
        self.pending.insert(
            id,
            ReparseTimer {
                generation,
                due: now + self.delay,
            },
        );
        true
    }

    pub fn record(&mut self, id: DocumentId, generation: Generation) -> bool {
        self.record_at(id, generation, Instant::now())
    }

    /// Drop the timer for `id`, if any.
    pub fn cancel(&mut self, id: DocumentId) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Take every timer that has fired by `now`, ordered by deadline.
    pub fn take_ready(&mut self, now: Instant) -> Vec<(DocumentId, Generation)> {
        let mut ready = Vec::new();

        self.pending.retain(|id, timer| {
            if now >= timer.due {
                ready.push((timer.due, *id, timer.generation));
                false
            } else {
                true
            }
        });

        ready.sort();
        ready
            .into_iter()
            .map(|(_, id, generation)| (id, generation))
            .collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_pending(&self, id: DocumentId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Earliest deadline among pending timers.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|timer| timer.due).min()
    }
}
