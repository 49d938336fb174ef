//! Scheduled events on the engine's virtual clock.
//!
//! Delayed reactions are queued here instead of on real timers. Every entry
//! has an id; cancelled ids never fire.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use petsim_logic::message::Candidate;

#[derive(Debug, Clone, PartialEq)]
pub enum ScheduledKind {
    /// Hand a candidate to the message queue.
    Submit(Candidate),
}

#[derive(Debug, Default)]
pub struct Timeline {
    due: BinaryHeap<Reverse<(u64, u64)>>,
    payloads: HashMap<u64, ScheduledKind>,
    next_id: u64,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `kind` to fire at `at_ms`. Returns the event id.
    pub fn schedule(&mut self, at_ms: u64, kind: ScheduledKind) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.due.push(Reverse((at_ms, id)));
        self.payloads.insert(id, kind);
        id
    }

    /// Returns false if the event already fired or was cancelled.
    pub fn cancel(&mut self, id: u64) -> bool {
        self.payloads.remove(&id).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.due.clear();
        self.payloads.clear();
    }

    /// Remove and return everything due at or before `now_ms`, oldest first.
    pub fn pop_due(&mut self, now_ms: u64) -> Vec<(u64, ScheduledKind)> {
        let mut fired = Vec::new();
        while let Some(Reverse((at_ms, id))) = self.due.peek().copied() {
            if at_ms > now_ms {
                break;
            }
            self.due.pop();
            if let Some(kind) = self.payloads.remove(&id) {
                fired.push((id, kind));
            }
        }
        fired
    }

    /// Events still waiting to fire.
    pub fn pending(&self) -> usize {
        self.payloads.len()
    }
}
