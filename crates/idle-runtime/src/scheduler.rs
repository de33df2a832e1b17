//! Virtual-clock timer queue.
//!
//! Every deferred action in the game (production tick, event roll, effect
//! expiry, mini-game windows, debounced save) is a single-shot entry in this
//! queue. Intervals re-arm themselves when they fire. Tests drive the clock
//! explicitly, the CLI maps it onto wall time.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, BinaryHeap};

/// Handle returned by [`Scheduler::schedule`], used to cancel the entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Entry<E> {
    due_ms: u64,
    id: TimerId,
    event: E,
}

// Ordering: (due_ms ASC, id ASC); ids grow monotonically so ties fire in
// scheduling order.
impl<E> PartialEq for Entry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.due_ms == other.due_ms && self.id == other.id
    }
}

impl<E> Eq for Entry<E> {}

impl<E> PartialOrd for Entry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Entry<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due_ms
            .cmp(&other.due_ms)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Cancelled entries tolerated in the heap beyond twice the armed count.
const COMPACT_SLACK: usize = 64;

/// Single-shot timers on a millisecond virtual clock.
#[derive(Debug)]
pub struct Scheduler<E> {
    now_ms: u64,
    next_id: u64,
    queue: BinaryHeap<Reverse<Entry<E>>>,
    /// Ids still armed. Cancelled entries stay in the heap and are skipped on pop.
    live: BTreeSet<TimerId>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_id: 0,
            queue: BinaryHeap::new(),
            live: BTreeSet::new(),
        }
    }

    /// Current virtual time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Arm `event` to fire `delay_ms` from now.
    pub fn schedule(&mut self, delay_ms: u64, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.live.insert(id);
        self.queue.push(Reverse(Entry {
            due_ms: self.now_ms.saturating_add(delay_ms),
            id,
            event,
        }));
        id
    }

    /// Disarm a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        if !self.live.remove(&id) {
            return false;
        }
        self.drop_stale_head();
        if self.queue.len() > COMPACT_SLACK + 2 * self.live.len() {
            let live = &self.live;
            self.queue.retain(|Reverse(entry)| live.contains(&entry.id));
        }
        true
    }

    fn drop_stale_head(&mut self) {
        while let Some(Reverse(head)) = self.queue.peek() {
            if self.live.contains(&head.id) {
                break;
            }
            self.queue.pop();
        }
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.live.contains(&id)
    }

    /// Number of armed timers.
    pub fn pending(&self) -> usize {
        self.live.len()
    }

    /// Pop the next armed entry due at or before `until_ms`, advancing the
    /// clock to its due time.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(TimerId, E)> {
        loop {
            let due_ms = self.queue.peek()?.0.due_ms;
            if due_ms > until_ms {
                return None;
            }
            let Reverse(entry) = self.queue.pop()?;
            if !self.live.remove(&entry.id) {
                continue;
            }
            if entry.due_ms > self.now_ms {
                self.now_ms = entry.due_ms;
            }
            return Some((entry.id, entry.event));
        }
    }

    /// Move the clock forward without firing anything.
    pub fn advance_to(&mut self, ms: u64) {
        if ms > self.now_ms {
            self.now_ms = ms;
        }
    }

    /// Drop every timer. The clock keeps its value.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.live.clear();
    }
}
