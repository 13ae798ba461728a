//! Cooperative timer queue
//!
//! Single-threaded: units of work are queued with a wake time on a virtual
//! millisecond clock and popped one at a time in (wake time, insertion) order.
//! A unit runs to completion before the next one starts.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Outcome of one tick of a walk unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Suspend and wake again after this many milliseconds
    Sleep(u64),
    /// Terminal; do not reschedule
    Done,
}

struct Entry<T> {
    wake_at: u64,
    seq: u64,
    item: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.wake_at == other.wake_at && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    // Reversed so BinaryHeap pops the earliest entry first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .wake_at
            .cmp(&self.wake_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Timer queue over a virtual clock
pub struct Scheduler<T> {
    now: u64,
    next_seq: u64,
    queue: BinaryHeap<Entry<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_seq: 0,
            queue: BinaryHeap::new(),
        }
    }

    /// Current virtual time (ms)
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Queue `item` to wake `delay_ms` from now
    pub fn schedule(&mut self, delay_ms: u64, item: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Entry {
            wake_at: self.now.saturating_add(delay_ms),
            seq,
            item,
        });
    }

    /// Pop the earliest unit due at or before `until`, moving the clock to
    /// its wake time
    pub fn pop_due(&mut self, until: u64) -> Option<T> {
        if self.queue.peek()?.wake_at > until {
            return None;
        }
        let entry = self.queue.pop()?;
        self.now = self.now.max(entry.wake_at);
        Some(entry.item)
    }

    /// Move the clock forward once nothing else is due
    pub fn advance_to(&mut self, until: u64) {
        self.now = self.now.max(until);
    }

    /// Wake time of the earliest queued unit
    pub fn next_wake(&self) -> Option<u64> {
        self.queue.peek().map(|e| e.wake_at)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Count queued units matching a predicate
    pub fn count_where(&self, mut pred: impl FnMut(&T) -> bool) -> usize {
        self.queue.iter().filter(|e| pred(&e.item)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pops_in_time_order() {
        let mut sched = Scheduler::new();
        sched.schedule(30, "c");
        sched.schedule(10, "a");
        sched.schedule(20, "b");

        assert_eq!(sched.pop_due(100), Some("a"));
        assert_eq!(sched.now(), 10);
        assert_eq!(sched.pop_due(100), Some("b"));
        assert_eq!(sched.pop_due(100), Some("c"));
        assert_eq!(sched.now(), 30);
        assert_eq!(sched.pop_due(100), None);
    }

    #[test]
    fn test_same_time_is_fifo() {
        let mut sched = Scheduler::new();
        for i in 0..5 {
            sched.schedule(0, i);
        }
        let order: Vec<_> = std::iter::from_fn(|| sched.pop_due(0)).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_not_due_stays_queued() {
        let mut sched = Scheduler::new();
        sched.schedule(50, ());
        assert_eq!(sched.pop_due(49), None);
        assert_eq!(sched.len(), 1);

        sched.advance_to(49);
        assert_eq!(sched.now(), 49);
        assert_eq!(sched.next_wake(), Some(50));
        assert_eq!(sched.pop_due(50), Some(()));
        assert!(sched.is_empty());
    }

    #[test]
    fn test_delay_is_relative_to_clock() {
        let mut sched = Scheduler::new();
        sched.advance_to(1000);
        sched.schedule(5, 'x');
        assert_eq!(sched.next_wake(), Some(1005));
        // Clock never runs backwards
        sched.advance_to(10);
        assert_eq!(sched.now(), 1000);
    }
}
