// A lazy-deletion min-heap index over entry ids keyed by next_fire_time.
//
// Entries' actual state lives in the engine's map; the heap only orders ids.
// When an entry's next_fire_time changes (rescheduled, paused, removed) the
// old heap slot is left in place and discarded on pop if it no longer
// matches the entry's current next_fire_time ("stale" check below) — the
// usual trick for a priority queue whose keys mutate in place.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use chrono::{DateTime, Utc};

#[derive(Eq, PartialEq)]
struct HeapKey {
    fire_time: DateTime<Utc>,
    id: String,
}

impl Ord for HeapKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.fire_time.cmp(&other.fire_time).then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for HeapKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Default)]
pub struct FireTimeIndex {
    heap: BinaryHeap<Reverse<HeapKey>>,
}

impl FireTimeIndex {
    pub fn new() -> Self {
        FireTimeIndex {
            heap: BinaryHeap::new(),
        }
    }

    pub fn push(&mut self, id: String, fire_time: DateTime<Utc>) {
        self.heap.push(Reverse(HeapKey { fire_time, id }));
    }

    pub fn peek_time(&self) -> Option<DateTime<Utc>> {
        self.heap.peek().map(|Reverse(k)| k.fire_time)
    }

    /// Pops the next candidate id/time pair without checking staleness;
    /// callers must verify it still matches the entry's live state.
    pub fn pop(&mut self) -> Option<(String, DateTime<Utc>)> {
        self.heap.pop().map(|Reverse(k)| (k.id, k.fire_time))
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn pops_in_ascending_fire_time_order() {
        let mut index = FireTimeIndex::new();
        let now = Utc::now();
        index.push("b".into(), now + Duration::seconds(5));
        index.push("a".into(), now + Duration::seconds(1));
        index.push("c".into(), now + Duration::seconds(10));

        assert_eq!(index.pop().unwrap().0, "a");
        assert_eq!(index.pop().unwrap().0, "b");
        assert_eq!(index.pop().unwrap().0, "c");
        assert!(index.pop().is_none());
    }
}
