//! Priority queue collecting prediction results.

use std::collections::{BinaryHeap, HashSet};

use super::entry::{fingerprint, Entry, BIGRAM_BOOST_SECS};

/// Ranking score: recency first, shorter surfaces win ties, and a bigram
/// boost counts as a week of freshness.
pub(crate) fn entry_score(entry: &Entry) -> i64 {
    let mut score = entry.last_access_time as i64 - entry.char_len() as i64;
    if entry.bigram_boost {
        score += BIGRAM_BOOST_SECS as i64;
    }
    score
}

#[derive(PartialEq, Eq)]
struct Scored {
    score: i64,
    /// Tie-break so ordering is deterministic; lower insertion order wins.
    order: std::cmp::Reverse<usize>,
    index: usize,
}

impl Ord for Scored {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.score, &self.order).cmp(&(other.score, &other.order))
    }
}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Max-heap of entries deduplicated by (key, value) fingerprint.
#[derive(Default)]
pub(crate) struct EntryPriorityQueue {
    pool: Vec<Option<Entry>>,
    heap: BinaryHeap<Scored>,
    seen: HashSet<u32>,
}

impl EntryPriorityQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn size(&self) -> usize {
        self.heap.len()
    }

    /// Add an entry; duplicates of an already-queued (key, value) are
    /// dropped and reported as `false`.
    pub(crate) fn push(&mut self, entry: Entry) -> bool {
        let fp = fingerprint(&entry.key, &entry.value);
        if !self.seen.insert(fp) {
            return false;
        }
        let score = entry_score(&entry);
        let index = self.pool.len();
        self.pool.push(Some(entry));
        self.heap.push(Scored {
            score,
            order: std::cmp::Reverse(index),
            index,
        });
        true
    }

    /// Remove and return the highest-scored entry.
    pub(crate) fn pop(&mut self) -> Option<Entry> {
        let scored = self.heap.pop()?;
        self.pool.get_mut(scored.index).and_then(Option::take)
    }
}
