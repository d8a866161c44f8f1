//! History entries and their fingerprints.

use serde::{Deserialize, Serialize};

/// Seconds a bigram-boosted candidate counts as "fresh" for scoring.
pub(crate) const BIGRAM_BOOST_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EntryType {
    #[default]
    Default,
    /// Sentinel recording a clear-all-history event.
    CleanAllEvent,
    /// Sentinel recording a clear-unused-history event.
    CleanUnusedEvent,
}

/// One learned (reading, surface) pair plus its n-gram links. Links are
/// fingerprints of follower entries; a link whose target was evicted
/// simply fails to resolve at lookup time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    pub value: String,
    pub description: String,
    pub entry_type: EntryType,
    /// Unix seconds of the last commit or prediction hit.
    pub last_access_time: u64,
    pub suggestion_freq: u32,
    pub conversion_freq: u32,
    /// Set when the entry was committed right after its predecessor, so
    /// chained prediction may rank it as if it were recent.
    pub bigram_boost: bool,
    /// Fingerprints of entries that followed this one.
    pub next_entries: Vec<u32>,
    /// Tombstone: kept so the user's deletion survives re-learning, but
    /// never surfaced.
    pub removed: bool,
}

impl Entry {
    pub(crate) fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    pub(crate) fn add_next_entry(&mut self, fp: u32, limit: usize) {
        if self.next_entries.contains(&fp) {
            return;
        }
        if self.next_entries.len() >= limit {
            self.next_entries.remove(0);
        }
        self.next_entries.push(fp);
    }

    pub(crate) fn remove_next_entry(&mut self, fp: u32) {
        self.next_entries.retain(|&f| f != fp);
    }
}

/// Fingerprint of a (key, value) pair. Entry identity everywhere: the
/// cache key, n-gram links, and revert bookkeeping.
pub fn fingerprint(key: &str, value: &str) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(key.as_bytes());
    hasher.update(&[0xff]);
    hasher.update(value.as_bytes());
    hasher.finalize()
}

/// Fingerprint of a whole entry. Identical to `fingerprint(key, value)`
/// for regular entries; event sentinels hash their type in so they never
/// collide with learned text.
pub fn entry_fingerprint(entry: &Entry) -> u32 {
    match entry.entry_type {
        EntryType::Default => fingerprint(&entry.key, &entry.value),
        EntryType::CleanAllEvent | EntryType::CleanUnusedEvent => {
            let mut hasher = crc32fast::Hasher::new();
            hasher.update(entry.key.as_bytes());
            hasher.update(&[0xff]);
            hasher.update(entry.value.as_bytes());
            hasher.update(&[0xfe, entry.entry_type as u8]);
            hasher.finalize()
        }
    }
}
