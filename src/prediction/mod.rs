//! History-based prediction: learns committed conversions and suggests
//! them back, chained through n-gram links.
//!
//! Entries live in a fingerprint-keyed LRU cache and are persisted
//! through [`storage::UserHistoryStorage`] by a background syncer
//! thread. All collaborators (dictionary, suppression list, clock) are
//! injected, so the predictor itself holds no global state.

pub mod entry;
mod queue;
pub mod storage;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::base::clock::Clock;
use crate::base::japanese;
use crate::base::number_util;
use crate::config::{Config, HistoryLearningLevel, PreeditMethod, Request, RequestType};
use crate::dict::{DictionaryInterface, SuppressionDictionary};
use crate::segments::{Candidate, CandidateSource, Segments};

pub use entry::{entry_fingerprint, fingerprint, Entry, EntryType};
pub use storage::StorageError;

use queue::EntryPriorityQueue;

/// Cache capacity; least-recently-used entries fall off.
const MAX_ENTRIES: usize = 10_000;
/// How many cache entries one lookup scans, newest first.
const MAX_LRU_SCAN: usize = 1_000;
/// Follower links kept per entry.
const MAX_NEXT_ENTRIES: usize = 4;
/// How deep follower chains are walked for completion and deletion.
const MAX_NGRAM_CHAIN: usize = 3;
/// Entries untouched for this long are dropped at sync time.
const ENTRY_LIFETIME_SECS: u64 = 62 * 24 * 60 * 60;

/// "Did you mean" annotation for fuzzy-romaji recoveries.
const ROMAN_FUZZY_DESCRIPTION: &str = "もしかして";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MatchType {
    NoMatch,
    /// `entry_key` extends the input; usable as-is.
    LeftPrefix,
    /// The input extends `entry_key`; followers may complete it.
    RightPrefix,
    Exact,
}

pub(crate) fn get_match_type(input_key: &str, entry_key: &str) -> MatchType {
    if input_key.is_empty() || entry_key.is_empty() {
        return MatchType::NoMatch;
    }
    if input_key == entry_key {
        return MatchType::Exact;
    }
    if entry_key.starts_with(input_key) {
        return MatchType::LeftPrefix;
    }
    if input_key.starts_with(entry_key) {
        return MatchType::RightPrefix;
    }
    MatchType::NoMatch
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RemoveNgramChainResult {
    /// A link somewhere below was cut.
    Done,
    /// This node is the chain tail; the caller must cut its link.
    Tail,
    NotFound,
}

/// Fingerprint-keyed LRU cache. Recency drives both eviction and the
/// scan order of lookups.
#[derive(Default)]
struct EntryCache {
    map: HashMap<u32, Entry>,
    /// Front = most recently used.
    recency: Vec<u32>,
}

impl EntryCache {
    fn len(&self) -> usize {
        self.map.len()
    }

    fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn get(&self, fp: u32) -> Option<&Entry> {
        self.map.get(&fp)
    }

    fn get_mut(&mut self, fp: u32) -> Option<&mut Entry> {
        self.map.get_mut(&fp)
    }

    fn touch(&mut self, fp: u32) {
        if let Some(pos) = self.recency.iter().position(|&f| f == fp) {
            self.recency.remove(pos);
        }
        self.recency.insert(0, fp);
    }

    fn insert(&mut self, fp: u32, entry: Entry) {
        self.map.insert(fp, entry);
        self.touch(fp);
        while self.map.len() > MAX_ENTRIES {
            if let Some(oldest) = self.recency.pop() {
                self.map.remove(&oldest);
            } else {
                break;
            }
        }
    }

    fn remove(&mut self, fp: u32) -> Option<Entry> {
        if let Some(pos) = self.recency.iter().position(|&f| f == fp) {
            self.recency.remove(pos);
        }
        self.map.remove(&fp)
    }

    fn clear(&mut self) {
        self.map.clear();
        self.recency.clear();
    }

    fn retain<F: FnMut(&Entry) -> bool>(&mut self, mut keep: F) {
        let map = &mut self.map;
        map.retain(|_, e| keep(e));
        self.recency.retain(|fp| map.contains_key(fp));
    }

    /// Iterate newest first.
    fn iter_mru(&self) -> impl Iterator<Item = (u32, &Entry)> {
        self.recency
            .iter()
            .filter_map(|fp| self.map.get(fp).map(|e| (*fp, e)))
    }
}

pub struct UserHistoryPredictor {
    dictionary: Arc<dyn DictionaryInterface + Send + Sync>,
    suppression_dictionary: Arc<SuppressionDictionary>,
    clock: Arc<dyn Clock + Send + Sync>,
    path: PathBuf,
    dic: EntryCache,
    /// (fingerprint, existed before) per entry touched by the last
    /// finish, for revert.
    last_committed: Vec<(u32, bool)>,
    /// Commits arriving from a zero-query suggestion; telemetry only.
    num_zero_query_commits: usize,
    updated: bool,
    syncer: Option<JoinHandle<()>>,
}

impl UserHistoryPredictor {
    /// Load the history at `path`; a missing or unreadable file starts
    /// empty.
    pub fn new(
        dictionary: Arc<dyn DictionaryInterface + Send + Sync>,
        suppression_dictionary: Arc<SuppressionDictionary>,
        clock: Arc<dyn Clock + Send + Sync>,
        path: PathBuf,
    ) -> Self {
        let mut dic = EntryCache::default();
        match storage::UserHistoryStorage::open(&path) {
            Ok(loaded) => {
                // Saved newest-first; inserting in reverse restores the
                // recency order.
                for e in loaded.entries.into_iter().rev() {
                    let fp = entry_fingerprint(&e);
                    dic.insert(fp, e);
                }
                info!(entries = dic.len(), "user history loaded");
            }
            Err(e) => warn!(error = %e, "user history unreadable; starting empty"),
        }
        Self {
            dictionary,
            suppression_dictionary,
            clock,
            path,
            dic,
            last_committed: Vec::new(),
            num_zero_query_commits: 0,
            updated: false,
            syncer: None,
        }
    }

    pub fn num_zero_query_commits(&self) -> usize {
        self.num_zero_query_commits
    }

    // ---------------------------------------------------------------
    // Prediction

    /// Fill the first conversion segment with history candidates.
    /// Returns true when any candidate was added.
    pub fn predict(&mut self, config: &Config, request: &Request, segments: &mut Segments) -> bool {
        self.predict_with_expansion(config, request, segments, &[])
    }

    /// Like [`predict`](Self::predict), with alternative readings of the
    /// input (from the composer's trailing-key expansion) looked up as
    /// well.
    pub fn predict_with_expansion(
        &mut self,
        config: &Config,
        request: &Request,
        segments: &mut Segments,
        alt_keys: &[String],
    ) -> bool {
        if config.history_learning_level == HistoryLearningLevel::NoHistory {
            return false;
        }
        if self.dic.is_empty() || segments.conversion_segments_size() == 0 {
            return false;
        }
        let input_key = segments.conversion_segments()[0].key.clone();

        let mut results = EntryPriorityQueue::new();
        let zero_query = input_key.is_empty();
        if zero_query {
            if !request.zero_query_suggestion {
                return false;
            }
            self.lookup_zero_query(segments, &mut results);
        } else {
            self.lookup(config, request, &input_key, alt_keys, segments, &mut results);
        }
        if results.size() == 0 {
            return false;
        }

        let max_size = if zero_query {
            request.max_user_history_prediction_candidates_size_for_zero_query
        } else {
            request.max_user_history_prediction_candidates_size
        };
        let input_len = input_key.chars().count();
        let is_suggestion = request.request_type == RequestType::Suggestion;

        let mut added = 0;
        while added < max_size {
            let Some(result) = results.pop() else {
                break;
            };
            if is_suggestion
                && !is_valid_suggestion(zero_query, request.mixed_conversion, input_len, &result)
            {
                continue;
            }
            let Some(segment) = segments.mut_conversion_segments().first_mut() else {
                break;
            };
            debug!(key = %result.key, value = %result.value, "history candidate");
            segment.add_candidate(Candidate {
                key: result.key,
                value: result.value,
                description: result.description,
                source: CandidateSource::UserHistoryPredictor,
            });
            added += 1;
        }
        added > 0
    }

    fn lookup(
        &self,
        config: &Config,
        request: &Request,
        input_key: &str,
        alt_keys: &[String],
        segments: &Segments,
        results: &mut EntryPriorityQueue,
    ) {
        // Followers of the committed context get the bigram boost.
        let context_followers: Vec<u32> = segments
            .history_segments()
            .last()
            .and_then(|h| {
                self.dic
                    .get(fingerprint(&h.key, h.committed_value()))
                    .map(|e| e.next_entries.clone())
            })
            .unwrap_or_default();

        let roman_input = if config.preedit_method == PreeditMethod::Romaji
            && maybe_roman_misspelled_key(input_key)
        {
            Some(japanese::hiragana_to_romaji(input_key))
        } else {
            None
        };

        for (fp, entry) in self.dic.iter_mru().take(MAX_LRU_SCAN) {
            if !self.is_valid_entry(entry) {
                continue;
            }
            let boosted = context_followers.contains(&fp);
            match self.match_against(
                input_key,
                alt_keys,
                entry,
                request.kana_modifier_insensitive_conversion,
            ) {
                MatchType::Exact | MatchType::LeftPrefix => {
                    let mut result = entry.clone();
                    result.bigram_boost |= boosted;
                    results.push(result);
                }
                MatchType::RightPrefix => {
                    self.push_chain_completions(input_key, entry, boosted, results);
                }
                MatchType::NoMatch => {
                    if let Some(roman_input) = &roman_input {
                        let entry_roman = japanese::hiragana_to_romaji(&entry.key);
                        if roman_fuzzy_prefix_match(&entry_roman, roman_input) {
                            let mut result = entry.clone();
                            if result.description.is_empty() {
                                result.description = ROMAN_FUZZY_DESCRIPTION.to_string();
                            }
                            results.push(result);
                        }
                    }
                }
            }
        }
    }

    /// With expansion keys present the entry must cover one of them; the
    /// bare base would also match readings the trailing keys already
    /// ruled out. Under kana-modifier-insensitive matching, a 12-key host
    /// emits the base kana before the modifier taps, so keys that agree
    /// after folding voicing marks and small kana also count as a prefix.
    fn match_against(
        &self,
        input_key: &str,
        alt_keys: &[String],
        entry: &Entry,
        kana_modifier_insensitive: bool,
    ) -> MatchType {
        let match_keys = |input: &str, key: &str| {
            let found = get_match_type(input, key);
            if found != MatchType::NoMatch || !kana_modifier_insensitive {
                return found;
            }
            match get_match_type(
                &japanese::normalize_kana_modifiers(input),
                &japanese::normalize_kana_modifiers(key),
            ) {
                MatchType::Exact | MatchType::LeftPrefix => MatchType::LeftPrefix,
                _ => MatchType::NoMatch,
            }
        };
        if alt_keys.is_empty() {
            return match_keys(input_key, &entry.key);
        }
        for alt in alt_keys {
            match match_keys(alt, &entry.key) {
                MatchType::Exact | MatchType::LeftPrefix => return MatchType::LeftPrefix,
                _ => {}
            }
        }
        MatchType::NoMatch
    }

    /// The entry's key is a prefix of the input; walk follower links to
    /// synthesize completions covering the whole input.
    fn push_chain_completions(
        &self,
        input_key: &str,
        head: &Entry,
        boosted: bool,
        results: &mut EntryPriorityQueue,
    ) {
        let mut stack: Vec<(String, String, Vec<u32>, usize)> = vec![(
            head.key.clone(),
            head.value.clone(),
            head.next_entries.clone(),
            0,
        )];
        while let Some((key_acc, value_acc, followers, depth)) = stack.pop() {
            if depth >= MAX_NGRAM_CHAIN {
                continue;
            }
            for nfp in followers {
                let Some(follower) = self.dic.get(nfp) else {
                    continue;
                };
                if !self.is_valid_entry(follower) {
                    continue;
                }
                let key = format!("{key_acc}{}", follower.key);
                let value = format!("{value_acc}{}", follower.value);
                match get_match_type(input_key, &key) {
                    MatchType::Exact | MatchType::LeftPrefix => {
                        results.push(Entry {
                            key,
                            value,
                            description: String::new(),
                            last_access_time: head.last_access_time,
                            bigram_boost: boosted || head.bigram_boost,
                            ..Entry::default()
                        });
                    }
                    MatchType::RightPrefix => {
                        stack.push((key, value, follower.next_entries.clone(), depth + 1));
                    }
                    MatchType::NoMatch => {}
                }
            }
        }
    }

    /// Zero-query: followers of the most recent committed segment.
    fn lookup_zero_query(&self, segments: &Segments, results: &mut EntryPriorityQueue) {
        let Some(history) = segments.history_segments().last() else {
            return;
        };
        let fp = fingerprint(&history.key, history.committed_value());
        let Some(prev) = self.dic.get(fp) else {
            return;
        };
        for &nfp in &prev.next_entries {
            let Some(follower) = self.dic.get(nfp) else {
                continue;
            };
            if !self.is_valid_entry(follower) {
                continue;
            }
            let mut result = follower.clone();
            result.bigram_boost = true;
            results.push(result);
        }
    }

    fn is_valid_entry(&self, entry: &Entry) -> bool {
        !entry.removed
            && entry.entry_type == EntryType::Default
            && !entry.value.is_empty()
            && !contains_private_use(&entry.value)
            && !self
                .suppression_dictionary
                .suppress_entry(&entry.key, &entry.value)
    }

    // ---------------------------------------------------------------
    // Learning

    /// Learn a committed conversion: one entry per segment, follower
    /// links between neighbors, and a whole-sentence entry for
    /// multi-segment commits.
    pub fn finish(&mut self, config: &Config, request: &Request, segments: &mut Segments) {
        if config.history_learning_level != HistoryLearningLevel::DefaultHistory {
            return;
        }
        if self.is_privacy_sensitive(segments) {
            debug!("privacy sensitive commit; not learned");
            return;
        }
        let now = self.clock.now_secs();
        self.last_committed.clear();

        // Committed context, if its entry is still cached.
        let mut prev_fp: Option<u32> = segments
            .history_segments()
            .last()
            .map(|h| fingerprint(&h.key, h.committed_value()))
            .filter(|fp| self.dic.get(*fp).is_some());

        let mut whole_key = String::new();
        let mut whole_value = String::new();
        let mut learned_segments = 0;

        // A commit with no reading at all came from a zero-query
        // suggestion; there is nothing to learn but the event is counted.
        self.num_zero_query_commits += segments
            .conversion_segments()
            .iter()
            .filter(|s| {
                s.key.is_empty()
                    && s.candidate(0)
                        .is_some_and(|c| c.key.is_empty() && !c.value.is_empty())
            })
            .count();

        let pairs: Vec<(String, String, String)> = segments
            .conversion_segments()
            .iter()
            .filter_map(|segment| {
                let candidate = segment.candidate(0)?;
                let key = if candidate.key.is_empty() {
                    segment.key.clone()
                } else {
                    candidate.key.clone()
                };
                (!key.is_empty() && !candidate.value.is_empty()).then(|| {
                    (key, candidate.value.clone(), candidate.description.clone())
                })
            })
            .collect();

        for (key, value, description) in &pairs {
            let is_punct = is_punctuation_value(value);
            if is_punct && prev_fp.is_none() {
                // Leading punctuation never starts a chain.
                continue;
            }
            let fp = self.insert_entry(key, value, description, request.request_type, now);
            if let Some(pfp) = prev_fp {
                if let Some(prev) = self.dic.get_mut(pfp) {
                    prev.add_next_entry(fp, MAX_NEXT_ENTRIES);
                }
            }
            // Punctuation closes the chain; the next word starts fresh.
            prev_fp = (!is_punct).then_some(fp);
            whole_key.push_str(key);
            whole_value.push_str(value);
            learned_segments += 1;
        }

        if learned_segments > 1 {
            self.insert_entry(&whole_key, &whole_value, "", request.request_type, now);
        }
        if learned_segments > 0 {
            self.updated = true;
        }
    }

    fn insert_entry(
        &mut self,
        key: &str,
        value: &str,
        description: &str,
        request_type: RequestType,
        now: u64,
    ) -> u32 {
        let fp = fingerprint(key, value);
        let existed = self.dic.get(fp).is_some();
        if !existed {
            self.dic.insert(
                fp,
                Entry {
                    key: key.to_string(),
                    value: value.to_string(),
                    ..Entry::default()
                },
            );
        }
        if let Some(entry) = self.dic.get_mut(fp) {
            entry.removed = false;
            entry.last_access_time = now;
            if !description.is_empty() {
                entry.description = description.to_string();
            }
            match request_type {
                RequestType::Conversion => entry.conversion_freq += 1,
                RequestType::Suggestion | RequestType::Prediction => entry.suggestion_freq += 1,
            }
        }
        self.dic.touch(fp);
        self.last_committed.push((fp, existed));
        fp
    }

    /// Undo the learning done by the last [`finish`](Self::finish).
    pub fn revert(&mut self) {
        let reverted: Vec<(u32, bool)> = std::mem::take(&mut self.last_committed);
        for (fp, existed) in reverted.into_iter().rev() {
            if existed {
                if let Some(entry) = self.dic.get_mut(fp) {
                    entry.suggestion_freq = entry.suggestion_freq.saturating_sub(1);
                }
            } else {
                self.dic.remove(fp);
            }
        }
        self.updated = true;
    }

    // ---------------------------------------------------------------
    // Deletion

    /// Wipe the whole history, leaving a sentinel recording the event.
    pub fn clear_all_history(&mut self) {
        self.dic.clear();
        self.insert_event(EntryType::CleanAllEvent);
        self.updated = true;
        info!("user history cleared");
    }

    /// Drop entries that were never used: suggestion and conversion
    /// frequency both zero.
    pub fn clear_unused_history(&mut self) {
        self.dic.retain(|e| {
            e.entry_type != EntryType::Default
                || e.suggestion_freq > 0
                || e.conversion_freq > 0
        });
        self.insert_event(EntryType::CleanUnusedEvent);
        self.updated = true;
    }

    fn insert_event(&mut self, entry_type: EntryType) {
        let event = Entry {
            entry_type,
            last_access_time: self.clock.now_secs(),
            ..Entry::default()
        };
        let fp = entry_fingerprint(&event);
        self.dic.insert(fp, event);
    }

    /// Remove one learned (key, value) pair: tombstone the exact entry
    /// and cut every follower chain that spells it out. Returns true if
    /// anything was deleted.
    pub fn clear_history_entry(&mut self, key: &str, value: &str) -> bool {
        let mut deleted = false;

        if let Some(entry) = self.dic.get_mut(fingerprint(key, value)) {
            if !entry.removed {
                entry.removed = true;
                deleted = true;
            }
        }

        // Heads whose key/value open the target may start a chain that
        // concatenates to it.
        let heads: Vec<u32> = self
            .dic
            .iter_mru()
            .filter(|(_, e)| {
                e.entry_type == EntryType::Default
                    && e.key.len() < key.len()
                    && key.starts_with(e.key.as_str())
                    && value.starts_with(e.value.as_str())
            })
            .map(|(fp, _)| fp)
            .collect();
        for head in heads {
            if self.remove_ngram_chain(head, key, value, "", "", 0) == RemoveNgramChainResult::Done
            {
                deleted = true;
            }
        }

        if deleted {
            self.updated = true;
        }
        deleted
    }

    fn remove_ngram_chain(
        &mut self,
        fp: u32,
        target_key: &str,
        target_value: &str,
        key_acc: &str,
        value_acc: &str,
        depth: usize,
    ) -> RemoveNgramChainResult {
        let Some(entry) = self.dic.get(fp) else {
            return RemoveNgramChainResult::NotFound;
        };
        let key = format!("{key_acc}{}", entry.key);
        let value = format!("{value_acc}{}", entry.value);
        if key == target_key && value == target_value {
            return RemoveNgramChainResult::Tail;
        }
        if !target_key.starts_with(&key) || !target_value.starts_with(&value) {
            return RemoveNgramChainResult::NotFound;
        }
        if depth >= MAX_NGRAM_CHAIN {
            return RemoveNgramChainResult::NotFound;
        }
        let followers = entry.next_entries.clone();
        let mut result = RemoveNgramChainResult::NotFound;
        for nfp in followers {
            match self.remove_ngram_chain(nfp, target_key, target_value, &key, &value, depth + 1) {
                RemoveNgramChainResult::Tail => {
                    if let Some(entry) = self.dic.get_mut(fp) {
                        entry.remove_next_entry(nfp);
                    }
                    result = RemoveNgramChainResult::Done;
                }
                RemoveNgramChainResult::Done => result = RemoveNgramChainResult::Done,
                RemoveNgramChainResult::NotFound => {}
            }
        }
        result
    }

    // ---------------------------------------------------------------
    // Privacy

    /// A committed value that is one bare number is likely a PIN or
    /// similar secret, unless the dictionary knows the surface. Commits
    /// split across segments are not caught; the boundary already blurs
    /// what the number meant.
    fn is_privacy_sensitive(&self, segments: &Segments) -> bool {
        let conversion = segments.conversion_segments();
        if conversion.len() != 1 {
            return false;
        }
        let Some(candidate) = conversion[0].candidate(0) else {
            return false;
        };
        let value = &candidate.value;
        if !number_util::is_arabic_number(value) {
            return false;
        }
        !self.dictionary.has_value(value)
    }

    // ---------------------------------------------------------------
    // Persistence

    pub fn entries_size(&self) -> usize {
        self.dic.len()
    }

    /// Prune expired entries and write a snapshot from a background
    /// thread. A no-op when nothing changed since the last sync.
    pub fn sync(&mut self) -> Result<(), StorageError> {
        self.wait_for_syncer();
        if !self.updated {
            return Ok(());
        }
        let cutoff = self.clock.now_secs().saturating_sub(ENTRY_LIFETIME_SECS);
        self.dic.retain(|e| e.last_access_time >= cutoff);

        let entries: Vec<Entry> = self.dic.iter_mru().map(|(_, e)| e.clone()).collect();
        let snapshot = storage::UserHistoryStorage::new(entries);
        let path = self.path.clone();
        self.syncer = Some(thread::spawn(move || {
            if let Err(e) = snapshot.save(&path) {
                warn!(error = %e, "user history sync failed");
            }
        }));
        self.updated = false;
        Ok(())
    }

    /// Block until the in-flight sync, if any, has finished.
    pub fn wait_for_syncer(&mut self) {
        if let Some(handle) = self.syncer.take() {
            if handle.join().is_err() {
                warn!("user history syncer panicked");
            }
        }
    }
}

impl Drop for UserHistoryPredictor {
    fn drop(&mut self) {
        self.wait_for_syncer();
    }
}

/// Suggestion gate: boosted and zero-query results always pass, as does
/// everything under mixed conversion, where suggestions surface from the
/// first key; others need the input to be long enough for how often the
/// entry was used.
fn is_valid_suggestion(
    zero_query: bool,
    mixed_conversion: bool,
    input_len: usize,
    entry: &Entry,
) -> bool {
    if entry.bigram_boost || zero_query || mixed_conversion {
        return true;
    }
    let freq = entry.suggestion_freq.max(entry.conversion_freq / 4) as usize;
    let required = 3usize.saturating_sub(freq.min(2));
    input_len >= required
}

/// Values carrying private-use codepoints (legacy vendor symbol
/// encodings, or a table sentinel that leaked into a commit) render
/// differently on every host; never surface them.
fn contains_private_use(value: &str) -> bool {
    value.chars().any(|c| ('\u{E000}'..='\u{F8FF}').contains(&c))
}

fn is_punctuation_value(value: &str) -> bool {
    !value.is_empty()
        && value.chars().all(|c| {
            matches!(c, '。' | '、' | '！' | '？' | '．' | '，' | '.' | ',' | '!' | '?')
        })
}

/// Whether the key looks like a romaji misspelling: hiragana with exactly
/// one stray ASCII char, or pure ASCII.
pub(crate) fn maybe_roman_misspelled_key(key: &str) -> bool {
    let mut hiragana = 0;
    let mut ascii = 0;
    let mut unknown = 0;
    for c in key.chars() {
        if japanese::is_hiragana(c) || c == 'ー' {
            hiragana += 1;
        } else if c.is_ascii() {
            ascii += 1;
        } else {
            unknown += 1;
        }
    }
    (hiragana > 0 && ascii == 1 && unknown == 0) || (hiragana == 0 && ascii > 0 && unknown == 0)
}

/// Prefix match allowing exactly one typo: a transposed pair, a dropped
/// char, or something typed where a prolonged sound mark belongs. An
/// exact prefix returns false; no correction was needed.
pub(crate) fn roman_fuzzy_prefix_match(s: &str, prefix: &str) -> bool {
    let s: Vec<char> = s.chars().collect();
    let p: Vec<char> = prefix.chars().collect();
    if p.is_empty() || p.len() > s.len() {
        return false;
    }
    for i in 0..p.len() {
        if s[i] == p[i] {
            continue;
        }
        // Transposed neighbors: "simasu" vs "simaus".
        if i + 1 < p.len() && i + 1 < s.len() && s[i] == p[i + 1] && s[i + 1] == p[i] {
            return p[i + 2..] == s[i + 2..i + 2 + (p.len() - i - 2)];
        }
        // Something typed over a prolonged sound mark: "gu-guru" vs "guxguru".
        if s[i] == '-' {
            return p[i + 1..] == s[i + 1..p.len()];
        }
        // One char dropped from the prefix: "desu" vs "dsu".
        return p.len() < s.len() && p[i..] == s[i + 1..=p.len()];
    }
    false
}
