//! Ordered chunk buffer and the keystroke-to-chunk state machine.
//!
//! Positions are in display chars. Insertion extends the open chunk
//! ending at the insertion point when the table allows it; otherwise the
//! open chunk's pending tail is resolved and a fresh chunk is opened.

use tracing::trace;

use super::chunk::Chunk;
use super::table::{self, Table, TableAttributes};
use super::transliteration::Transliteration;

/// One keystroke handed to the composition.
#[derive(Debug, Clone, Copy)]
pub(crate) struct InsertKey {
    /// The char fed to the table (style conversions already applied).
    pub(crate) ch: char,
    /// Transliteration form for a chunk this key opens.
    pub(crate) form: Transliteration,
    pub(crate) timestamp_msec: u64,
    /// Bypass the table and insert the char verbatim.
    pub(crate) as_is: bool,
    /// First keystroke after a commit or reset; a NEW_CHUNK rule for this
    /// key then refuses to extend the previous pending buffer.
    pub(crate) is_new_input: bool,
}

enum Extend {
    Consumed,
    Rejected,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Composition {
    chunks: Vec<Chunk>,
}

impl Composition {
    pub(crate) fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub(crate) fn len_chars(&self) -> usize {
        self.chunks.iter().map(Chunk::display_chars).sum()
    }

    pub(crate) fn clear(&mut self) {
        self.chunks.clear();
    }

    /// Insert one keystroke at display position `pos`; returns the new
    /// cursor position.
    pub(crate) fn insert_at(&mut self, table: &Table, pos: usize, key: InsertKey) -> usize {
        let total = self.len_chars();
        let pos = pos.min(total);
        if pos < total {
            self.split_boundary(pos);
        }
        let before = self.len_chars();
        let idx = self.chunk_count_before(pos);
        self.insert_into(table, idx, key);
        pos + self.len_chars() - before
    }

    fn insert_into(&mut self, table: &Table, idx: usize, key: InsertKey) {
        if key.as_is {
            let text = key.ch.to_string();
            self.chunks
                .insert(idx, Chunk::direct(&text, key.form, key.timestamp_msec));
            return;
        }

        // A NEW_CHUNK rule opens a fresh chunk for the first key after a
        // commit or reset; later presses of the same key may still cycle
        // the pending buffer.
        let forces_new = key.is_new_input
            && table
                .lookup(&key.ch.to_string())
                .map(|r| r.attributes.contains(TableAttributes::NEW_CHUNK))
                .unwrap_or(false);

        if idx > 0 {
            let open = self.chunks[idx - 1].is_open() && !self.chunks[idx - 1].is_fixed();
            if open && !forces_new {
                match Self::extend_chunk(table, &mut self.chunks[idx - 1], key) {
                    Extend::Consumed => return,
                    Extend::Rejected => {
                        Self::resolve_pending(table, &mut self.chunks[idx - 1]);
                    }
                }
            } else if open {
                Self::resolve_pending(table, &mut self.chunks[idx - 1]);
            }
        }

        let mut chunk = Chunk::new(key.form, key.timestamp_msec);
        if let Extend::Rejected = Self::extend_chunk(table, &mut chunk, key) {
            // No rule starts with this key; it passes through verbatim.
            chunk.raw.push(key.ch);
            chunk.converted.push(key.ch);
            chunk.seal();
        }
        if !chunk.is_empty() {
            self.chunks.insert(idx, chunk);
        }
        self.drop_empty();
    }

    /// Try to consume `key` in `chunk` by longest-prefix lookup of
    /// pending + key.
    fn extend_chunk(table: &Table, chunk: &mut Chunk, key: InsertKey) -> Extend {
        let mut candidate = chunk.pending.clone();
        candidate.push(key.ch);
        let cand_len = candidate.chars().count();
        let lookup = table.lookup_prefix(&candidate);

        if lookup.matched_len == cand_len {
            chunk.raw.push(key.ch);
            chunk.timestamp_msec = key.timestamp_msec;
            if lookup.has_longer {
                // A longer rule may still match; hold the keys unconverted.
                chunk.pending = candidate;
                return Extend::Consumed;
            }
            let rule = match lookup.rule {
                Some(rule) => rule,
                None => return Extend::Rejected,
            };
            trace!(input = %rule.input, output = %rule.output, "rule applied");
            chunk.converted.push_str(&rule.output);
            chunk.pending = rule.pending.clone();
            chunk.attributes = rule.attributes;
            if chunk.is_fixed() || rule.attributes.contains(TableAttributes::END_CHUNK) {
                chunk.seal();
            }
            return Extend::Consumed;
        }

        if lookup.has_longer {
            chunk.raw.push(key.ch);
            chunk.timestamp_msec = key.timestamp_msec;
            chunk.pending = candidate;
            return Extend::Consumed;
        }

        Extend::Rejected
    }

    /// Convert what remains of a pending buffer by repeated longest-prefix
    /// matching; unmatched chars pass through. Seals the chunk.
    fn resolve_pending(table: &Table, chunk: &mut Chunk) {
        let mut guard = 0;
        while !chunk.pending.is_empty() {
            guard += 1;
            if guard > 100 {
                let rest = table::strip_special_keys(&chunk.pending);
                chunk.converted.push_str(&rest);
                chunk.pending.clear();
                break;
            }
            let lookup = table.lookup_prefix(&chunk.pending);
            if lookup.matched_len > 0 {
                let rule = match lookup.rule {
                    Some(rule) => rule,
                    None => break,
                };
                let remainder: String =
                    chunk.pending.chars().skip(lookup.matched_len).collect();
                chunk.converted.push_str(&rule.output);
                chunk.pending = rule.pending.clone();
                chunk.pending.push_str(&remainder);
            } else {
                let mut chars = chunk.pending.chars();
                if let Some(first) = chars.next() {
                    if !matches!(
                        first,
                        table::TOGGLE_KEY | table::TIMEOUT_KEY | table::TOGGLED_KEY
                    ) {
                        chunk.converted.push(first);
                    }
                }
                chunk.pending = chars.collect();
            }
        }
        chunk.seal();
    }

    /// Whether the trailing pending buffer is cycling through toggle
    /// variants.
    pub(crate) fn is_toggleable(&self) -> bool {
        self.chunks
            .last()
            .map(|c| c.is_open() && c.pending.starts_with(table::TOGGLE_KEY))
            .unwrap_or(false)
    }

    /// Finish toggling on the trailing chunk: apply the timeout rule if
    /// one exists, otherwise mark the buffer toggled so the next press of
    /// the same key opens a new chunk. Plain (non-toggling) pending romaji
    /// is left untouched.
    pub(crate) fn stop_toggling(&mut self, table: &Table) {
        let Some(chunk) = self.chunks.last_mut() else {
            return;
        };
        if !chunk.is_open() || chunk.pending.is_empty() {
            return;
        }
        let mut key = chunk.pending.clone();
        key.push(table::TIMEOUT_KEY);
        if let Some(rule) = table.lookup(&key) {
            chunk.converted.push_str(&rule.output);
            chunk.pending = rule.pending.clone();
            chunk.attributes = rule.attributes;
            if chunk.is_fixed() {
                chunk.seal();
            }
        } else if chunk.pending.starts_with(table::TOGGLE_KEY) {
            let rest: String = chunk.pending.chars().skip(1).collect();
            chunk.pending = String::from(table::TOGGLED_KEY);
            chunk.pending.push_str(&rest);
        }
    }

    /// Timestamp of the last keystroke into the trailing chunk.
    pub(crate) fn last_timestamp_msec(&self) -> Option<u64> {
        self.chunks.last().map(|c| c.timestamp_msec)
    }

    pub(crate) fn delete_at(&mut self, pos: usize) -> bool {
        let Some((idx, offset)) = self.locate(pos) else {
            return false;
        };
        self.chunks[idx].delete_char(offset);
        self.drop_empty();
        true
    }

    /// Seal every chunk so the next keystroke opens a new one.
    pub(crate) fn seal_all(&mut self) {
        for chunk in &mut self.chunks {
            chunk.seal();
        }
    }

    /// Restamp all chunks with one output form.
    pub(crate) fn set_forms(&mut self, form: Transliteration) {
        for chunk in &mut self.chunks {
            chunk.form = form;
        }
    }

    /// Form of the chunk containing display char `pos`.
    pub(crate) fn form_at(&self, pos: usize) -> Option<Transliteration> {
        self.locate(pos).map(|(idx, _)| self.chunks[idx].form)
    }

    /// Render each chunk in its own stamped form.
    pub(crate) fn render_preedit(&self) -> String {
        self.chunks
            .iter()
            .map(|c| c.transliterate(c.form))
            .collect()
    }

    /// Render the whole buffer in one uniform form.
    pub(crate) fn render_form(&self, form: Transliteration) -> String {
        self.chunks.iter().map(|c| c.transliterate(form)).collect()
    }

    /// Render display chars `[pos, pos + len)` in one form. Chunks fully
    /// inside the range render whole; partial chunks contribute a char
    /// slice of their rendering when lengths line up, else of their
    /// content.
    pub(crate) fn render_range_form(
        &self,
        form: Transliteration,
        pos: usize,
        len: usize,
    ) -> String {
        let mut out = String::new();
        let mut start = 0;
        let end = pos + len;
        for chunk in &self.chunks {
            let clen = chunk.display_chars();
            let cstart = start;
            let cend = start + clen;
            start = cend;
            if cend <= pos || cstart >= end {
                continue;
            }
            if cstart >= pos && cend <= end {
                out.push_str(&chunk.transliterate(form));
                continue;
            }
            let lo = pos.saturating_sub(cstart);
            let hi = end.min(cend) - cstart;
            let rendered = chunk.transliterate(form);
            if rendered.chars().count() == clen {
                out.extend(rendered.chars().skip(lo).take(hi - lo));
            } else {
                out.extend(chunk.display().chars().skip(lo).take(hi - lo));
            }
        }
        out
    }

    /// Reading for kana-kanji conversion: kana content, with a trailing
    /// unconverted romaji tail included verbatim.
    pub(crate) fn conversion_query(&self) -> String {
        self.chunks
            .iter()
            .map(|c| {
                if c.form.is_ascii_form() {
                    c.raw.clone()
                } else {
                    c.display()
                }
            })
            .collect()
    }

    /// Reading for prediction: like the conversion query, but a trailing
    /// pending buffer with an exact rule is converted through it
    /// (a dangling `n` predicts as `ん`).
    pub(crate) fn prediction_query(&self, table: &Table) -> String {
        let mut out = String::new();
        for (i, chunk) in self.chunks.iter().enumerate() {
            if chunk.form.is_ascii_form() {
                out.push_str(&chunk.raw);
                continue;
            }
            let last = i + 1 == self.chunks.len();
            if last && !chunk.pending.is_empty() {
                out.push_str(&chunk.converted);
                match table.lookup(&chunk.pending) {
                    Some(rule) if !rule.output.is_empty() => out.push_str(&rule.output),
                    _ => out.push_str(&table::strip_special_keys(&chunk.pending)),
                }
            } else {
                out.push_str(&chunk.display());
            }
        }
        out
    }

    /// Base reading plus the set of kana the trailing pending buffer can
    /// still become, for expanded prediction lookup.
    pub(crate) fn prediction_queries(
        &self,
        table: &Table,
        limit: usize,
    ) -> (String, Vec<String>) {
        let mut base = String::new();
        let mut expanded = Vec::new();
        for (i, chunk) in self.chunks.iter().enumerate() {
            if chunk.form.is_ascii_form() {
                base.push_str(&chunk.raw);
                continue;
            }
            let last = i + 1 == self.chunks.len();
            if last && !chunk.pending.is_empty() {
                base.push_str(&chunk.converted);
                for rule in table.expand_suffixes(&chunk.pending, limit) {
                    let fragment = if !rule.output.is_empty() {
                        rule.output.clone()
                    } else {
                        table::strip_special_keys(&rule.pending)
                    };
                    if !fragment.is_empty() && !expanded.contains(&fragment) {
                        expanded.push(fragment);
                    }
                }
                if expanded.is_empty() {
                    let visible = table::strip_special_keys(&chunk.pending);
                    if !visible.is_empty() {
                        expanded.push(visible);
                    }
                }
            } else {
                base.push_str(&chunk.display());
            }
        }
        (base, expanded)
    }

    /// True when every chunk came from a DIRECT_INPUT rule and nothing is
    /// pending, i.e. the host should commit immediately.
    pub(crate) fn should_commit(&self) -> bool {
        !self.chunks.is_empty()
            && self
                .chunks
                .iter()
                .all(|c| c.attributes.contains(TableAttributes::DIRECT_INPUT) && c.is_fixed())
    }

    fn drop_empty(&mut self) {
        self.chunks.retain(|c| !c.is_empty());
    }

    /// (chunk index, char offset inside it) for display position `pos`.
    fn locate(&self, pos: usize) -> Option<(usize, usize)> {
        let mut start = 0;
        for (idx, chunk) in self.chunks.iter().enumerate() {
            let clen = chunk.display_chars();
            if pos < start + clen {
                return Some((idx, pos - start));
            }
            start += clen;
        }
        None
    }

    /// Number of chunks entirely before display position `pos`. Assumes a
    /// chunk boundary exists at `pos`.
    fn chunk_count_before(&self, pos: usize) -> usize {
        let mut start = 0;
        for (idx, chunk) in self.chunks.iter().enumerate() {
            if start >= pos {
                return idx;
            }
            start += chunk.display_chars();
        }
        self.chunks.len()
    }

    /// Ensure a chunk boundary at display position `pos`, splitting the
    /// chunk that straddles it.
    fn split_boundary(&mut self, pos: usize) {
        if let Some((idx, offset)) = self.locate(pos) {
            if offset > 0 {
                if let Some(tail) = self.chunks[idx].split_at(offset) {
                    self.chunks.insert(idx + 1, tail);
                }
            }
        }
    }
}
