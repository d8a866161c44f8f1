//! A contiguous run of keystrokes sharing one conversion state.

use super::table::{self, TableAttributes};
use super::transliteration::{self, Transliteration};

/// One unit of the composition buffer. `raw` holds the keystrokes as
/// typed, `converted` the finalized output fragment, and `pending` the
/// still-ambiguous tail in sentinel form. A sealed chunk no longer
/// accepts input; following keys open a new chunk.
#[derive(Debug, Clone)]
pub(crate) struct Chunk {
    pub(crate) raw: String,
    pub(crate) converted: String,
    pub(crate) pending: String,
    pub(crate) attributes: TableAttributes,
    /// Transliteration form this chunk renders in. Stamped from the input
    /// mode at creation, restamped by output-mode changes.
    pub(crate) form: Transliteration,
    /// Time of the last keystroke, for multi-tap timeout checks.
    pub(crate) timestamp_msec: u64,
    sealed: bool,
}

impl Chunk {
    pub(crate) fn new(form: Transliteration, timestamp_msec: u64) -> Self {
        Self {
            raw: String::new(),
            converted: String::new(),
            pending: String::new(),
            attributes: TableAttributes::NONE,
            form,
            timestamp_msec,
            sealed: false,
        }
    }

    /// A chunk holding text inserted verbatim, bypassing the table.
    pub(crate) fn direct(text: &str, form: Transliteration, timestamp_msec: u64) -> Self {
        let mut chunk = Self::new(form, timestamp_msec);
        chunk.raw.push_str(text);
        chunk.converted.push_str(text);
        chunk.seal();
        chunk
    }

    /// User-visible content: converted output plus the pending tail with
    /// sentinel chars stripped.
    pub(crate) fn display(&self) -> String {
        let mut out = self.converted.clone();
        out.push_str(&table::strip_special_keys(&self.pending));
        out
    }

    pub(crate) fn display_chars(&self) -> usize {
        self.display().chars().count()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.display().is_empty() && self.raw.is_empty()
    }

    /// Whether the chunk can still absorb keystrokes.
    pub(crate) fn is_open(&self) -> bool {
        !self.sealed && (self.converted.is_empty() || !self.pending.is_empty())
    }

    pub(crate) fn is_fixed(&self) -> bool {
        self.pending.is_empty()
    }

    pub(crate) fn seal(&mut self) {
        self.sealed = true;
    }

    /// Render the chunk in `form`. Chunks flagged NO_TRANSLITERATION keep
    /// their content in every form.
    pub(crate) fn transliterate(&self, form: Transliteration) -> String {
        let content = self.display();
        if self.attributes.contains(TableAttributes::NO_TRANSLITERATION) {
            return content;
        }
        transliteration::render(form, &content, &self.raw)
    }

    /// Delete the display char at `offset`. Deleting the last char of a
    /// live pending buffer shortens it in place; any other deletion
    /// materializes the display text and seals the chunk, so the raw
    /// keystroke record is rewritten to the edited content.
    pub(crate) fn delete_char(&mut self, offset: usize) {
        let display = self.display();
        let total = display.chars().count();
        if offset >= total {
            return;
        }
        let visible_pending = table::strip_special_keys(&self.pending);
        if offset + 1 == total && !visible_pending.is_empty() && !self.sealed {
            if let Some(idx) = self
                .pending
                .char_indices()
                .rev()
                .find(|(_, c)| !matches!(*c, table::TOGGLE_KEY | table::TIMEOUT_KEY | table::TOGGLED_KEY))
                .map(|(i, _)| i)
            {
                self.pending.remove(idx);
                self.raw.pop();
                if table::strip_special_keys(&self.pending).is_empty() {
                    self.pending.clear();
                }
                return;
            }
        }
        let edited: String = display
            .chars()
            .enumerate()
            .filter(|(i, _)| *i != offset)
            .map(|(_, c)| c)
            .collect();
        self.converted = edited.clone();
        self.pending.clear();
        self.raw = edited;
        self.seal();
    }

    /// Split off the tail starting at display char `offset`. Both halves
    /// are materialized and sealed.
    pub(crate) fn split_at(&mut self, offset: usize) -> Option<Chunk> {
        let display = self.display();
        let total = display.chars().count();
        if offset == 0 || offset >= total {
            return None;
        }
        let head: String = display.chars().take(offset).collect();
        let tail: String = display.chars().skip(offset).collect();
        self.converted = head.clone();
        self.pending.clear();
        self.raw = head;
        self.seal();
        let mut rest = Chunk::new(self.form, self.timestamp_msec);
        rest.raw = tail.clone();
        rest.converted = tail;
        rest.attributes = self.attributes;
        rest.seal();
        Some(rest)
    }
}
