//! Preedit composition: keystrokes in, transliterable text out.
//!
//! The `Composer` owns a chunked composition buffer, a cursor, and the
//! input/output transliteration modes. Keystrokes run through the
//! rule [`Table`]; the resulting buffer can be rendered as preedit,
//! queried for conversion/prediction readings, or transliterated into
//! any of the canonical forms.

pub mod character_form;
pub mod chunk;
pub mod composition;
pub mod table;
pub mod transliteration;


use std::sync::Arc;

use tracing::debug;

use crate::base::clock::{Clock, SystemClock};
use crate::config::{Config, InputFieldType, Request, ShiftKeyModeSwitch};

pub use character_form::{AsComposedForm, CharacterFormPolicy, FullWidthAsciiForm};
use composition::{Composition, InsertKey};
pub use table::{Table, TableAttributes};
pub use transliteration::{InputMode, Transliteration, Transliterations};

/// Commands that are not keystrokes but still mutate the composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerCommand {
    /// Finish multi-tap cycling on the trailing chunk; the next press of
    /// the same key starts a new character.
    StopKeyToggling,
}

/// How a key event's string payload enters the composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputStyle {
    /// Run through the table under the current input mode.
    #[default]
    FollowMode,
    /// Insert verbatim, bypassing the table.
    AsIs,
}

/// A key press as delivered by the host. `key_code` carries a printable
/// character; `key_string` carries pre-composed text (kana keyboards,
/// reconversion). At least one must be set for the event to do anything.
#[derive(Debug, Clone, Default)]
pub struct KeyEvent {
    pub key_code: Option<char>,
    pub key_string: Option<String>,
    pub input_style: InputStyle,
    /// Event time; inserts fall back to the composer's clock when absent.
    pub timestamp_msec: Option<u64>,
}

/// Preedit length cap; inserts past it are dropped.
const MAX_PREEDIT_LENGTH: usize = 256;

#[derive(Clone)]
pub struct Composer {
    table: Arc<Table>,
    config: Config,
    request: Request,
    clock: Arc<dyn Clock + Send + Sync>,
    form_policy: Arc<dyn CharacterFormPolicy + Send + Sync>,
    composition: Composition,
    position: usize,
    input_mode: Transliteration,
    output_mode: Transliteration,
    comeback_input_mode: Transliteration,
    input_field_type: InputFieldType,
    shifted_sequence_count: usize,
    is_new_input: bool,
    max_length: usize,
    source_text: String,
}

impl Composer {
    pub fn new(table: Arc<Table>, config: Config, request: Request) -> Self {
        Self::with_clock(table, config, request, Arc::new(SystemClock))
    }

    pub fn with_clock(
        table: Arc<Table>,
        config: Config,
        request: Request,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            table,
            config,
            request,
            clock,
            form_policy: Arc::new(AsComposedForm),
            composition: Composition::default(),
            position: 0,
            input_mode: Transliteration::Hiragana,
            output_mode: Transliteration::Hiragana,
            comeback_input_mode: Transliteration::Hiragana,
            input_field_type: InputFieldType::Normal,
            shifted_sequence_count: 0,
            is_new_input: true,
            max_length: MAX_PREEDIT_LENGTH,
            source_text: String::new(),
        }
    }

    /// Drop the composition but keep the sticky input mode; a temporary
    /// shift-switched mode reverts.
    pub fn reset(&mut self) {
        self.composition.clear();
        self.position = 0;
        self.output_mode = Transliteration::Hiragana;
        self.input_mode = self.comeback_input_mode;
        self.shifted_sequence_count = 0;
        self.is_new_input = true;
        self.source_text.clear();
    }

    pub fn reset_input_mode(&mut self) {
        self.input_mode = self.comeback_input_mode;
        self.shifted_sequence_count = 0;
    }

    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    pub fn set_request(&mut self, request: Request) {
        self.request = request;
    }

    pub fn set_table(&mut self, table: Arc<Table>) {
        self.table = table;
    }

    /// Display-form policy for preedit and submission strings. Queries
    /// are unaffected.
    pub fn set_character_form_policy(
        &mut self,
        policy: Arc<dyn CharacterFormPolicy + Send + Sync>,
    ) {
        self.form_policy = policy;
    }

    pub fn empty(&self) -> bool {
        self.composition.is_empty()
    }

    pub fn get_length(&self) -> usize {
        self.composition.len_chars()
    }

    pub fn get_cursor(&self) -> usize {
        self.position
    }

    pub fn set_max_length(&mut self, len: usize) {
        self.max_length = len;
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Whether another keystroke still fits under the length cap.
    pub fn enable_insert(&self) -> bool {
        self.composition.len_chars() < self.max_length
    }

    pub fn get_input_mode(&self) -> Transliteration {
        self.input_mode
    }

    pub fn get_comeback_input_mode(&self) -> Transliteration {
        self.comeback_input_mode
    }

    pub fn get_output_mode(&self) -> Transliteration {
        self.output_mode
    }

    /// Sticky input-mode change; also becomes the comeback mode.
    pub fn set_input_mode(&mut self, mode: Transliteration) {
        self.input_mode = mode;
        self.comeback_input_mode = mode;
        self.shifted_sequence_count = 0;
        self.is_new_input = true;
    }

    /// Mode switch that lasts until commit or an explicit mode change.
    pub fn set_temporary_input_mode(&mut self, mode: Transliteration) {
        self.input_mode = mode;
    }

    /// Restamp the whole composition into `mode` and move the cursor to
    /// the end.
    pub fn set_output_mode(&mut self, mode: Transliteration) {
        self.output_mode = mode;
        self.composition.set_forms(mode);
        self.position = self.composition.len_chars();
    }

    pub fn set_input_field_type(&mut self, field_type: InputFieldType) {
        self.input_field_type = field_type;
    }

    pub fn get_input_field_type(&self) -> InputFieldType {
        self.input_field_type
    }

    /// Force the next keystroke to open a fresh chunk even when a rule
    /// would otherwise extend the previous one.
    pub fn set_new_input(&mut self) {
        self.is_new_input = true;
    }

    /// Committed text preceding the composition, for zero-query context.
    pub fn set_source_text(&mut self, text: &str) {
        self.source_text = text.to_string();
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn insert_character(&mut self, ch: char) {
        let now = self.clock.now_msecs();
        self.insert_character_at(ch, now);
    }

    /// Insert with the key event's own timestamp; clients that batch or
    /// replay events keep multi-tap timeouts accurate this way.
    pub fn insert_character_at(&mut self, ch: char, timestamp_msec: u64) {
        if !self.enable_insert() {
            return;
        }
        self.handle_timeout(timestamp_msec);
        self.apply_temporary_input_mode(ch);

        let as_is = self.input_mode.is_ascii_form();
        // Kana modes feed the table case-insensitively; rule inputs are
        // registered in lowercase.
        let ch = if as_is { ch } else { ch.to_ascii_lowercase() };
        let key = InsertKey {
            ch,
            form: self.input_mode,
            timestamp_msec,
            as_is,
            is_new_input: self.is_new_input,
        };
        self.position = self
            .composition
            .insert_at(&self.table, self.position, key);
        self.is_new_input = false;
        // A completed DIRECT_INPUT sequence ("http" with auto IME turn
        // off enabled) leaves kana mode until the next commit.
        if !self.input_mode.is_ascii_form() && self.composition.should_commit() {
            self.set_temporary_input_mode(Transliteration::HalfAscii);
        }
        debug!(ch = %ch, position = self.position, "inserted");
    }

    /// Insert a host key event. Returns `false` for an event carrying
    /// neither a key code nor a key string; the composition is unchanged.
    pub fn insert_character_key_event(&mut self, key: &KeyEvent) -> bool {
        if let Some(text) = &key.key_string {
            match key.input_style {
                InputStyle::AsIs => self.insert_text_as_is(text),
                InputStyle::FollowMode => {
                    let ts = key
                        .timestamp_msec
                        .unwrap_or_else(|| self.clock.now_msecs());
                    for ch in text.chars() {
                        self.insert_character_at(ch, ts);
                    }
                }
            }
            return true;
        }
        match key.key_code {
            Some(ch) => {
                let ts = key
                    .timestamp_msec
                    .unwrap_or_else(|| self.clock.now_msecs());
                self.insert_character_at(ch, ts);
                true
            }
            None => false,
        }
    }

    /// Insert text verbatim, bypassing the table (kana input, commits
    /// replayed into the preedit).
    pub fn insert_text_as_is(&mut self, text: &str) {
        let now = self.clock.now_msecs();
        for ch in text.chars() {
            if !self.enable_insert() {
                break;
            }
            let key = InsertKey {
                ch,
                form: self.input_mode,
                timestamp_msec: now,
                as_is: true,
                is_new_input: false,
            };
            self.position = self
                .composition
                .insert_at(&self.table, self.position, key);
        }
        self.is_new_input = false;
    }

    pub fn insert_command(&mut self, command: ComposerCommand) {
        match command {
            ComposerCommand::StopKeyToggling => {
                self.composition.stop_toggling(&self.table);
            }
        }
    }

    /// True when the trailing chunk is mid multi-tap cycle.
    pub fn is_toggleable(&self) -> bool {
        self.composition.is_toggleable()
    }

    fn handle_timeout(&mut self, timestamp_msec: u64) {
        let threshold = self.config.composing_timeout_threshold_msec;
        if threshold == 0 {
            return;
        }
        if let Some(last) = self.composition.last_timestamp_msec() {
            if timestamp_msec.saturating_sub(last) >= threshold {
                self.composition.stop_toggling(&self.table);
                self.composition.seal_all();
            }
        }
    }

    /// Shift-key mode switching. An uppercase letter switches to a
    /// temporary mode; a lowercase letter returns to the comeback mode
    /// unless more than one key was already shifted ("SSh" stays ASCII,
    /// "Sh" turns back into kana). Non-ASCII input always reverts.
    fn apply_temporary_input_mode(&mut self, ch: char) {
        if self.config.shift_key_mode_switch == ShiftKeyModeSwitch::Off {
            return;
        }
        if !ch.is_ascii() {
            self.input_mode = self.comeback_input_mode;
            self.shifted_sequence_count = 0;
            return;
        }
        if ch.is_ascii_uppercase() {
            match self.config.shift_key_mode_switch {
                ShiftKeyModeSwitch::AsciiInputMode => {
                    if !self.input_mode.is_ascii_form() {
                        self.set_temporary_input_mode(Transliteration::HalfAscii);
                    }
                }
                ShiftKeyModeSwitch::KatakanaInputMode => {
                    if self.input_mode != Transliteration::FullKatakana {
                        self.set_temporary_input_mode(Transliteration::FullKatakana);
                    }
                }
                ShiftKeyModeSwitch::Off => {}
            }
            self.shifted_sequence_count += 1;
        } else if ch.is_ascii_lowercase() {
            if self.shifted_sequence_count > 1
                && self.config.shift_key_mode_switch == ShiftKeyModeSwitch::AsciiInputMode
            {
                self.shifted_sequence_count += 1;
                return;
            }
            self.input_mode = self.comeback_input_mode;
            self.shifted_sequence_count = 0;
        }
    }

    pub fn backspace(&mut self) {
        if self.position == 0 {
            return;
        }
        self.composition.delete_at(self.position - 1);
        self.position -= 1;
        self.update_input_mode();
    }

    pub fn delete(&mut self) {
        self.composition.delete_at(self.position);
        self.update_input_mode();
    }

    pub fn delete_at(&mut self, pos: usize) {
        if self.composition.delete_at(pos) && pos < self.position {
            self.position -= 1;
        }
        self.update_input_mode();
    }

    pub fn delete_range(&mut self, pos: usize, length: usize) {
        for _ in 0..length {
            if !self.composition.delete_at(pos) {
                break;
            }
        }
        if self.position > pos {
            let removed = length.min(self.position - pos);
            self.position -= removed;
        }
        self.position = self.position.min(self.composition.len_chars());
        self.update_input_mode();
    }

    pub fn edit_erase(&mut self) {
        self.composition.clear();
        self.position = 0;
        self.input_mode = self.comeback_input_mode;
        self.shifted_sequence_count = 0;
        self.is_new_input = true;
    }

    pub fn move_cursor_left(&mut self) {
        if self.position > 0 {
            self.position -= 1;
        }
        self.update_input_mode();
    }

    pub fn move_cursor_right(&mut self) {
        if self.position < self.composition.len_chars() {
            self.position += 1;
        }
        self.update_input_mode();
    }

    pub fn move_cursor_to_beginning(&mut self) {
        self.position = 0;
        self.update_input_mode();
    }

    pub fn move_cursor_to_end(&mut self) {
        self.position = self.composition.len_chars();
        self.update_input_mode();
    }

    /// Out-of-range positions leave the cursor where it was.
    pub fn move_cursor_to(&mut self, pos: usize) {
        if pos > self.composition.len_chars() {
            return;
        }
        self.position = pos;
        self.update_input_mode();
    }

    /// Re-derive the input mode from the chunk left of the cursor when
    /// the request asks for it; at the head the comeback mode applies.
    fn update_input_mode(&mut self) {
        if !self.request.update_input_mode_from_surrounding_text {
            return;
        }
        if self.composition.is_empty() {
            return;
        }
        self.input_mode = if self.position == 0 {
            self.comeback_input_mode
        } else {
            self.composition
                .form_at(self.position - 1)
                .unwrap_or(self.comeback_input_mode)
        };
    }

    /// Preedit string, each chunk rendered in its stamped form and the
    /// result passed through the character-form policy.
    pub fn get_string_for_preedit(&self) -> String {
        self.form_policy
            .normalize_form(&self.composition.render_preedit())
    }

    /// The string committed when the user confirms the composition as-is.
    pub fn get_string_for_submission(&self) -> String {
        self.form_policy
            .normalize_form(&self.composition.render_preedit())
    }

    /// Reading for kana-kanji conversion: a trailing unconverted romaji
    /// tail stays verbatim.
    pub fn get_query_for_conversion(&self) -> String {
        self.composition.conversion_query()
    }

    /// Reading for prediction: a trailing pending sequence with an exact
    /// rule converts through it ("zenkakuyosoun" predicts with ん).
    pub fn get_query_for_prediction(&self) -> String {
        self.composition.prediction_query(&self.table)
    }

    /// Base reading plus every kana the trailing pending keys could still
    /// become, for expanded dictionary lookup.
    pub fn get_queries_for_prediction(&self) -> (String, Vec<String>) {
        self.composition.prediction_queries(&self.table, 128)
    }

    pub fn get_transliteration(&self, form: Transliteration) -> String {
        self.composition.render_form(form)
    }

    pub fn get_transliterations(&self) -> Transliterations {
        let mut out = Transliterations::default();
        for form in Transliteration::ALL {
            out.push(form, &self.composition.render_form(form));
        }
        out
    }

    pub fn get_sub_transliterations(&self, pos: usize, length: usize) -> Transliterations {
        let mut out = Transliterations::default();
        for form in Transliteration::ALL {
            out.push(form, &self.composition.render_range_form(form, pos, length));
        }
        out
    }

    /// True when every chunk came from a DIRECT_INPUT rule; the host
    /// should commit without conversion.
    pub fn should_commit(&self) -> bool {
        self.composition.should_commit()
    }

    /// Number of leading chars to auto-commit for the current field type.
    /// Password fields hold back the newest char; numeric fields flush
    /// everything.
    pub fn should_commit_head(&self) -> Option<usize> {
        let len = self.composition.len_chars();
        match self.input_field_type {
            InputFieldType::Password if len > 1 => Some(len - 1),
            InputFieldType::Number | InputFieldType::Tel if len > 0 => Some(len),
            _ => None,
        }
    }
}

/// Rewrite kana punctuation that reads as part of a number: a prolonged
/// sound mark before a digit becomes a minus sign, and 。/、 adjacent to
/// digits become the full-width point and comma. Returns `None` when
/// nothing changed.
pub fn transform_characters_for_numbers(input: &str) -> Option<String> {
    fn is_digit(c: char) -> bool {
        c.is_ascii_digit() || ('０'..='９').contains(&c)
    }

    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut changed = false;
    for (i, &c) in chars.iter().enumerate() {
        let prev_digit = i > 0 && is_digit(chars[i - 1]);
        let next_digit = i + 1 < chars.len() && is_digit(chars[i + 1]);
        let replacement = match c {
            'ー' if next_digit => Some('−'),
            '。' if prev_digit && next_digit => Some('．'),
            '、' if prev_digit && next_digit => Some('，'),
            _ => None,
        };
        match replacement {
            Some(r) => {
                out.push(r);
                changed = true;
            }
            None => out.push(c),
        }
    }
    changed.then_some(out)
}
