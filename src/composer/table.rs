//! Key-sequence to output-fragment mapping.
//!
//! A `Table` is an immutable set of rules `input → (output, pending)` plus
//! per-rule attributes, looked up by longest input prefix through a char
//! trie. Rules may embed special markers:
//!
//! - `{?}` the pending buffer is toggleable (repeated-key cycling)
//! - `{!}` matched on timeout or an explicit stop-toggling command
//! - `{*}` the pending buffer finished toggling
//! - `{{}` escapes a literal `{`
//!
//! Markers are rewritten to private-use-area sentinel chars when a rule is
//! registered, so lookups never parse braces at composition time.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::config::{Config, PreeditMethod};

/// Pending buffer can still cycle through toggle variants.
pub(crate) const TOGGLE_KEY: char = '\u{F000}';
/// Virtual key appended when the inter-key timeout fires.
pub(crate) const TIMEOUT_KEY: char = '\u{F001}';
/// Pending buffer finished toggling; further keys start a new chunk.
pub(crate) const TOGGLED_KEY: char = '\u{F002}';

pub const DEFAULT_TABLE_TOML: &str = include_str!("romaji_table.toml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableAttributes(u8);

impl TableAttributes {
    pub const NONE: TableAttributes = TableAttributes(0);
    /// The keystroke always opens a new chunk instead of extending the
    /// previous pending buffer.
    pub const NEW_CHUNK: TableAttributes = TableAttributes(1);
    /// The chunk content is rendered as-is in every transliteration form.
    pub const NO_TRANSLITERATION: TableAttributes = TableAttributes(2);
    /// The composition should be committed as soon as the rule applies.
    pub const DIRECT_INPUT: TableAttributes = TableAttributes(4);
    /// The rule closes its chunk; following keys start a new one.
    pub const END_CHUNK: TableAttributes = TableAttributes(8);

    pub fn contains(self, other: TableAttributes) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for TableAttributes {
    type Output = TableAttributes;
    fn bitor(self, rhs: TableAttributes) -> TableAttributes {
        TableAttributes(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub input: String,
    pub output: String,
    pub pending: String,
    pub attributes: TableAttributes,
}

#[derive(Debug, Default)]
struct TrieNode {
    children: HashMap<char, TrieNode>,
    rule: Option<usize>,
}

/// Result of a longest-prefix lookup.
pub struct PrefixLookup<'a> {
    /// Longest rule whose input is a prefix of the query, if any.
    pub rule: Option<&'a Rule>,
    /// Number of query chars consumed by `rule`.
    pub matched_len: usize,
    /// True when the full query is a strict prefix of at least one longer
    /// rule, i.e. waiting for more keys could still produce a match.
    pub has_longer: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum TableConfigError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("[rules] table is empty")]
    Empty,
    #[error("empty input key")]
    EmptyInput,
}

/// Rewrite `{?}` / `{!}` / `{*}` / `{{}` into sentinel chars.
fn parse_special_keys(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let (replacement, consumed) = match tail.get(..3) {
            Some("{?}") => (Some(TOGGLE_KEY), 3),
            Some("{!}") => (Some(TIMEOUT_KEY), 3),
            Some("{*}") => (Some(TOGGLED_KEY), 3),
            Some("{{}") => (Some('{'), 3),
            _ => (None, 1),
        };
        match replacement {
            Some(c) => out.push(c),
            None => out.push('{'),
        }
        rest = &tail[consumed..];
    }
    out.push_str(rest);
    out
}

/// Remove sentinel chars for display.
pub(crate) fn strip_special_keys(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(*c, TOGGLE_KEY | TIMEOUT_KEY | TOGGLED_KEY))
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RuleSpec {
    Output(String),
    Full {
        output: String,
        #[serde(default)]
        pending: String,
    },
}

#[derive(Deserialize)]
struct TableConfig {
    rules: BTreeMap<String, RuleSpec>,
}

#[derive(Debug)]
pub struct Table {
    rules: Vec<Rule>,
    root: TrieNode,
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl Table {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            root: TrieNode::default(),
        }
    }

    /// Build the standard romaji table from the embedded TOML.
    pub fn default_table() -> Self {
        // The embedded table is validated by tests; a broken build asset
        // cannot be recovered from at runtime.
        Self::from_toml(DEFAULT_TABLE_TOML).expect("embedded romaji table must be valid")
    }

    /// Build the table for a config: the standard romaji rules, plus the
    /// auto-IME-turn-off keys when enabled. Kana input never consults
    /// these rules, so they are only added for the romaji method.
    pub fn initialize_with_config(config: &Config) -> Self {
        let mut table = Self::default_table();
        if config.use_auto_ime_turn_off && config.preedit_method == PreeditMethod::Romaji {
            table.add_auto_ime_turn_off_rules();
        }
        table
    }

    /// URL-ish prefixes stay ASCII. "http" and friends also request an
    /// immediate commit, which drops the composer into half-ASCII mode;
    /// "google" merely escapes kana conversion and keeps composing.
    fn add_auto_ime_turn_off_rules(&mut self) {
        let direct = TableAttributes::DIRECT_INPUT | TableAttributes::NO_TRANSLITERATION;
        self.add_rule_with_attributes("http", "http", "", direct);
        self.add_rule_with_attributes("www.", "www.", "", direct);
        self.add_rule_with_attributes("\\\\", "\\\\", "", direct);
        self.add_rule_with_attributes("google", "google", "", TableAttributes::NO_TRANSLITERATION);
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, TableConfigError> {
        let config: TableConfig =
            toml::from_str(toml_str).map_err(|e| TableConfigError::Parse(e.to_string()))?;
        if config.rules.is_empty() {
            return Err(TableConfigError::Empty);
        }
        let mut table = Table::new();
        for (input, spec) in &config.rules {
            if input.is_empty() {
                return Err(TableConfigError::EmptyInput);
            }
            match spec {
                RuleSpec::Output(output) => table.add_rule(input, output, ""),
                RuleSpec::Full { output, pending } => table.add_rule(input, output, pending),
            }
        }
        Ok(table)
    }

    pub fn add_rule(&mut self, input: &str, output: &str, pending: &str) {
        self.add_rule_with_attributes(input, output, pending, TableAttributes::NONE);
    }

    pub fn add_rule_with_attributes(
        &mut self,
        input: &str,
        output: &str,
        pending: &str,
        attributes: TableAttributes,
    ) {
        let input = parse_special_keys(input);
        if input.is_empty() {
            return;
        }
        let rule = Rule {
            input: input.clone(),
            output: parse_special_keys(output),
            pending: parse_special_keys(pending),
            attributes,
        };
        let index = self.rules.len();
        self.rules.push(rule);

        let mut node = &mut self.root;
        for c in input.chars() {
            node = node.children.entry(c).or_default();
        }
        // Re-registering an input replaces the old rule in the trie; the
        // shadowed Rule stays in the arena but is unreachable.
        node.rule = Some(index);
    }

    /// Exact-match lookup. `key` is in already-parsed (sentinel) form when
    /// called internally; external callers may pass marker syntax.
    pub fn lookup(&self, key: &str) -> Option<&Rule> {
        let key = parse_special_keys(key);
        let mut node = &self.root;
        for c in key.chars() {
            node = node.children.get(&c)?;
        }
        node.rule.map(|i| &self.rules[i])
    }

    /// Longest-prefix lookup over the raw (sentinel-form) query.
    pub(crate) fn lookup_prefix(&self, query: &str) -> PrefixLookup<'_> {
        let mut node = &self.root;
        let mut best: Option<(usize, usize)> = None; // (rule index, chars consumed)
        let mut consumed = 0;
        let mut walked_all = true;
        for c in query.chars() {
            match node.children.get(&c) {
                Some(child) => {
                    node = child;
                    consumed += 1;
                    if let Some(rule) = node.rule {
                        best = Some((rule, consumed));
                    }
                }
                None => {
                    walked_all = false;
                    break;
                }
            }
        }
        PrefixLookup {
            rule: best.map(|(i, _)| &self.rules[i]),
            matched_len: best.map(|(_, n)| n).unwrap_or(0),
            has_longer: walked_all && !node.children.is_empty(),
        }
    }

    /// True when at least one rule input starts with `prefix` and is
    /// strictly longer, i.e. the pending buffer can still grow.
    pub(crate) fn has_longer_rule(&self, prefix: &str) -> bool {
        let mut node = &self.root;
        for c in prefix.chars() {
            match node.children.get(&c) {
                Some(child) => node = child,
                None => return false,
            }
        }
        !node.children.is_empty()
    }

    /// Collect outputs of all rules whose input extends `prefix`. Used to
    /// expand an ambiguous trailing romaji fragment for prediction.
    pub(crate) fn expand_suffixes(&self, prefix: &str, limit: usize) -> Vec<&Rule> {
        let mut node = &self.root;
        for c in prefix.chars() {
            match node.children.get(&c) {
                Some(child) => node = child,
                None => return Vec::new(),
            }
        }
        let mut out = Vec::new();
        let mut stack: Vec<&TrieNode> = vec![node];
        while let Some(n) = stack.pop() {
            if out.len() >= limit {
                break;
            }
            if let Some(i) = n.rule {
                out.push(&self.rules[i]);
            }
            stack.extend(n.children.values());
        }
        out
    }
}
