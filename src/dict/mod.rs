//! Dictionary seams consulted by the predictor.
//!
//! The predictor needs only narrow views of the system dictionary: does
//! a reading or surface exist, and which tokens match a reading exactly.
//! `SuppressionDictionary` is the user's blocklist of candidates that
//! must never resurface.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use tracing::warn;

/// One dictionary token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub key: String,
    pub value: String,
    pub cost: i32,
}

pub trait DictionaryInterface {
    fn has_key(&self, key: &str) -> bool;
    fn has_value(&self, value: &str) -> bool;
    fn lookup_exact(&self, key: &str) -> Vec<Token>;
}

/// In-memory dictionary backed by a reading → tokens map. Hosts load
/// their lexicon into it; tests seed it directly.
#[derive(Debug, Default)]
pub struct MemoryDictionary {
    tokens: HashMap<String, Vec<Token>>,
    values: HashSet<String>,
}

impl MemoryDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &str, value: &str, cost: i32) {
        self.values.insert(value.to_string());
        self.tokens
            .entry(key.to_string())
            .or_default()
            .push(Token {
                key: key.to_string(),
                value: value.to_string(),
                cost,
            });
    }
}

impl DictionaryInterface for MemoryDictionary {
    fn has_key(&self, key: &str) -> bool {
        self.tokens.contains_key(key)
    }

    fn has_value(&self, value: &str) -> bool {
        self.values.contains(value)
    }

    fn lookup_exact(&self, key: &str) -> Vec<Token> {
        self.tokens.get(key).cloned().unwrap_or_default()
    }
}

/// User blocklist of (key, value) pairs. An empty key or value acts as a
/// wildcard: ("", value) suppresses the surface under any reading.
#[derive(Debug, Default)]
pub struct SuppressionDictionary {
    entries: Mutex<HashSet<(String, String)>>,
}

impl SuppressionDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&self, key: &str, value: &str) {
        if key.is_empty() && value.is_empty() {
            return;
        }
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert((key.to_string(), value.to_string()));
            }
            Err(_) => warn!("suppression dictionary lock poisoned"),
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().map(|e| e.is_empty()).unwrap_or(true)
    }

    /// Whether the candidate must be filtered out.
    pub fn suppress_entry(&self, key: &str, value: &str) -> bool {
        let Ok(entries) = self.entries.lock() else {
            return false;
        };
        if entries.is_empty() {
            return false;
        }
        entries.contains(&(key.to_string(), value.to_string()))
            || entries.contains(&(key.to_string(), String::new()))
            || entries.contains(&(String::new(), value.to_string()))
    }
}
