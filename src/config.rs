//! Engine configuration and per-request options.
//!
//! Unlike a process-wide settings singleton, both `Config` and `Request`
//! are plain values handed to the composer and predictor at construction
//! or call time, so tests can vary them freely. Defaults are embedded as
//! TOML and validated at parse time.

use serde::Deserialize;

pub const DEFAULT_CONFIG_TOML: &str = include_str!("default_config.toml");

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// How the user composes readings. Kana input disables roman-misspelling
/// recovery in the predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreeditMethod {
    #[default]
    Romaji,
    Kana,
}

/// What a single shifted alphabetic keystroke switches the input mode to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftKeyModeSwitch {
    Off,
    #[default]
    AsciiInputMode,
    KatakanaInputMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryLearningLevel {
    #[default]
    DefaultHistory,
    ReadOnly,
    NoHistory,
}

/// Kind of text field the composition targets. Password and numeric
/// fields change the auto-commit policy, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFieldType {
    #[default]
    Normal,
    Password,
    Number,
    Tel,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub preedit_method: PreeditMethod,
    pub shift_key_mode_switch: ShiftKeyModeSwitch,
    pub use_auto_ime_turn_off: bool,
    pub composing_timeout_threshold_msec: u64,
    pub history_learning_level: HistoryLearningLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preedit_method: PreeditMethod::Romaji,
            shift_key_mode_switch: ShiftKeyModeSwitch::AsciiInputMode,
            use_auto_ime_turn_off: false,
            composing_timeout_threshold_msec: 0,
            history_learning_level: HistoryLearningLevel::DefaultHistory,
        }
    }
}

impl Config {
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        // One minute is already far beyond any multi-tap timeout in use.
        if self.composing_timeout_threshold_msec > 60_000 {
            return Err(ConfigError::InvalidValue {
                field: "composing_timeout_threshold_msec".to_string(),
                reason: "must be at most 60000".to_string(),
            });
        }
        Ok(())
    }
}

/// Per-conversion-request options. Carried alongside `Segments` into the
/// predictor, and consulted by the composer for cursor/mode behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestType {
    Conversion,
    #[default]
    Suggestion,
    Prediction,
}

#[derive(Debug, Clone)]
pub struct Request {
    pub request_type: RequestType,
    pub zero_query_suggestion: bool,
    pub mixed_conversion: bool,
    pub kana_modifier_insensitive_conversion: bool,
    pub update_input_mode_from_surrounding_text: bool,
    pub max_user_history_prediction_candidates_size: usize,
    pub max_user_history_prediction_candidates_size_for_zero_query: usize,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            request_type: RequestType::Suggestion,
            zero_query_suggestion: false,
            mixed_conversion: false,
            kana_modifier_insensitive_conversion: false,
            update_input_mode_from_surrounding_text: true,
            max_user_history_prediction_candidates_size: 3,
            max_user_history_prediction_candidates_size_for_zero_query: 3,
        }
    }
}
