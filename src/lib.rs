//! Core of a Japanese input method: the composing buffer that turns key
//! events into kana via a transliteration table, and the user-history
//! predictor that learns committed text and suggests it back.
//!
//! The two halves are independent. A front end drives a [`Composer`] per
//! text field and hands its queries to a [`UserHistoryPredictor`] shared
//! across fields.

pub mod base;
pub mod composer;
pub mod config;
pub mod dict;
pub mod prediction;
pub mod segments;
mod trace_init;

pub use base::clock::{Clock, SystemClock};
pub use composer::character_form::{AsComposedForm, CharacterFormPolicy, FullWidthAsciiForm};
pub use composer::table::{Table, TableAttributes};
pub use composer::transliteration::{InputMode, Transliteration, Transliterations};
pub use composer::{Composer, ComposerCommand, InputStyle, KeyEvent};
pub use config::{Config, HistoryLearningLevel, InputFieldType, Request, RequestType};
pub use dict::{DictionaryInterface, SuppressionDictionary};
pub use prediction::UserHistoryPredictor;
pub use segments::{Candidate, CandidateSource, Segment, SegmentType, Segments};
pub use trace_init::init_tracing;
