//! Display-form normalization applied to rendered strings.
//!
//! Hosts differ on whether ASCII and punctuation should surface half- or
//! full-width. The composition renders each chunk in its stamped
//! transliteration form; preedit and submission strings then pass through
//! this policy, so a deployment can impose its width preferences without
//! touching the rule table. Conversion and prediction queries bypass it;
//! readings must stay in the form the dictionary indexes.

use crate::base::japanese;

pub trait CharacterFormPolicy {
    /// Rewrite a rendered preedit/submission string into the display form
    /// the host expects.
    fn normalize_form(&self, text: &str) -> String;
}

/// Leaves strings exactly as rendered.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsComposedForm;

impl CharacterFormPolicy for AsComposedForm {
    fn normalize_form(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Forces printable ASCII to the full-width forms, the common preference
/// for Japanese text fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullWidthAsciiForm;

impl CharacterFormPolicy for FullWidthAsciiForm {
    fn normalize_form(&self, text: &str) -> String {
        japanese::ascii_to_fullwidth(text)
    }
}
