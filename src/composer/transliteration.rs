//! Canonical transliteration forms of a composition buffer.

use crate::base::japanese;

/// The eleven renderable forms. The first five double as input modes;
/// case variants exist only as output forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transliteration {
    Hiragana,
    FullKatakana,
    HalfKatakana,
    HalfAscii,
    HalfAsciiUpper,
    HalfAsciiLower,
    HalfAsciiCapitalized,
    FullAscii,
    FullAsciiUpper,
    FullAsciiLower,
    FullAsciiCapitalized,
}

pub use Transliteration as InputMode;

impl Transliteration {
    pub const ALL: [Transliteration; 11] = [
        Transliteration::Hiragana,
        Transliteration::FullKatakana,
        Transliteration::HalfKatakana,
        Transliteration::HalfAscii,
        Transliteration::HalfAsciiUpper,
        Transliteration::HalfAsciiLower,
        Transliteration::HalfAsciiCapitalized,
        Transliteration::FullAscii,
        Transliteration::FullAsciiUpper,
        Transliteration::FullAsciiLower,
        Transliteration::FullAsciiCapitalized,
    ];

    pub fn is_ascii_form(self) -> bool {
        !matches!(
            self,
            Transliteration::Hiragana
                | Transliteration::FullKatakana
                | Transliteration::HalfKatakana
        )
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => {
            first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
        }
        None => String::new(),
    }
}

/// Render one form from the kana content and the raw keystrokes of a
/// chunk. Kana forms derive from `content`, ASCII forms from `raw`.
pub(crate) fn render(form: Transliteration, content: &str, raw: &str) -> String {
    match form {
        Transliteration::Hiragana => content.to_string(),
        Transliteration::FullKatakana => japanese::hiragana_to_katakana(content),
        Transliteration::HalfKatakana => {
            japanese::katakana_to_halfwidth(&japanese::hiragana_to_katakana(content))
        }
        Transliteration::HalfAscii => raw.to_string(),
        Transliteration::HalfAsciiUpper => raw.to_uppercase(),
        Transliteration::HalfAsciiLower => raw.to_lowercase(),
        Transliteration::HalfAsciiCapitalized => capitalize(raw),
        Transliteration::FullAscii => japanese::ascii_to_fullwidth(raw),
        Transliteration::FullAsciiUpper => japanese::ascii_to_fullwidth(&raw.to_uppercase()),
        Transliteration::FullAsciiLower => japanese::ascii_to_fullwidth(&raw.to_lowercase()),
        Transliteration::FullAsciiCapitalized => {
            japanese::ascii_to_fullwidth(&capitalize(raw))
        }
    }
}

/// One rendered string per form, indexable by `Transliteration`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transliterations {
    strings: [String; 11],
}

impl Transliterations {
    pub fn get(&self, form: Transliteration) -> &str {
        &self.strings[Self::index(form)]
    }

    pub(crate) fn push(&mut self, form: Transliteration, fragment: &str) {
        self.strings[Self::index(form)].push_str(fragment);
    }

    fn index(form: Transliteration) -> usize {
        Transliteration::ALL
            .iter()
            .position(|f| *f == form)
            .unwrap_or(0)
    }
}
