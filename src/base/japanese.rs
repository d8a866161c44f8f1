//! Character-level Unicode classification and script conversion for
//! Japanese text.
//!
//! Width conversion tables cover the ranges an IME actually produces:
//! ASCII punctuation/letters/digits and the standard katakana block.

/// Check the full Hiragana block (U+3040..U+309F). This includes a few
/// unassigned codepoints but these never appear in composition output, so
/// the block-level check is preferred over an exact range.
pub fn is_hiragana(c: char) -> bool {
    ('\u{3040}'..='\u{309F}').contains(&c)
}

/// Check the full Katakana block (U+30A0..U+30FF).
pub fn is_katakana(c: char) -> bool {
    ('\u{30A0}'..='\u{30FF}').contains(&c)
}

pub fn is_kanji(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
        || ('\u{3400}'..='\u{4DBF}').contains(&c)
        || ('\u{20000}'..='\u{2A6DF}').contains(&c)
}

pub fn is_ascii_printable(c: char) -> bool {
    (' '..='~').contains(&c)
}

/// Convert a hiragana string to katakana.
/// Non-hiragana characters (ー, ASCII, etc.) pass through unchanged.
pub fn hiragana_to_katakana(s: &str) -> String {
    s.chars()
        .map(|c| {
            if ('\u{3041}'..='\u{3096}').contains(&c) {
                char::from_u32(c as u32 + 0x60).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

/// Convert a katakana string to hiragana. ー and ヴ等 without hiragana
/// counterparts pass through unchanged.
pub fn katakana_to_hiragana(s: &str) -> String {
    s.chars()
        .map(|c| {
            if ('\u{30A1}'..='\u{30F6}').contains(&c) {
                char::from_u32(c as u32 - 0x60).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

/// Convert printable ASCII to full-width forms (space → U+3000).
pub fn ascii_to_fullwidth(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            ' ' => '\u{3000}',
            '!'..='~' => char::from_u32(c as u32 + 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// Convert full-width ASCII forms back to half-width.
pub fn fullwidth_to_halfwidth_ascii(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{3000}' => ' ',
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .collect()
}

const HALFWIDTH_DAKUTEN: char = '\u{FF9E}';
const HALFWIDTH_HANDAKUTEN: char = '\u{FF9F}';

/// Half-width form of a single unvoiced katakana char, if one exists.
fn halfwidth_katakana_base(c: char) -> Option<char> {
    let table: &[(char, char)] = &[
        ('ァ', 'ｧ'), ('ィ', 'ｨ'), ('ゥ', 'ｩ'), ('ェ', 'ｪ'), ('ォ', 'ｫ'),
        ('ャ', 'ｬ'), ('ュ', 'ｭ'), ('ョ', 'ｮ'), ('ッ', 'ｯ'), ('ー', 'ｰ'),
        ('ア', 'ｱ'), ('イ', 'ｲ'), ('ウ', 'ｳ'), ('エ', 'ｴ'), ('オ', 'ｵ'),
        ('カ', 'ｶ'), ('キ', 'ｷ'), ('ク', 'ｸ'), ('ケ', 'ｹ'), ('コ', 'ｺ'),
        ('サ', 'ｻ'), ('シ', 'ｼ'), ('ス', 'ｽ'), ('セ', 'ｾ'), ('ソ', 'ｿ'),
        ('タ', 'ﾀ'), ('チ', 'ﾁ'), ('ツ', 'ﾂ'), ('テ', 'ﾃ'), ('ト', 'ﾄ'),
        ('ナ', 'ﾅ'), ('ニ', 'ﾆ'), ('ヌ', 'ﾇ'), ('ネ', 'ﾈ'), ('ノ', 'ﾉ'),
        ('ハ', 'ﾊ'), ('ヒ', 'ﾋ'), ('フ', 'ﾌ'), ('ヘ', 'ﾍ'), ('ホ', 'ﾎ'),
        ('マ', 'ﾏ'), ('ミ', 'ﾐ'), ('ム', 'ﾑ'), ('メ', 'ﾒ'), ('モ', 'ﾓ'),
        ('ヤ', 'ﾔ'), ('ユ', 'ﾕ'), ('ヨ', 'ﾖ'),
        ('ラ', 'ﾗ'), ('リ', 'ﾘ'), ('ル', 'ﾙ'), ('レ', 'ﾚ'), ('ロ', 'ﾛ'),
        ('ワ', 'ﾜ'), ('ヲ', 'ｦ'), ('ン', 'ﾝ'),
        ('。', '｡'), ('、', '､'), ('「', '｢'), ('」', '｣'), ('・', '･'),
    ];
    table.iter().find(|(f, _)| *f == c).map(|(_, h)| *h)
}

/// Decompose a voiced katakana char into (unvoiced base, combining mark).
fn split_voicing(c: char) -> Option<(char, char)> {
    let dakuten: &[(char, char)] = &[
        ('ガ', 'カ'), ('ギ', 'キ'), ('グ', 'ク'), ('ゲ', 'ケ'), ('ゴ', 'コ'),
        ('ザ', 'サ'), ('ジ', 'シ'), ('ズ', 'ス'), ('ゼ', 'セ'), ('ゾ', 'ソ'),
        ('ダ', 'タ'), ('ヂ', 'チ'), ('ヅ', 'ツ'), ('デ', 'テ'), ('ド', 'ト'),
        ('バ', 'ハ'), ('ビ', 'ヒ'), ('ブ', 'フ'), ('ベ', 'ヘ'), ('ボ', 'ホ'),
        ('ヴ', 'ウ'),
    ];
    let handakuten: &[(char, char)] = &[
        ('パ', 'ハ'), ('ピ', 'ヒ'), ('プ', 'フ'), ('ペ', 'ヘ'), ('ポ', 'ホ'),
    ];
    if let Some((_, base)) = dakuten.iter().find(|(v, _)| *v == c) {
        return Some((*base, HALFWIDTH_DAKUTEN));
    }
    if let Some((_, base)) = handakuten.iter().find(|(v, _)| *v == c) {
        return Some((*base, HALFWIDTH_HANDAKUTEN));
    }
    None
}

/// Convert full-width katakana to half-width katakana, decomposing voiced
/// characters into base + combining mark (ガ → ｶﾞ). Characters without a
/// half-width form pass through unchanged.
pub fn katakana_to_halfwidth(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if let Some((base, mark)) = split_voicing(c) {
            if let Some(h) = halfwidth_katakana_base(base) {
                out.push(h);
                out.push(mark);
                continue;
            }
        }
        match halfwidth_katakana_base(c) {
            Some(h) => out.push(h),
            None => out.push(c),
        }
    }
    out
}

/// Fold hiragana voicing marks and small kana to the base character
/// (ば/ぱ → は, っ → つ). On 12-key layouts the base key is typed first
/// and the modifier tapped on afterwards, so keys equal under this
/// folding describe the same key sequence.
pub fn normalize_kana_modifiers(s: &str) -> String {
    s.chars().map(kana_modifier_base).collect()
}

fn kana_modifier_base(c: char) -> char {
    let table: &[(char, char)] = &[
        ('が', 'か'), ('ぎ', 'き'), ('ぐ', 'く'), ('げ', 'け'), ('ご', 'こ'),
        ('ざ', 'さ'), ('じ', 'し'), ('ず', 'す'), ('ぜ', 'せ'), ('ぞ', 'そ'),
        ('だ', 'た'), ('ぢ', 'ち'), ('づ', 'つ'), ('で', 'て'), ('ど', 'と'),
        ('ば', 'は'), ('び', 'ひ'), ('ぶ', 'ふ'), ('べ', 'へ'), ('ぼ', 'ほ'),
        ('ぱ', 'は'), ('ぴ', 'ひ'), ('ぷ', 'ふ'), ('ぺ', 'へ'), ('ぽ', 'ほ'),
        ('ゔ', 'う'),
        ('ぁ', 'あ'), ('ぃ', 'い'), ('ぅ', 'う'), ('ぇ', 'え'), ('ぉ', 'お'),
        ('ゃ', 'や'), ('ゅ', 'ゆ'), ('ょ', 'よ'), ('っ', 'つ'), ('ゎ', 'わ'),
    ];
    table.iter().find(|(v, _)| *v == c).map(|(_, b)| *b).unwrap_or(c)
}

/// Kunrei-style romaji for a single hiragana char.
fn hiragana_char_to_romaji(c: char) -> Option<&'static str> {
    let table: &[(char, &str)] = &[
        ('あ', "a"), ('い', "i"), ('う', "u"), ('え', "e"), ('お', "o"),
        ('か', "ka"), ('き', "ki"), ('く', "ku"), ('け', "ke"), ('こ', "ko"),
        ('が', "ga"), ('ぎ', "gi"), ('ぐ', "gu"), ('げ', "ge"), ('ご', "go"),
        ('さ', "sa"), ('し', "si"), ('す', "su"), ('せ', "se"), ('そ', "so"),
        ('ざ', "za"), ('じ', "zi"), ('ず', "zu"), ('ぜ', "ze"), ('ぞ', "zo"),
        ('た', "ta"), ('ち', "ti"), ('つ', "tu"), ('て', "te"), ('と', "to"),
        ('だ', "da"), ('ぢ', "di"), ('づ', "du"), ('で', "de"), ('ど', "do"),
        ('な', "na"), ('に', "ni"), ('ぬ', "nu"), ('ね', "ne"), ('の', "no"),
        ('は', "ha"), ('ひ', "hi"), ('ふ', "hu"), ('へ', "he"), ('ほ', "ho"),
        ('ば', "ba"), ('び', "bi"), ('ぶ', "bu"), ('べ', "be"), ('ぼ', "bo"),
        ('ぱ', "pa"), ('ぴ', "pi"), ('ぷ', "pu"), ('ぺ', "pe"), ('ぽ', "po"),
        ('ま', "ma"), ('み', "mi"), ('む', "mu"), ('め', "me"), ('も', "mo"),
        ('や', "ya"), ('ゆ', "yu"), ('よ', "yo"),
        ('ら', "ra"), ('り', "ri"), ('る', "ru"), ('れ', "re"), ('ろ', "ro"),
        ('わ', "wa"), ('を', "wo"), ('ん', "n"),
        ('ぁ', "a"), ('ぃ', "i"), ('ぅ', "u"), ('ぇ', "e"), ('ぉ', "o"),
        ('ー', "-"),
    ];
    table.iter().find(|(k, _)| *k == c).map(|(_, r)| *r)
}

/// Best-effort hiragana-to-romaji conversion used for roman-misspelling
/// recovery. Small ya/yu/yo fold into the preceding syllable (きょ → kyo),
/// っ doubles the following consonant, and characters with no mapping
/// (ASCII already, punctuation) pass through as-is.
pub fn hiragana_to_romaji(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    let mut pending_sokuon = false;
    while i < chars.len() {
        let c = chars[i];
        if c == 'っ' {
            pending_sokuon = true;
            i += 1;
            continue;
        }
        let mut syllable = match hiragana_char_to_romaji(c) {
            Some(r) => r.to_string(),
            None => {
                pending_sokuon = false;
                out.push(c);
                i += 1;
                continue;
            }
        };
        if i + 1 < chars.len() {
            let glide = match chars[i + 1] {
                'ゃ' => Some("ya"),
                'ゅ' => Some("yu"),
                'ょ' => Some("yo"),
                _ => None,
            };
            if let Some(g) = glide {
                if syllable.len() == 2 {
                    syllable.truncate(1);
                    syllable.push_str(g);
                    i += 1;
                }
            }
        }
        if pending_sokuon {
            if let Some(first) = syllable.chars().next() {
                out.push(first);
            }
            pending_sokuon = false;
        }
        out.push_str(&syllable);
        i += 1;
    }
    if pending_sokuon {
        out.push_str("tu");
    }
    out
}
