//! Strict string-to-number parsing.
//!
//! `str::parse` rejects surrounding whitespace and `i32::from_str_radix`
//! accepts hex prefixes in some call sites' hands; the helpers here pin down
//! exactly what a committed numeric segment may look like: optional ASCII
//! whitespace, optional sign (signed types only), decimal digits, nothing
//! else. Out-of-range input returns `None` rather than saturating.

fn trim_ascii_space(s: &str) -> &str {
    s.trim_matches(|c: char| matches!(c, ' ' | '\t' | '\r' | '\n' | '\x0b' | '\x0c'))
}

fn parse_decimal(s: &str, allow_sign: bool) -> Option<(bool, u64)> {
    let s = trim_ascii_space(s);
    if s.is_empty() {
        return None;
    }
    let (negative, digits) = match s.as_bytes()[0] {
        b'+' if allow_sign => (false, &s[1..]),
        b'-' if allow_sign => (true, &s[1..]),
        _ => (false, s),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut value: u64 = 0;
    for b in digits.bytes() {
        value = value
            .checked_mul(10)?
            .checked_add(u64::from(b - b'0'))?;
    }
    Some((negative, value))
}

pub fn safe_str_to_i32(s: &str) -> Option<i32> {
    let (negative, magnitude) = parse_decimal(s, true)?;
    if negative {
        if magnitude > i32::MAX as u64 + 1 {
            return None;
        }
        Some((magnitude as i64).wrapping_neg() as i32)
    } else {
        if magnitude > i32::MAX as u64 {
            return None;
        }
        Some(magnitude as i32)
    }
}

pub fn safe_str_to_i64(s: &str) -> Option<i64> {
    let (negative, magnitude) = parse_decimal(s, true)?;
    if negative {
        if magnitude > i64::MAX as u64 + 1 {
            return None;
        }
        Some(magnitude.wrapping_neg() as i64)
    } else {
        if magnitude > i64::MAX as u64 {
            return None;
        }
        Some(magnitude as i64)
    }
}

pub fn safe_str_to_u32(s: &str) -> Option<u32> {
    let (negative, magnitude) = parse_decimal(s, false)?;
    if negative || magnitude > u32::MAX as u64 {
        return None;
    }
    Some(magnitude as u32)
}

pub fn safe_str_to_u64(s: &str) -> Option<u64> {
    let (negative, magnitude) = parse_decimal(s, false)?;
    if negative {
        return None;
    }
    Some(magnitude)
}

/// True when every char is a half-width or full-width Arabic digit.
pub fn is_arabic_number(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_digit() || ('０'..='９').contains(&c))
}

/// True for plain decimal integers: half-width digits only, no sign.
pub fn is_decimal_integer(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
