//! Canonical forms for contact fields
//!
//! Name casing, phone formatting and USA number classification. Every
//! function here is pure and returns its input unchanged when given its own
//! output, which is what lets repeated formatting runs settle.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// `+1` followed by the formatted national part, e.g. `1 (555) 123-4567`
static FORMATTED_USA_REST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]\s?\([0-9]{3}\)\s?[0-9]{3}-[0-9]{4}$").expect("valid USA phone pattern")
});

/// A phone value that cannot be put in canonical form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneFormatError {
    pub value: String,
    pub reason: &'static str,
}

impl std::fmt::Display for PhoneFormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot format phone '{}': {}", self.value, self.reason)
    }
}

impl std::error::Error for PhoneFormatError {}

/// Title-case a name value. Absent, empty and non-string values yield `""`.
pub fn name_case(value: Option<&Value>) -> String {
    match value.and_then(Value::as_str) {
        Some(name) => title_case(name),
        None => String::new(),
    }
}

/// Lower-case everything, then upper-case the first character of each word
///
/// A word starts at any alphanumeric character that is not preceded by
/// another word character, so apostrophes and hyphens start new words:
/// `o'brien-smith` becomes `O'Brien-Smith`. Whitespace is kept as is.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut at_word_start = true;

    for ch in input.chars() {
        if ch.is_alphanumeric() || is_combining_mark(ch) {
            if at_word_start && !is_combining_mark(ch) {
                push_upper(&mut out, ch);
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }

    out
}

fn push_upper(out: &mut String, ch: char) {
    let mut upper = ch.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(single), None) => out.push(single),
        // 'ß' -> "SS" would read back as a two-letter word start
        _ => out.extend(ch.to_lowercase()),
    }
}

fn is_combining_mark(ch: char) -> bool {
    matches!(
        ch as u32,
        0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF | 0xFE20..=0xFE2F
    )
}

/// Stringify a phone value the way it is compared against stored values
pub fn phone_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn digits_only(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Format a phone value (string or number)
///
/// Values already starting with `+` are treated as canonical. Ten digit
/// numbers, and eleven digit numbers with a leading `1`, become
/// `+1 (AAA) PPP-LLLL`; anything else becomes `+` followed by its digits.
pub fn format_phone(value: &Value) -> Result<String, PhoneFormatError> {
    let text = phone_text(value).ok_or_else(|| PhoneFormatError {
        value: value.to_string(),
        reason: "not a string or number",
    })?;
    format_phone_str(&text)
}

pub fn format_phone_str(phone: &str) -> Result<String, PhoneFormatError> {
    let trimmed = phone.trim();
    if trimmed.starts_with('+') {
        return Ok(trimmed.to_string());
    }

    let digits = digits_only(trimmed);
    match digits.len() {
        0 => Err(PhoneFormatError {
            value: phone.to_string(),
            reason: "no digits",
        }),
        10 => Ok(north_american(&digits)),
        11 if digits.starts_with('1') => Ok(north_american(&digits[1..])),
        _ => Ok(format!("+{}", digits)),
    }
}

fn north_american(national: &str) -> String {
    format!(
        "+1 ({}) {}-{}",
        &national[..3],
        &national[3..6],
        &national[6..10]
    )
}

/// Classify a phone value as a North American (country code 1) number
pub fn is_usa_number(value: Option<&Value>) -> bool {
    value
        .and_then(phone_text)
        .is_some_and(|text| is_usa_phone(&text))
}

pub fn is_usa_phone(phone: &str) -> bool {
    let phone = phone.trim();
    if phone.is_empty() {
        return false;
    }

    if phone.starts_with("+1 ") {
        return true;
    }

    // "+1" directly followed by digits is decided structurally, so longer
    // international numbers that happen to start with 1 are not counted
    if let Some(rest) = phone.strip_prefix("+1") {
        if rest.starts_with(|c: char| c.is_ascii_digit()) {
            let plain_national = rest.len() == 10 && rest.chars().all(|c| c.is_ascii_digit());
            return plain_national || FORMATTED_USA_REST.is_match(rest);
        }
    }

    let digits = digits_only(phone);
    digits.len() == 10 || (digits.len() == 11 && digits.starts_with('1'))
}
