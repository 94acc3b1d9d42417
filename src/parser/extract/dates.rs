use chrono::{Datelike, NaiveDate};

use crate::parser::profile::DateRule;

// Two-digit years first: "%d.%m.%Y" would read "05.03.15" as year 15.
const DATE_FORMATS: &[&str] = &[
    "%d.%m.%y", "%d-%m-%y", "%d/%m/%y", "%d.%m.%Y", "%d-%m-%Y", "%d/%m/%Y",
];

/// `%Y` takes as few as one digit, so years below 1000 are truncated input.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim().trim_end_matches(['.', '-', '/']);
    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(raw, fmt)
            .ok()
            .filter(|d| d.year() >= 1000)
    })
}

/// Apply the profile's date rule to a captured date.
/// Returns the date text to keep and its year, when the date parses.
pub fn normalize(raw: Option<&str>, rule: DateRule) -> (Option<String>, Option<i32>) {
    let Some(raw) = raw else {
        return (None, None);
    };
    let parsed = parse_date(raw);
    let year = parsed.map(|d| d.year());
    match rule {
        DateRule::Raw => (Some(raw.to_string()), year),
        DateRule::Iso => (parsed.map(|d| d.format("%Y-%m-%d").to_string()), year),
    }
}

/// First plausible 4-digit year (19xx/20xx) in a document name.
pub fn year_from_name(name: &str) -> Option<i32> {
    let bytes = name.as_bytes();
    (0..bytes.len().saturating_sub(3)).find_map(|i| {
        let window = &bytes[i..i + 4];
        let bounded = (i == 0 || !bytes[i - 1].is_ascii_digit())
            && bytes.get(i + 4).map_or(true, |b| !b.is_ascii_digit());
        if !bounded || !window.iter().all(u8::is_ascii_digit) {
            return None;
        }
        let year = window
            .iter()
            .fold(0i32, |acc, b| acc * 10 + i32::from(b - b'0'));
        (1900..2100).contains(&year).then_some(year)
    })
}
