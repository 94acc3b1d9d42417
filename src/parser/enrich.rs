use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::extract::ExtractedBlock;
use super::profile::{Field, LayoutProfile, MineTypeFallback};
use crate::record::{Cause, MineType, Severity};

static CODE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d{1,4})\s*[-–]?\s*(.*)$").unwrap());

/// Ordered keyword rules over the lower-cased accident type; first hit wins.
const CAUSE_RULES: &[(&[&str], Cause)] = &[
    (&["roof", "side"], Cause::GroundControlFailure),
    (
        &["wagon", "truck", "conveyor", "tanker", "transport", "movement", "dumper"],
        Cause::TransportationAccident,
    ),
    (&["electric", "power", "cable"], Cause::ElectricalHazard),
    (&["explosion", "fire", "blowout"], Cause::ExplosionFire),
    (&["fall of person", "height"], Cause::FallFromHeight),
    (&["drown", "water"], Cause::DrowningFlooding),
    (&["machine", "machinery"], Cause::MachineryFailure),
];

/// Fields derived from an extracted block rather than read off it.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub code: Option<String>,
    pub code_number: Option<String>,
    pub accident_type: Option<String>,
    pub cause: Cause,
    pub cause_label: String,
    pub mine_type: MineType,
    pub severity: Severity,
    pub mine: Option<String>,
    pub owner: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
}

pub fn enrich(block_text: &str, extracted: &ExtractedBlock, profile: &LayoutProfile) -> Enrichment {
    let title = profile.title_case;
    let code = extracted.fields.get(Field::Code).map(str::to_string);
    let (code_number, raw_type) = code.as_deref().map(split_code).unwrap_or((None, None));
    let accident_type = normalize_text(raw_type.as_deref(), title);
    let cause = classify_cause(accident_type.as_deref());
    let cause_label = if title {
        title_case(cause.as_str())
    } else {
        cause.as_str().to_string()
    };

    Enrichment {
        cause,
        cause_label,
        mine_type: classify_mine_type(block_text, profile.mine_type_fallback),
        severity: extracted.casualties.severity(),
        mine: normalize_text(extracted.fields.get(Field::Mine), title),
        owner: normalize_text(extracted.fields.get(Field::Owner), title),
        district: normalize_text(extracted.fields.get(Field::District), title),
        state: normalize_text(extracted.fields.get(Field::State), title),
        code,
        code_number,
        accident_type,
    }
}

pub fn classify_cause(accident_type: Option<&str>) -> Cause {
    let Some(t) = accident_type else {
        return Cause::Other;
    };
    let t = t.to_lowercase();
    CAUSE_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| t.contains(k)))
        .map_or(Cause::Other, |(_, cause)| *cause)
}

pub fn classify_mine_type(block: &str, fallback: MineTypeFallback) -> MineType {
    if block.contains("Underground") {
        return MineType::Underground;
    }
    if block.contains("Opencast") {
        return MineType::Opencast;
    }
    if fallback == MineTypeFallback::UnknownCoerced {
        debug!("mine type unknown, coercing to Underground");
    }
    MineType::Underground
}

/// "0111 Fall Of Roof" → ("0111", "Fall Of Roof"). The number is zero-padded
/// to four digits; a code with no leading digits yields neither part.
pub fn split_code(code: &str) -> (Option<String>, Option<String>) {
    let Some(caps) = CODE_SPLIT_RE.captures(code) else {
        return (None, None);
    };
    let number = format!("{:0>4}", &caps[1]);
    let rest = caps[2].trim();
    let rest = if rest.is_empty() { None } else { Some(rest.to_string()) };
    (Some(number), rest)
}

/// Trim, optionally title-case, and treat a stringified missing value as absent.
pub fn normalize_text(value: Option<&str>, title: bool) -> Option<String> {
    let v = value?.trim();
    let v = if title { title_case(v) } else { v.to_string() };
    if v.is_empty() || v == "Nan" {
        None
    } else {
        Some(v)
    }
}

/// Upper-case the first letter of every run of letters, lower-case the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_letter = true;
        } else {
            out.push(c);
            prev_letter = false;
        }
    }
    out
}
