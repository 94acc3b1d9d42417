use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

/// One person named in the "Persons Killed" list of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Victim {
    pub name: Option<String>,
    pub role: Option<String>,
    pub gender: Option<Gender>,
    pub age: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Fatal,
    Serious,
    Minor,
}

impl Severity {
    /// Fatal iff anyone was killed, else Serious iff anyone was injured.
    pub fn from_counts(fatalities: u32, injuries: u32) -> Self {
        if fatalities > 0 {
            Severity::Fatal
        } else if injuries > 0 {
            Severity::Serious
        } else {
            Severity::Minor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Fatal => "Fatal",
            Severity::Serious => "Serious",
            Severity::Minor => "Minor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fatal" => Some(Severity::Fatal),
            "serious" => Some(Severity::Serious),
            "minor" => Some(Severity::Minor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MineType {
    Opencast,
    Underground,
}

impl MineType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MineType::Opencast => "Opencast",
            MineType::Underground => "Underground",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Opencast" => Some(MineType::Opencast),
            "Underground" => Some(MineType::Underground),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cause {
    #[serde(rename = "Ground Control Failure")]
    GroundControlFailure,
    #[serde(rename = "Transportation Accident")]
    TransportationAccident,
    #[serde(rename = "Electrical Hazard")]
    ElectricalHazard,
    #[serde(rename = "Explosion / Fire")]
    ExplosionFire,
    #[serde(rename = "Fall from Height")]
    FallFromHeight,
    #[serde(rename = "Drowning / Flooding")]
    DrowningFlooding,
    #[serde(rename = "Machinery Failure")]
    MachineryFailure,
    Other,
}

impl Cause {
    pub const ALL: [Cause; 8] = [
        Cause::GroundControlFailure,
        Cause::TransportationAccident,
        Cause::ElectricalHazard,
        Cause::ExplosionFire,
        Cause::FallFromHeight,
        Cause::DrowningFlooding,
        Cause::MachineryFailure,
        Cause::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Cause::GroundControlFailure => "Ground Control Failure",
            Cause::TransportationAccident => "Transportation Accident",
            Cause::ElectricalHazard => "Electrical Hazard",
            Cause::ExplosionFire => "Explosion / Fire",
            Cause::FallFromHeight => "Fall from Height",
            Cause::DrowningFlooding => "Drowning / Flooding",
            Cause::MachineryFailure => "Machinery Failure",
            Cause::Other => "Other",
        }
    }

    /// Case-insensitive lookup by label; unknown labels are `None`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Cause::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many people a record says were killed.
///
/// The tabular layout carries the summary line verbatim, the narrative layout
/// derives a count from the parsed victim list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PersonsKilled {
    Count(u32),
    Summary(String),
    Unknown,
}

impl PersonsKilled {
    pub fn to_text(&self) -> Option<String> {
        match self {
            PersonsKilled::Count(n) => Some(n.to_string()),
            PersonsKilled::Summary(s) => Some(s.clone()),
            PersonsKilled::Unknown => None,
        }
    }

    /// Inverse of `to_text` as stored in the database: digits are a count.
    pub fn from_text(text: Option<String>) -> Self {
        match text {
            None => PersonsKilled::Unknown,
            Some(t) => match t.parse::<u32>() {
                Ok(n) => PersonsKilled::Count(n),
                Err(_) => PersonsKilled::Summary(t),
            },
        }
    }
}

/// A fully assembled accident record. Only the assembler builds these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccidentRecord {
    pub accident_id: u32,
    pub source_doc: String,
    pub page_span: Vec<u32>,
    pub date: String,
    pub year: Option<i32>,
    pub time: Option<String>,
    pub mine: Option<String>,
    pub owner: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
    pub code: Option<String>,
    pub code_number: Option<String>,
    pub accident_type: Option<String>,
    pub cause: Cause,
    /// `cause` as written out, title-cased when the layout title-cases.
    pub cause_label: String,
    pub mine_type: MineType,
    pub severity: Severity,
    pub fatalities: u32,
    pub injuries: u32,
    pub persons_killed: PersonsKilled,
    pub narrative: Option<String>,
    pub description: Option<String>,
    pub prevention: Option<String>,
    pub victims: Vec<Victim>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_follows_counts() {
        assert_eq!(Severity::from_counts(1, 2), Severity::Fatal);
        assert_eq!(Severity::from_counts(0, 2), Severity::Serious);
        assert_eq!(Severity::from_counts(0, 0), Severity::Minor);
        for f in 0..4 {
            for i in 0..4 {
                let s = Severity::from_counts(f, i);
                assert_eq!(s == Severity::Fatal, f > 0);
                assert_eq!(s == Severity::Serious, f == 0 && i > 0);
            }
        }
    }

    #[test]
    fn cause_labels_parse_back() {
        for c in Cause::ALL {
            assert_eq!(Cause::parse(c.as_str()), Some(c));
        }
        assert_eq!(Cause::parse("explosion / fire"), Some(Cause::ExplosionFire));
        assert_eq!(Cause::parse("Methane"), None);
    }

    #[test]
    fn persons_killed_text() {
        assert_eq!(PersonsKilled::from_text(Some("2".into())), PersonsKilled::Count(2));
        assert_eq!(
            PersonsKilled::from_text(Some("One loader".into())),
            PersonsKilled::Summary("One loader".into())
        );
        assert_eq!(PersonsKilled::from_text(None), PersonsKilled::Unknown);
        assert_eq!(PersonsKilled::Count(3).to_text().as_deref(), Some("3"));
    }

    #[test]
    fn gender_is_case_insensitive() {
        assert_eq!(Gender::parse("MALE"), Some(Gender::Male));
        assert_eq!(Gender::parse("female"), Some(Gender::Female));
        assert_eq!(Gender::parse("x"), None);
    }
}
