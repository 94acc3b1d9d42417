use std::sync::LazyLock;

use clap::ValueEnum;
use regex::Regex;

/// Report family a document belongs to. Chosen by the caller, never sniffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Layout {
    /// Numbered "N. Date - ..." entries with a "Person(s) Killed:" list.
    Narrative,
    /// "Code: NNNN ..." entries with one labeled field per line.
    Tabular,
}

impl Layout {
    pub fn profile(self) -> &'static LayoutProfile {
        match self {
            Layout::Narrative => &NARRATIVE,
            Layout::Tabular => &TABULAR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::Narrative => "narrative",
            Layout::Tabular => "tabular",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Date,
    Time,
    Mine,
    Owner,
    District,
    State,
    Code,
    PersonsKilled,
    Description,
    Prevention,
}

pub struct FieldRule {
    pub field: Field,
    pub pattern: Regex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segmentation {
    /// The delimiter text stays at the head of the block it opens.
    KeepDelimiter,
    DropDelimiter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRule {
    /// Keep the captured text as written.
    Raw,
    /// Parse against the known formats and render `YYYY-MM-DD`; drop on failure.
    Iso,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonsKilledRule {
    /// `max(victims, 1 if a persons-killed section exists else 0)`
    VictimCount,
    /// The captured summary line verbatim.
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MineTypeFallback {
    Underground,
    /// Unknown, then coerced to Underground during enrichment.
    UnknownCoerced,
}

/// Segmentation and defaulting rules for one family of report layouts.
pub struct LayoutProfile {
    pub layout: Layout,
    pub delimiter: Regex,
    pub segmentation: Segmentation,
    pub drop_code_lines: bool,
    pub fields: Vec<FieldRule>,
    pub dates: DateRule,
    pub persons_killed: PersonsKilledRule,
    pub title_case: bool,
    pub keep_narrative: bool,
    pub mine_type_fallback: MineTypeFallback,
}

impl LayoutProfile {
    pub fn rule(&self, field: Field) -> Option<&FieldRule> {
        self.fields.iter().find(|r| r.field == field)
    }
}

fn rule(field: Field, pattern: &str) -> FieldRule {
    FieldRule {
        field,
        pattern: Regex::new(pattern).unwrap(),
    }
}

static NARRATIVE: LazyLock<LayoutProfile> = LazyLock::new(|| LayoutProfile {
    layout: Layout::Narrative,
    delimiter: Regex::new(r"(?im)^[ \t]*\d+\.[ \t]*Date[ \t]*-[ \t]*").unwrap(),
    segmentation: Segmentation::KeepDelimiter,
    drop_code_lines: true,
    fields: vec![
        rule(Field::Date, r"(?i)\bDate[ \t]*[:\-][ \t]*([0-9/.\-]+)"),
        rule(Field::Time, r"(?i)\bTime[ \t]*[:\-][ \t]*([0-9:. ]+)"),
        rule(Field::Mine, r"(?i)\bMine[ \t]*[:\-][ \t]*([^\n]+)"),
        rule(Field::Owner, r"(?i)\bOwner[ \t]*[:\-][ \t]*([^\n]+)"),
        rule(Field::District, r"(?i)\bDist(?:rict|\.)[ \t]*[:\-][ \t]*([^,\n]+)"),
        rule(Field::State, r"(?i)\bState[ \t]*[:\-][ \t]*([A-Za-z .\-]+)"),
        rule(Field::Code, r"(?i)\bCode[ \t]*[:\-][ \t]*(\d{1,4}[^\n]*)"),
        rule(
            Field::PersonsKilled,
            r"(?is)\bPersons?(?:\(s\))?[ \t]*Killed[ \t]*[:\-](.+?)(?:\n[ \t]*\n|\z)",
        ),
        rule(Field::Prevention, r"(?i)\bPrevention[ \t]*[:\-][ \t]*([^\n]+)"),
    ],
    dates: DateRule::Raw,
    persons_killed: PersonsKilledRule::VictimCount,
    title_case: false,
    keep_narrative: true,
    mine_type_fallback: MineTypeFallback::Underground,
});

static TABULAR: LazyLock<LayoutProfile> = LazyLock::new(|| LayoutProfile {
    layout: Layout::Tabular,
    delimiter: Regex::new(r"(?i)\bCode[ \t]*[:\-]").unwrap(),
    segmentation: Segmentation::DropDelimiter,
    drop_code_lines: false,
    fields: vec![
        // The code sits right after the "Code:" delimiter that opened the block,
        // and its type text never runs onto the next line.
        rule(
            Field::Code,
            r"\A\s*([0-9]{3,4}(?:[ \t]*[-–]?[ \t]*[A-Za-z][^\n]*)?)(?:[^0-9]|\z)",
        ),
        rule(
            Field::Date,
            r"(?i)\bDate[ \t]*[:\-][ \t]*(\d{1,2}[./\-]\d{1,2}[./\-]\d{2,4})",
        ),
        rule(Field::Time, r"(?i)\bTime[ \t]*[:\-][ \t]*([0-9:. ]+)"),
        rule(Field::Mine, r"(?i)\bMine[ \t]*[:\-][ \t]*([^\n]*)"),
        rule(Field::Owner, r"(?i)\bOwner[ \t]*[:\-][ \t]*([^\n]*)"),
        rule(Field::District, r"(?i)\bDistrict[ \t]*[:\-][ \t]*([^\n]*)"),
        rule(Field::State, r"(?i)\bState[ \t]*[:\-][ \t]*([^\n]*)"),
        rule(
            Field::PersonsKilled,
            r"(?i)\bPersons?(?:\(s\))?[ \t]*Killed[ \t]*[:\-][ \t]*([^\n]*)",
        ),
        rule(Field::Description, r"(?i)\bDescription[ \t]*[:\-][ \t]*([^\n]*)"),
        rule(Field::Prevention, r"(?i)\bPrevention[ \t]*[:\-][ \t]*([^\n]*)"),
    ],
    dates: DateRule::Iso,
    persons_killed: PersonsKilledRule::Summary,
    title_case: true,
    keep_narrative: false,
    mine_type_fallback: MineTypeFallback::UnknownCoerced,
});
