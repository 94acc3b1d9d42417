pub mod casualties;
pub mod dates;
pub mod victims;

use std::collections::HashMap;

use casualties::Casualties;

use crate::parser::profile::{Field, LayoutProfile};
use crate::record::Victim;

/// Labeled-field captures for one block. A field is present only if its
/// pattern matched with a non-blank capture.
#[derive(Debug, Clone, Default)]
pub struct ExtractedFields {
    values: HashMap<Field, String>,
}

impl ExtractedFields {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// Everything read directly off a block, before classification.
#[derive(Debug, Clone)]
pub struct ExtractedBlock {
    pub fields: ExtractedFields,
    pub date: Option<String>,
    pub year: Option<i32>,
    pub victims: Vec<Victim>,
    pub casualties: Casualties,
}

pub fn extract_fields(block: &str, profile: &LayoutProfile) -> ExtractedFields {
    let mut values = HashMap::new();
    for rule in &profile.fields {
        let Some(m) = rule.pattern.captures(block).and_then(|c| c.get(1)) else {
            continue;
        };
        let value = match rule.field {
            // Keep line structure: the victim list is parsed out of it.
            Field::PersonsKilled => m.as_str().trim().to_string(),
            _ => m.as_str().split_whitespace().collect::<Vec<_>>().join(" "),
        };
        if !value.is_empty() {
            values.insert(rule.field, value);
        }
    }
    ExtractedFields { values }
}

pub fn extract_block(block: &str, profile: &LayoutProfile) -> ExtractedBlock {
    let fields = extract_fields(block, profile);
    let (date, year) = dates::normalize(fields.get(Field::Date), profile.dates);
    let victims = fields
        .get(Field::PersonsKilled)
        .map(victims::parse_victims)
        .unwrap_or_default();

    ExtractedBlock {
        date,
        year,
        victims,
        casualties: Casualties::count(block),
        fields,
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::profile::Layout;
    use crate::record::Gender;

    const NARRATIVE_BLOCK: &str = "1. Date - 05.03.2015\nMine - ABC Colliery\nOwner - XYZ Ltd\nState - Jharkhand\nPerson(s) Killed: 1. Ram Lal, Loader, Male, 34 Years\n\n";

    #[test]
    fn narrative_scenario() {
        let b = extract_block(NARRATIVE_BLOCK, Layout::Narrative.profile());
        assert_eq!(b.date.as_deref(), Some("05.03.2015"));
        assert_eq!(b.year, Some(2015));
        assert_eq!(b.fields.get(Field::Mine), Some("ABC Colliery"));
        assert_eq!(b.fields.get(Field::Owner), Some("XYZ Ltd"));
        assert_eq!(b.fields.get(Field::State), Some("Jharkhand"));
        assert_eq!(b.fields.get(Field::District), None);
        assert_eq!(b.fields.get(Field::Code), None);
        assert_eq!(b.victims.len(), 1);
        assert_eq!(b.victims[0].name.as_deref(), Some("Ram Lal"));
        assert_eq!(b.victims[0].role.as_deref(), Some("Loader"));
        assert_eq!(b.victims[0].gender, Some(Gender::Male));
        assert_eq!(b.victims[0].age, Some(34));
    }

    #[test]
    fn narrative_district_and_time() {
        let block = "2. Date - 11/07/2015 Time - 14.30\nMine - Kalyani Limestone Mine\nDist. - Sundargarh, State - Odisha\n";
        let f = extract_fields(block, Layout::Narrative.profile());
        assert_eq!(f.get(Field::Time), Some("14.30"));
        assert_eq!(f.get(Field::District), Some("Sundargarh"));
        assert_eq!(f.get(Field::State), Some("Odisha"));
    }

    #[test]
    fn persons_section_stops_at_blank_line() {
        let block = "1. Date - 01.01.2015\nPerson(s) Killed: 1. A B, Loader, Male, 30 Years\n2. C D, Fitter, Male, 40 Years\n\nWhile loading, 3. E F, Helper, Male, 20 Years";
        let b = extract_block(block, Layout::Narrative.profile());
        assert_eq!(b.victims.len(), 2);
    }

    #[test]
    fn tabular_fields() {
        let block = " 0111 Fall of roof\nDate: 05.03.15\nMine: bhatdih colliery\nOwner: BCCL\nDistrict: Dhanbad\nState: JHARKHAND\nPersons Killed: One loader\nDescription: Roof fell while drilling; one killed.\n";
        let b = extract_block(block, Layout::Tabular.profile());
        assert_eq!(b.fields.get(Field::Code), Some("0111 Fall of roof"));
        assert_eq!(b.date.as_deref(), Some("2015-03-05"));
        assert_eq!(b.fields.get(Field::Mine), Some("bhatdih colliery"));
        assert_eq!(b.fields.get(Field::District), Some("Dhanbad"));
        assert_eq!(b.fields.get(Field::PersonsKilled), Some("One loader"));
        assert_eq!(
            b.fields.get(Field::Description),
            Some("Roof fell while drilling; one killed.")
        );
        assert_eq!(b.casualties.fatalities, 2);
    }

    #[test]
    fn tabular_code_only_at_block_head() {
        let block = "\nDate: 05.03.2015\nMine: X\n";
        let f = extract_fields(block, Layout::Tabular.profile());
        assert_eq!(f.get(Field::Code), None);
        assert_eq!(f.get(Field::Mine), Some("X"));
    }

    #[test]
    fn bare_code_line_keeps_to_its_line() {
        let block = "0111\nMine: Water Tank Quarry\nDate: 05.03.2015\n";
        let f = extract_fields(block, Layout::Tabular.profile());
        assert_eq!(f.get(Field::Code), Some("0111"));
        assert_eq!(f.get(Field::Mine), Some("Water Tank Quarry"));

        let f = extract_fields(" 0230 - Dumper\nMine: X\n", Layout::Tabular.profile());
        assert_eq!(f.get(Field::Code), Some("0230 - Dumper"));
        let f = extract_fields("12345 Roof\nMine: X\n", Layout::Tabular.profile());
        assert_eq!(f.get(Field::Code), None);
    }

    #[test]
    fn blank_captures_are_absent() {
        let f = extract_fields("0111 Roof\nMine:\nOwner:   \n", Layout::Tabular.profile());
        assert_eq!(f.get(Field::Mine), None);
        assert_eq!(f.get(Field::Owner), None);
        assert_eq!(f.len(), 1);
    }

    #[test]
    fn unparseable_tabular_date_is_dropped() {
        let b = extract_block("0111 Roof\nDate: 45.13.2015\n", Layout::Tabular.profile());
        assert_eq!(b.date, None);
        assert_eq!(b.year, None);
    }
}
