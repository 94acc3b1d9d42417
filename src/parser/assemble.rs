use tracing::debug;

use super::enrich::Enrichment;
use super::extract::ExtractedBlock;
use super::profile::{Field, LayoutProfile, PersonsKilledRule};
use crate::record::{AccidentRecord, PersonsKilled};

/// A record that passed the non-empty check but has no `accident_id` yet.
/// Ids are a property of the whole batch, see [`number_records`].
#[derive(Debug, Clone)]
pub struct Draft {
    record: AccidentRecord,
}

impl Draft {
    #[cfg(test)]
    pub fn record(&self) -> &AccidentRecord {
        &self.record
    }
}

/// Where a block came from.
pub struct Provenance<'a> {
    pub source_doc: &'a str,
    pub page_span: Vec<u32>,
    pub default_year: Option<i32>,
}

/// Merge extracted and derived fields into a draft record.
/// Blocks with no code, no mine and no date are noise and yield `None`.
pub fn assemble(
    block_text: &str,
    extracted: ExtractedBlock,
    enrichment: Enrichment,
    profile: &LayoutProfile,
    provenance: Provenance<'_>,
) -> Option<Draft> {
    if enrichment.code.is_none() && enrichment.mine.is_none() && extracted.date.is_none() {
        debug!(
            "discarding block with no code, mine or date: {:?}",
            block_text.chars().take(60).collect::<String>()
        );
        return None;
    }

    let fields = &extracted.fields;
    let persons_killed = match profile.persons_killed {
        PersonsKilledRule::VictimCount => {
            let section = u32::from(fields.get(Field::PersonsKilled).is_some());
            PersonsKilled::Count((extracted.victims.len() as u32).max(section))
        }
        PersonsKilledRule::Summary => fields
            .get(Field::PersonsKilled)
            .map_or(PersonsKilled::Unknown, |s| PersonsKilled::Summary(s.to_string())),
    };
    let narrative = if profile.keep_narrative {
        Some(block_text.trim().to_string()).filter(|s| !s.is_empty())
    } else {
        None
    };

    let record = AccidentRecord {
        accident_id: 0,
        source_doc: provenance.source_doc.to_string(),
        page_span: provenance.page_span,
        year: extracted.year.or(provenance.default_year),
        date: extracted.date.unwrap_or_default(),
        time: fields.get(Field::Time).map(str::to_string),
        mine: enrichment.mine,
        owner: enrichment.owner,
        district: enrichment.district,
        state: enrichment.state,
        code: enrichment.code,
        code_number: enrichment.code_number,
        accident_type: enrichment.accident_type,
        cause: enrichment.cause,
        cause_label: enrichment.cause_label,
        mine_type: enrichment.mine_type,
        severity: enrichment.severity,
        fatalities: extracted.casualties.fatalities,
        injuries: extracted.casualties.injuries,
        persons_killed,
        narrative,
        description: fields.get(Field::Description).map(str::to_string),
        prevention: fields.get(Field::Prevention).map(str::to_string),
        victims: extracted.victims,
    };

    Some(Draft { record })
}

/// Give the batch its dense 1-based ids, in emission order.
pub fn number_records(drafts: Vec<Draft>) -> Vec<AccidentRecord> {
    drafts
        .into_iter()
        .zip(1u32..)
        .map(|(draft, id)| AccidentRecord {
            accident_id: id,
            ..draft.record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::enrich::enrich;
    use crate::parser::extract::extract_block;
    use crate::parser::profile::Layout;

    fn draft(text: &str, layout: Layout) -> Option<Draft> {
        let profile = layout.profile();
        let extracted = extract_block(text, profile);
        let enrichment = enrich(text, &extracted, profile);
        assemble(
            text,
            extracted,
            enrichment,
            profile,
            Provenance {
                source_doc: "test.pdf",
                page_span: vec![3],
                default_year: Some(2015),
            },
        )
    }

    #[test]
    fn noise_block_is_discarded() {
        assert!(draft("some stray footer text, nothing else", Layout::Tabular).is_none());
        assert!(draft("Owner: Somebody\nState: Goa", Layout::Tabular).is_none());
    }

    #[test]
    fn narrative_counts_victims() {
        let text = "1. Date - 05.03.2015\nMine - ABC Colliery\nOwner - XYZ Ltd\nState - Jharkhand\nPerson(s) Killed: 1. Ram Lal, Loader, Male, 34 Years\n\n";
        let d = draft(text, Layout::Narrative).unwrap();
        let r = d.record();
        assert_eq!(r.date, "05.03.2015");
        assert_eq!(r.mine.as_deref(), Some("ABC Colliery"));
        assert_eq!(r.persons_killed, PersonsKilled::Count(1));
        assert_eq!(r.narrative.as_deref(), Some(text.trim()));
        assert_eq!(r.page_span, vec![3]);
    }

    #[test]
    fn narrative_section_without_parsable_victims_counts_one() {
        let text = "1. Date - 05.03.2015\nPerson(s) Killed: an unnamed worker\n";
        let r = draft(text, Layout::Narrative).unwrap();
        assert_eq!(r.record().persons_killed, PersonsKilled::Count(1));
        assert!(r.record().victims.is_empty());
    }

    #[test]
    fn tabular_keeps_summary_text() {
        let text = " 0230 Dumper\nMine: X\nPersons Killed: Two drivers\n";
        let r = draft(text, Layout::Tabular).unwrap();
        assert_eq!(r.record().persons_killed, PersonsKilled::Summary("Two drivers".into()));
        assert_eq!(r.record().narrative, None);
        // no parsable date: the default year applies and the date is empty
        assert_eq!(r.record().date, "");
        assert_eq!(r.record().year, Some(2015));
    }

    #[test]
    fn ids_are_dense_and_ordered() {
        let drafts: Vec<_> = ["A", "B", "C", "D"]
            .iter()
            .map(|m| draft(&format!("0111 Roof\nMine: {m}\n"), Layout::Tabular).unwrap())
            .collect();
        let records = number_records(drafts);
        let ids: Vec<_> = records.iter().map(|r| r.accident_id).collect();
        assert_eq!(ids, [1, 2, 3, 4]);
        let mines: Vec<_> = records.iter().map(|r| r.mine.as_deref().unwrap()).collect();
        assert_eq!(mines, ["A", "B", "C", "D"]);
        assert!(number_records(Vec::new()).is_empty());
    }
}
