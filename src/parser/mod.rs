pub mod assemble;
pub mod enrich;
pub mod extract;
pub mod profile;
pub mod sanitize;
pub mod segment;

use indicatif::ProgressBar;
use rayon::prelude::*;
use tracing::info;

use crate::record::AccidentRecord;
use assemble::{Draft, Provenance};
use profile::LayoutProfile;
use segment::{Block, PageIndex};

const CHUNK_SIZE: usize = 500;

/// Pipeline: pages → sanitized text → blocks → fields → enrichment → records.
///
/// `pages` are `(page number, raw text)` in page order. Blocks are processed in
/// parallel; ids are assigned once every block is known.
pub fn process_document(
    source_doc: &str,
    pages: &[(u32, String)],
    profile: &LayoutProfile,
    default_year: Option<i32>,
    pb: &ProgressBar,
) -> Vec<AccidentRecord> {
    let cleaned: Vec<(u32, String)> = pages
        .iter()
        .map(|(page, text)| (*page, sanitize::clean_page(text, profile.drop_code_lines)))
        .collect();
    let (text, index) = PageIndex::join(&cleaned);
    let blocks = segment::split_records(&text, profile);
    info!(
        "{}: {} pages, {} candidate blocks ({} layout)",
        source_doc,
        pages.len(),
        blocks.len(),
        profile.layout.as_str()
    );

    pb.set_length(blocks.len() as u64);
    let mut drafts = Vec::with_capacity(blocks.len());
    for chunk in blocks.chunks(CHUNK_SIZE) {
        let results: Vec<Option<Draft>> = chunk
            .par_iter()
            .map(|block| process_block(block, &index, source_doc, profile, default_year))
            .collect();
        drafts.extend(results.into_iter().flatten());
        pb.inc(chunk.len() as u64);
    }

    let discarded = blocks.len() - drafts.len();
    let records = assemble::number_records(drafts);
    info!(
        "{}: {} records extracted, {} blocks discarded",
        source_doc,
        records.len(),
        discarded
    );
    records
}

fn process_block(
    block: &Block,
    index: &PageIndex,
    source_doc: &str,
    profile: &LayoutProfile,
    default_year: Option<i32>,
) -> Option<Draft> {
    let extracted = extract::extract_block(&block.text, profile);
    let enrichment = enrich::enrich(&block.text, &extracted, profile);
    let provenance = Provenance {
        source_doc,
        page_span: index.pages_for(&segment::content_span(block)),
        default_year,
    };
    assemble::assemble(&block.text, extracted, enrichment, profile, provenance)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::profile::Layout;
    use crate::record::{Cause, MineType, PersonsKilled, Severity};

    fn fixture_pages(name: &str) -> Vec<(u32, String)> {
        let raw = std::fs::read_to_string(format!("tests/fixtures/{}.txt", name)).unwrap();
        raw.split('\x0C')
            .enumerate()
            .map(|(i, t)| (i as u32 + 1, t.to_string()))
            .collect()
    }

    fn run(name: &str, layout: Layout, year: Option<i32>) -> Vec<AccidentRecord> {
        process_document(
            name,
            &fixture_pages(name),
            layout.profile(),
            year,
            &ProgressBar::hidden(),
        )
    }

    #[test]
    fn no_pages_no_records() {
        for layout in [Layout::Narrative, Layout::Tabular] {
            let records =
                process_document("empty", &[], layout.profile(), None, &ProgressBar::hidden());
            assert!(records.is_empty());
            let blank = vec![(1, String::new()), (2, "   ".to_string())];
            let records =
                process_document("blank", &blank, layout.profile(), None, &ProgressBar::hidden());
            assert!(records.is_empty());
        }
    }

    #[test]
    fn narrative_fixture() {
        let records = run("narrative_2015", Layout::Narrative, Some(2015));
        assert_eq!(records.len(), 4);

        let first = &records[0];
        assert_eq!(first.accident_id, 1);
        assert_eq!(first.date, "05.03.2015");
        assert_eq!(first.mine.as_deref(), Some("ABC Colliery"));
        assert_eq!(first.owner.as_deref(), Some("XYZ Ltd"));
        assert_eq!(first.state.as_deref(), Some("Jharkhand"));
        assert_eq!(first.district.as_deref(), Some("Dhanbad"));
        assert_eq!(first.victims.len(), 1);
        assert_eq!(first.persons_killed, PersonsKilled::Count(1));
        assert_eq!(first.severity, Severity::Fatal);
        assert_eq!(first.mine_type, MineType::Underground);
        assert_eq!(first.page_span, vec![1]);
        // running headers never reach a record
        assert!(records
            .iter()
            .all(|r| !r.narrative.as_deref().unwrap_or("").contains("STATEMENT")));

        let second = &records[1];
        assert_eq!(second.victims.len(), 2);
        assert_eq!(second.persons_killed, PersonsKilled::Count(2));
        assert_eq!(second.mine_type, MineType::Opencast);

        // the third entry runs across the page break
        assert_eq!(records[2].page_span, vec![1, 2]);
        assert_eq!(records[3].page_span, vec![2]);
    }

    #[test]
    fn tabular_fixture() {
        let records = run("tabular_2015", Layout::Tabular, Some(2015));
        // the fourth "Code:" entry carries no code, mine or date
        assert_eq!(records.len(), 3);
        let ids: Vec<_> = records.iter().map(|r| r.accident_id).collect();
        assert_eq!(ids, [1, 2, 3]);

        let first = &records[0];
        assert_eq!(first.code.as_deref(), Some("0111 Fall of roof"));
        assert_eq!(first.code_number.as_deref(), Some("0111"));
        assert_eq!(first.accident_type.as_deref(), Some("Fall Of Roof"));
        assert_eq!(first.cause, Cause::GroundControlFailure);
        assert_eq!(first.date, "2015-03-05");
        assert_eq!(first.year, Some(2015));
        assert_eq!(first.mine.as_deref(), Some("Bhatdih Colliery"));
        assert_eq!(first.state.as_deref(), Some("Jharkhand"));
        assert_eq!(first.persons_killed, PersonsKilled::Summary("One loader".into()));
        assert_eq!(first.severity, Severity::Fatal);

        let second = &records[1];
        assert_eq!(second.code_number.as_deref(), Some("0230"));
        assert_eq!(second.cause, Cause::TransportationAccident);
        assert_eq!(second.mine_type, MineType::Opencast);
        assert_eq!(second.severity, Severity::Serious);

        let third = &records[2];
        assert_eq!(third.cause, Cause::Other);
        assert_eq!(third.date, "");
        assert_eq!(third.year, Some(2015));
        assert_eq!(third.severity, Severity::Minor);
        assert_eq!(third.page_span, vec![2]);
    }

    #[test]
    fn every_code_number_is_four_digits() {
        let records = run("tabular_2015", Layout::Tabular, None);
        for r in &records {
            match (&r.code, &r.code_number) {
                (None, n) => assert!(n.is_none()),
                (Some(_), Some(n)) => {
                    assert_eq!(n.len(), 4);
                    assert!(n.chars().all(|c| c.is_ascii_digit()));
                }
                (Some(c), None) => panic!("code {c:?} without number"),
            }
        }
    }

    #[test]
    fn severity_matches_counts_for_every_record() {
        for (name, layout) in [("narrative_2015", Layout::Narrative), ("tabular_2015", Layout::Tabular)] {
            for r in run(name, layout, None) {
                assert_eq!(r.severity, Severity::from_counts(r.fatalities, r.injuries));
            }
        }
    }
}
