use std::ops::Range;

use super::profile::{LayoutProfile, Segmentation};

/// One candidate accident record: its text and where it sits in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub text: String,
    pub span: Range<usize>,
}

/// Split the concatenated document into record blocks, in document order.
/// Text before the first delimiter is preamble and never becomes a block.
pub fn split_records(text: &str, profile: &LayoutProfile) -> Vec<Block> {
    let matches: Vec<_> = profile.delimiter.find_iter(text).collect();
    let mut blocks = Vec::with_capacity(matches.len());

    for (i, m) in matches.iter().enumerate() {
        let end = matches.get(i + 1).map_or(text.len(), |next| next.start());
        let start = match profile.segmentation {
            Segmentation::KeepDelimiter => m.start() + leading_ws(m.as_str()),
            Segmentation::DropDelimiter => m.end(),
        };
        blocks.push(Block {
            text: text[start..end].to_string(),
            span: start..end,
        });
    }

    blocks
}

fn leading_ws(s: &str) -> usize {
    s.len() - s.trim_start().len()
}

/// Maps byte offsets of the joined document back to 1-based page numbers.
#[derive(Debug, Clone, Default)]
pub struct PageIndex {
    // (start offset, page number), ascending by offset
    starts: Vec<(usize, u32)>,
}

impl PageIndex {
    /// Join pages with "\n", remembering where each one starts.
    pub fn join(pages: &[(u32, String)]) -> (String, PageIndex) {
        let mut text = String::new();
        let mut starts = Vec::with_capacity(pages.len());
        for (i, (page, page_text)) in pages.iter().enumerate() {
            if i > 0 {
                text.push('\n');
            }
            starts.push((text.len(), *page));
            text.push_str(page_text);
        }
        (text, PageIndex { starts })
    }

    /// Pages overlapping `span` (whitespace-only edges are ignored by the caller).
    pub fn pages_for(&self, span: &Range<usize>) -> Vec<u32> {
        let mut out = Vec::new();
        for (i, &(start, page)) in self.starts.iter().enumerate() {
            let end = self.starts.get(i + 1).map_or(usize::MAX, |&(s, _)| s);
            let overlaps = start < span.end.max(span.start + 1) && span.start < end;
            if overlaps && !out.contains(&page) {
                out.push(page);
            }
        }
        out
    }
}

/// Shrink a block span so that leading/trailing whitespace does not pull in
/// a neighbouring page.
pub fn content_span(block: &Block) -> Range<usize> {
    let lead = leading_ws(&block.text);
    let trail = block.text.len() - block.text.trim_end().len();
    let start = block.span.start + lead;
    let end = (block.span.end - trail).max(start);
    start..end
}
