use std::sync::LazyLock;

use regex::Regex;

use crate::record::Severity;

static KILLED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(?:killed|died)\b").unwrap());
static INJURED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\binjured\b").unwrap());

/// Keyword counts over a whole block. A proxy, not a casualty ledger:
/// every occurrence counts, even two in the same sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Casualties {
    pub fatalities: u32,
    pub injuries: u32,
}

impl Casualties {
    pub fn count(block: &str) -> Self {
        Casualties {
            fatalities: KILLED_RE.find_iter(block).count() as u32,
            injuries: INJURED_RE.find_iter(block).count() as u32,
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::from_counts(self.fatalities, self.injuries)
    }
}
