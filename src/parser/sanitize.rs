use std::sync::LazyLock;

use regex::Regex;

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^STATEMENT\s+NO").unwrap());
static CODE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^Code\s*:").unwrap());
static HSPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

/// Clean one page: drop running headers (and stray "Code:" lines when asked),
/// collapse horizontal whitespace, trim the page.
pub fn clean_page(text: &str, drop_code_lines: bool) -> String {
    let kept: Vec<&str> = text
        .lines()
        .filter(|line| {
            let l = line.trim();
            !(HEADER_RE.is_match(l) || (drop_code_lines && CODE_LINE_RE.is_match(l)))
        })
        .collect();

    let joined = kept.join("\n");
    HSPACE_RE.replace_all(&joined, " ").trim().to_string()
}
