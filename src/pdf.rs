use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// One page of extracted text, 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    pub page: u32,
    pub text: String,
}

/// Read every page of a PDF as text. Image-only pages come back empty.
pub fn read_pages(path: &Path) -> Result<Vec<PageText>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let texts = pdf_extract::extract_text_from_mem_by_pages(&bytes)
        .map_err(|e| anyhow!("PDF text extraction failed for {}: {}", path.display(), e))?;

    let pages: Vec<PageText> = texts
        .into_iter()
        .zip(1u32..)
        .map(|(text, page)| PageText { page, text })
        .collect();

    let empty = pages.iter().filter(|p| p.text.trim().is_empty()).count();
    if empty == pages.len() {
        warn!("{}: no text layer on any of {} pages", path.display(), pages.len());
    } else {
        info!("{}: read {} pages ({} empty)", path.display(), pages.len(), empty);
    }
    Ok(pages)
}

/// Logical document name: the file name, falling back to the full path.
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

/// One `{"page": n, "text": "..."}` object per line.
pub fn write_jsonl(path: &Path, pages: &[PageText]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for page in pages {
        serde_json::to_writer(&mut out, page)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

pub fn read_jsonl(path: &Path) -> Result<Vec<PageText>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut pages = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let page: PageText = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: bad page record", path.display(), i + 1))?;
        pages.push(page);
    }
    Ok(pages)
}
