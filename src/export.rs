use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::record::AccidentRecord;

/// Column order the dashboard reads.
pub const CSV_COLUMNS: &[&str] = &[
    "accident_id",
    "accident_code",
    "code_number",
    "date",
    "year",
    "state",
    "district",
    "mine_name",
    "mine_type",
    "owner",
    "accident_type",
    "cause",
    "severity",
    "fatalities",
    "injuries",
    "persons_killed",
    "description",
];

fn create(path: &Path) -> Result<BufWriter<File>> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

pub fn write_csv(path: &Path, records: &[AccidentRecord]) -> Result<()> {
    let mut out = create(path)?;
    writeln!(out, "{}", CSV_COLUMNS.join(","))?;
    for r in records {
        writeln!(out, "{}", csv_row(r).join(","))?;
    }
    out.flush()?;
    Ok(())
}

fn csv_row(r: &AccidentRecord) -> Vec<String> {
    let opt = |v: &Option<String>| escape_csv(v.as_deref().unwrap_or(""));
    vec![
        r.accident_id.to_string(),
        opt(&r.code),
        opt(&r.code_number),
        escape_csv(&r.date),
        r.year.map(|y| y.to_string()).unwrap_or_default(),
        opt(&r.state),
        opt(&r.district),
        opt(&r.mine),
        r.mine_type.as_str().to_string(),
        opt(&r.owner),
        opt(&r.accident_type),
        escape_csv(&r.cause_label),
        r.severity.as_str().to_string(),
        r.fatalities.to_string(),
        r.injuries.to_string(),
        opt(&r.persons_killed.to_text()),
        opt(&r.description),
    ]
}

fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Flat text plus metadata, the shape the retrieval index ingests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub text: String,
    pub metadata: Map<String, Value>,
}

pub fn to_document(r: &AccidentRecord) -> Result<Document> {
    let persons_killed = r.persons_killed.to_text();
    let date = Some(r.date.clone()).filter(|d| !d.is_empty());
    let lines = [
        ("Date", &date),
        ("Mine", &r.mine),
        ("Owner", &r.owner),
        ("State", &r.state),
        ("District", &r.district),
        ("Persons Killed", &persons_killed),
        ("Narrative", &r.narrative),
    ];
    let text = lines
        .iter()
        .filter_map(|(label, value)| value.as_ref().map(|v| format!("{}: {}", label, v)))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(Document {
        text,
        metadata: flat_metadata(r)?,
    })
}

/// Every record field, with lists and objects turned into JSON strings.
fn flat_metadata(r: &AccidentRecord) -> Result<Map<String, Value>> {
    let Value::Object(fields) = serde_json::to_value(r)? else {
        anyhow::bail!("record did not serialize to an object");
    };
    let mut meta = Map::new();
    for (key, value) in fields {
        let flat = match value {
            Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
            scalar => scalar,
        };
        meta.insert(key, flat);
    }
    meta.remove("cause_label");
    meta.insert("cause".to_string(), Value::String(r.cause_label.clone()));
    // keep the stored text form rather than the untagged enum
    meta.insert(
        "persons_killed".to_string(),
        r.persons_killed.to_text().map_or(Value::Null, Value::String),
    );
    Ok(meta)
}

pub fn write_documents(path: &Path, records: &[AccidentRecord]) -> Result<()> {
    let mut out = create(path)?;
    for r in records {
        serde_json::to_writer(&mut out, &to_document(r)?)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
