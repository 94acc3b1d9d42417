use std::path::Path;

use anyhow::Result;
use rusqlite::Connection;

use crate::pdf::PageText;
use crate::record::{AccidentRecord, Cause, Gender, MineType, PersonsKilled, Severity, Victim};

const DB_PATH: &str = "data/dgms.sqlite";

/// Open the store at `$DGMS_DB_PATH`, or `data/dgms.sqlite`.
pub fn connect() -> Result<Connection> {
    let path = std::env::var("DGMS_DB_PATH").unwrap_or_else(|_| DB_PATH.to_string());
    if let Some(dir) = Path::new(&path).parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let conn = Connection::open(&path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS pages (
            id          INTEGER PRIMARY KEY,
            source_doc  TEXT NOT NULL,
            page        INTEGER NOT NULL,
            text        TEXT NOT NULL,
            ingested_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(source_doc, page)
        );
        CREATE INDEX IF NOT EXISTS idx_pages_source ON pages(source_doc);

        CREATE TABLE IF NOT EXISTS accidents (
            source_doc     TEXT NOT NULL,
            accident_id    INTEGER NOT NULL,
            accident_code  TEXT,
            code_number    TEXT CHECK(code_number IS NULL OR length(code_number) = 4),
            date           TEXT NOT NULL,
            year           INTEGER,
            time           TEXT,
            state          TEXT,
            district       TEXT,
            mine_name      TEXT,
            mine_type      TEXT NOT NULL CHECK(mine_type IN ('Opencast','Underground')),
            owner          TEXT,
            accident_type  TEXT,
            cause          TEXT NOT NULL,
            severity       TEXT NOT NULL CHECK(severity IN ('Fatal','Serious','Minor')),
            fatalities     INTEGER NOT NULL,
            injuries       INTEGER NOT NULL,
            persons_killed TEXT,
            narrative      TEXT,
            description    TEXT,
            prevention     TEXT,
            page_span      TEXT NOT NULL,
            extracted_at   TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (source_doc, accident_id)
        );
        CREATE INDEX IF NOT EXISTS idx_accidents_state ON accidents(state);
        CREATE INDEX IF NOT EXISTS idx_accidents_cause ON accidents(cause);

        CREATE TABLE IF NOT EXISTS victims (
            source_doc   TEXT NOT NULL,
            accident_id  INTEGER NOT NULL,
            position     INTEGER NOT NULL,
            name         TEXT,
            role         TEXT,
            gender       TEXT CHECK(gender IS NULL OR gender IN ('Male','Female')),
            age          INTEGER,
            PRIMARY KEY (source_doc, accident_id, position),
            FOREIGN KEY (source_doc, accident_id)
                REFERENCES accidents(source_doc, accident_id) ON DELETE CASCADE
        );
        ",
    )?;
    Ok(())
}

// ── Pages ──

/// Store the pages of `source_doc`, replacing whatever an earlier ingest left.
pub fn insert_pages(conn: &Connection, source_doc: &str, pages: &[PageText]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM pages WHERE source_doc = ?1", [source_doc])?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO pages (source_doc, page, text) VALUES (?1, ?2, ?3)",
        )?;
        for p in pages {
            count += stmt.execute(rusqlite::params![source_doc, p.page, p.text])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub fn fetch_pages(conn: &Connection, source_doc: &str) -> Result<Vec<PageText>> {
    let mut stmt =
        conn.prepare("SELECT page, text FROM pages WHERE source_doc = ?1 ORDER BY page")?;
    let rows = stmt
        .query_map([source_doc], |row| {
            Ok(PageText {
                page: row.get(0)?,
                text: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Records ──

/// Replace every stored record of `source_doc` with `records`.
/// Ids only mean something within one batch, so batches are never merged.
pub fn save_records(conn: &Connection, source_doc: &str, records: &[AccidentRecord]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM victims WHERE source_doc = ?1", [source_doc])?;
    tx.execute("DELETE FROM accidents WHERE source_doc = ?1", [source_doc])?;
    {
        let mut acc = tx.prepare(
            "INSERT INTO accidents
             (source_doc, accident_id, accident_code, code_number, date, year, time, state,
              district, mine_name, mine_type, owner, accident_type, cause, severity,
              fatalities, injuries, persons_killed, narrative, description, prevention, page_span)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                     ?16, ?17, ?18, ?19, ?20, ?21, ?22)",
        )?;
        let mut vic = tx.prepare(
            "INSERT INTO victims (source_doc, accident_id, position, name, role, gender, age)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for r in records {
            acc.execute(rusqlite::params![
                source_doc,
                r.accident_id,
                r.code,
                r.code_number,
                r.date,
                r.year,
                r.time,
                r.state,
                r.district,
                r.mine,
                r.mine_type.as_str(),
                r.owner,
                r.accident_type,
                r.cause_label,
                r.severity.as_str(),
                r.fatalities,
                r.injuries,
                r.persons_killed.to_text(),
                r.narrative,
                r.description,
                r.prevention,
                serde_json::to_string(&r.page_span)?,
            ])?;
            for (pos, v) in r.victims.iter().enumerate() {
                vic.execute(rusqlite::params![
                    source_doc,
                    r.accident_id,
                    pos as u32,
                    v.name,
                    v.role,
                    v.gender.map(|g| g.as_str()),
                    v.age,
                ])?;
            }
        }
    }
    tx.commit()?;
    Ok(())
}

pub fn fetch_records(conn: &Connection, source_doc: &str) -> Result<Vec<AccidentRecord>> {
    let mut stmt = conn.prepare(
        "SELECT accident_id, accident_code, code_number, date, year, time, state, district,
                mine_name, mine_type, owner, accident_type, cause, fatalities, injuries,
                persons_killed, narrative, description, prevention, page_span
         FROM accidents WHERE source_doc = ?1 ORDER BY accident_id",
    )?;
    let mut records = stmt
        .query_map([source_doc], |row| {
            let mine_type: String = row.get(9)?;
            let cause: String = row.get(12)?;
            let fatalities: u32 = row.get(13)?;
            let injuries: u32 = row.get(14)?;
            let page_span: String = row.get(19)?;
            Ok(AccidentRecord {
                accident_id: row.get(0)?,
                source_doc: source_doc.to_string(),
                code: row.get(1)?,
                code_number: row.get(2)?,
                date: row.get(3)?,
                year: row.get(4)?,
                time: row.get(5)?,
                state: row.get(6)?,
                district: row.get(7)?,
                mine: row.get(8)?,
                mine_type: MineType::parse(&mine_type).unwrap_or(MineType::Underground),
                owner: row.get(10)?,
                accident_type: row.get(11)?,
                cause: Cause::parse(&cause).unwrap_or(Cause::Other),
                cause_label: cause,
                severity: Severity::from_counts(fatalities, injuries),
                fatalities,
                injuries,
                persons_killed: PersonsKilled::from_text(row.get(15)?),
                narrative: row.get(16)?,
                description: row.get(17)?,
                prevention: row.get(18)?,
                page_span: serde_json::from_str(&page_span).unwrap_or_default(),
                victims: Vec::new(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut vstmt = conn.prepare(
        "SELECT accident_id, name, role, gender, age FROM victims
         WHERE source_doc = ?1 ORDER BY accident_id, position",
    )?;
    let victims = vstmt
        .query_map([source_doc], |row| {
            let gender: Option<String> = row.get(3)?;
            Ok((
                row.get::<_, u32>(0)?,
                Victim {
                    name: row.get(1)?,
                    role: row.get(2)?,
                    gender: gender.as_deref().and_then(Gender::parse),
                    age: row.get(4)?,
                },
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for (id, victim) in victims {
        if let Some(r) = records.iter_mut().find(|r| r.accident_id == id) {
            r.victims.push(victim);
        }
    }
    Ok(records)
}

// ── Overview / stats ──

pub struct OverviewRow {
    pub source_doc: String,
    pub accident_id: u32,
    pub date: String,
    pub state: String,
    pub mine: String,
    pub cause: String,
    pub severity: String,
    pub fatalities: u32,
    pub injuries: u32,
}

pub fn fetch_overview(
    conn: &Connection,
    state: Option<&str>,
    severity: Option<Severity>,
    cause: Option<Cause>,
    limit: usize,
) -> Result<Vec<OverviewRow>> {
    let mut conditions = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(s) = state {
        conditions.push(format!("state = ?{} COLLATE NOCASE", params.len() + 1));
        params.push(Box::new(s.to_string()));
    }
    if let Some(s) = severity {
        conditions.push(format!("severity = ?{}", params.len() + 1));
        params.push(Box::new(s.as_str()));
    }
    if let Some(c) = cause {
        conditions.push(format!("cause = ?{} COLLATE NOCASE", params.len() + 1));
        params.push(Box::new(c.as_str()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        "SELECT source_doc, accident_id, date, COALESCE(state,''), COALESCE(mine_name,''),
                cause, severity, fatalities, injuries
         FROM accidents{}
         ORDER BY source_doc, accident_id
         LIMIT {}",
        where_clause, limit
    );

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            Ok(OverviewRow {
                source_doc: row.get(0)?,
                accident_id: row.get(1)?,
                date: row.get(2)?,
                state: row.get(3)?,
                mine: row.get(4)?,
                cause: row.get(5)?,
                severity: row.get(6)?,
                fatalities: row.get(7)?,
                injuries: row.get(8)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub struct Stats {
    pub documents: usize,
    pub pages: usize,
    pub records: usize,
    pub fatalities: usize,
    pub injuries: usize,
    pub by_severity: Vec<(String, usize)>,
    pub by_cause: Vec<(String, usize)>,
    pub by_state: Vec<(String, usize)>,
    pub by_mine_type: Vec<(String, usize)>,
}

pub fn get_stats(conn: &Connection, source_doc: Option<&str>) -> Result<Stats> {
    // NULL matches every document
    let filter = "(?1 IS NULL OR source_doc = ?1)";
    let count = |sql: &str| -> Result<usize> {
        Ok(conn.query_row(&format!("{} WHERE {}", sql, filter), [source_doc], |r| r.get(0))?)
    };
    let group = |column: &str, top: usize| -> Result<Vec<(String, usize)>> {
        let sql = format!(
            "SELECT COALESCE(NULLIF({col},''),'(unknown)') AS label, COUNT(*) FROM accidents
             WHERE {filter} GROUP BY label COLLATE NOCASE ORDER BY 2 DESC, 1 LIMIT {top}",
            col = column,
            filter = filter,
            top = top
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([source_doc], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    };

    Ok(Stats {
        documents: count("SELECT COUNT(DISTINCT source_doc) FROM pages")?,
        pages: count("SELECT COUNT(*) FROM pages")?,
        records: count("SELECT COUNT(*) FROM accidents")?,
        fatalities: count("SELECT COALESCE(SUM(fatalities),0) FROM accidents")?,
        injuries: count("SELECT COALESCE(SUM(injuries),0) FROM accidents")?,
        by_severity: group("severity", 3)?,
        by_cause: group("cause", Cause::ALL.len())?,
        by_state: group("state", 10)?,
        by_mine_type: group("mine_type", 2)?,
    })
}
