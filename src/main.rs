mod db;
mod export;
mod parser;
mod pdf;
mod record;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use parser::extract::dates::year_from_name;
use parser::profile::Layout;
use record::{AccidentRecord, Cause, Severity};

#[derive(Parser)]
#[command(name = "dgms_extract", about = "DGMS accident volume extraction")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a PDF's pages into the store
    Ingest {
        pdf: PathBuf,
        /// Document name to store pages under (default: file name)
        #[arg(short, long)]
        source: Option<String>,
        /// Also write pages as JSON lines
        #[arg(long)]
        jsonl: Option<PathBuf>,
    },
    /// Extract accident records from stored pages
    Extract {
        /// Document name given at ingest
        source: String,
        #[arg(short, long, value_enum)]
        layout: Layout,
        /// Year for records whose date does not parse (default: from the name)
        #[arg(short, long)]
        year: Option<i32>,
        /// Read pages from a JSON lines file instead of the store
        #[arg(long)]
        jsonl: Option<PathBuf>,
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Write text + metadata documents as JSON lines
        #[arg(long)]
        documents: Option<PathBuf>,
    },
    /// Ingest + extract in one pipeline
    Run {
        pdf: PathBuf,
        #[arg(short, long, value_enum)]
        layout: Layout,
        #[arg(short, long)]
        year: Option<i32>,
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long)]
        documents: Option<PathBuf>,
    },
    /// Export stored records of one document
    Export {
        source: String,
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long)]
        documents: Option<PathBuf>,
    },
    /// Show dashboard totals
    Stats {
        /// Restrict to one document
        #[arg(short, long)]
        source: Option<String>,
    },
    /// Accident records overview table
    Overview {
        /// Filter by state (case-insensitive)
        #[arg(long)]
        state: Option<String>,
        /// Filter by severity (Fatal, Serious, Minor)
        #[arg(long)]
        severity: Option<String>,
        /// Filter by cause (e.g. "Ground Control Failure")
        #[arg(long)]
        cause: Option<String>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ingest { pdf, source, jsonl } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let source = source.unwrap_or_else(|| pdf::source_name(&pdf));
            let pages = ingest(&conn, &pdf, &source, jsonl.as_deref())?;
            println!("Stored {} pages of {}", pages, source);
            Ok(())
        }
        Commands::Extract {
            source,
            layout,
            year,
            jsonl,
            csv,
            documents,
        } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = match &jsonl {
                Some(path) => pdf::read_jsonl(path)?,
                None => db::fetch_pages(&conn, &source)?,
            };
            if pages.is_empty() {
                println!("No pages for {}. Run 'ingest' first.", source);
                return Ok(());
            }
            let records = extract(&conn, &source, &pages, layout, year)?;
            write_exports(&records, csv.as_deref(), documents.as_deref())
        }
        Commands::Run {
            pdf,
            layout,
            year,
            csv,
            documents,
        } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let source = pdf::source_name(&pdf);

            let t_ingest = Instant::now();
            let stored = ingest(&conn, &pdf, &source, None)?;
            println!(
                "Stored {} pages in {:.1}s",
                stored,
                t_ingest.elapsed().as_secs_f64()
            );

            let pages = db::fetch_pages(&conn, &source)?;
            let records = extract(&conn, &source, &pages, layout, year)?;
            write_exports(&records, csv.as_deref(), documents.as_deref())
        }
        Commands::Export {
            source,
            csv,
            documents,
        } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let records = db::fetch_records(&conn, &source)?;
            if records.is_empty() {
                println!("No records for {}. Run 'extract' first.", source);
                return Ok(());
            }
            if csv.is_none() && documents.is_none() {
                println!("{} records stored; pass --csv or --documents to export.", records.len());
                return Ok(());
            }
            write_exports(&records, csv.as_deref(), documents.as_deref())
        }
        Commands::Overview {
            state,
            severity,
            cause,
            limit,
        } => {
            let severity = severity
                .map(|s| Severity::parse(&s).ok_or_else(|| anyhow!("unknown severity {:?}", s)))
                .transpose()?;
            let cause = cause
                .map(|c| Cause::parse(&c).ok_or_else(|| anyhow!("unknown cause {:?}", c)))
                .transpose()?;

            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let rows = db::fetch_overview(&conn, state.as_deref(), severity, cause, limit)?;
            if rows.is_empty() {
                println!("No accidents found.");
                return Ok(());
            }

            println!(
                "{:>4} | {:<10} | {:<14} | {:<24} | {:<22} | {:<7} | {:>3} | {:>3}",
                "#", "Date", "State", "Mine", "Cause", "Sev", "K", "I"
            );
            println!("{}", "-".repeat(106));

            for r in &rows {
                println!(
                    "{:>4} | {:<10} | {:<14} | {:<24} | {:<22} | {:<7} | {:>3} | {:>3}",
                    r.accident_id,
                    truncate(&r.date, 10),
                    truncate(&r.state, 14),
                    truncate(&r.mine, 24),
                    truncate(&r.cause, 22),
                    r.severity,
                    r.fatalities,
                    r.injuries
                );
            }

            let docs: std::collections::BTreeSet<_> = rows.iter().map(|r| r.source_doc.as_str()).collect();
            println!("\n{} accidents from {} document(s)", rows.len(), docs.len());
            Ok(())
        }
        Commands::Stats { source } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn, source.as_deref())?;
            println!("Documents:  {}", s.documents);
            println!("Pages:      {}", s.pages);
            println!("Accidents:  {}", s.records);
            println!("Fatalities: {}", s.fatalities);
            println!("Injuries:   {}", s.injuries);
            for (title, groups) in [
                ("Severity", &s.by_severity),
                ("Cause", &s.by_cause),
                ("State", &s.by_state),
                ("Mine type", &s.by_mine_type),
            ] {
                if groups.is_empty() {
                    continue;
                }
                println!("\n--- {} ---", title);
                for (label, n) in groups {
                    println!("  {:<26} {:>6}", truncate(label, 26), n);
                }
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn ingest(
    conn: &rusqlite::Connection,
    path: &Path,
    source: &str,
    jsonl: Option<&Path>,
) -> anyhow::Result<usize> {
    let mut pages = pdf::read_pages(path)?;
    // code lines are kept here; the tabular layout reads its codes from them
    for page in &mut pages {
        page.text = parser::sanitize::clean_page(&page.text, false);
    }
    if let Some(out) = jsonl {
        pdf::write_jsonl(out, &pages)?;
    }
    db::insert_pages(conn, source, &pages)
        .with_context(|| format!("failed to store pages of {}", source))
}

fn extract(
    conn: &rusqlite::Connection,
    source: &str,
    pages: &[pdf::PageText],
    layout: Layout,
    year: Option<i32>,
) -> anyhow::Result<Vec<AccidentRecord>> {
    let pages: Vec<(u32, String)> = pages.iter().map(|p| (p.page, p.text.clone())).collect();
    let default_year = year.or_else(|| year_from_name(source));

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
            .unwrap()
            .progress_chars("#>-"),
    );
    let records = parser::process_document(source, &pages, layout.profile(), default_year, &pb);
    pb.finish_and_clear();

    db::save_records(conn, source, &records)?;
    let fatalities: u32 = records.iter().map(|r| r.fatalities).sum();
    let injuries: u32 = records.iter().map(|r| r.injuries).sum();
    println!(
        "Saved {} accidents ({} killed, {} injured) from {} pages.",
        records.len(),
        fatalities,
        injuries,
        pages.len()
    );
    Ok(records)
}

fn write_exports(
    records: &[AccidentRecord],
    csv: Option<&Path>,
    documents: Option<&Path>,
) -> anyhow::Result<()> {
    if let Some(path) = csv {
        export::write_csv(path, records)?;
        println!("Wrote {} rows to {}", records.len(), path.display());
    }
    if let Some(path) = documents {
        export::write_documents(path, records)?;
        println!("Wrote {} documents to {}", records.len(), path.display());
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_chars() {
        assert_eq!(truncate("Jharkhand", 14), "Jharkhand");
        assert_eq!(truncate("Ground Control Failure", 6), "Ground...");
        assert_eq!(truncate("Mine–A", 5), "Mine–...");
    }

    #[test]
    fn durations_read_naturally() {
        use std::time::Duration;
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }

    #[test]
    fn cli_parses_layout() {
        let cli = Cli::try_parse_from(["dgms_extract", "extract", "vol.pdf", "--layout", "tabular"]).unwrap();
        match cli.command {
            Commands::Extract { source, layout, .. } => {
                assert_eq!(source, "vol.pdf");
                assert_eq!(layout, Layout::Tabular);
            }
            _ => panic!("wrong subcommand"),
        }
        assert!(Cli::try_parse_from(["dgms_extract", "extract", "vol.pdf", "--layout", "csv"]).is_err());
    }
}
