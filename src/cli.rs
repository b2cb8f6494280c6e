use std::{io, path::PathBuf};

use chrono::{DateTime, Local, NaiveDate, NaiveTime, Timelike, Utc};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{BLOCK_COUNT, GRID},
    domain::{ActivityCatalog, BlockGrid, block_position, productive_progress},
    engine::clock::{block_label, block_start_label, elapsed_blocks},
    storage::{self, DataPaths, PlanDiscovery},
};

#[derive(Parser, Debug)]
#[command(name = "dayblocks")]
#[command(about = "Plan your day in 144 ten-minute blocks", long_about = None)]
pub struct Cli {
    #[arg(long, global = true, help = "Directory holding settings, plans and tunes")]
    pub data_dir: Option<PathBuf>,

    #[arg(long, global = true, help = "Do not play a tune when a block elapses")]
    pub mute: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(about = "Show how far through the day you are")]
    Status {
        #[arg(long, short, help = "Saved plan name")]
        plan: Option<String>,
    },

    #[command(about = "List saved plans")]
    Plans,

    #[command(about = "Print a saved plan as a grid")]
    Show {
        #[arg(long, short, help = "Saved plan name")]
        plan: Option<String>,
    },

    #[command(about = "Link a range of blocks to an activity")]
    Set {
        #[arg(long, short, help = "Saved plan name (created if missing)")]
        plan: String,

        #[arg(long, help = "Start time, HH:MM")]
        from: String,

        #[arg(long, help = "End time, HH:MM (24:00 for midnight)")]
        to: String,

        #[arg(help = "Activity name, or -1 to unlink")]
        activity: String,
    },

    #[command(about = "Export a plan")]
    Export {
        #[arg(long, value_enum, help = "Export format")]
        format: ExportFormat,

        #[arg(long, short, help = "Saved plan name")]
        plan: Option<String>,

        #[arg(long, short, help = "Output path")]
        out: Option<PathBuf>,
    },

    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(help = "Shell type (bash, zsh, fish)")]
        shell: String,
    },
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ExportFormat {
    Json,
    Ics,
    Csv,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockExport {
    pub hour: usize,
    pub slot: usize,
    pub start: String,
    pub end: String,
    pub activity: String,
    pub productive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanExport {
    pub schema_version: u32,
    pub exported_at: DateTime<Utc>,
    pub plan: Option<String>,
    pub blocks: Vec<BlockExport>,
}

fn catalog_for(paths: &DataPaths) -> Result<ActivityCatalog, String> {
    let settings = storage::load_or_create_settings(&paths.settings).map_err(|e| e.to_string())?;
    Ok(settings.catalog())
}

/// An explicit name wins; otherwise a lone saved plan is used.
fn resolve_plan_name(paths: &DataPaths, plan: Option<String>) -> Result<Option<String>, String> {
    if plan.is_some() {
        return Ok(plan);
    }

    match storage::discover_plans(&paths.plans_dir) {
        PlanDiscovery::None => Ok(None),
        PlanDiscovery::Single(name) => Ok(Some(name)),
        PlanDiscovery::Multiple(names) => Err(format!(
            "Several saved plans found, pick one with --plan: {}",
            names.join(", ")
        )),
    }
}

fn load_grid(
    paths: &DataPaths,
    catalog: &ActivityCatalog,
    plan: Option<String>,
) -> Result<(Option<String>, BlockGrid), String> {
    let name = resolve_plan_name(paths, plan)?;
    let grid = match &name {
        Some(name) => {
            storage::load_plan(&paths.plans_dir, name, catalog).map_err(|e| e.to_string())?
        }
        None => BlockGrid::new(),
    };
    Ok((name, grid))
}

pub fn status(paths: &DataPaths, plan: Option<String>) -> Result<(), String> {
    let catalog = catalog_for(paths)?;
    let (name, grid) = load_grid(paths, &catalog, plan)?;

    let now = Local::now();
    let elapsed = elapsed_blocks(&now);
    let (row, col) = block_position(elapsed + 1);
    let current = catalog.resolve(grid.get(row, col));
    let progress = productive_progress(&grid, &catalog, elapsed);

    println!(
        "{} ({})",
        now.format("%H:%M"),
        name.as_deref().unwrap_or("no saved plan")
    );
    println!("{}", "-".repeat(40));
    println!("{:20} {}/{}", "Blocks elapsed", elapsed, BLOCK_COUNT);
    println!("{:20} {} {}", "Current block", block_label(row, col), current.label());
    println!("{:20} {}", "Productive", progress);
    Ok(())
}

pub fn list_plans(paths: &DataPaths) -> Result<(), String> {
    let names = storage::list_plans(&paths.plans_dir);
    if names.is_empty() {
        println!("No saved plans in {}", paths.plans_dir.display());
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

fn truncate_label(value: &str, max_chars: usize) -> String {
    let count = value.chars().count();
    if count <= max_chars {
        return value.to_string();
    }

    if max_chars <= 3 {
        return value.chars().take(max_chars).collect();
    }

    let prefix: String = value.chars().take(max_chars - 3).collect();
    format!("{}...", prefix)
}

pub fn render_grid_text(grid: &BlockGrid, catalog: &ActivityCatalog) -> String {
    let mut out = String::from("      ");
    for col in 0..GRID.cols {
        out.push_str(&format!(" :{}0      ", col));
    }
    out.push('\n');

    for row in 0..GRID.rows {
        out.push_str(&format!("{:02}:00 ", row));
        for col in 0..GRID.cols {
            let id = grid.get(row, col);
            let label = if id.is_unlinked() {
                "·".to_string()
            } else {
                truncate_label(catalog.resolve(id).label(), 8)
            };
            out.push_str(&format!(" {:<8}", label));
        }
        out.push('\n');
    }
    out
}

pub fn show(paths: &DataPaths, plan: Option<String>) -> Result<(), String> {
    let catalog = catalog_for(paths)?;
    let (name, grid) = load_grid(paths, &catalog, plan)?;

    println!("{}", name.as_deref().unwrap_or("(empty plan)"));
    print!("{}", render_grid_text(&grid, &catalog));
    Ok(())
}

fn parse_clock(raw: &str) -> Result<u32, String> {
    let raw = raw.trim();
    if raw == "24:00" {
        return Ok(24 * 60);
    }
    let time = NaiveTime::parse_from_str(raw, "%H:%M")
        .map_err(|_| format!("'{}' is not a time of day (HH:MM)", raw))?;
    Ok(time.hour() * 60 + time.minute())
}

/// 1-based block indices overlapping `[from, to)`.
pub fn block_range(from: &str, to: &str) -> Result<std::ops::Range<usize>, String> {
    let from_min = parse_clock(from)?;
    let to_min = parse_clock(to)?;
    if to_min <= from_min {
        return Err(format!("'{}' must be later than '{}'", to, from));
    }

    let block = GRID.minutes_per_block;
    let first = (from_min / block) as usize + 1;
    let last = to_min.div_ceil(block) as usize;
    Ok(first..last + 1)
}

pub fn set_blocks(
    paths: &DataPaths,
    plan: &str,
    from: &str,
    to: &str,
    activity: &str,
) -> Result<(), String> {
    let catalog = catalog_for(paths)?;
    let id = catalog
        .find_by_name(activity)
        .map(|activity| activity.id.clone())
        .ok_or_else(|| format!("Activity '{}' not found", activity))?;
    let range = block_range(from, to)?;

    let mut grid = match storage::load_plan(&paths.plans_dir, plan, &catalog) {
        Ok(grid) => grid,
        Err(storage::StorageError::PlanNotFound(_)) => BlockGrid::new(),
        Err(e) => return Err(e.to_string()),
    };

    let count = range.len();
    grid.fill(range, &id);
    storage::save_plan(&paths.plans_dir, plan, &grid).map_err(|e| e.to_string())?;

    println!(
        "Linked {} blocks ({}-{}) to '{}' in plan '{}'",
        count,
        from,
        to,
        catalog.resolve(&id).label(),
        plan.trim()
    );
    Ok(())
}

pub fn export_rows(grid: &BlockGrid, catalog: &ActivityCatalog) -> Vec<BlockExport> {
    grid.iter()
        .map(|(row, col, id)| BlockExport {
            hour: row,
            slot: col,
            start: block_start_label(row, col),
            end: block_label(row, col)[6..].to_string(),
            activity: id.0.clone(),
            productive: catalog.is_productive(id),
        })
        .collect()
}

/// One VEVENT per run of consecutive blocks linked to the same activity.
pub fn render_ics(grid: &BlockGrid, day: NaiveDate, stamp: DateTime<Utc>) -> String {
    let mut ics = String::new();
    ics.push_str("BEGIN:VCALENDAR\r\n");
    ics.push_str("VERSION:2.0\r\n");
    ics.push_str("PRODID:-//dayblocks//daily plan//EN\r\n");

    let runs = grid
        .iter()
        .enumerate()
        .group_by(|(_, (_, _, id))| (*id).clone());

    for (id, blocks) in &runs {
        if id.is_unlinked() {
            continue;
        }
        let indices: Vec<usize> = blocks.map(|(i, _)| i).collect();
        let (Some(&first), Some(&last)) = (indices.first(), indices.last()) else {
            continue;
        };

        let minutes = i64::from(GRID.minutes_per_block);
        let midnight = day.and_time(NaiveTime::default());
        let start = midnight + chrono::Duration::minutes(first as i64 * minutes);
        let end = midnight + chrono::Duration::minutes((last as i64 + 1) * minutes);

        ics.push_str("BEGIN:VEVENT\r\n");
        ics.push_str(&format!(
            "UID:dayblocks-{}-{}\r\n",
            day.format("%Y%m%d"),
            first + 1
        ));
        ics.push_str(&format!("DTSTAMP:{}\r\n", stamp.format("%Y%m%dT%H%M%SZ")));
        ics.push_str(&format!("DTSTART:{}\r\n", start.format("%Y%m%dT%H%M%S")));
        ics.push_str(&format!("DTEND:{}\r\n", end.format("%Y%m%dT%H%M%S")));
        ics.push_str(&format!("SUMMARY:{}\r\n", id));
        ics.push_str(&format!("CATEGORIES:{}\r\n", id));
        ics.push_str("END:VEVENT\r\n");
    }

    ics.push_str("END:VCALENDAR\r\n");
    ics
}

pub fn render_csv(rows: &[BlockExport]) -> Result<String, String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row).map_err(|e| e.to_string())?;
    }
    let bytes = writer.into_inner().map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

pub fn export_plan(
    paths: &DataPaths,
    format: ExportFormat,
    plan: Option<String>,
    out_path: Option<PathBuf>,
) -> Result<(), String> {
    let catalog = catalog_for(paths)?;
    let (name, grid) = load_grid(paths, &catalog, plan)?;

    let content = match format {
        ExportFormat::Json => {
            let export = PlanExport {
                schema_version: 1,
                exported_at: Utc::now(),
                plan: name,
                blocks: export_rows(&grid, &catalog),
            };
            serde_json::to_string_pretty(&export).map_err(|e| e.to_string())?
        }
        ExportFormat::Ics => render_ics(&grid, Local::now().date_naive(), Utc::now()),
        ExportFormat::Csv => render_csv(&export_rows(&grid, &catalog))?,
    };

    if let Some(path) = out_path {
        storage::write_text_file(&path, &content).map_err(|e| e.to_string())?;
        println!("Exported to {}", path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

pub fn print_completions(shell: &str) -> Result<(), String> {
    use clap_complete::Shell;
    let shell = match shell {
        "bash" => Shell::Bash,
        "zsh" => Shell::Zsh,
        "fish" => Shell::Fish,
        _ => {
            return Err(format!(
                "Unsupported shell: {}. Use bash, zsh, or fish.",
                shell
            ));
        }
    };
    clap_complete::generate(shell, &mut Cli::command(), "dayblocks", &mut io::stdout());
    Ok(())
}

pub fn run_command(command: Command, paths: &DataPaths) {
    let result = match command {
        Command::Status { plan } => status(paths, plan),
        Command::Plans => list_plans(paths),
        Command::Show { plan } => show(paths, plan),
        Command::Set {
            plan,
            from,
            to,
            activity,
        } => set_blocks(paths, &plan, &from, &to, &activity),
        Command::Export { format, plan, out } => export_plan(paths, format, plan, out),
        Command::Completions { shell } => print_completions(&shell),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActivityId, tests::sample_catalog};

    #[test]
    fn test_block_range_covers_overlapping_blocks() {
        assert_eq!(block_range("09:00", "10:00").unwrap(), 55..61);
        assert_eq!(block_range("09:05", "09:15").unwrap(), 55..57);
        assert_eq!(block_range("23:00", "24:00").unwrap(), 139..145);
        assert!(block_range("10:00", "09:00").is_err());
        assert!(block_range("25:00", "26:00").is_err());
    }

    #[test]
    fn test_export_rows_cover_all_blocks() {
        let catalog = sample_catalog();
        let mut grid = BlockGrid::new();
        grid.set(23, 5, ActivityId::new("Work"));

        let rows = export_rows(&grid, &catalog);
        assert_eq!(rows.len(), BLOCK_COUNT);
        let last = rows.last().unwrap();
        assert_eq!(last.start, "23:50");
        assert_eq!(last.end, "00:00");
        assert_eq!(last.activity, "Work");
        assert!(last.productive);
        assert!(!rows[0].productive);
    }

    #[test]
    fn test_ics_merges_consecutive_blocks() {
        let mut grid = BlockGrid::new();
        grid.fill(55..61, &ActivityId::new("Work"));
        grid.fill(144..145, &ActivityId::new("Sleep"));

        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let ics = render_ics(&grid, day, Utc::now());

        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);
        assert!(ics.contains("DTSTART:20260302T090000\r\n"));
        assert!(ics.contains("DTEND:20260302T100000\r\n"));
        assert!(ics.contains("DTEND:20260303T000000\r\n"));
    }

    #[test]
    fn test_csv_has_header_and_rows() {
        let catalog = sample_catalog();
        let csv = render_csv(&export_rows(&BlockGrid::new(), &catalog)).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("hour,slot,start,end,activity,productive")
        );
        assert_eq!(lines.next(), Some("0,0,00:00,00:10,-1,false"));
        assert_eq!(csv.lines().count(), BLOCK_COUNT + 1);
    }

    #[test]
    fn test_text_grid_has_row_per_hour() {
        let catalog = sample_catalog();
        let mut grid = BlockGrid::new();
        grid.set(8, 0, ActivityId::new("Work"));

        let text = render_grid_text(&grid, &catalog);
        assert_eq!(text.lines().count(), GRID.rows + 1);
        assert!(text.lines().nth(9).unwrap().starts_with("08:00  Work"));
    }
}
