use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::standings::{StandingRow, StandingsTable};

const HEADERS: [&str; 8] = ["League", "Pos", "Team", "P", "W", "D", "L", "Pts"];

/// Writes the table to a single "Standings" sheet. Returns the number of
/// team rows written.
pub fn export_standings(path: &Path, table: &StandingsTable) -> Result<usize> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name("Standings")
        .context("name standings sheet")?;

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *header)
            .with_context(|| format!("write header {col}"))?;
    }

    let mut written = 0usize;
    for (row_idx, (league, row)) in table.rows().enumerate() {
        write_row(worksheet, (row_idx + 1) as u32, league, row)?;
        written += 1;
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
    }
    workbook
        .save(path)
        .with_context(|| format!("save {}", path.display()))?;
    Ok(written)
}

fn write_row(worksheet: &mut Worksheet, row: u32, league: &str, standing: &StandingRow) -> Result<()> {
    worksheet
        .write_string(row, 0, league)
        .with_context(|| format!("write cell ({row},0)"))?;
    worksheet
        .write_number(row, 1, standing.position as f64)
        .with_context(|| format!("write cell ({row},1)"))?;
    worksheet
        .write_string(row, 2, &standing.team)
        .with_context(|| format!("write cell ({row},2)"))?;
    let numbers = [
        f64::from(standing.played),
        f64::from(standing.won),
        f64::from(standing.draw),
        f64::from(standing.lost),
        standing.points as f64,
    ];
    for (offset, value) in numbers.iter().enumerate() {
        let col = 3 + offset as u16;
        worksheet
            .write_number(row, col, *value)
            .with_context(|| format!("write cell ({row},{col})"))?;
    }
    Ok(())
}
