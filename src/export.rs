use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_xlsxwriter::{
    Color, ConditionalFormatText, ConditionalFormatTextRule, Format, FormatAlign, FormatBorder,
    Workbook, Worksheet,
};

use crate::config::WeekSelector;
use crate::model::{
    PlayerPropRecord, PlayerStatRecord, REPORT_COLUMNS, ReconciliationReport, StatValue,
};
use crate::store::stat_columns;

const HEADER_FILL: u32 = 0xD7E4BC;
const OVER_FILL: u32 = 0xC6EFCE;
const OVER_FONT: u32 = 0x006100;
const UNDER_FILL: u32 = 0xFFC7CE;
const UNDER_FONT: u32 = 0x9C0006;
const RESULT_COLUMN: u16 = 5;

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: usize,
}

pub fn stats_workbook_path(dir: &Path, week: &WeekSelector) -> PathBuf {
    dir.join(format!("nfl_{}_player_stats.xlsx", week.slug()))
}

pub fn props_workbook_path(dir: &Path, week: &WeekSelector) -> PathBuf {
    dir.join(format!("nfl_{}_player_props.xlsx", week.slug()))
}

pub fn comparison_workbook_path(dir: &Path, week: &WeekSelector) -> PathBuf {
    dir.join(format!("nfl_{}_props_comparison.xlsx", week.slug()))
}

pub fn export_stats(path: &Path, records: &[PlayerStatRecord]) -> Result<ExportSummary> {
    let labels = stat_columns(records);
    let mut header: Vec<String> = [
        "Game",
        "Team",
        "Category",
        "Player",
        "Home Team Score",
        "Away Team Score",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    header.extend(labels.iter().cloned());

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Player Stats")?;
        write_header(sheet, &header)?;
        for (idx, record) in records.iter().enumerate() {
            let row = idx as u32 + 1;
            let fixed = [
                record.game_label.as_str(),
                record.team.as_str(),
                record.category.as_str(),
                record.player_name.as_str(),
            ];
            for (col, value) in fixed.iter().enumerate() {
                sheet.write_string(row, col as u16, *value)?;
            }
            for (col, score) in [(4u16, record.home_score), (5u16, record.away_score)] {
                if let Some(score) = score {
                    sheet.write_number(row, col, f64::from(score))?;
                }
            }
            for (offset, label) in labels.iter().enumerate() {
                if let Some(value) = record.field(label) {
                    write_stat_value(sheet, row, 6 + offset as u16, value)?;
                }
            }
        }
        sheet.autofit();
    }
    save(&mut workbook, path)?;
    Ok(ExportSummary {
        path: path.to_path_buf(),
        rows: records.len(),
    })
}

pub fn export_props(path: &Path, records: &[PlayerPropRecord]) -> Result<ExportSummary> {
    let header: Vec<String> = ["Event", "Bookmaker", "Market", "Player", "Prop", "Line", "Odds"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Player Props")?;
        write_header(sheet, &header)?;
        for (idx, record) in records.iter().enumerate() {
            let row = idx as u32 + 1;
            sheet.write_string(row, 0, &record.event_label)?;
            sheet.write_string(row, 1, &record.bookmaker)?;
            sheet.write_string(row, 2, &record.market)?;
            sheet.write_string(row, 3, &record.player_name)?;
            sheet.write_string(row, 4, &record.side)?;
            if let Some(line) = &record.line {
                write_stat_value(sheet, row, 5, line)?;
            }
            if let Some(odds) = record.odds {
                sheet.write_number(row, 6, odds)?;
            }
        }
        sheet.autofit();
    }
    save(&mut workbook, path)?;
    Ok(ExportSummary {
        path: path.to_path_buf(),
        rows: records.len(),
    })
}

/// Comparison sheet: outcome rows, one blank row, then the bold totals rows.
/// Over/Under cells in the result column are shaded green/red.
pub fn export_comparison(path: &Path, report: &ReconciliationReport) -> Result<ExportSummary> {
    let header: Vec<String> = REPORT_COLUMNS.iter().map(|s| s.to_string()).collect();
    let bold = Format::new().set_bold();
    let rows = report.rows();

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Comparison")?;
        write_header(sheet, &header)?;

        let mut row_idx: u32 = 1;
        let mut blank_written = false;
        for row in &rows {
            if row.is_totals() && !blank_written {
                row_idx += 1;
                blank_written = true;
            }
            for (col, value) in row.cells().iter().enumerate() {
                if row.is_totals() {
                    sheet.write_string_with_format(row_idx, col as u16, *value, &bold)?;
                } else {
                    sheet.write_string(row_idx, col as u16, *value)?;
                }
            }
            row_idx += 1;
        }

        let last_row = row_idx.saturating_sub(1).max(1);
        add_result_highlighting(sheet, last_row)?;
        sheet.autofit();
    }
    save(&mut workbook, path)?;
    Ok(ExportSummary {
        path: path.to_path_buf(),
        rows: report.outcomes.len(),
    })
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_text_wrap()
        .set_align(FormatAlign::Top)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_border(FormatBorder::Thin)
}

fn write_header(sheet: &mut Worksheet, header: &[String]) -> Result<()> {
    let format = header_format();
    for (col, value) in header.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, value, &format)
            .with_context(|| format!("write header cell {col}"))?;
    }
    Ok(())
}

fn write_stat_value(sheet: &mut Worksheet, row: u32, col: u16, value: &StatValue) -> Result<()> {
    match value {
        StatValue::Number(n) if n.is_finite() => {
            sheet.write_number(row, col, *n)?;
        }
        other => {
            sheet.write_string(row, col, other.to_string())?;
        }
    }
    Ok(())
}

fn add_result_highlighting(sheet: &mut Worksheet, last_row: u32) -> Result<()> {
    let over = ConditionalFormatText::new()
        .set_rule(ConditionalFormatTextRule::Contains("Over".to_string()))
        .set_format(
            Format::new()
                .set_background_color(Color::RGB(OVER_FILL))
                .set_font_color(Color::RGB(OVER_FONT)),
        );
    let under = ConditionalFormatText::new()
        .set_rule(ConditionalFormatTextRule::Contains("Under".to_string()))
        .set_format(
            Format::new()
                .set_background_color(Color::RGB(UNDER_FILL))
                .set_font_color(Color::RGB(UNDER_FONT)),
        );
    sheet
        .add_conditional_format(1, RESULT_COLUMN, last_row, RESULT_COLUMN, &over)
        .context("add Over highlighting")?;
    sheet
        .add_conditional_format(1, RESULT_COLUMN, last_row, RESULT_COLUMN, &under)
        .context("add Under highlighting")?;
    Ok(())
}

fn save(workbook: &mut Workbook, path: &Path) -> Result<()> {
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))
}
