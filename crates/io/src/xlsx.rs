// Excel/ODS grid import (calamine) and colored result export (rust_xlsxwriter)

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook, Worksheet};

use spotcheck_recon::model::{ReconOutput, ReconStatus};
use spotcheck_recon::{Cell, RawRow};

use crate::csv::{result_record, RESULT_HEADERS};

/// Import one sheet of a workbook (xlsx, xlsm, xls, xlsb, ods) as a grid.
/// Without a sheet name the first sheet is used. Row and column positions are
/// preserved even when the used range does not start at A1.
pub fn import(path: &Path, sheet: Option<&str>) -> Result<Vec<RawRow>, String> {
    let mut workbook = open_workbook_auto(path).map_err(|e| format!("Failed to open Excel file: {}", e))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let name = match sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|n| n.as_str() == wanted || n.trim().eq_ignore_ascii_case(wanted.trim()))
            .cloned()
            .ok_or_else(|| format!("sheet '{}' not found (available: {})", wanted, sheet_names.join(", ")))?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| "Excel file contains no sheets".to_string())?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| format!("Failed to read sheet '{}': {}", name, e))?;

    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut grid: Vec<RawRow> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells: RawRow = vec![Cell::Empty; start_col as usize];
        cells.extend(row.iter().map(convert));
        grid.push(cells);
    }

    tracing::debug!(path = %path.display(), sheet = %name, rows = grid.len(), "sheet imported");
    Ok(grid)
}

fn convert(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::text(s.as_str()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::text(if *b { "TRUE" } else { "FALSE" }),
        Data::Error(e) => Cell::text(format!("#{:?}", e)),
        // Serial in the 1900 date system
        Data::DateTime(dt) => Cell::DateSerial(dt.as_f64()),
        Data::DateTimeIso(s) => Cell::text(s.as_str()),
        Data::DurationIso(s) => Cell::text(s.as_str()),
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

const FOUND_EXACT_FILL: u32 = 0xC6EFCE;
const FOUND_SLOT_FILL: u32 = 0xFFEB9C;
const NOT_FOUND_FILL: u32 = 0xFFC7CE;

fn status_format(status: ReconStatus) -> Format {
    let fill = match status {
        ReconStatus::FoundExact => FOUND_EXACT_FILL,
        ReconStatus::FoundSlot => FOUND_SLOT_FILL,
        ReconStatus::NotFound => NOT_FOUND_FILL,
    };
    Format::new().set_background_color(Color::RGB(fill))
}

fn write_header(worksheet: &mut Worksheet, headers: &[&str]) -> Result<(), String> {
    let header_format = Format::new()
        .set_bold()
        .set_border_bottom(FormatBorder::Thin);
    for (col, h) in headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *h, &header_format)
            .map_err(|e| format!("Failed to write header: {}", e))?;
    }
    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| format!("Failed to set freeze panes: {}", e))?;
    Ok(())
}

/// Write results (one colored row per airing by status), the per-row
/// diagnostics, and the run summary to a new workbook.
pub fn export_results(output: &ReconOutput, path: &Path) -> Result<(), String> {
    let mut workbook = Workbook::new();

    let results = workbook
        .add_worksheet()
        .set_name("Results")
        .map_err(|e| format!("Failed to create sheet 'Results': {}", e))?;
    write_header(results, RESULT_HEADERS)?;
    for (i, r) in output.results.iter().enumerate() {
        let row = (i + 1) as u32;
        let format = status_format(r.status);
        for (col, value) in result_record(r).iter().enumerate() {
            results
                .write_string_with_format(row, col as u16, value, &format)
                .map_err(|e| format!("Failed to write row {}: {}", row, e))?;
        }
    }
    let last_row = output.results.len() as u32;
    results
        .autofilter(0, 0, last_row, (RESULT_HEADERS.len() - 1) as u16)
        .map_err(|e| format!("Failed to set autofilter: {}", e))?;
    for (col, width) in [(1u16, 32.0), (2, 24.0), (5, 32.0), (10, 24.0)] {
        results
            .set_column_width(col, width)
            .map_err(|e| format!("Failed to set column width: {}", e))?;
    }

    let diagnostics = workbook
        .add_worksheet()
        .set_name("Diagnostics")
        .map_err(|e| format!("Failed to create sheet 'Diagnostics': {}", e))?;
    write_header(diagnostics, &["report_row", "classification", "detail", "skipped_cells"])?;
    for (i, d) in output.diagnostics.iter().enumerate() {
        let row = (i + 1) as u32;
        let skipped = d
            .skips
            .iter()
            .map(|s| format!("col {}: '{}'", s.column + 1, s.value))
            .collect::<Vec<_>>()
            .join("; ");
        for (col, value) in [
            (d.row_index + 1).to_string(),
            d.classification.to_string(),
            d.detail.clone(),
            skipped,
        ]
        .iter()
        .enumerate()
        {
            diagnostics
                .write_string(row, col as u16, value)
                .map_err(|e| format!("Failed to write row {}: {}", row, e))?;
        }
    }

    let summary = workbook
        .add_worksheet()
        .set_name("Summary")
        .map_err(|e| format!("Failed to create sheet 'Summary': {}", e))?;
    let s = &output.summary;
    let counts = [
        ("report rows", s.rows_read),
        ("airings", s.events),
        ("FOUND_EXACT", s.found_exact),
        ("FOUND_SLOT", s.found_slot),
        ("NOT_FOUND", s.not_found),
        ("unresolved outlets", s.unresolved_outlets),
        ("parse skips", s.parse_skips),
        ("ledger records", s.ledger_records),
        ("ledger rows skipped", s.ledger_rows_skipped),
    ];
    write_header(summary, &["metric", "count"])?;
    for (i, (label, count)) in counts.iter().enumerate() {
        let row = (i + 1) as u32;
        summary
            .write_string(row, 0, *label)
            .and_then(|ws| ws.write_number(row, 1, *count as f64))
            .map_err(|e| format!("Failed to write summary: {}", e))?;
    }

    workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {}", e))?;
    Ok(())
}
