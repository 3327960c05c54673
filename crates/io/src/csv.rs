// CSV/TSV grid import and result export

use std::io::Read;
use std::path::Path;

use spotcheck_recon::model::{ReconOutput, ReconciliationResult};
use spotcheck_recon::{Cell, RawRow};

/// Read a delimited file into a grid. The delimiter is sniffed from the
/// first lines; every field becomes a text cell (blank fields are empty).
pub fn import(path: &Path) -> Result<Vec<RawRow>, String> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    import_from_string(&content, delimiter)
}

pub fn import_with_delimiter(path: &Path, delimiter: u8) -> Result<Vec<RawRow>, String> {
    let content = read_file_as_utf8(path)?;
    import_from_string(&content, delimiter)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Lines whose fields are all folded into one cell don't vote
        let target = counts.iter().copied().max().unwrap_or(0);
        if target <= 1 {
            continue;
        }

        // Score: lines agreeing with the widest split, weighted by width
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| format!("cannot open {}: {e}", path.display()))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    // Excel-exported UTF-8 often carries a BOM
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        bytes.drain(..3);
    }

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            tracing::debug!(path = %path.display(), "not UTF-8; decoding as Windows-1252");
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn import_from_string(content: &str, delimiter: u8) -> Result<Vec<RawRow>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut grid = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| e.to_string())?;
        grid.push(record.iter().map(Cell::text).collect());
    }
    Ok(grid)
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

pub const RESULT_HEADERS: &[&str] = &[
    "report_row",
    "outlet_text",
    "campaign",
    "date",
    "time",
    "canonical_outlet",
    "match_score",
    "match_tier",
    "status",
    "reason",
    "ledger_title",
    "ledger_row",
];

/// One result as display strings, in `RESULT_HEADERS` order.
pub fn result_record(r: &ReconciliationResult) -> Vec<String> {
    let event = &r.resolved.event;
    let resolution = &r.resolved.resolution;
    vec![
        (event.row_index + 1).to_string(),
        event.outlet_text.clone(),
        event.campaign_text.clone(),
        event.date.format("%Y-%m-%d").to_string(),
        event.time.format("%H:%M:%S").to_string(),
        resolution.canonical_outlet.clone().unwrap_or_else(|| "UNRESOLVED".into()),
        format!("{:.1}", resolution.match_score),
        resolution.match_tier.to_string(),
        r.status.to_string(),
        r.reason.map(|m| m.to_string()).unwrap_or_default(),
        r.ledger_title.clone().unwrap_or_default(),
        r.ledger_row.map(|i| (i + 1).to_string()).unwrap_or_default(),
    ]
}

/// Write one row per reconciliation result.
pub fn export_results(output: &ReconOutput, path: &Path) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .from_path(path)
        .map_err(|e| e.to_string())?;

    writer.write_record(RESULT_HEADERS).map_err(|e| e.to_string())?;
    for r in &output.results {
        writer.write_record(result_record(r)).map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}
