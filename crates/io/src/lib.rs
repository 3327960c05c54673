// Grid loading and result export

use std::path::Path;

use spotcheck_recon::RawRow;

pub mod csv;
pub mod xlsx;

/// Extensions read through calamine; everything else is treated as delimited text.
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Load a report, ledger or alias grid by file extension. `sheet` only
/// applies to spreadsheet formats.
pub fn load_grid(path: &Path, sheet: Option<&str>) -> Result<Vec<RawRow>, String> {
    let ext = extension(path);
    if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
        self::xlsx::import(path, sheet)
    } else {
        if sheet.is_some() {
            tracing::warn!(path = %path.display(), "sheet name ignored for delimited file");
        }
        match ext.as_str() {
            "tsv" | "tab" => self::csv::import_with_delimiter(path, b'\t'),
            _ => self::csv::import(path),
        }
    }
}
