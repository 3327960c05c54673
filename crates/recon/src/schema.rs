use crate::config::ColumnCandidates;
use crate::error::ReconError;
use crate::model::{AliasDirectory, AliasEntry, Cell, LedgerRecord, RawRow};
use crate::normalize::fold;
use crate::temporal::{parse_date, parse_time};

const ALIAS_COLUMNS: &[&str] = &["alias", "apelido", "de", "veiculo_soudview"];
const CANONICAL_COLUMNS: &[&str] = &["canonical", "para", "veiculo_principal"];

/// Which table a column lookup is for; picks the error variant on a miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaTarget {
    Ledger,
    Report,
}

/// Resolved column indices for the four logical fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub outlet: usize,
    pub date: usize,
    pub time: usize,
    pub title: usize,
}

/// Trim, lowercase, fold accents, and join words with `_`.
/// `"Data Contratação "` becomes `"data_contratacao"`.
pub fn standardize_header(header: &str) -> String {
    fold(header.trim())
        .split(|c: char| c.is_whitespace() || c == '-' || c == '.')
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

fn find_column(headers: &[String], candidates: &[String]) -> Option<usize> {
    candidates
        .iter()
        .map(|c| standardize_header(c))
        .find_map(|wanted| headers.iter().position(|h| *h == wanted))
}

/// Locate outlet/date/time/title in a header row. With `positional_fallback`
/// a field with no matching header takes column 0, 1, 2 or 3 respectively.
pub fn resolve_columns(
    header: &[Cell],
    candidates: &ColumnCandidates,
    target: SchemaTarget,
) -> Result<ColumnMap, ReconError> {
    let headers: Vec<String> = header.iter().map(|c| standardize_header(&c.display())).collect();
    let available: Vec<String> = headers.iter().filter(|h| !h.is_empty()).cloned().collect();

    let lookup = |field: &str, position: usize, names: &[String]| -> Result<usize, ReconError> {
        if let Some(idx) = find_column(&headers, names) {
            return Ok(idx);
        }
        if candidates.positional_fallback && position < headers.len() {
            tracing::debug!(field, position, "no header match; using positional column");
            return Ok(position);
        }
        let field = field.to_string();
        let available = available.clone();
        Err(match target {
            SchemaTarget::Ledger => ReconError::LedgerSchema { field, available },
            SchemaTarget::Report => ReconError::ReportSchema { field, available },
        })
    };

    Ok(ColumnMap {
        outlet: lookup("outlet", 0, &candidates.outlet)?,
        date: lookup("date", 1, &candidates.date)?,
        time: lookup("time", 2, &candidates.time)?,
        title: lookup("title", 3, &candidates.title)?,
    })
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerLoad {
    pub records: Vec<LedgerRecord>,
    /// Data rows dropped for a blank outlet or an unparseable date/time.
    pub skipped: usize,
}

/// Verify the ledger header carries every required field. Runs before any
/// report row is processed.
pub fn check_ledger_schema(grid: &[RawRow], candidates: &ColumnCandidates) -> Result<Option<ColumnMap>, ReconError> {
    match grid.first() {
        Some(header) => resolve_columns(header, candidates, SchemaTarget::Ledger).map(Some),
        None => Ok(None),
    }
}

/// Convert a ledger grid (header row first) into records.
pub fn load_ledger(grid: &[RawRow], candidates: &ColumnCandidates) -> Result<LedgerLoad, ReconError> {
    let Some(map) = check_ledger_schema(grid, candidates)? else {
        return Ok(LedgerLoad::default());
    };

    let empty = Cell::Empty;
    let mut load = LedgerLoad::default();
    for (row_index, row) in grid[1..].iter().enumerate() {
        if row.iter().all(Cell::is_empty) {
            continue;
        }
        let get = |idx: usize| row.get(idx).unwrap_or(&empty);
        let outlet = get(map.outlet).display();
        let date = parse_date(get(map.date));
        let time = parse_time(get(map.time));

        match (outlet.is_empty(), date, time) {
            (false, Some(date), Some(time)) => load.records.push(LedgerRecord {
                outlet,
                date,
                time,
                title: get(map.title).display(),
                row_index,
            }),
            _ => {
                tracing::warn!(
                    row = row_index,
                    outlet = %outlet,
                    date = %get(map.date).display(),
                    time = %get(map.time).display(),
                    "skipping ledger row"
                );
                load.skipped += 1;
            }
        }
    }
    Ok(load)
}

// ---------------------------------------------------------------------------
// Alias directory
// ---------------------------------------------------------------------------

/// Build an alias directory from a grid whose first row is a header. Known
/// alias/canonical header names are preferred; otherwise the first two
/// columns are used.
pub fn load_aliases(grid: &[RawRow]) -> AliasDirectory {
    let Some((header, body)) = grid.split_first() else {
        return AliasDirectory::default();
    };
    let headers: Vec<String> = header.iter().map(|c| standardize_header(&c.display())).collect();
    let known = |names: &[&str]| {
        names
            .iter()
            .find_map(|n| headers.iter().position(|h| h == n))
    };
    let (alias_col, canonical_col) = match (known(ALIAS_COLUMNS), known(CANONICAL_COLUMNS)) {
        (Some(a), Some(c)) => (a, c),
        _ => (0, 1),
    };

    let entries = body
        .iter()
        .filter_map(|row| {
            let alias = row.get(alias_col)?.display();
            let canonical = row.get(canonical_col)?.display();
            (!alias.is_empty() && !canonical.is_empty()).then_some(AliasEntry { alias, canonical })
        })
        .collect();
    AliasDirectory { entries }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn row(cells: &[&str]) -> RawRow {
        cells.iter().map(|s| Cell::text(*s)).collect()
    }

    #[test]
    fn standardizes_headers() {
        assert_eq!(standardize_header(" Data Contratação "), "data_contratacao");
        assert_eq!(standardize_header("Veículo-BoxNet"), "veiculo_boxnet");
        assert_eq!(standardize_header("HORA"), "hora");
    }

    #[test]
    fn candidates_tried_in_order() {
        let header = row(&["Veiculo", "Data", "DataFonte", "Hora", "Titulo"]);
        let map = resolve_columns(&header, &ColumnCandidates::default(), SchemaTarget::Ledger).unwrap();
        // datafonte precedes data in the candidate list
        assert_eq!(map, ColumnMap { outlet: 0, date: 2, time: 3, title: 4 });
    }

    #[test]
    fn missing_field_is_schema_violation() {
        let header = row(&["Veiculo", "Data", "Titulo"]);
        match resolve_columns(&header, &ColumnCandidates::default(), SchemaTarget::Ledger) {
            Err(ReconError::LedgerSchema { field, available }) => {
                assert_eq!(field, "time");
                assert_eq!(available, vec!["veiculo", "data", "titulo"]);
            }
            other => panic!("expected LedgerSchema, got {other:?}"),
        }
    }

    #[test]
    fn positional_fallback() {
        let candidates = ColumnCandidates {
            positional_fallback: true,
            ..ColumnCandidates::default()
        };
        let header = row(&["Col A", "Col B", "Col C", "Col D"]);
        let map = resolve_columns(&header, &candidates, SchemaTarget::Ledger).unwrap();
        assert_eq!(map, ColumnMap { outlet: 0, date: 1, time: 2, title: 3 });

        // too few columns still fails
        let short = row(&["Col A", "Col B"]);
        assert!(resolve_columns(&short, &candidates, SchemaTarget::Ledger).is_err());
    }

    #[test]
    fn loads_ledger_and_counts_skips() {
        let grid = vec![
            row(&["veiculo_boxnet", "data_contratacao", "hora_veiculacao", "titulo_peca"]),
            row(&["Radio Mix FM/Sao Paulo", "15/03/2024", "14:30:00", "Summer Promo"]),
            row(&["", "15/03/2024", "14:30:00", "Summer Promo"]),
            row(&["Band FM", "not a date", "10:00", "X"]),
            row(&["", "", "", ""]),
            vec![
                Cell::text("Band FM"),
                Cell::DateSerial(45366.0),
                Cell::DateSerial(0.4375),
                Cell::Empty,
            ],
        ];
        let load = load_ledger(&grid, &ColumnCandidates::default()).unwrap();
        assert_eq!(load.records.len(), 2);
        assert_eq!(load.skipped, 2);

        let first = &load.records[0];
        assert_eq!(first.outlet, "Radio Mix FM/Sao Paulo");
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(first.time, NaiveTime::from_hms_opt(14, 30, 0).unwrap());
        assert_eq!(first.row_index, 0);

        let last = &load.records[1];
        assert_eq!(last.time, NaiveTime::from_hms_opt(10, 30, 0).unwrap());
        assert_eq!(last.title, "");
        assert_eq!(last.row_index, 4);
    }

    #[test]
    fn empty_ledger_grid_loads_nothing() {
        let load = load_ledger(&[], &ColumnCandidates::default()).unwrap();
        assert!(load.records.is_empty());
        assert_eq!(load.skipped, 0);
    }

    #[test]
    fn alias_grid_by_header_name() {
        let grid = vec![
            row(&["para", "de"]),
            row(&["Radio Mix FM/Sao Paulo", "MIX SP"]),
            row(&["", "orphan"]),
        ];
        let dir = load_aliases(&grid);
        assert_eq!(dir.len(), 1);
        assert_eq!(
            dir.entries[0],
            AliasEntry {
                alias: "MIX SP".into(),
                canonical: "Radio Mix FM/Sao Paulo".into()
            }
        );
    }

    #[test]
    fn alias_grid_positional() {
        let grid = vec![row(&["x", "y"]), row(&["Band SP", "Band FM"])];
        let dir = load_aliases(&grid);
        assert_eq!(dir.entries[0].alias, "Band SP");
        assert_eq!(dir.entries[0].canonical, "Band FM");
    }
}
