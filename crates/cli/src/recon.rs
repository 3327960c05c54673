//! `spotcheck run | validate | parse`: config-driven airing reconciliation.

use std::path::{Path, PathBuf};

use spotcheck_recon::config::InputConfig;
use spotcheck_recon::model::{AliasDirectory, ReconOutput};
use spotcheck_recon::schema::load_aliases;
use spotcheck_recon::{ReconConfig, ReconError, ReconInput};

use crate::exit_codes::{recon_exit_code, EXIT_INVALID_CONFIG, EXIT_MISSING_AIRINGS, EXIT_RUNTIME};
use crate::CliError;

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::LedgerSchema { .. } => {
                Some("add the header to [ledger] candidates, or set positional_fallback = true".to_string())
            }
            ReconError::ReportSchema { .. } => {
                Some("add the header to [report.columns] candidates".to_string())
            }
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }
}

/// Read and validate a run file.
pub fn load_config(config_path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| recon_err(EXIT_RUNTIME, format!("cannot read config {}: {e}", config_path.display())))?;
    Ok(ReconConfig::from_toml(&config_str)?)
}

fn inputs(config: &ReconConfig) -> Result<&InputConfig, CliError> {
    config.inputs.as_ref().ok_or_else(|| {
        recon_err(EXIT_INVALID_CONFIG, "run file has no [inputs] section")
            .with_hint("add [inputs] with report = \"...\" and ledger = \"...\"")
    })
}

fn load(base_dir: &Path, file: &str, sheet: Option<&str>) -> Result<Vec<spotcheck_recon::RawRow>, ReconError> {
    let path = base_dir.join(file);
    spotcheck_io::load_grid(&path, sheet).map_err(|e| ReconError::Io(format!("{}: {e}", path.display())))
}

/// Load report, ledger and alias grids. Paths resolve relative to the run file.
pub fn load_input(config_path: &Path, config: &ReconConfig) -> Result<ReconInput, CliError> {
    let inputs = inputs(config)?;
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let rows = load(base_dir, &inputs.report, inputs.report_sheet.as_deref())?;
    let ledger = load(base_dir, &inputs.ledger, inputs.ledger_sheet.as_deref())?;
    let aliases = match &inputs.aliases {
        Some(file) => load_aliases(&load(base_dir, file, inputs.aliases_sheet.as_deref())?),
        None => AliasDirectory::default(),
    };
    tracing::debug!(
        report_rows = rows.len(),
        ledger_rows = ledger.len(),
        aliases = aliases.len(),
        "inputs loaded"
    );

    Ok(ReconInput { rows, ledger, aliases })
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

pub struct RunOptions {
    pub json: bool,
    pub output: Option<PathBuf>,
    pub csv: Option<PathBuf>,
    pub xlsx: Option<PathBuf>,
    pub fail_on_missing: bool,
}

pub fn cmd_run(config_path: PathBuf, opts: RunOptions) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let input = load_input(&config_path, &config)?;
    let result = spotcheck_recon::run(&config, &input)?;

    write_outputs(&result, &opts)?;
    print_summary(&result);

    if opts.fail_on_missing && result.summary.not_found > 0 {
        return Err(recon_err(
            EXIT_MISSING_AIRINGS,
            format!("{} airing(s) not found in the ledger", result.summary.not_found),
        ));
    }
    Ok(())
}

fn write_outputs(result: &ReconOutput, opts: &RunOptions) -> Result<(), CliError> {
    if opts.json || opts.output.is_some() {
        let json_str = serde_json::to_string_pretty(result)
            .map_err(|e| recon_err(EXIT_RUNTIME, format!("JSON serialization error: {e}")))?;

        if let Some(ref path) = opts.output {
            std::fs::write(path, &json_str)
                .map_err(|e| recon_err(EXIT_RUNTIME, format!("cannot write output: {e}")))?;
            eprintln!("wrote {}", path.display());
        }

        if opts.json {
            println!("{json_str}");
        }
    }

    if let Some(ref path) = opts.csv {
        spotcheck_io::csv::export_results(result, path)
            .map_err(|e| recon_err(EXIT_RUNTIME, format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }

    if let Some(ref path) = opts.xlsx {
        spotcheck_io::xlsx::export_results(result, path)
            .map_err(|e| recon_err(EXIT_RUNTIME, format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

/// Human summary to stderr.
fn print_summary(result: &ReconOutput) {
    let s = &result.summary;
    eprintln!(
        "{}: {} airings from {} rows: {} found, {} slot only, {} not found ({} unresolved outlets)",
        result.meta.config_name,
        s.events,
        s.rows_read,
        s.found_exact,
        s.found_slot,
        s.not_found,
        s.unresolved_outlets,
    );
    if s.parse_skips > 0 || s.ledger_rows_skipped > 0 {
        eprintln!(
            "skipped: {} report cells, {} ledger rows (of {} kept)",
            s.parse_skips, s.ledger_rows_skipped, s.ledger_records
        );
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    eprintln!(
        "valid: \"{}\" ({:?} layout, {} scorer, threshold {}, {} granularity)",
        config.name,
        config.report.layout,
        config.matching.scorer,
        config.matching.threshold,
        config.reconcile.time_granularity,
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// parse
// ---------------------------------------------------------------------------

/// Parse the report only and print the per-row diagnostic log.
pub fn cmd_parse(config_path: PathBuf, json: bool) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let inputs = inputs(&config)?;
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let rows = load(base_dir, &inputs.report, inputs.report_sheet.as_deref())?;
    let input = ReconInput {
        rows,
        ledger: Vec::new(),
        aliases: AliasDirectory::default(),
    };
    let parsed = spotcheck_recon::engine::parse(&config, &input)?;

    if json {
        let value = serde_json::json!({
            "events": &parsed.events,
            "diagnostics": &parsed.diagnostics,
        });
        let json_str = serde_json::to_string_pretty(&value)
            .map_err(|e| recon_err(EXIT_RUNTIME, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        for d in &parsed.diagnostics {
            println!("{:>5}  {:<16} {}", d.row_index + 1, d.classification.to_string(), d.detail);
            for skip in &d.skips {
                println!("{:>5}  {:<16} skipped col {} '{}' ({:?})", "", "", skip.column + 1, skip.value, skip.reason);
            }
        }
    }

    eprintln!(
        "{} rows, {} airings, {} skipped cells",
        parsed.diagnostics.len(),
        parsed.events.len(),
        parsed.skip_count()
    );
    Ok(())
}
