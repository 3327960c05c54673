//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success                                                   |
//! | 1    | General error (unspecified)                               |
//! | 2    | CLI usage error (bad args)                                |
//! | 3    | Run file failed to parse or validate                      |
//! | 4    | Runtime error (input unreadable, output unwritable)       |
//! | 5    | Ledger lacks a required field                             |
//! | 6    | NOT_FOUND verdicts present and `--fail-on-missing` is set |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
#[allow(dead_code)]
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Run file is not valid TOML, has unknown values, or fails validation.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// An input could not be read or an output could not be written.
pub const EXIT_RUNTIME: u8 = 4;

/// The ledger header lacks outlet, date, time or title
/// (or a tabular report lacks one of its columns).
pub const EXIT_LEDGER_SCHEMA: u8 = 5;

/// At least one airing was NOT_FOUND (only with `--fail-on-missing`).
pub const EXIT_MISSING_AIRINGS: u8 = 6;

use spotcheck_recon::ReconError;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ReconError::LedgerSchema { .. } | ReconError::ReportSchema { .. } => EXIT_LEDGER_SCHEMA,
        ReconError::Io(_) => EXIT_RUNTIME,
    }
}
