use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty keyword table, bad threshold, etc.).
    ConfigValidation(String),
    /// A required ledger field could not be located among the ledger headers.
    LedgerSchema { field: String, available: Vec<String> },
    /// A required column of a tabular report could not be located.
    ReportSchema { field: String, available: Vec<String> },
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::LedgerSchema { field, available } => {
                if available.is_empty() {
                    write!(f, "ledger schema violation: missing field '{field}' (ledger has no header row)")
                } else {
                    write!(
                        f,
                        "ledger schema violation: missing field '{field}' (available columns: {})",
                        available.join(", ")
                    )
                }
            }
            Self::ReportSchema { field, available } => write!(
                f,
                "report schema error: missing column '{field}' (available columns: {})",
                available.join(", ")
            ),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
