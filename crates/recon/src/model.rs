use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One cell of a loaded grid, as the reader saw it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    /// Spreadsheet date/time serial (days since 1899-12-30, fraction = time of day).
    DateSerial(f64),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.trim().is_empty() {
            Self::Empty
        } else {
            Self::Text(s)
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) | Self::DateSerial(_) => false,
        }
    }

    /// Text rendering used for headers, labels and reporting.
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) | Self::DateSerial(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
        }
    }
}

/// Ordered cells of one report or ledger row.
pub type RawRow = Vec<Cell>;

/// Curated spelling → canonical outlet mapping, in file order.
#[derive(Debug, Clone, Default)]
pub struct AliasDirectory {
    pub entries: Vec<AliasEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    pub alias: String,
    pub canonical: String,
}

impl AliasDirectory {
    pub fn from_pairs<I, A, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, C)>,
        A: Into<String>,
        C: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(alias, canonical)| AliasEntry {
                    alias: alias.into(),
                    canonical: canonical.into(),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything one run needs, fully materialized.
pub struct ReconInput {
    /// Report grid, in file order.
    pub rows: Vec<RawRow>,
    /// Ledger grid; the first row holds the column headers.
    pub ledger: Vec<RawRow>,
    pub aliases: AliasDirectory,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Outlet/campaign carried forward across report rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseContext {
    pub outlet: Option<String>,
    pub campaign: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParseState {
    NoContext,
    HaveOutlet,
    HaveOutletAndCampaign,
}

impl ParseContext {
    pub fn state(&self) -> ParseState {
        match (&self.outlet, &self.campaign) {
            (Some(_), Some(_)) => ParseState::HaveOutletAndCampaign,
            (Some(_), None) => ParseState::HaveOutlet,
            (None, _) => ParseState::NoContext,
        }
    }
}

/// One observed airing extracted from the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiringEvent {
    pub outlet_text: String,
    pub campaign_text: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// Zero-based index of the report row the event came from.
    pub row_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowKind {
    OutletHeader,
    CampaignHeader,
    DataRow,
    Unclassified,
}

impl std::fmt::Display for RowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutletHeader => write!(f, "OUTLET_HEADER"),
            Self::CampaignHeader => write!(f, "CAMPAIGN_HEADER"),
            Self::DataRow => write!(f, "DATA_ROW"),
            Self::Unclassified => write!(f, "UNCLASSIFIED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InvalidDate,
    InvalidTime,
}

/// A recoverable cell-level parse failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseSkip {
    pub column: usize,
    pub value: String,
    pub reason: SkipReason,
}

/// One entry per report row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticEntry {
    pub row_index: usize,
    pub classification: RowKind,
    pub detail: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skips: Vec<ParseSkip>,
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchTier {
    ExactAlias,
    FuzzyAlias,
    FuzzyDirect,
    None,
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExactAlias => write!(f, "EXACT_ALIAS"),
            Self::FuzzyAlias => write!(f, "FUZZY_ALIAS"),
            Self::FuzzyDirect => write!(f, "FUZZY_DIRECT"),
            Self::None => write!(f, "NONE"),
        }
    }
}

/// Outcome of resolving one outlet text. `canonical_outlet == None` is the
/// UNRESOLVED verdict; `match_score` then carries the best score observed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub canonical_outlet: Option<String>,
    pub match_score: f64,
    pub match_tier: MatchTier,
}

impl Resolution {
    pub fn unresolved(best_score: f64) -> Self {
        Self {
            canonical_outlet: None,
            match_score: best_score,
            match_tier: MatchTier::None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.canonical_outlet.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedEvent {
    #[serde(flatten)]
    pub event: AiringEvent,
    #[serde(flatten)]
    pub resolution: Resolution,
}

// ---------------------------------------------------------------------------
// Ledger + reconciliation
// ---------------------------------------------------------------------------

/// One contracted airing from the ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerRecord {
    pub outlet: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub title: String,
    /// Zero-based index of the ledger data row (header excluded).
    pub row_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconStatus {
    FoundExact,
    FoundSlot,
    NotFound,
}

impl std::fmt::Display for ReconStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FoundExact => write!(f, "FOUND_EXACT"),
            Self::FoundSlot => write!(f, "FOUND_SLOT"),
            Self::NotFound => write!(f, "NOT_FOUND"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissReason {
    UnresolvedOutlet,
    NoLedgerMatch,
}

impl std::fmt::Display for MissReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnresolvedOutlet => write!(f, "UNRESOLVED_OUTLET"),
            Self::NoLedgerMatch => write!(f, "NO_LEDGER_MATCH"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationResult {
    #[serde(flatten)]
    pub resolved: ResolvedEvent,
    pub status: ReconStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<MissReason>,
    /// Title of the ledger record that matched, when one did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_row: Option<usize>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconSummary {
    pub rows_read: usize,
    pub events: usize,
    pub found_exact: usize,
    pub found_slot: usize,
    pub not_found: usize,
    /// Distinct outlet texts that resolved to no canonical outlet.
    pub unresolved_outlets: usize,
    pub parse_skips: usize,
    pub ledger_records: usize,
    pub ledger_rows_skipped: usize,
    pub row_kinds: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconOutput {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub results: Vec<ReconciliationResult>,
    pub diagnostics: Vec<DiagnosticEntry>,
}
