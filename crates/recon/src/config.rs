use std::collections::HashMap;

use serde::Deserialize;

use crate::error::ReconError;
use crate::normalize::NameNormalizer;
use crate::similarity::Scorer;
use crate::temporal::TimeGranularity;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    #[serde(default)]
    pub inputs: Option<InputConfig>,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub ledger: ColumnCandidates,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub normalize: NormalizeConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            name: "default".into(),
            inputs: None,
            report: ReportConfig::default(),
            ledger: ColumnCandidates::default(),
            matching: MatchingConfig::default(),
            normalize: NormalizeConfig::default(),
            reconcile: ReconcileConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// File locations for a run. Paths are resolved relative to the config file
/// by the caller; the engine itself never touches the filesystem.
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    pub report: String,
    #[serde(default)]
    pub report_sheet: Option<String>,
    pub ledger: String,
    #[serde(default)]
    pub ledger_sheet: Option<String>,
    #[serde(default)]
    pub aliases: Option<String>,
    #[serde(default)]
    pub aliases_sheet: Option<String>,
}

// ---------------------------------------------------------------------------
// Report layout + row classifier tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportLayout {
    /// Outlet/campaign header rows interleaved with date rows of time cells.
    #[default]
    Grouped,
    /// One airing per row under a header row (outlet, date, time, title).
    Tabular,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub layout: ReportLayout,
    #[serde(default = "default_outlet_labels")]
    pub outlet_labels: Vec<String>,
    #[serde(default = "default_campaign_labels")]
    pub campaign_labels: Vec<String>,
    #[serde(default = "default_outlet_keywords")]
    pub outlet_keywords: Vec<String>,
    #[serde(default = "default_campaign_keywords")]
    pub campaign_keywords: Vec<String>,
    /// Column candidates for the tabular layout.
    #[serde(default)]
    pub columns: ColumnCandidates,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            layout: ReportLayout::default(),
            outlet_labels: default_outlet_labels(),
            campaign_labels: default_campaign_labels(),
            outlet_keywords: default_outlet_keywords(),
            campaign_keywords: default_campaign_keywords(),
            columns: ColumnCandidates::default(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn default_outlet_labels() -> Vec<String> {
    strings(&["veículo:", "emissora:", "station:", "outlet:"])
}

fn default_campaign_labels() -> Vec<String> {
    strings(&["comercial:", "campanha:", "campaign:", "commercial:"])
}

fn default_outlet_keywords() -> Vec<String> {
    strings(&[
        "fm", "am", "tv", "radio", "rede", "network", "emissora", "canal", "channel", "televisao",
    ])
}

fn default_campaign_keywords() -> Vec<String> {
    strings(&["comercial", "campanha", "campaign", "commercial", "spot", "jingle"])
}

// ---------------------------------------------------------------------------
// Column candidates (Schema Resolver)
// ---------------------------------------------------------------------------

/// Candidate header names per logical field, tried in order against
/// standardized headers (trimmed, lowercased, accents folded, spaces → `_`).
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnCandidates {
    #[serde(default = "default_outlet_columns")]
    pub outlet: Vec<String>,
    #[serde(default = "default_date_columns")]
    pub date: Vec<String>,
    #[serde(default = "default_time_columns")]
    pub time: Vec<String>,
    #[serde(default = "default_title_columns")]
    pub title: Vec<String>,
    /// Fall back to columns 0..=3 (outlet, date, time, title) when a field
    /// has no matching header.
    #[serde(default)]
    pub positional_fallback: bool,
}

impl Default for ColumnCandidates {
    fn default() -> Self {
        Self {
            outlet: default_outlet_columns(),
            date: default_date_columns(),
            time: default_time_columns(),
            title: default_title_columns(),
            positional_fallback: false,
        }
    }
}

fn default_outlet_columns() -> Vec<String> {
    strings(&["veiculo_boxnet", "veiculo", "outlet", "station", "emissora"])
}

fn default_date_columns() -> Vec<String> {
    strings(&["data_contratacao", "datafonte", "data", "date"])
}

fn default_time_columns() -> Vec<String> {
    strings(&["hora_veiculacao", "hora", "horario", "time"])
}

fn default_title_columns() -> Vec<String> {
    strings(&["titulo_peca", "titulo", "comercial", "campanha", "title"])
}

// ---------------------------------------------------------------------------
// Matching, normalization, reconciliation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub scorer: Scorer,
    /// Restrict direct (tier 3) candidates to canonical names whose normalized
    /// form contains this normalized text.
    #[serde(default)]
    pub candidate_filter: Option<String>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            scorer: Scorer::default(),
            candidate_filter: None,
        }
    }
}

fn default_threshold() -> f64 {
    80.0
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NormalizeConfig {
    /// Extra abbreviation → expansion entries (override built-ins on collision).
    #[serde(default)]
    pub abbreviations: HashMap<String, String>,
    #[serde(default)]
    pub noise_words: Vec<String>,
    /// Use only the configured tables, not the built-in ones.
    #[serde(default)]
    pub replace_defaults: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReconcileConfig {
    #[serde(default)]
    pub time_granularity: TimeGranularity,
    /// Distinguish FOUND_EXACT (title matches) from FOUND_SLOT (slot only).
    /// When false every slot match is FOUND_EXACT.
    #[serde(default = "default_true")]
    pub require_title_match: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            time_granularity: TimeGranularity::default(),
            require_title_match: true,
        }
    }
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }

        let threshold = self.matching.threshold;
        if !threshold.is_finite() || !(0.0..=100.0).contains(&threshold) {
            return Err(ReconError::ConfigValidation(format!(
                "matching.threshold must be within 0..=100, got {threshold}"
            )));
        }

        if self.report.layout == ReportLayout::Grouped {
            if self.report.outlet_labels.is_empty() && self.report.outlet_keywords.is_empty() {
                return Err(ReconError::ConfigValidation(
                    "report: outlet_labels and outlet_keywords cannot both be empty".into(),
                ));
            }
            if self.report.campaign_labels.is_empty() && self.report.campaign_keywords.is_empty() {
                return Err(ReconError::ConfigValidation(
                    "report: campaign_labels and campaign_keywords cannot both be empty".into(),
                ));
            }
        }

        validate_columns("ledger", &self.ledger)?;
        if self.report.layout == ReportLayout::Tabular {
            validate_columns("report.columns", &self.report.columns)?;
        }

        let conflicts = NameNormalizer::new(&self.normalize).conflicting_abbreviations();
        if !conflicts.is_empty() {
            return Err(ReconError::ConfigValidation(format!(
                "normalize.abbreviations: expansions of {} contain other abbreviation keys",
                conflicts.join(", ")
            )));
        }

        Ok(())
    }
}

fn validate_columns(section: &str, columns: &ColumnCandidates) -> Result<(), ReconError> {
    for (field, candidates) in [
        ("outlet", &columns.outlet),
        ("date", &columns.date),
        ("time", &columns.time),
        ("title", &columns.title),
    ] {
        if candidates.is_empty() && !columns.positional_fallback {
            return Err(ReconError::ConfigValidation(format!(
                "{section}.{field}: at least one candidate column is required"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
