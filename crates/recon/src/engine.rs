use std::collections::{HashMap, HashSet};

use crate::classify::RowClassifier;
use crate::config::{ReconConfig, ReportLayout};
use crate::error::ReconError;
use crate::evidence::compute_summary;
use crate::matcher::reconcile;
use crate::model::{
    AiringEvent, LedgerRecord, ReconInput, ReconMeta, ReconOutput, Resolution, ResolvedEvent,
};
use crate::normalize::NameNormalizer;
use crate::parser::{parse_report, parse_tabular, ParseOutput};
use crate::resolver::OutletResolver;
use crate::schema::load_ledger;

/// Run one reconciliation: schema check, parse, resolve, join.
///
/// Only a ledger missing a required field is fatal. An empty report or an
/// empty ledger yields no results (diagnostics are still produced).
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconOutput, ReconError> {
    let ledger = load_ledger(&input.ledger, &config.ledger)?;
    tracing::info!(
        records = ledger.records.len(),
        skipped = ledger.skipped,
        "ledger loaded"
    );

    let parsed = parse(config, input)?;
    tracing::info!(
        rows = input.rows.len(),
        events = parsed.events.len(),
        skips = parsed.skip_count(),
        "report parsed"
    );

    let results = if parsed.events.is_empty() || ledger.records.is_empty() {
        tracing::warn!(
            events = parsed.events.len(),
            ledger_records = ledger.records.len(),
            "nothing to reconcile"
        );
        Vec::new()
    } else {
        let canonical = canonical_outlets(&ledger.records);
        let resolver = OutletResolver::new(
            NameNormalizer::new(&config.normalize),
            &input.aliases,
            &canonical,
            &config.matching,
        );
        let resolved = resolve_events(&resolver, parsed.events);
        reconcile(resolved, &ledger.records, &config.reconcile)
    };

    let summary = compute_summary(&results, &parsed.diagnostics, ledger.records.len(), ledger.skipped);
    tracing::info!(
        found_exact = summary.found_exact,
        found_slot = summary.found_slot,
        not_found = summary.not_found,
        "reconciliation complete"
    );

    Ok(ReconOutput {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        results,
        diagnostics: parsed.diagnostics,
    })
}

/// Parse the report grid only, per the configured layout.
pub fn parse(config: &ReconConfig, input: &ReconInput) -> Result<ParseOutput, ReconError> {
    Ok(match config.report.layout {
        ReportLayout::Grouped => parse_report(&input.rows, &RowClassifier::new(&config.report)),
        ReportLayout::Tabular => parse_tabular(&input.rows, &config.report.columns)?,
    })
}

/// Distinct ledger outlets in first-seen order.
pub fn canonical_outlets(records: &[LedgerRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| seen.insert(r.outlet.trim().to_lowercase()))
        .map(|r| r.outlet.trim().to_string())
        .collect()
}

/// Resolve every event's outlet, once per distinct outlet text.
pub fn resolve_events(resolver: &OutletResolver, events: Vec<AiringEvent>) -> Vec<ResolvedEvent> {
    let mut cache: HashMap<String, Resolution> = HashMap::new();
    events
        .into_iter()
        .map(|event| {
            let resolution = cache
                .entry(event.outlet_text.clone())
                .or_insert_with(|| {
                    let r = resolver.resolve(&event.outlet_text);
                    tracing::debug!(
                        outlet = %event.outlet_text,
                        canonical = r.canonical_outlet.as_deref().unwrap_or("UNRESOLVED"),
                        score = r.match_score,
                        tier = %r.match_tier,
                        "outlet resolved"
                    );
                    r
                })
                .clone();
            ResolvedEvent { event, resolution }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AliasDirectory, Cell, MatchTier, MissReason, RawRow, ReconStatus, RowKind};

    fn row(cells: &[&str]) -> RawRow {
        cells.iter().map(|s| Cell::text(*s)).collect()
    }

    fn ledger() -> Vec<RawRow> {
        vec![
            row(&["Veiculo_BoxNet", "Data_Contratacao", "Hora_Veiculacao", "Titulo_Peca"]),
            row(&["Radio Mix FM/Sao Paulo", "15/03/2024", "14:30:00", "Summer Promo"]),
            row(&["Radio Mix FM/Sao Paulo", "15/03/2024", "15:45:00", "Winter Promo"]),
            row(&["Band FM", "15/03/2024", "09:00:00", "Jingle"]),
        ]
    }

    fn report() -> Vec<RawRow> {
        vec![
            row(&["Veículo: RADIO MIX FM SAO PAULO"]),
            row(&["Comercial: Summer Promo"]),
            row(&["15/03/2024", "14:30:00", "15:45:00", "16:00"]),
            row(&["Veículo: TV Cultura"]),
            row(&["Comercial: Summer Promo"]),
            row(&["15/03/2024", "14:30"]),
        ]
    }

    #[test]
    fn end_to_end() {
        let input = ReconInput {
            rows: report(),
            ledger: ledger(),
            aliases: AliasDirectory::default(),
        };
        let out = run(&ReconConfig::default(), &input).unwrap();

        assert_eq!(out.results.len(), 4);
        let statuses: Vec<ReconStatus> = out.results.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                ReconStatus::FoundExact,
                ReconStatus::FoundSlot,
                ReconStatus::NotFound,
                ReconStatus::NotFound,
            ]
        );
        assert_eq!(out.results[0].resolved.resolution.match_tier, MatchTier::FuzzyDirect);
        assert_eq!(out.results[2].reason, Some(MissReason::NoLedgerMatch));
        assert_eq!(out.results[3].reason, Some(MissReason::UnresolvedOutlet));

        assert_eq!(out.diagnostics.len(), 6);
        assert_eq!(out.diagnostics[2].classification, RowKind::DataRow);
        assert_eq!(out.summary.found_exact, 1);
        assert_eq!(out.summary.ledger_records, 3);
        assert_eq!(out.meta.config_name, "default");
    }

    #[test]
    fn schema_violation_is_fatal_before_parsing() {
        let input = ReconInput {
            rows: report(),
            ledger: vec![row(&["veiculo", "data", "titulo"])],
            aliases: AliasDirectory::default(),
        };
        match run(&ReconConfig::default(), &input) {
            Err(ReconError::LedgerSchema { field, .. }) => assert_eq!(field, "time"),
            other => panic!("expected LedgerSchema, got {other:?}"),
        }
    }

    #[test]
    fn empty_inputs_yield_empty_results() {
        let no_rows = ReconInput {
            rows: Vec::new(),
            ledger: ledger(),
            aliases: AliasDirectory::default(),
        };
        let out = run(&ReconConfig::default(), &no_rows).unwrap();
        assert!(out.results.is_empty());
        assert!(out.diagnostics.is_empty());

        let header_only = ReconInput {
            rows: report(),
            ledger: ledger()[..1].to_vec(),
            aliases: AliasDirectory::default(),
        };
        let out = run(&ReconConfig::default(), &header_only).unwrap();
        assert!(out.results.is_empty());
        assert_eq!(out.diagnostics.len(), 6);

        let no_ledger = ReconInput {
            rows: report(),
            ledger: Vec::new(),
            aliases: AliasDirectory::default(),
        };
        assert!(run(&ReconConfig::default(), &no_ledger).unwrap().results.is_empty());
    }

    #[test]
    fn canonical_outlets_dedupe_in_order() {
        let load = load_ledger(&ledger(), &ReconConfig::default().ledger).unwrap();
        assert_eq!(
            canonical_outlets(&load.records),
            vec!["Radio Mix FM/Sao Paulo".to_string(), "Band FM".to_string()]
        );
    }

    #[test]
    fn alias_directory_feeds_resolution() {
        let input = ReconInput {
            rows: vec![
                row(&["Veículo: Cultura"]),
                row(&["Comercial: Jingle"]),
                row(&["15/03/2024", "09:00"]),
            ],
            ledger: ledger(),
            aliases: AliasDirectory::from_pairs([("Cultura", "Band FM")]),
        };
        let out = run(&ReconConfig::default(), &input).unwrap();
        assert_eq!(out.results[0].resolved.resolution.match_tier, MatchTier::ExactAlias);
        assert_eq!(out.results[0].status, ReconStatus::FoundExact);
    }

    #[test]
    fn twelve_hour_times_agree_on_both_sides() {
        let input = ReconInput {
            rows: vec![
                row(&["Veículo: Band FM"]),
                row(&["Comercial: Jingle"]),
                row(&["15/03/2024", "2:30 PM"]),
            ],
            ledger: vec![
                row(&["veiculo", "data", "hora", "titulo"]),
                row(&["Band FM", "15/03/2024", "2:30:00 PM", "Jingle"]),
            ],
            aliases: AliasDirectory::default(),
        };
        let out = run(&ReconConfig::default(), &input).unwrap();
        assert_eq!(out.summary.ledger_rows_skipped, 0);
        assert_eq!(out.summary.parse_skips, 0);
        assert_eq!(out.results.len(), 1);
        assert_eq!(
            out.results[0].resolved.event.time,
            chrono::NaiveTime::from_hms_opt(14, 30, 0).unwrap()
        );
        assert_eq!(out.results[0].status, ReconStatus::FoundExact);
    }
}
