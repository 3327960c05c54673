use std::collections::{BTreeMap, BTreeSet};

use crate::model::{DiagnosticEntry, MissReason, ReconStatus, ReconSummary, ReconciliationResult};

/// Compute summary statistics from results and the parse diagnostics.
pub fn compute_summary(
    results: &[ReconciliationResult],
    diagnostics: &[DiagnosticEntry],
    ledger_records: usize,
    ledger_rows_skipped: usize,
) -> ReconSummary {
    let mut row_kinds: BTreeMap<String, usize> = BTreeMap::new();
    let mut parse_skips = 0;
    for d in diagnostics {
        *row_kinds.entry(d.classification.to_string()).or_insert(0) += 1;
        parse_skips += d.skips.len();
    }

    let mut found_exact = 0;
    let mut found_slot = 0;
    let mut not_found = 0;
    let mut unresolved: BTreeSet<&str> = BTreeSet::new();
    for r in results {
        match r.status {
            ReconStatus::FoundExact => found_exact += 1,
            ReconStatus::FoundSlot => found_slot += 1,
            ReconStatus::NotFound => not_found += 1,
        }
        if r.reason == Some(MissReason::UnresolvedOutlet) {
            unresolved.insert(r.resolved.event.outlet_text.as_str());
        }
    }

    ReconSummary {
        rows_read: diagnostics.len(),
        events: results.len(),
        found_exact,
        found_slot,
        not_found,
        unresolved_outlets: unresolved.len(),
        parse_skips,
        ledger_records,
        ledger_rows_skipped,
        row_kinds,
    }
}
