use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};

use crate::config::ReconcileConfig;
use crate::model::{LedgerRecord, MissReason, ReconStatus, ReconciliationResult, ResolvedEvent};
use crate::normalize::fold;
use crate::temporal::TimeGranularity;

/// Coarse key: outlet + date + time at the configured granularity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub outlet: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl SlotKey {
    pub fn new(outlet: &str, date: NaiveDate, time: NaiveTime, granularity: TimeGranularity) -> Self {
        Self {
            outlet: outlet.trim().to_lowercase(),
            date,
            time: granularity.truncate(time),
        }
    }
}

/// Title comparison form: folded, whitespace collapsed.
pub fn title_key(title: &str) -> String {
    fold(title).split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Anything that can take part in the join. Ledger records and events key
/// through the same functions, so which side is indexed does not matter.
pub trait Keyed {
    /// `None` when the item cannot be keyed (an unresolved outlet).
    fn slot_key(&self, granularity: TimeGranularity) -> Option<SlotKey>;
    fn title(&self) -> &str;
}

impl Keyed for LedgerRecord {
    fn slot_key(&self, granularity: TimeGranularity) -> Option<SlotKey> {
        Some(SlotKey::new(&self.outlet, self.date, self.time, granularity))
    }

    fn title(&self) -> &str {
        &self.title
    }
}

impl Keyed for ResolvedEvent {
    fn slot_key(&self, granularity: TimeGranularity) -> Option<SlotKey> {
        let outlet = self.resolution.canonical_outlet.as_deref()?;
        Some(SlotKey::new(outlet, self.event.date, self.event.time, granularity))
    }

    fn title(&self) -> &str {
        &self.event.campaign_text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMatch {
    /// Slot and title agree; index into the indexed collection.
    Exact(usize),
    /// Slot agrees, title does not; first record in the slot.
    Slot(usize),
    Miss,
}

/// Slot key → (index, title key) of every indexed item, in input order.
#[derive(Debug, Default)]
pub struct KeyIndex {
    slots: HashMap<SlotKey, Vec<(usize, String)>>,
    granularity: TimeGranularity,
}

impl KeyIndex {
    pub fn build<T: Keyed>(items: &[T], granularity: TimeGranularity) -> Self {
        let mut slots: HashMap<SlotKey, Vec<(usize, String)>> = HashMap::new();
        for (idx, item) in items.iter().enumerate() {
            if let Some(key) = item.slot_key(granularity) {
                slots.entry(key).or_default().push((idx, title_key(item.title())));
            }
        }
        Self { slots, granularity }
    }

    pub fn len(&self) -> usize {
        self.slots.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn lookup<T: Keyed>(&self, probe: &T) -> KeyMatch {
        let Some(key) = probe.slot_key(self.granularity) else {
            return KeyMatch::Miss;
        };
        let Some(entries) = self.slots.get(&key) else {
            return KeyMatch::Miss;
        };
        let wanted = title_key(probe.title());
        match entries.iter().find(|(_, title)| *title == wanted) {
            Some((idx, _)) => KeyMatch::Exact(*idx),
            None => KeyMatch::Slot(entries[0].0),
        }
    }
}

/// Classify every resolved event against the ledger. Output order follows
/// the event order.
pub fn reconcile(
    events: Vec<ResolvedEvent>,
    ledger: &[LedgerRecord],
    config: &ReconcileConfig,
) -> Vec<ReconciliationResult> {
    let index = KeyIndex::build(ledger, config.time_granularity);
    tracing::debug!(
        ledger_records = index.len(),
        granularity = %config.time_granularity,
        require_title_match = config.require_title_match,
        "ledger indexed"
    );

    events
        .into_iter()
        .map(|resolved| {
            let hit = index.lookup(&resolved);
            let (status, reason, row) = match hit {
                KeyMatch::Exact(i) => (ReconStatus::FoundExact, None, Some(i)),
                KeyMatch::Slot(i) if !config.require_title_match => (ReconStatus::FoundExact, None, Some(i)),
                KeyMatch::Slot(i) => (ReconStatus::FoundSlot, None, Some(i)),
                KeyMatch::Miss if !resolved.resolution.is_resolved() => {
                    (ReconStatus::NotFound, Some(MissReason::UnresolvedOutlet), None)
                }
                KeyMatch::Miss => (ReconStatus::NotFound, Some(MissReason::NoLedgerMatch), None),
            };
            let record = row.map(|i| &ledger[i]);
            ReconciliationResult {
                resolved,
                status,
                reason,
                ledger_title: record.map(|r| r.title.clone()),
                ledger_row: record.map(|r| r.row_index),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
