use crate::classify::{RowClassifier, RowShape};
use crate::config::ColumnCandidates;
use crate::error::ReconError;
use crate::model::{
    AiringEvent, Cell, DiagnosticEntry, ParseContext, ParseSkip, ParseState, RawRow, RowKind,
    SkipReason,
};
use crate::schema::{resolve_columns, SchemaTarget};
use crate::temporal::{is_meridiem, looks_like_time_text, parse_date, parse_time, parse_time_text};

/// Result of feeding one row through the fold.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub context: ParseContext,
    pub events: Vec<AiringEvent>,
    pub diagnostic: DiagnosticEntry,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutput {
    pub events: Vec<AiringEvent>,
    pub diagnostics: Vec<DiagnosticEntry>,
    /// Context after the last row.
    pub context: ParseContext,
}

impl ParseOutput {
    pub fn skip_count(&self) -> usize {
        self.diagnostics.iter().map(|d| d.skips.len()).sum()
    }
}

fn entry(row_index: usize, classification: RowKind, detail: impl Into<String>) -> DiagnosticEntry {
    DiagnosticEntry {
        row_index,
        classification,
        detail: detail.into(),
        skips: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Grouped layout
// ---------------------------------------------------------------------------

/// Advance the parse by one row.
pub fn step(context: ParseContext, row_index: usize, row: &[Cell], classifier: &RowClassifier) -> Step {
    match classifier.classify(row) {
        RowShape::Dated { date_col } => data_step(context, row_index, row, date_col),
        RowShape::Outlet(outlet) => {
            let diagnostic = entry(row_index, RowKind::OutletHeader, format!("outlet = {outlet}"));
            Step {
                context: ParseContext {
                    outlet: Some(outlet),
                    campaign: None,
                },
                events: Vec::new(),
                diagnostic,
            }
        }
        RowShape::Campaign(campaign) => {
            if context.outlet.is_none() {
                let diagnostic = entry(
                    row_index,
                    RowKind::CampaignHeader,
                    format!("campaign '{campaign}' ignored: no outlet seen yet"),
                );
                return Step { context, events: Vec::new(), diagnostic };
            }
            let diagnostic = entry(row_index, RowKind::CampaignHeader, format!("campaign = {campaign}"));
            Step {
                context: ParseContext {
                    outlet: context.outlet,
                    campaign: Some(campaign),
                },
                events: Vec::new(),
                diagnostic,
            }
        }
        RowShape::Blank => Step {
            context,
            events: Vec::new(),
            diagnostic: entry(row_index, RowKind::Unclassified, "blank row"),
        },
        RowShape::Other => Step {
            context,
            events: Vec::new(),
            diagnostic: entry(row_index, RowKind::Unclassified, "no header marker or dated times"),
        },
    }
}

fn data_step(context: ParseContext, row_index: usize, row: &[Cell], date_col: usize) -> Step {
    let date_cell = &row[date_col];
    let Some(date) = parse_date(date_cell) else {
        let mut diagnostic = entry(row_index, RowKind::Unclassified, "date cell failed to parse; row skipped");
        diagnostic.skips.push(ParseSkip {
            column: date_col,
            value: date_cell.display(),
            reason: SkipReason::InvalidDate,
        });
        return Step { context, events: Vec::new(), diagnostic };
    };

    let (outlet, campaign) = match (&context.outlet, &context.campaign) {
        (Some(o), Some(c)) => (o.clone(), c.clone()),
        _ => {
            let detail = match context.state() {
                ParseState::NoContext => "dated row before any outlet header",
                _ => "dated row before any campaign header for the current outlet",
            };
            return Step {
                context,
                events: Vec::new(),
                diagnostic: entry(row_index, RowKind::Unclassified, detail),
            };
        }
    };

    let mut events = Vec::new();
    let mut skips = Vec::new();
    for (offset, cell) in row[date_col + 1..].iter().enumerate() {
        let column = date_col + 1 + offset;
        for (value, time) in cell_times(cell) {
            match time {
                Some(time) => events.push(AiringEvent {
                    outlet_text: outlet.clone(),
                    campaign_text: campaign.clone(),
                    date,
                    time,
                    row_index,
                }),
                None => skips.push(ParseSkip {
                    column,
                    value,
                    reason: SkipReason::InvalidTime,
                }),
            }
        }
    }

    let diagnostic = DiagnosticEntry {
        row_index,
        classification: RowKind::DataRow,
        detail: format!("{date}: {} airing(s)", events.len()),
        skips,
    };
    Step { context, events, diagnostic }
}

/// Every time value a cell holds. Text cells may hold several
/// whitespace-separated times, and an `AM`/`PM` token belongs to the time
/// before it. Text tokens not shaped like a time (titles, spot lengths) are
/// not times at all and yield nothing.
fn cell_times(cell: &Cell) -> Vec<(String, Option<chrono::NaiveTime>)> {
    match cell {
        Cell::Empty => Vec::new(),
        Cell::Text(s) => {
            let mut tokens = s.split_whitespace().peekable();
            let mut out = Vec::new();
            while let Some(tok) = tokens.next() {
                if !looks_like_time_text(tok) {
                    continue;
                }
                let value = match tokens.next_if(|next| is_meridiem(next)) {
                    Some(meridiem) => format!("{tok} {meridiem}"),
                    None => tok.to_string(),
                };
                let time = parse_time_text(&value);
                out.push((value, time));
            }
            out
        }
        Cell::Number(_) | Cell::DateSerial(_) => vec![(cell.display(), parse_time(cell))],
    }
}

/// Parse a grouped report in one pass.
pub fn parse_report(rows: &[RawRow], classifier: &RowClassifier) -> ParseOutput {
    let mut out = ParseOutput::default();
    for (row_index, row) in rows.iter().enumerate() {
        let context = std::mem::take(&mut out.context);
        let Step { context, events, diagnostic } = step(context, row_index, row, classifier);
        tracing::trace!(row = row_index, kind = %diagnostic.classification, "{}", diagnostic.detail);
        out.context = context;
        out.events.extend(events);
        out.diagnostics.push(diagnostic);
    }
    out
}

// ---------------------------------------------------------------------------
// Tabular layout
// ---------------------------------------------------------------------------

/// Parse an already-tabular report: the first row holds headers, each later
/// row is one airing (`campaign_text` comes from the title column).
pub fn parse_tabular(rows: &[RawRow], columns: &ColumnCandidates) -> Result<ParseOutput, ReconError> {
    let mut out = ParseOutput::default();
    let Some((header, body)) = rows.split_first() else {
        return Ok(out);
    };
    let map = resolve_columns(header, columns, SchemaTarget::Report)?;
    out.diagnostics.push(entry(0, RowKind::Unclassified, "header row"));

    let empty = Cell::Empty;
    for (offset, row) in body.iter().enumerate() {
        let row_index = offset + 1;
        let get = |idx: usize| row.get(idx).unwrap_or(&empty);

        let outlet = get(map.outlet).display();
        if outlet.is_empty() || row.iter().all(Cell::is_empty) {
            out.diagnostics.push(entry(row_index, RowKind::Unclassified, "no outlet; row skipped"));
            continue;
        }

        let mut skips = Vec::new();
        let date = parse_date(get(map.date));
        if date.is_none() {
            skips.push(ParseSkip {
                column: map.date,
                value: get(map.date).display(),
                reason: SkipReason::InvalidDate,
            });
        }
        let time = parse_time(get(map.time));
        if time.is_none() {
            skips.push(ParseSkip {
                column: map.time,
                value: get(map.time).display(),
                reason: SkipReason::InvalidTime,
            });
        }

        match (date, time) {
            (Some(date), Some(time)) => {
                out.events.push(AiringEvent {
                    outlet_text: outlet,
                    campaign_text: get(map.title).display(),
                    date,
                    time,
                    row_index,
                });
                out.diagnostics.push(DiagnosticEntry {
                    row_index,
                    classification: RowKind::DataRow,
                    detail: format!("{date}: 1 airing(s)"),
                    skips,
                });
            }
            _ => out.diagnostics.push(DiagnosticEntry {
                row_index,
                classification: RowKind::Unclassified,
                detail: "date or time failed to parse; row skipped".into(),
                skips,
            }),
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
