use std::collections::HashSet;

use crate::config::ReportConfig;
use crate::model::Cell;
use crate::normalize::{fold, fold_char};
use crate::temporal::{looks_like_date, looks_like_time};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowShape {
    /// Date-like cell at `date_col` followed by at least one time-like cell.
    Dated { date_col: usize },
    Outlet(String),
    Campaign(String),
    Blank,
    Other,
}

/// A `Veículo:`-style label. Matched accent/case-insensitively on a word
/// boundary; the colon may be preceded by whitespace.
#[derive(Debug, Clone)]
struct Label {
    word: Vec<char>,
    colon: bool,
}

impl Label {
    fn new(text: &str) -> Option<Self> {
        let folded = fold(text.trim());
        let (body, colon) = match folded.strip_suffix(':') {
            Some(body) => (body.trim_end().to_string(), true),
            None => (folded, false),
        };
        if body.is_empty() {
            return None;
        }
        Some(Self { word: body.chars().collect(), colon })
    }

    /// Byte offset just past the label inside `text`, if present.
    fn find_in(&self, text: &str) -> Option<usize> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let n = self.word.len();
        if chars.len() < n {
            return None;
        }

        'outer: for start in 0..=(chars.len() - n) {
            if start > 0 && chars[start - 1].1.is_alphanumeric() {
                continue;
            }
            for (k, wc) in self.word.iter().enumerate() {
                if fold_char(chars[start + k].1) != *wc {
                    continue 'outer;
                }
            }

            let mut pos = start + n;
            if !self.colon {
                if pos < chars.len() && chars[pos].1.is_alphanumeric() {
                    continue;
                }
                return Some(chars.get(pos).map(|(i, _)| *i).unwrap_or(text.len()));
            }
            while pos < chars.len() && chars[pos].1.is_whitespace() {
                pos += 1;
            }
            if pos < chars.len() && chars[pos].1 == ':' {
                return Some(chars.get(pos + 1).map(|(i, _)| *i).unwrap_or(text.len()));
            }
        }
        None
    }
}

#[derive(Debug, Clone)]
pub struct RowClassifier {
    outlet_labels: Vec<Label>,
    campaign_labels: Vec<Label>,
    outlet_keywords: HashSet<String>,
    campaign_keywords: HashSet<String>,
}

impl Default for RowClassifier {
    fn default() -> Self {
        Self::new(&ReportConfig::default())
    }
}

fn keyword_set(words: &[String]) -> HashSet<String> {
    words
        .iter()
        .map(|w| fold(w.trim()))
        .filter(|w| !w.is_empty())
        .collect()
}

fn joined_text(cells: &[Cell]) -> String {
    cells
        .iter()
        .filter(|c| !c.is_empty())
        .map(Cell::display)
        .collect::<Vec<_>>()
        .join(" ")
}

impl RowClassifier {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            outlet_labels: config.outlet_labels.iter().filter_map(|l| Label::new(l)).collect(),
            campaign_labels: config.campaign_labels.iter().filter_map(|l| Label::new(l)).collect(),
            outlet_keywords: keyword_set(&config.outlet_keywords),
            campaign_keywords: keyword_set(&config.campaign_keywords),
        }
    }

    /// Precedence: dated rows, then explicit labels (outlet before campaign),
    /// then a leading campaign keyword, then any outlet keyword, then any
    /// campaign keyword.
    pub fn classify(&self, row: &[Cell]) -> RowShape {
        let Some(first) = row.iter().position(|c| !c.is_empty()) else {
            return RowShape::Blank;
        };

        if looks_like_date(&row[first]) && row[first + 1..].iter().any(looks_like_time) {
            return RowShape::Dated { date_col: first };
        }

        if let Some(value) = self.label_value(row, &self.outlet_labels) {
            return if value.is_empty() { RowShape::Other } else { RowShape::Outlet(value) };
        }
        if let Some(value) = self.label_value(row, &self.campaign_labels) {
            return if value.is_empty() { RowShape::Other } else { RowShape::Campaign(value) };
        }

        let text = joined_text(row);
        let folded = fold(&text);
        let tokens: Vec<&str> = folded
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        if tokens.first().is_some_and(|t| self.campaign_keywords.contains(*t)) {
            return RowShape::Campaign(text);
        }
        if tokens.iter().any(|t| self.outlet_keywords.contains(*t)) {
            return RowShape::Outlet(text);
        }
        if tokens.iter().any(|t| self.campaign_keywords.contains(*t)) {
            return RowShape::Campaign(text);
        }

        RowShape::Other
    }

    /// Text after the first matching label: rest of that cell plus the
    /// following non-empty cells. `Some("")` means a dangling label.
    fn label_value(&self, row: &[Cell], labels: &[Label]) -> Option<String> {
        let mut dangling = false;
        for (idx, cell) in row.iter().enumerate() {
            let Cell::Text(text) = cell else { continue };
            for label in labels {
                if let Some(offset) = label.find_in(text) {
                    let mut parts = vec![text[offset..].trim().to_string()];
                    parts.extend(row[idx + 1..].iter().filter(|c| !c.is_empty()).map(Cell::display));
                    let value = parts
                        .into_iter()
                        .filter(|p| !p.is_empty())
                        .collect::<Vec<_>>()
                        .join(" ");
                    if !value.is_empty() {
                        return Some(value);
                    }
                    dangling = true;
                }
            }
        }
        dangling.then(String::new)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<Cell> {
        cells.iter().map(|s| Cell::text(*s)).collect()
    }

    #[test]
    fn dated_row() {
        let c = RowClassifier::default();
        assert_eq!(
            c.classify(&row(&["15/03/2024", "14:30:00", "15:45:00"])),
            RowShape::Dated { date_col: 0 }
        );
        // leading blank column tolerated
        assert_eq!(
            c.classify(&row(&["", "15/03/2024", "14:30"])),
            RowShape::Dated { date_col: 1 }
        );
        // serial date + fractional time
        assert_eq!(
            c.classify(&[Cell::DateSerial(45366.0), Cell::Number(0.5)]),
            RowShape::Dated { date_col: 0 }
        );
    }

    #[test]
    fn date_without_times_is_not_dated() {
        let c = RowClassifier::default();
        assert_eq!(c.classify(&row(&["15/03/2024", "sem veiculação"])), RowShape::Other);
    }

    #[test]
    fn outlet_label_in_same_cell() {
        let c = RowClassifier::default();
        assert_eq!(
            c.classify(&row(&["Veículo: RADIO MIX FM SAO PAULO"])),
            RowShape::Outlet("RADIO MIX FM SAO PAULO".into())
        );
        assert_eq!(
            c.classify(&row(&["VEICULO :  Band FM"])),
            RowShape::Outlet("Band FM".into())
        );
    }

    #[test]
    fn label_value_in_following_cells() {
        let c = RowClassifier::default();
        assert_eq!(
            c.classify(&row(&["Comercial:", "", "Summer Promo", "30s"])),
            RowShape::Campaign("Summer Promo 30s".into())
        );
    }

    #[test]
    fn label_needs_word_boundary_and_value() {
        let c = RowClassifier::default();
        // "Comercial:" with nothing after it is not a header
        assert_eq!(c.classify(&row(&["Comercial:"])), RowShape::Other);
        // label embedded in a longer word is not a label
        assert_eq!(c.classify(&row(&["Multiveículo: x"])), RowShape::Other);
    }

    #[test]
    fn outlet_keyword_row() {
        let c = RowClassifier::default();
        assert_eq!(
            c.classify(&row(&["Radio Mix FM", ""])),
            RowShape::Outlet("Radio Mix FM".into())
        );
    }

    #[test]
    fn leading_campaign_keyword_beats_outlet_keyword() {
        let c = RowClassifier::default();
        assert_eq!(
            c.classify(&row(&["Spot Verão FM"])),
            RowShape::Campaign("Spot Verão FM".into())
        );
        // outlet keyword wins when the campaign word isn't leading
        assert_eq!(
            c.classify(&row(&["Rádio Comercial FM"])),
            RowShape::Outlet("Rádio Comercial FM".into())
        );
    }

    #[test]
    fn blank_and_other_rows() {
        let c = RowClassifier::default();
        assert_eq!(c.classify(&row(&["", "  "])), RowShape::Blank);
        assert_eq!(c.classify(&[]), RowShape::Blank);
        assert_eq!(c.classify(&row(&["Data", "Horários"])), RowShape::Other);
    }

    #[test]
    fn custom_tables() {
        let config = ReportConfig {
            outlet_labels: vec!["Station:".into()],
            campaign_labels: vec!["Ad:".into()],
            outlet_keywords: vec!["kbc".into()],
            campaign_keywords: vec!["promo".into()],
            ..ReportConfig::default()
        };
        let c = RowClassifier::new(&config);
        assert_eq!(c.classify(&row(&["station: WXYZ"])), RowShape::Outlet("WXYZ".into()));
        assert_eq!(c.classify(&row(&["AD: Back to school"])), RowShape::Campaign("Back to school".into()));
        assert_eq!(c.classify(&row(&["KBC 101"])), RowShape::Outlet("KBC 101".into()));
        assert_eq!(c.classify(&row(&["Veículo: X"])), RowShape::Other);
    }
}
