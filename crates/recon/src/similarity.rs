//! String similarity scorers on a 0–100 scale. Any empty side scores 0.

use std::collections::BTreeSet;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scorer {
    /// Set intersection/remainder comparison; insensitive to order and duplicates.
    #[default]
    TokenSet,
    /// Whole-string ratio after sorting tokens.
    TokenSort,
    /// Best ratio of the shorter string against same-length windows of the longer.
    Partial,
    /// Plain normalized Levenshtein ratio.
    Ratio,
    JaroWinkler,
}

impl std::fmt::Display for Scorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TokenSet => write!(f, "token_set"),
            Self::TokenSort => write!(f, "token_sort"),
            Self::Partial => write!(f, "partial"),
            Self::Ratio => write!(f, "ratio"),
            Self::JaroWinkler => write!(f, "jaro_winkler"),
        }
    }
}

impl Scorer {
    pub fn score(self, a: &str, b: &str) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        match self {
            Self::TokenSet => token_set_ratio(a, b),
            Self::TokenSort => token_sort_ratio(a, b),
            Self::Partial => partial_ratio(a, b),
            Self::Ratio => ratio(a, b),
            Self::JaroWinkler => strsim::jaro_winkler(a, b) * 100.0,
        }
    }
}

pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    strsim::normalized_levenshtein(a, b) * 100.0
}

fn sorted_tokens(s: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens
}

pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a).join(" "), &sorted_tokens(b).join(" "))
}

pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let set_a: BTreeSet<&str> = a.split_whitespace().collect();
    let set_b: BTreeSet<&str> = b.split_whitespace().collect();
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let common: Vec<&str> = set_a.intersection(&set_b).copied().collect();
    let only_a: Vec<&str> = set_a.difference(&set_b).copied().collect();
    let only_b: Vec<&str> = set_b.difference(&set_a).copied().collect();

    // One side's tokens are a subset of the other's
    if !common.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 100.0;
    }

    let sect = common.join(" ");
    let join = |rest: &[&str]| -> String {
        match (sect.is_empty(), rest.is_empty()) {
            (true, _) => rest.join(" "),
            (false, true) => sect.clone(),
            (false, false) => format!("{sect} {}", rest.join(" ")),
        }
    };
    let combined_a = join(&only_a);
    let combined_b = join(&only_b);

    let mut best = ratio(&combined_a, &combined_b);
    if !sect.is_empty() {
        best = best.max(ratio(&sect, &combined_a)).max(ratio(&sect, &combined_b));
    }
    best
}

pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let (short, long): (Vec<char>, Vec<char>) = if a.chars().count() <= b.chars().count() {
        (a.chars().collect(), b.chars().collect())
    } else {
        (b.chars().collect(), a.chars().collect())
    };
    if short.is_empty() {
        return 0.0;
    }
    let needle: String = short.iter().collect();
    let mut best: f64 = 0.0;
    for start in 0..=(long.len() - short.len()) {
        let window: String = long[start..start + short.len()].iter().collect();
        best = best.max(ratio(&needle, &window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_100() {
        for scorer in [Scorer::TokenSet, Scorer::TokenSort, Scorer::Partial, Scorer::Ratio, Scorer::JaroWinkler] {
            assert_eq!(scorer.score("mix fm sao paulo", "mix fm sao paulo"), 100.0, "{scorer}");
        }
    }

    #[test]
    fn empty_side_scores_zero() {
        assert_eq!(Scorer::TokenSet.score("", "mix fm"), 0.0);
        assert_eq!(Scorer::Ratio.score("mix fm", ""), 0.0);
    }

    #[test]
    fn token_set_ignores_order_and_subsets() {
        assert_eq!(token_set_ratio("sao paulo mix fm", "mix fm sao paulo"), 100.0);
        assert_eq!(token_set_ratio("mix fm", "mix fm sao paulo"), 100.0);
        assert!(token_set_ratio("mix fm", "band fm") < 80.0);
    }

    #[test]
    fn token_set_partial_overlap() {
        let score = token_set_ratio("jovem pan fm sao paulo", "jovem pan news sao paulo");
        assert!(score > 70.0 && score < 100.0, "score = {score}");
    }

    #[test]
    fn token_sort_is_order_insensitive() {
        assert_eq!(token_sort_ratio("paulo sao", "sao paulo"), 100.0);
        assert!(token_sort_ratio("mix fm", "mix fm sao paulo") < 100.0);
    }

    #[test]
    fn partial_finds_substring() {
        assert_eq!(partial_ratio("mix fm", "radio mix fm sao paulo"), 100.0);
        assert!(partial_ratio("band", "mix fm") < 60.0);
    }

    #[test]
    fn default_scorer_is_token_set() {
        assert_eq!(Scorer::default(), Scorer::TokenSet);
    }
}
