use std::collections::{HashMap, HashSet};

use crate::config::NormalizeConfig;

/// Built-in abbreviation table. Keys are matched either verbatim (with their
/// dots) or after punctuation is stripped.
const DEFAULT_ABBREVIATIONS: &[(&str, &str)] = &[
    ("sp", "sao paulo"),
    ("rj", "rio de janeiro"),
    ("bh", "belo horizonte"),
    ("mg", "minas gerais"),
    ("poa", "porto alegre"),
    ("bsb", "brasilia"),
    ("cwb", "curitiba"),
    ("r.", "radio"),
    ("rd.", "radio"),
    ("rad.", "radio"),
    ("s.", "sao"),
    ("sta.", "santa"),
    ("sto.", "santo"),
    ("n.s.", "nossa senhora"),
    ("intl", "internacional"),
];

/// Corporate suffixes, generic broadcast words and connectors. Band markers
/// (FM/AM/TV) are kept: they distinguish sister stations.
const DEFAULT_NOISE_WORDS: &[&str] = &[
    "ltda", "sa", "eireli", "epp", "me", "inc", "llc", "ltd", "corp", "cia",
    "radio", "radios", "rede", "network", "emissora", "canal", "channel",
    "televisao", "television", "sistema", "comunicacao", "comunicacoes",
    "broadcasting", "de", "da", "do", "das", "dos", "e", "the", "of",
];

/// Band markers shared by many unrelated stations. A key made only of these
/// says nothing about which station it names.
pub const BAND_MARKERS: &[&str] = &["fm", "am", "tv"];

/// Lowercase and strip diacritics from a single character.
pub fn fold_char(c: char) -> char {
    let lower = c.to_lowercase().next().unwrap_or(c);
    match lower {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

/// Lowercase + accent-fold a whole string.
pub fn fold(text: &str) -> String {
    text.chars().map(fold_char).collect()
}

fn is_separator(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '/' | '\\' | '|' | ',' | ';' | ':' | '(' | ')' | '[' | ']' | '{' | '}' | '-' | '_' | '+' | '&' | '"' | '\''
        )
}

fn strip_punctuation(token: &str) -> String {
    token.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Fold, split and strip a phrase into clean tokens (no abbreviation or noise handling).
fn clean_tokens(text: &str) -> Vec<String> {
    fold(text)
        .split(is_separator)
        .map(strip_punctuation)
        .filter(|t| !t.is_empty())
        .collect()
}

#[derive(Debug, Clone)]
pub struct NameNormalizer {
    abbreviations: HashMap<String, Vec<String>>,
    noise: HashSet<String>,
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new(&NormalizeConfig::default())
    }
}

impl NameNormalizer {
    /// Build from the built-in tables, extended (or replaced) by config.
    pub fn new(config: &NormalizeConfig) -> Self {
        let mut abbreviations = HashMap::new();
        let mut noise = HashSet::new();

        if !config.replace_defaults {
            for (key, expansion) in DEFAULT_ABBREVIATIONS {
                abbreviations.insert(fold(key), clean_tokens(expansion));
            }
            for word in DEFAULT_NOISE_WORDS {
                noise.insert((*word).to_string());
            }
        }
        for (key, expansion) in &config.abbreviations {
            abbreviations.insert(fold(key.trim()), clean_tokens(expansion));
        }
        for word in &config.noise_words {
            let cleaned = strip_punctuation(&fold(word));
            if !cleaned.is_empty() {
                noise.insert(cleaned);
            }
        }

        Self { abbreviations, noise }
    }

    fn expansion(&self, raw: &str, stripped: &str) -> Option<&Vec<String>> {
        self.abbreviations
            .get(raw)
            .or_else(|| self.abbreviations.get(stripped))
    }

    /// Folded, punctuation-free tokens of `text` with nothing expanded or
    /// dropped. `Rede TV/São Paulo` becomes `rede tv sao paulo`.
    pub fn fold_tokens(&self, text: &str) -> String {
        clean_tokens(text).join(" ")
    }

    /// Whether a normalized key holds at least one token besides band markers.
    pub fn is_distinctive(key: &str) -> bool {
        key.split_whitespace().any(|t| !BAND_MARKERS.contains(&t))
    }

    /// Lowercase, fold, expand abbreviations, drop noise words and strip
    /// punctuation. The output is a fixed point of this function.
    pub fn normalize(&self, text: &str) -> String {
        let folded = fold(text);
        let mut out: Vec<String> = Vec::new();

        for raw in folded.split(is_separator).filter(|t| !t.is_empty()) {
            let stripped = strip_punctuation(raw);
            match self.expansion(raw, &stripped) {
                Some(words) => {
                    out.extend(words.iter().filter(|w| !self.noise.contains(*w)).cloned());
                }
                None => {
                    if !stripped.is_empty() && !self.noise.contains(&stripped) {
                        out.push(stripped);
                    }
                }
            }
        }

        out.join(" ")
    }

    /// Abbreviation keys whose expansion contains another key. Such a table
    /// would make normalization order-dependent.
    pub fn conflicting_abbreviations(&self) -> Vec<String> {
        let mut conflicts: Vec<String> = self
            .abbreviations
            .iter()
            .filter(|(_, words)| words.iter().any(|w| self.abbreviations.contains_key(w)))
            .map(|(key, _)| key.clone())
            .collect();
        conflicts.sort();
        conflicts
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
