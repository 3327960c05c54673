use crate::config::MatchingConfig;
use crate::model::{AliasDirectory, MatchTier, Resolution};
use crate::normalize::NameNormalizer;
use crate::similarity::{ratio, Scorer};

/// A candidate with its normalized and folded forms computed once up front.
#[derive(Debug, Clone)]
struct Candidate {
    key: String,
    folded: String,
    canonical: String,
}

/// What an outlet text is compared by. A key made only of band markers
/// (`Rede TV` → `tv`) would be a token subset of every TV station, so it is
/// compared whole, by its folded text, instead.
enum Probe {
    Key(String),
    Folded(String),
}

#[derive(Debug, Clone)]
pub struct OutletResolver {
    normalizer: NameNormalizer,
    aliases: Vec<Candidate>,
    canonicals: Vec<Candidate>,
    threshold: f64,
    scorer: Scorer,
}

impl OutletResolver {
    /// `canonical` is the list of authoritative outlet names (normally the
    /// ledger's distinct outlets in first-seen order).
    pub fn new(
        normalizer: NameNormalizer,
        aliases: &AliasDirectory,
        canonical: &[String],
        matching: &MatchingConfig,
    ) -> Self {
        let alias_candidates = aliases
            .entries
            .iter()
            .map(|e| Candidate {
                key: normalizer.normalize(&e.alias),
                folded: normalizer.fold_tokens(&e.alias),
                canonical: e.canonical.clone(),
            })
            .filter(|c| !c.key.is_empty())
            .collect();

        let filter = matching
            .candidate_filter
            .as_deref()
            .map(|f| normalizer.normalize(f))
            .filter(|f| !f.is_empty());
        let canonical_candidates: Vec<Candidate> = canonical
            .iter()
            .map(|name| Candidate {
                key: normalizer.normalize(name),
                folded: normalizer.fold_tokens(name),
                canonical: name.clone(),
            })
            .filter(|c| !c.key.is_empty())
            .filter(|c| filter.as_ref().map_or(true, |f| c.key.contains(f.as_str())))
            .collect();

        tracing::debug!(
            aliases = aliases.len(),
            canonicals = canonical_candidates.len(),
            threshold = matching.threshold,
            scorer = %matching.scorer,
            "outlet resolver ready"
        );

        Self {
            normalizer,
            aliases: alias_candidates,
            canonicals: canonical_candidates,
            threshold: matching.threshold,
            scorer: matching.scorer,
        }
    }

    pub fn normalizer(&self) -> &NameNormalizer {
        &self.normalizer
    }

    pub fn resolve(&self, outlet_text: &str) -> Resolution {
        let key = self.normalizer.normalize(outlet_text);
        if key.is_empty() {
            return Resolution::unresolved(0.0);
        }
        let probe = if NameNormalizer::is_distinctive(&key) {
            Probe::Key(key)
        } else {
            Probe::Folded(self.normalizer.fold_tokens(outlet_text))
        };

        let exact = |c: &&Candidate| match &probe {
            Probe::Key(key) => c.key == *key,
            Probe::Folded(folded) => c.folded == *folded,
        };
        if let Some(hit) = self.aliases.iter().find(exact) {
            return Resolution {
                canonical_outlet: Some(hit.canonical.clone()),
                match_score: 100.0,
                match_tier: MatchTier::ExactAlias,
            };
        }

        let mut best_seen: f64 = 0.0;
        for (candidates, tier) in [
            (&self.aliases, MatchTier::FuzzyAlias),
            (&self.canonicals, MatchTier::FuzzyDirect),
        ] {
            if let Some((hit, score)) = self.best_match(&probe, candidates) {
                if score >= self.threshold {
                    return Resolution {
                        canonical_outlet: Some(hit.canonical.clone()),
                        match_score: score,
                        match_tier: tier,
                    };
                }
                best_seen = best_seen.max(score);
            }
        }

        tracing::debug!(outlet = outlet_text, best = best_seen, "outlet unresolved");
        Resolution::unresolved(best_seen)
    }

    fn best_match<'a>(&self, probe: &Probe, candidates: &'a [Candidate]) -> Option<(&'a Candidate, f64)> {
        let mut best: Option<(&Candidate, f64)> = None;
        for c in candidates {
            let score = match probe {
                Probe::Key(key) => self.scorer.score(key, &c.key),
                Probe::Folded(folded) => ratio(folded, &c.folded),
            };
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((c, score));
            }
        }
        best
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(aliases: &[(&str, &str)], canonical: &[&str], matching: MatchingConfig) -> OutletResolver {
        let dir = AliasDirectory::from_pairs(aliases.iter().copied());
        let canonical: Vec<String> = canonical.iter().map(|s| s.to_string()).collect();
        OutletResolver::new(NameNormalizer::default(), &dir, &canonical, &matching)
    }

    #[test]
    fn fuzzy_direct_against_canonical_list() {
        let r = resolver(&[], &["Radio Mix FM/Sao Paulo"], MatchingConfig::default());
        let res = r.resolve("RADIO MIX FM SAO PAULO");
        assert_eq!(res.match_tier, MatchTier::FuzzyDirect);
        assert_eq!(res.canonical_outlet.as_deref(), Some("Radio Mix FM/Sao Paulo"));
        assert!(res.match_score >= 80.0);
    }

    #[test]
    fn exact_alias_wins_with_score_100() {
        // The direct candidate is an identical string, yet the alias tier
        // runs first and maps elsewhere.
        let r = resolver(
            &[("Mix SP", "Mix Holding"), ("Radio Mix FM", "Radio Mix FM/Sao Paulo")],
            &["Radio Mix FM"],
            MatchingConfig::default(),
        );
        let res = r.resolve("Rádio Mix FM");
        assert_eq!(res.match_tier, MatchTier::ExactAlias);
        assert_eq!(res.match_score, 100.0);
        assert_eq!(res.canonical_outlet.as_deref(), Some("Radio Mix FM/Sao Paulo"));
    }

    #[test]
    fn fuzzy_alias_before_direct() {
        let r = resolver(
            &[("Jovem Pan FM Sao Paulo", "JP FM")],
            &["Jovem Pan FM"],
            MatchingConfig::default(),
        );
        let res = r.resolve("Jovem Pan FM - SP");
        // "jovem pan fm sao paulo" equals the alias key after normalization
        assert_eq!(res.match_tier, MatchTier::ExactAlias);

        let res = r.resolve("Jovem Pan FM Sao Paulo Capital");
        assert_eq!(res.match_tier, MatchTier::FuzzyAlias);
        assert_eq!(res.canonical_outlet.as_deref(), Some("JP FM"));
    }

    #[test]
    fn ties_go_to_first_candidate() {
        let r = resolver(&[], &["Band FM Campinas", "Band FM Santos"], MatchingConfig::default());
        // "band fm" is a token subset of both: 100 each
        let res = r.resolve("Band FM");
        assert_eq!(res.canonical_outlet.as_deref(), Some("Band FM Campinas"));

        let r = resolver(&[], &["Band FM Santos", "Band FM Campinas"], MatchingConfig::default());
        assert_eq!(r.resolve("Band FM").canonical_outlet.as_deref(), Some("Band FM Santos"));
    }

    #[test]
    fn band_only_name_is_not_a_subset_match() {
        let r = resolver(&[], &["TV Cultura/Sao Paulo", "Rede TV/Sao Paulo"], MatchingConfig::default());
        let res = r.resolve("Rede TV");
        assert!(!res.is_resolved(), "got {res:?}");
        assert!(res.match_score < 80.0);

        let r = resolver(&[], &["TV Cultura/Sao Paulo", "Rede TV"], MatchingConfig::default());
        let res = r.resolve("REDE TV");
        assert_eq!(res.canonical_outlet.as_deref(), Some("Rede TV"));
        assert_eq!(res.match_tier, MatchTier::FuzzyDirect);
        assert_eq!(res.match_score, 100.0);
    }

    #[test]
    fn band_only_name_matches_alias_by_folded_text() {
        let r = resolver(
            &[("Canal TV", "TV Cultura/Sao Paulo"), ("Rede TV", "Rede TV/Sao Paulo")],
            &[],
            MatchingConfig::default(),
        );
        let res = r.resolve("Rede TV");
        assert_eq!(res.match_tier, MatchTier::ExactAlias);
        assert_eq!(res.canonical_outlet.as_deref(), Some("Rede TV/Sao Paulo"));
    }

    #[test]
    fn below_threshold_everywhere_is_unresolved() {
        let r = resolver(&[("Mix SP", "Radio Mix FM/Sao Paulo")], &["Radio Mix FM/Sao Paulo"], MatchingConfig::default());
        let res = r.resolve("TV Cultura");
        assert!(!res.is_resolved());
        assert_eq!(res.match_tier, MatchTier::None);
        assert!(res.match_score < 80.0);
    }

    #[test]
    fn empty_text_and_empty_lists() {
        let r = resolver(&[], &[], MatchingConfig::default());
        assert_eq!(r.resolve("Radio Mix FM"), Resolution::unresolved(0.0));
        let r = resolver(&[], &["Band FM"], MatchingConfig::default());
        assert_eq!(r.resolve("  "), Resolution::unresolved(0.0));
    }

    #[test]
    fn threshold_is_configurable() {
        let strict = MatchingConfig {
            threshold: 100.0,
            ..MatchingConfig::default()
        };
        let r = resolver(&[], &["Jovem Pan News"], strict);
        assert!(!r.resolve("Jovem Pan FM").is_resolved());

        let loose = MatchingConfig {
            threshold: 50.0,
            ..MatchingConfig::default()
        };
        let r = resolver(&[], &["Jovem Pan News"], loose);
        assert_eq!(r.resolve("Jovem Pan FM").match_tier, MatchTier::FuzzyDirect);
    }

    #[test]
    fn candidate_filter_limits_direct_tier() {
        let matching = MatchingConfig {
            candidate_filter: Some("São Paulo".into()),
            ..MatchingConfig::default()
        };
        let r = resolver(&[], &["Mix FM Rio", "Mix FM/Sao Paulo"], matching);
        let res = r.resolve("Mix FM");
        assert_eq!(res.canonical_outlet.as_deref(), Some("Mix FM/Sao Paulo"));
    }
}
