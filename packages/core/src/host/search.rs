//! Free-text host search
//!
//! Each host is scored against four patterns (whole query as a word, whole
//! query anywhere, any term as a word, any term anywhere) over four targets
//! (alias, hostname, user, key). More specific patterns and more important
//! targets weigh more; hosts that match nothing are dropped.

use regex::{Regex, RegexBuilder};

use super::canonical::canonicalize;
use super::schema::HostRecord;
use super::store::ConfigStore;

/// Ties are broken by position, so scores are spread this far apart
const POSITION_SPREAD: u64 = 1_000_000_000;

struct Patterns {
    /// (weight, pattern), most specific first
    weighted: Vec<(u64, Regex)>,
}

impl Patterns {
    fn build(query: &str, terms: &[String]) -> Option<Self> {
        let query = regex::escape(query);
        let alternatives = terms
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let terms = format!("({alternatives})");

        let sources = [
            (4, format!(r"\b{query}\b")),
            (3, query),
            (2, format!(r"\b{terms}\b")),
            (1, terms),
        ];

        let mut weighted = Vec::with_capacity(sources.len());
        for (weight, source) in sources {
            match RegexBuilder::new(&source).case_insensitive(true).build() {
                Ok(re) => weighted.push((weight, re)),
                Err(e) => {
                    tracing::debug!("Skipping search pattern {source}: {e}");
                    return None;
                }
            }
        }
        Some(Self { weighted })
    }

    /// Sum of `(pattern + 1) * 10 + (target + 1)` over every match
    fn score(&self, targets: &[(u64, Option<&str>)]) -> u64 {
        let mut score = 0;
        for (target_weight, target) in targets {
            let Some(target) = target.filter(|t| !t.is_empty()) else {
                continue;
            };
            for (pattern_weight, re) in &self.weighted {
                if re.is_match(target) {
                    score += (pattern_weight + 1) * 10 + (target_weight + 1);
                }
            }
        }
        score
    }
}

impl ConfigStore {
    /// Hosts matching `query`, best match first
    ///
    /// The query is split on spaces; terms that resolve to an IP address add
    /// that address as an extra term. Failed lookups are ignored. An empty
    /// query returns every host in key order.
    pub fn search(&self, query: &str) -> Vec<(String, HostRecord)> {
        let query = query.trim().to_lowercase();

        let with_alias = |key: &str, host: &HostRecord| {
            let mut host = host.clone();
            if host.pssh.alias.is_empty() {
                host.pssh.alias = key.to_string();
            }
            (key.to_string(), host)
        };

        if query.is_empty() {
            return self
                .hosts()
                .iter()
                .map(|(key, host)| with_alias(key, host))
                .collect();
        }

        let mut terms: Vec<String> = query
            .split(' ')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        let resolved: Vec<String> = terms
            .iter()
            .map(|term| canonicalize(self.resolver(), term, true, false).hostname)
            .filter(|ip| !terms.contains(ip))
            .collect();
        terms.extend(resolved);

        let Some(patterns) = Patterns::build(&query, &terms) else {
            return Vec::new();
        };

        let mut scored: Vec<(u64, String, HostRecord)> = Vec::new();
        for (position, (key, host)) in self.hosts().iter().enumerate() {
            let alias = Some(host.pssh.alias.as_str());
            let targets = [
                (4, alias),
                (3, host.hostname()),
                (2, host.user()),
                (1, Some(key.as_str())),
            ];

            let score = patterns.score(&targets);
            if score > 0 {
                tracing::debug!("{key}: {score}");
                let (key, host) = with_alias(key, host);
                scored.push((score * POSITION_SPREAD + position as u64, key, host));
            }
        }

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, key, host)| (key, host)).collect()
    }
}
