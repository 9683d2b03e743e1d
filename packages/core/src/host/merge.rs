//! Conflict-aware merging
//!
//! Hosts are identified by hostname + user (+ port when given), not by
//! alias. Adding a host that matches an existing one either changes nothing
//! (it is a subset of what is already known) or yields an override: just
//! the fields that differ, for the user to reconcile by hand.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::clean::DEFAULT_PORT;
use super::error::StoreError;
use super::schema::HostRecord;
use super::store::ConfigStore;

/// What to look for with [`ConfigStore::find`]
#[derive(Debug, Clone, Default)]
pub struct HostSearch<'a> {
    pub alias: Option<&'a str>,
    pub hostname: Option<&'a str>,
    pub port: Option<&'a str>,
    pub user: Option<&'a str>,
}

/// Hosts found by [`ConfigStore::find`], indexed by what matched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindResult {
    /// Searched alias -> the host owning it (empty when unmapped)
    pub alias: BTreeMap<String, Vec<HostRecord>>,
    /// User -> storage key -> host, for hosts on the searched hostname
    pub hostname: BTreeMap<String, BTreeMap<String, HostRecord>>,
}

/// Outcome of [`ConfigStore::add`]
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// Stored under `key` (possibly suffixed to be unique)
    Inserted { key: String },
    /// An existing host already holds everything the candidate had
    Unchanged { existing_key: String },
    /// The candidate differs from an existing host; `override_host` holds
    /// only the differing fields
    Conflict {
        existing_key: String,
        override_host: HostRecord,
    },
}

impl AddOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Conflict { .. })
    }

    /// Key the host is stored under; `None` on conflict
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Inserted { key } => Some(key),
            Self::Unchanged { existing_key } => Some(existing_key),
            Self::Conflict { .. } => None,
        }
    }
}

/// Counts from [`ConfigStore::merge`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub inserted: usize,
    pub unchanged: usize,
    pub conflicts: usize,
}

/// Remove from `a` everything `b` holds with an equal value
///
/// Nested maps are diffed recursively and dropped once empty. Any other
/// value (including arrays, compared element by element) is removed only
/// when equal.
pub fn host_diff(a: &Map<String, Value>, b: &Map<String, Value>) -> Map<String, Value> {
    let mut diff = Map::new();
    for (key, value_a) in a {
        match (value_a, b.get(key)) {
            (Value::Object(nested_a), Some(Value::Object(nested_b))) => {
                let nested = host_diff(nested_a, nested_b);
                if !nested.is_empty() {
                    diff.insert(key.clone(), Value::Object(nested));
                }
            }
            (value_a, Some(value_b)) if value_a == value_b => {}
            (value_a, _) => {
                diff.insert(key.clone(), value_a.clone());
            }
        }
    }
    diff
}

fn to_map(key: &str, host: &HostRecord) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(host) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::InvalidHost {
            key: key.to_string(),
            message: format!("expected an object, found {other}"),
        }),
        Err(e) => Err(StoreError::InvalidHost {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}

fn same_port(wanted: &str, actual: &str) -> bool {
    match (wanted.trim().parse::<u32>(), actual.trim().parse::<u32>()) {
        (Ok(w), Ok(a)) => w == a,
        _ => wanted.trim() == actual.trim(),
    }
}

impl ConfigStore {
    /// Look hosts up by alias and by hostname (filtered by port and user)
    ///
    /// A missing search port matches any port; a host without a port counts
    /// as port 22.
    pub fn find(&self, search: &HostSearch<'_>) -> FindResult {
        let clean = |v: Option<&str>| v.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string);
        let alias = clean(search.alias);
        let hostname = clean(search.hostname);
        let port = clean(search.port);
        let user = clean(search.user);

        let mut result = FindResult::default();

        if let Some(alias) = alias {
            let hosts = self
                .get_hosts(Some(&alias))
                .into_iter()
                .map(|(_, host)| host.clone())
                .collect();
            result.alias.insert(alias, hosts);
        }

        if let Some(hostname) = hostname {
            if let Some(user) = &user {
                result.hostname.insert(user.clone(), BTreeMap::new());
            }

            let default_port = DEFAULT_PORT.to_string();
            for (key, host) in self.hosts_by_hostname(&hostname) {
                let host_user = host.user().unwrap_or("");
                let host_port = host.port().unwrap_or(&default_port);
                let port_matches = port.as_deref().is_none_or(|p| same_port(p, host_port));
                let user_matches = user.as_deref().is_none_or(|u| u == host_user);
                if port_matches && user_matches {
                    result
                        .hostname
                        .entry(host_user.to_string())
                        .or_default()
                        .insert(key.to_string(), host.clone());
                }
            }
        }

        result
    }

    /// Add a host unless an equivalent one exists
    ///
    /// Without `force`, a host on the same hostname and user is compared
    /// with the candidate: identical data is a no-op, differing data is a
    /// [`AddOutcome::Conflict`]. Otherwise the host is stored under a
    /// unique key derived from `alias`.
    pub fn add(
        &mut self,
        alias: &str,
        host: HostRecord,
        force: bool,
    ) -> Result<AddOutcome, StoreError> {
        let search = HostSearch {
            alias: Some(alias),
            hostname: host.hostname(),
            port: host.port(),
            user: host.user(),
        };
        let found = self.find(&search);

        let existing = match (host.hostname(), host.user()) {
            (Some(_), Some(user)) => found
                .hostname
                .get(user.trim())
                .and_then(|hosts| hosts.iter().next())
                .map(|(key, existing)| (key.clone(), existing.clone())),
            _ => None,
        };

        let (existing_key, existing) = match existing {
            Some(pair) if !force => pair,
            _ => {
                let key = self.auto_alias(alias);
                tracing::debug!("Adding host '{key}'");
                self.data.hosts.insert(key.clone(), host);
                self.reset_derived();
                return Ok(AddOutcome::Inserted { key });
            }
        };

        let diff = host_diff(&to_map(alias, &host)?, &to_map(&existing_key, &existing)?);
        if diff.is_empty() {
            return Ok(AddOutcome::Unchanged { existing_key });
        }

        let mut override_host: HostRecord =
            serde_json::from_value(Value::Object(diff)).map_err(|e| StoreError::InvalidHost {
                key: alias.to_string(),
                message: e.to_string(),
            })?;

        let alias_claimed = found.alias.get(alias).is_some_and(|hosts| !hosts.is_empty());
        if override_host.pssh.alias.is_empty() && !alias_claimed {
            override_host.pssh.alias = alias.to_string();
        }

        Ok(AddOutcome::Conflict {
            existing_key,
            override_host,
        })
    }

    /// Add every host of this store to `target`; conflicts go to `overrides`
    ///
    /// Conflicting deltas are forced into `overrides` under the existing
    /// host's key (suffixed when needed), so nothing is lost.
    pub fn merge(
        &self,
        target: &mut ConfigStore,
        overrides: &mut ConfigStore,
    ) -> Result<MergeSummary, StoreError> {
        let mut summary = MergeSummary::default();
        for (key, host) in self.hosts() {
            match target.add(key, host.clone(), false)? {
                AddOutcome::Inserted { .. } => summary.inserted += 1,
                AddOutcome::Unchanged { .. } => summary.unchanged += 1,
                AddOutcome::Conflict {
                    existing_key,
                    override_host,
                } => {
                    self.reporter
                        .log(&format!("Conflict for '{key}' - placing override for '{existing_key}'"));
                    overrides.add(&existing_key, override_host, true)?;
                    summary.conflicts += 1;
                }
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::test_support::store;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_host_diff_of_self_is_empty() {
        let host = object(json!({
            "ssh": {"hostname": "10.0.0.1", "user": "bob"},
            "pssh": {"alias": "web", "alias_additional": ["www"]}
        }));
        assert!(host_diff(&host, &host).is_empty());
    }

    #[test]
    fn test_host_diff_keeps_differences() {
        let a = object(json!({
            "ssh": {"hostname": "10.0.0.1", "user": "bob", "port": "2222"},
            "pssh": {"alias": "web", "alias_additional": ["a", "b"]}
        }));
        let b = object(json!({
            "ssh": {"hostname": "10.0.0.1", "user": "bob"},
            "pssh": {"alias": "web", "alias_additional": ["b", "a"]}
        }));
        assert_eq!(
            Value::Object(host_diff(&a, &b)),
            json!({
                "ssh": {"port": "2222"},
                "pssh": {"alias_additional": ["a", "b"]}
            })
        );
    }

    #[test]
    fn test_find_by_alias_and_hostname() {
        let (mut store, _) = store();
        store.set_host("web", HostRecord::new("10.0.0.1").with_user("bob").with_alias("web"));
        store.set_host("web-alt", HostRecord::new("10.0.0.1").with_user("bob").with_port(2222));
        store.set_host("other", HostRecord::new("10.0.0.1").with_user("amy"));

        let found = store.find(&HostSearch {
            alias: Some("web"),
            hostname: Some("10.0.0.1"),
            port: Some("22"),
            user: Some("bob"),
        });
        assert_eq!(found.alias["web"].len(), 1);
        let bob: Vec<_> = found.hostname["bob"].keys().cloned().collect();
        assert_eq!(bob, vec!["web"]);
        assert!(!found.hostname.contains_key("amy"));

        let any_port = store.find(&HostSearch {
            hostname: Some("10.0.0.1"),
            ..Default::default()
        });
        assert_eq!(any_port.hostname["bob"].len(), 2);
        assert_eq!(any_port.hostname["amy"].len(), 1);
    }

    #[test]
    fn test_add_inserts_new_host() {
        let (mut store, _) = store();
        let outcome = store
            .add("web", HostRecord::new("10.0.0.1").with_user("bob"), false)
            .unwrap();
        assert_eq!(outcome, AddOutcome::Inserted { key: "web".to_string() });
        assert!(outcome.is_success());
    }

    #[test]
    fn test_add_auto_aliases_on_key_clash() {
        let (mut store, _) = store();
        store.set_host("web", HostRecord::new("10.0.0.1").with_user("bob"));
        let outcome = store
            .add("web", HostRecord::new("10.0.0.2").with_user("bob"), false)
            .unwrap();
        assert_eq!(outcome, AddOutcome::Inserted { key: "web1".to_string() });
    }

    #[test]
    fn test_add_key_points_at_the_new_host() {
        let (mut store, _) = store();
        store.set_host("web", HostRecord::new("10.0.0.1").with_user("amy"));
        let outcome = store
            .add("web", HostRecord::new("10.0.0.9").with_user("bob"), false)
            .unwrap();
        assert_eq!(outcome.key(), Some("web1"));

        store.clean().unwrap();
        let (key, host) = store.get_host("web1").unwrap();
        assert_eq!(key, "web1");
        assert_eq!(host.hostname(), Some("10.0.0.9"));
        assert_eq!(store.get_host("web").unwrap().1.hostname(), Some("10.0.0.1"));
    }

    #[test]
    fn test_add_duplicate_is_unchanged() {
        let (mut store, _) = store();
        let host = HostRecord::new("10.0.0.1").with_user("bob").with_alias("web");
        store.set_host("web", host.clone());

        let outcome = store.add("web", host, false).unwrap();
        assert_eq!(
            outcome,
            AddOutcome::Unchanged {
                existing_key: "web".to_string()
            }
        );
        assert_eq!(store.hosts().len(), 1);
    }

    #[test]
    fn test_add_conflict_returns_delta() {
        let (mut store, _) = store();
        store.set_host(
            "web",
            HostRecord::new("10.0.0.1").with_user("bob").with_alias("web"),
        );

        let candidate = HostRecord::new("10.0.0.1")
            .with_user("bob")
            .with_option("identityfile", "~/.ssh/bob");
        let outcome = store.add("app", candidate, false).unwrap();

        let AddOutcome::Conflict {
            existing_key,
            override_host,
        } = outcome
        else {
            panic!("expected a conflict");
        };
        assert_eq!(existing_key, "web");
        assert_eq!(override_host.ssh.len(), 1);
        assert_eq!(override_host.ssh["identityfile"], "~/.ssh/bob");
        // Stamped with the candidate alias, which nothing in the store uses
        assert_eq!(override_host.pssh.alias, "app");
        assert_eq!(store.hosts().len(), 1);
    }

    #[test]
    fn test_add_force_always_inserts() {
        let (mut store, _) = store();
        let host = HostRecord::new("10.0.0.1").with_user("bob");
        store.set_host("web", host.clone());

        let outcome = store.add("web", host, true).unwrap();
        assert_eq!(outcome, AddOutcome::Inserted { key: "web1".to_string() });
        assert_eq!(store.hosts().len(), 2);
    }

    #[test]
    fn test_merge_sends_conflicts_to_override() {
        let (mut source, _) = store();
        source.set_host(
            "A",
            HostRecord::new("1.2.3.4").with_user("bob").with_alias("A"),
        );
        source.set_host("fresh", HostRecord::new("5.6.7.8").with_user("amy"));

        let (mut target, _) = store();
        target.set_host(
            "B",
            HostRecord::new("1.2.3.4")
                .with_user("bob")
                .with_port(2222)
                .with_alias("B"),
        );
        let (mut overrides, _) = store();

        let summary = source.merge(&mut target, &mut overrides).unwrap();
        assert_eq!(
            summary,
            MergeSummary {
                inserted: 1,
                unchanged: 0,
                conflicts: 1
            }
        );

        // Nothing new for the 1.2.3.4 connection in target
        assert_eq!(target.hosts_by_hostname("1.2.3.4").len(), 1);
        assert_eq!(target.hosts()["B"].port(), Some("2222"));
        assert!(target.hosts().contains_key("fresh"));

        // The delta is keyed to the target's host and holds no shared fields
        let placed = &overrides.hosts()["B"];
        assert!(placed.ssh.is_empty());
        assert_eq!(placed.pssh.alias, "A");
        assert_eq!(overrides.hosts().len(), 1);
    }

    #[test]
    fn test_merge_of_identical_store_changes_nothing() {
        let (mut source, _) = store();
        source.set_host(
            "web",
            HostRecord::new("10.0.0.1").with_user("bob").with_alias("web"),
        );
        let (mut target, _) = store();
        target.set_host(
            "web",
            HostRecord::new("10.0.0.1").with_user("bob").with_alias("web"),
        );
        let (mut overrides, _) = store();

        let summary = source.merge(&mut target, &mut overrides).unwrap();
        assert_eq!(summary.unchanged, 1);
        assert_eq!(target.hosts().len(), 1);
        assert!(overrides.hosts().is_empty());
    }
}
