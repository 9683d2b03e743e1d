//! The host store
//!
//! [`ConfigStore`] owns every host record loaded from JSON or SSH config
//! files plus the global options. Derived maps (aliases, hosts by hostname)
//! are computed lazily and dropped whenever the data changes.

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fs;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::alias::AliasMap;
use super::canonical::{Resolve, SystemResolver};
use super::clean::clean_host;
use super::error::StoreError;
use super::schema::{HostRecord, StoreData, StoreMeta};
use crate::report::{Reporter, TracingReporter};

/// Label used around team keys when the store doesn't set one
pub const DEFAULT_TEAM_KEYS_IDENTIFIER: &str = "team keys";

/// Loaded host configuration
pub struct ConfigStore {
    pub(super) data: StoreData,
    pub(super) resolver: Box<dyn Resolve>,
    pub(super) reporter: Rc<dyn Reporter>,
    alias_map: OnceCell<AliasMap>,
    hosts_by_hostname: OnceCell<BTreeMap<String, Vec<String>>>,
    exportable: bool,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("data", &self.data)
            .field("exportable", &self.exportable)
            .finish_non_exhaustive()
    }
}

impl ConfigStore {
    /// Empty store using the system resolver and `tracing` for warnings
    pub fn new() -> Self {
        Self {
            data: StoreData::default(),
            resolver: Box::new(SystemResolver),
            reporter: Rc::new(TracingReporter),
            alias_map: OnceCell::new(),
            hosts_by_hostname: OnceCell::new(),
            exportable: false,
        }
    }

    /// Builder pattern: replace the DNS resolver
    pub fn with_resolver(mut self, resolver: impl Resolve + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Builder pattern: replace the reporter
    pub fn with_reporter(mut self, reporter: Rc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Builder pattern: start from existing data
    pub fn with_data(mut self, data: StoreData) -> Self {
        self.data = data;
        self.reset_derived();
        self
    }

    pub fn data(&self) -> &StoreData {
        &self.data
    }

    pub fn global_options(&self) -> &BTreeMap<String, String> {
        &self.data.ssh
    }

    pub fn meta(&self) -> &StoreMeta {
        &self.data.pssh
    }

    pub fn hosts(&self) -> &BTreeMap<String, HostRecord> {
        &self.data.hosts
    }

    pub fn reporter(&self) -> &dyn Reporter {
        self.reporter.as_ref()
    }

    pub fn resolver(&self) -> &dyn Resolve {
        self.resolver.as_ref()
    }

    /// Drop derived maps so they are rebuilt from current data
    pub(super) fn reset_derived(&mut self) {
        self.alias_map.take();
        self.hosts_by_hostname.take();
    }

    /// Record a recoverable problem
    fn flag(&mut self, warning: &str) {
        self.reporter.warn(warning);
        self.exportable = false;
    }

    /// Alias map, built on first use
    pub fn alias_map(&self) -> &AliasMap {
        self.alias_map.get_or_init(|| {
            let map = AliasMap::build(&self.data.hosts);
            for collision in map.collisions() {
                self.reporter.warn(&collision.message());
            }
            map
        })
    }

    /// Alias map, optionally rebuilt from scratch
    pub fn get_alias_map(&mut self, fresh: bool) -> &AliasMap {
        if fresh {
            self.alias_map.take();
        }
        self.alias_map()
    }

    /// Storage key of the host with `alias`
    pub fn get_host_key(&self, alias: &str) -> Option<&str> {
        self.alias_map().get(alias)
    }

    /// Host with `alias`, if any
    pub fn get_host(&self, alias: &str) -> Option<(&str, &HostRecord)> {
        let key = self.get_host_key(alias)?;
        self.data
            .hosts
            .get_key_value(key)
            .map(|(k, host)| (k.as_str(), host))
    }

    /// All hosts, or just the host owning `alias` (empty when unmapped)
    pub fn get_hosts(&self, alias: Option<&str>) -> Vec<(&str, &HostRecord)> {
        match alias {
            None => self
                .data
                .hosts
                .iter()
                .map(|(k, host)| (k.as_str(), host))
                .collect(),
            Some(alias) => self.get_host(alias).into_iter().collect(),
        }
    }

    /// Hosts using `hostname` exactly, keyed by storage key
    pub fn hosts_by_hostname(&self, hostname: &str) -> Vec<(&str, &HostRecord)> {
        let index = self.hosts_by_hostname.get_or_init(|| {
            let mut index: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for (key, host) in &self.data.hosts {
                if let Some(hostname) = host.hostname() {
                    index
                        .entry(hostname.to_string())
                        .or_default()
                        .push(key.clone());
                }
            }
            index
        });

        index
            .get(hostname)
            .into_iter()
            .flatten()
            .filter_map(|key| {
                self.data
                    .hosts
                    .get_key_value(key)
                    .map(|(k, host)| (k.as_str(), host))
            })
            .collect()
    }

    /// Remove the host reachable by `alias` (or stored under that key)
    pub fn delete_host(&mut self, alias: &str) -> bool {
        if alias.is_empty() {
            return false;
        }
        let key = self
            .get_host_key(alias)
            .unwrap_or(alias)
            .to_string();
        let removed = self.data.hosts.remove(&key).is_some();
        if removed {
            tracing::debug!("Deleted host '{key}' (alias '{alias}')");
            self.reset_derived();
        }
        removed
    }

    /// Replace the host reachable by `alias`, or add it under that key
    pub fn set_host(&mut self, alias: &str, host: HostRecord) {
        let key = self
            .get_host_key(alias)
            .unwrap_or(alias)
            .to_string();
        self.data.hosts.insert(key, host);
        self.reset_derived();
    }

    /// `alias`, or `alias` followed by 1, 2, ... until no host uses it as a key
    pub fn auto_alias(&self, alias: &str) -> String {
        let mut candidate = alias.to_string();
        let mut i = 0;
        while self.data.hosts.contains_key(&candidate) {
            i += 1;
            candidate = format!("{alias}{i}");
        }
        candidate
    }

    /// Whether the last [`clean`](Self::clean) found no problems
    pub fn is_exportable(&self) -> bool {
        self.exportable
    }

    /// Clean every host and validate aliases
    ///
    /// Recoverable problems are reported and clear the exportable flag;
    /// the returned flag is the new value of [`is_exportable`](Self::is_exportable).
    pub fn clean(&mut self) -> Result<bool, StoreError> {
        self.reset_derived();
        self.exportable = true;

        let before = self.data.hosts.len();
        let mut cleaned: BTreeMap<String, HostRecord> = BTreeMap::new();
        let mut problems = Vec::new();

        for (key, host) in &self.data.hosts {
            let mut host = host.clone();
            problems.extend(clean_host(key, &mut host, self.resolver.as_ref()));
            cleaned.insert(key.clone(), host);
        }

        // Move hosts to their alias keys until nothing moves; a key vacated
        // by one rename can be taken by the next round
        loop {
            let mut moved = false;
            for (key, alias) in misaligned(&cleaned) {
                if cleaned.contains_key(&alias) {
                    continue;
                }
                if let Some(host) = cleaned.remove(&key) {
                    tracing::debug!("Renaming host key '{key}' to '{alias}'");
                    cleaned.insert(alias, host);
                    moved = true;
                }
            }
            if !moved {
                break;
            }
        }

        for (key, alias) in misaligned(&cleaned) {
            problems.push(format!(
                "Unable to rename host '{key}' to match its alias '{alias}' - \
                 another host already uses that key. Change one of the aliases to resolve this."
            ));
        }

        if cleaned.len() != before {
            return Err(StoreError::HostCountMismatch {
                before,
                after: cleaned.len(),
            });
        }

        self.data.hosts = cleaned;
        for problem in &problems {
            self.flag(problem);
        }

        if !self.alias_map().collisions().is_empty() {
            self.exportable = false;
        }

        Ok(self.exportable)
    }

    /// Team key bundle named by the store's `pssh.team_keys`
    pub fn team_keys(&self) -> Result<TeamKeys, StoreError> {
        let Some(path) = self.data.pssh.team_keys.as_deref() else {
            return Ok(TeamKeys::default());
        };
        self.reporter.log("Reading in team keys...");

        let raw = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        serde_json::from_str(&raw).map_err(|e| StoreError::InvalidJson {
            path: path.into(),
            message: e.to_string(),
        })
    }

    /// Label written around team keys
    pub fn team_keys_identifier(&self) -> &str {
        self.data
            .pssh
            .team_keys_identifier
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(DEFAULT_TEAM_KEYS_IDENTIFIER)
    }

    /// Block of team keys to append to a server's authorized_keys
    ///
    /// `None` when no team keys are configured.
    pub fn authorized_keys_block(&self) -> Result<Option<String>, StoreError> {
        let keys = self.team_keys()?;
        let lines: Vec<&str> = keys.public_keys().collect();
        if lines.is_empty() {
            return Ok(None);
        }

        let identifier = self.team_keys_identifier();
        let mut block = format!("# ----------------------------------\n# BEGIN - {identifier}\n\n");
        for line in lines {
            block.push_str(line);
            block.push('\n');
        }
        block.push_str(&format!("# END - {identifier}\n# ----------------------------------"));
        Ok(Some(block))
    }
}

/// Team key bundle: team name -> member name -> keys
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamKeys(pub BTreeMap<String, BTreeMap<String, TeamMember>>);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    #[serde(default)]
    pub keys: Vec<TeamKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamKey {
    pub key: String,
}

impl TeamKeys {
    /// Every public key line, team by team
    pub fn public_keys(&self) -> impl Iterator<Item = &str> {
        self.0
            .values()
            .flat_map(|members| members.values())
            .flat_map(|member| member.keys.iter())
            .map(|k| k.key.trim())
            .filter(|k| !k.is_empty())
    }
}

/// `(key, alias)` for hosts whose key differs from their primary alias
fn misaligned(hosts: &BTreeMap<String, HostRecord>) -> Vec<(String, String)> {
    hosts
        .iter()
        .filter(|(key, host)| !host.pssh.alias.is_empty() && host.pssh.alias != **key)
        .map(|(key, host)| (key.clone(), host.pssh.alias.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::test_support::{StaticResolver, store, store_with};
    use std::io::Write;

    fn insert(store: &mut ConfigStore, key: &str, host: HostRecord) {
        store.set_host(key, host);
    }

    #[test]
    fn test_get_hosts_by_alias() {
        let (mut store, _) = store();
        insert(&mut store, "web", HostRecord::new("10.0.0.1").with_additional_alias("www"));
        insert(&mut store, "db", HostRecord::new("10.0.0.2"));

        assert_eq!(store.get_hosts(None).len(), 2);
        let found = store.get_hosts(Some("www"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "web");
        assert!(store.get_hosts(Some("missing")).is_empty());
        assert_eq!(store.get_host_key("db"), Some("db"));
    }

    #[test]
    fn test_hosts_by_hostname() {
        let (mut store, _) = store();
        insert(&mut store, "a", HostRecord::new("10.0.0.1").with_user("bob"));
        insert(&mut store, "b", HostRecord::new("10.0.0.1").with_user("amy"));
        insert(&mut store, "c", HostRecord::new("10.0.0.2"));

        let keys: Vec<_> = store
            .hosts_by_hostname("10.0.0.1")
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert!(store.hosts_by_hostname("10.9.9.9").is_empty());
    }

    #[test]
    fn test_delete_host_by_alias() {
        let (mut store, _) = store();
        insert(&mut store, "web1", HostRecord::new("10.0.0.1").with_alias("web"));

        assert!(store.delete_host("web"));
        assert!(store.hosts().is_empty());
        assert!(!store.delete_host("web"));
        assert!(!store.delete_host(""));
    }

    #[test]
    fn test_set_host_replaces_by_alias() {
        let (mut store, _) = store();
        insert(&mut store, "web1", HostRecord::new("10.0.0.1").with_alias("web"));
        store.set_host("web", HostRecord::new("10.0.0.9").with_alias("web"));

        assert_eq!(store.hosts().len(), 1);
        assert_eq!(store.hosts()["web1"].hostname(), Some("10.0.0.9"));
    }

    #[test]
    fn test_auto_alias_is_unique_and_stable() {
        let (mut store, _) = store();
        insert(&mut store, "bob", HostRecord::new("10.0.0.1"));
        insert(&mut store, "bob1", HostRecord::new("10.0.0.2"));

        let first = store.auto_alias("bob");
        let second = store.auto_alias("bob");
        assert_eq!(first, "bob2");
        assert_eq!(first, second);
        assert!(!store.hosts().contains_key(&first));
        assert_eq!(store.auto_alias("amy"), "amy");
    }

    #[test]
    fn test_clean_resolves_and_defaults() {
        let resolver = StaticResolver::new().with("web.example.com", "10.0.0.5");
        let (mut store, reporter) = store_with(resolver);
        insert(&mut store, "web", HostRecord::new("web.example.com").with_user("deploy"));

        assert!(store.clean().unwrap());
        assert!(store.is_exportable());
        let host = &store.hosts()["web"];
        assert_eq!(host.hostname(), Some("10.0.0.5"));
        assert_eq!(host.port(), Some("22"));
        assert_eq!(host.pssh.alias, "web");
        assert!(reporter.warnings().is_empty());
    }

    #[test]
    fn test_clean_is_idempotent() {
        let resolver = StaticResolver::new().with("db.example.com", "10.0.0.6");
        let (mut store, _) = store_with(resolver);
        insert(&mut store, "db server", HostRecord::new("db.example.com").with_port("0"));
        insert(
            &mut store,
            "web",
            HostRecord::new("10.0.0.1")
                .with_user(" www ")
                .with_additional_alias("front end"),
        );

        store.clean().unwrap();
        let once = store.data().clone();
        store.clean().unwrap();
        assert_eq!(store.data(), &once);
        assert!(once.hosts.contains_key("db_server"));
    }

    #[test]
    fn test_clean_flags_bad_port() {
        let (mut store, reporter) = store();
        insert(&mut store, "web", HostRecord::new("10.0.0.1").with_port("70000"));

        assert!(!store.clean().unwrap());
        assert_eq!(store.hosts()["web"].port(), Some("70000"));
        assert!(reporter.warned_about("Invalid port '70000'"));
    }

    #[test]
    fn test_clean_flags_failed_lookup() {
        let (mut store, reporter) = store();
        insert(&mut store, "web", HostRecord::new("web.invalid"));

        assert!(!store.clean().unwrap());
        assert!(reporter.warned_about("Failed lookup - web.invalid"));

        let (mut quiet, _) = crate::host::test_support::store();
        insert(&mut quiet, "web", HostRecord::new("web.invalid").without_lookup());
        assert!(quiet.clean().unwrap());
    }

    #[test]
    fn test_clean_duplicate_alias_keeps_earlier() {
        let (mut store, reporter) = store();
        insert(&mut store, "app1", HostRecord::new("10.0.0.1").with_alias("app"));
        insert(&mut store, "app2", HostRecord::new("10.0.0.2").with_alias("app"));

        assert!(!store.clean().unwrap());
        // app1 took the "app" key, app2 could not
        assert!(store.hosts().contains_key("app"));
        assert!(store.hosts().contains_key("app2"));
        assert_eq!(store.get_host_key("app"), Some("app"));
        assert_eq!(store.hosts()["app"].hostname(), Some("10.0.0.1"));
        assert!(reporter.warned_about("Unable to rename host 'app2'"));
        assert!(reporter.warned_about("Duplicate alias"));
    }

    #[test]
    fn test_clean_realigns_key_to_alias() {
        let (mut store, _) = store();
        insert(&mut store, "old", HostRecord::new("10.0.0.1").with_alias("new"));

        assert!(store.clean().unwrap());
        assert!(store.hosts().contains_key("new"));
        assert!(!store.hosts().contains_key("old"));
    }

    #[test]
    fn test_clean_follows_rename_chains() {
        let (mut store, _) = store();
        insert(&mut store, "a", HostRecord::new("10.0.0.1").with_alias("b"));
        insert(&mut store, "b", HostRecord::new("10.0.0.2").with_alias("c"));

        assert!(store.clean().unwrap());
        let once = store.data().clone();
        let keys: Vec<_> = once.hosts.keys().cloned().collect();
        assert_eq!(keys, vec!["b", "c"]);
        assert_eq!(store.hosts()["b"].hostname(), Some("10.0.0.1"));

        assert!(store.clean().unwrap());
        assert_eq!(store.data(), &once);
    }

    #[test]
    fn test_clean_swapped_aliases_stay_put() {
        let (mut store, reporter) = store();
        insert(&mut store, "a", HostRecord::new("10.0.0.1").with_alias("b"));
        insert(&mut store, "b", HostRecord::new("10.0.0.2").with_alias("a"));

        assert!(!store.clean().unwrap());
        let once = store.data().clone();
        assert_eq!(store.hosts()["a"].hostname(), Some("10.0.0.1"));
        assert!(reporter.warned_about("Unable to rename host 'a'"));

        assert!(!store.clean().unwrap());
        assert_eq!(store.data(), &once);
    }

    #[test]
    fn test_get_alias_map_fresh_rebuilds() {
        let (mut store, _) = store();
        insert(&mut store, "web", HostRecord::new("10.0.0.1").with_alias("web"));
        assert_eq!(store.get_alias_map(false).get("web"), Some("web"));

        store.data.hosts.insert(
            "db".to_string(),
            HostRecord::new("10.0.0.2").with_alias("db"),
        );
        assert!(!store.get_alias_map(false).contains("db"));
        assert_eq!(store.get_alias_map(true).get("db"), Some("db"));
        assert_eq!(store.get_alias_map(false).get("web"), Some("web"));
    }

    #[test]
    fn test_team_keys_block() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"ops": {{"amy": {{"keys": [{{"key": "ssh-ed25519 AAAA amy"}}]}}, "bob": {{"keys": [{{"key": "ssh-rsa BBBB bob"}}]}}}}}}"#
        )
        .unwrap();

        let (mut store, _) = store();
        assert!(store.authorized_keys_block().unwrap().is_none());

        store.data.pssh.team_keys = Some(file.path().display().to_string());
        store.data.pssh.team_keys_identifier = Some("acme".to_string());
        let block = store.authorized_keys_block().unwrap().unwrap();

        assert!(block.starts_with("# ----------------------------------\n# BEGIN - acme\n"));
        assert!(block.contains("ssh-ed25519 AAAA amy\nssh-rsa BBBB bob\n"));
        assert!(block.ends_with("# END - acme\n# ----------------------------------"));
    }

    #[test]
    fn test_team_keys_identifier_default() {
        let (store, _) = store();
        assert_eq!(store.team_keys_identifier(), DEFAULT_TEAM_KEYS_IDENTIFIER);
    }
}
