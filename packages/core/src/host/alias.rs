//! Alias resolution
//!
//! Every host is reachable by its primary alias, its additional aliases and
//! (when it differs from the alias) its storage key. The first host to claim
//! an alias, in key order, owns it.

use std::collections::{BTreeMap, HashMap};

use super::schema::HostRecord;

/// An alias claimed by more than one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasCollision {
    pub alias: String,
    /// Host that keeps the alias
    pub prior_key: String,
    /// Host that lost it
    pub key: String,
}

impl AliasCollision {
    pub fn message(&self) -> String {
        format!(
            "Duplicate alias - both host '{prior}' and '{key}' have the same alias specified ({alias}).\n\
             Host '{prior}' will take precedence for now.\n\
             Edit or delete hosts as needed to resolve this conflict.\n\
             NOTE: Keys are used as aliases and can conflict with other aliases",
            prior = self.prior_key,
            key = self.key,
            alias = self.alias,
        )
    }
}

/// Map of alias to host key, in the order aliases were claimed
#[derive(Debug, Clone, Default)]
pub struct AliasMap {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
    collisions: Vec<AliasCollision>,
}

impl AliasMap {
    /// Build the map from hosts in key order
    pub fn build(hosts: &BTreeMap<String, HostRecord>) -> Self {
        let mut map = Self::default();
        for (key, host) in hosts {
            let mut aliases: Vec<&str> = vec![host.alias_or(key)];
            aliases.extend(host.pssh.alias_additional.iter().map(String::as_str));
            if aliases[0] != key {
                aliases.push(key);
            }

            for alias in aliases.into_iter().filter(|a| !a.is_empty()) {
                map.claim(alias, key);
            }
        }
        map
    }

    fn claim(&mut self, alias: &str, key: &str) {
        match self.index.get(alias) {
            Some(&i) => {
                let prior_key = &self.entries[i].1;
                if prior_key != key {
                    self.collisions.push(AliasCollision {
                        alias: alias.to_string(),
                        prior_key: prior_key.clone(),
                        key: key.to_string(),
                    });
                }
            }
            None => {
                self.index.insert(alias.to_string(), self.entries.len());
                self.entries.push((alias.to_string(), key.to_string()));
            }
        }
    }

    /// Storage key of the host owning `alias`
    pub fn get(&self, alias: &str) -> Option<&str> {
        self.index.get(alias).map(|&i| self.entries[i].1.as_str())
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.index.contains_key(alias)
    }

    /// `(alias, key)` pairs in claim order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(a, k)| (a.as_str(), k.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn collisions(&self) -> &[AliasCollision] {
        &self.collisions
    }
}
