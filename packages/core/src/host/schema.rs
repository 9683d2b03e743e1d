//! Host store schema
//!
//! Data structures persisted in the JSON store files:
//!
//! ```json
//! { "ssh": {...}, "pssh": {...}, "hosts": { "<key>": { "ssh": {...}, "pssh": {...} } } }
//! ```

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Value of a `pssh` switch that turns a behavior off
pub const SWITCH_OFF: &str = "no";

/// One SSH destination plus its pssh metadata
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HostRecord {
    /// SSH options keyed by lowercase option name (hostname, user, port, ...)
    #[serde(default, deserialize_with = "scalar_map")]
    pub ssh: BTreeMap<String, String>,

    /// pssh metadata (aliases, lookup switch, cleaning overrides)
    #[serde(default)]
    pub pssh: HostMeta,
}

/// Per-host metadata stored under `pssh`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HostMeta {
    /// Primary alias; cleaning defaults it to the storage key
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alias: String,

    /// Extra aliases, in the order they were written
    #[serde(default)]
    pub alias_additional: Vec<String>,

    /// "no" disables DNS canonicalization of the hostname
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup: Option<String>,

    /// Anything else: `clean_<field>` overrides, team key settings, user notes
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl HostMeta {
    /// Whether DNS canonicalization is allowed for this host
    pub fn lookup_enabled(&self) -> bool {
        !self
            .lookup
            .as_deref()
            .is_some_and(|v| v.eq_ignore_ascii_case(SWITCH_OFF))
    }

    /// Whether cleaning of `field` is allowed (`clean_<field>` is not "no")
    pub fn cleaning_enabled(&self, field: &str) -> bool {
        !matches!(
            self.extra.get(&format!("clean_{field}")),
            Some(Value::String(v)) if v.eq_ignore_ascii_case(SWITCH_OFF)
        )
    }

    /// Primary alias followed by the additional aliases
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.alias.as_str())
            .chain(self.alias_additional.iter().map(String::as_str))
    }
}

impl HostRecord {
    /// Create a host with just a hostname
    pub fn new(hostname: impl Into<String>) -> Self {
        Self::default().with_option("hostname", hostname)
    }

    /// Builder pattern: set any SSH option (key is lowercased)
    pub fn with_option(mut self, key: &str, value: impl Into<String>) -> Self {
        self.ssh.insert(key.to_lowercase(), value.into());
        self
    }

    /// Builder pattern: set user
    pub fn with_user(self, user: impl Into<String>) -> Self {
        self.with_option("user", user)
    }

    /// Builder pattern: set port
    pub fn with_port(self, port: impl ToString) -> Self {
        self.with_option("port", port.to_string())
    }

    /// Builder pattern: set primary alias
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.pssh.alias = alias.into();
        self
    }

    /// Builder pattern: add an additional alias
    pub fn with_additional_alias(mut self, alias: impl Into<String>) -> Self {
        self.pssh.alias_additional.push(alias.into());
        self
    }

    /// Builder pattern: disable DNS lookup for this host
    pub fn without_lookup(mut self) -> Self {
        self.pssh.lookup = Some(SWITCH_OFF.to_string());
        self
    }

    pub fn hostname(&self) -> Option<&str> {
        non_empty(self.ssh.get("hostname"))
    }

    pub fn user(&self) -> Option<&str> {
        non_empty(self.ssh.get("user"))
    }

    pub fn port(&self) -> Option<&str> {
        non_empty(self.ssh.get("port"))
    }

    /// The alias, or `key` when no alias has been set yet
    pub fn alias_or<'a>(&'a self, key: &'a str) -> &'a str {
        if self.pssh.alias.is_empty() {
            key
        } else {
            &self.pssh.alias
        }
    }

    /// Short `user@hostname:port` form for listings
    pub fn destination(&self) -> String {
        let mut out = String::new();
        if let Some(user) = self.user() {
            out.push_str(user);
            out.push('@');
        }
        out.push_str(self.hostname().unwrap_or("?"));
        if let Some(port) = self.port() {
            out.push(':');
            out.push_str(port);
        }
        out
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.as_str()).filter(|v| !v.trim().is_empty())
}

/// Store-wide metadata stored under the top-level `pssh`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StoreMeta {
    /// Path to a JSON bundle of team SSH public keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_keys: Option<String>,

    /// Label written around team keys in authorized_keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_keys_identifier: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Root structure of a JSON store file
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StoreData {
    /// Global SSH options written before any Host block
    #[serde(default, deserialize_with = "scalar_map")]
    pub ssh: BTreeMap<String, String>,

    #[serde(default)]
    pub pssh: StoreMeta,

    /// Host records keyed by storage key
    #[serde(default)]
    pub hosts: BTreeMap<String, HostRecord>,
}

/// Accept strings, numbers and booleans as SSH option values
fn scalar_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => (if b { "yes" } else { "no" }).to_string(),
                Value::Null => String::new(),
                other => {
                    return Err(D::Error::custom(format!(
                        "ssh option '{key}' must be a single value, found {other}"
                    )));
                }
            };
            Ok((key.to_lowercase(), value))
        })
        .collect()
}
