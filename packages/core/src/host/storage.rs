//! JSON store files
//!
//! Load one or more JSON (or JSONC) files into a store, deep-merging them in
//! order, and write the store back out.

use std::fs;
use std::path::Path;

use jsonc_parser::parse_to_serde_value;
use serde_json::{Map, Value};

use super::error::StoreError;
use super::schema::{HostRecord, StoreData};
use super::store::ConfigStore;

/// Extensions written in the relaxed, commented format
const RELAXED_EXTENSIONS: &[&str] = &["hjson", "jsonc"];

const RELAXED_HEADER: &str = "\
// pssh host configuration
//  - comments (// and /* */) are allowed and ignored
//  - ssh: options written to ssh_config (lowercase keys)
//  - pssh: alias, alias_additional, lookup (\"no\" to skip DNS), clean_<field> (\"no\" to skip cleaning)
";

/// Parse JSON or JSONC text; `None` when it holds no data
pub fn parse_json(text: &str, origin: &Path) -> Result<Option<Value>, StoreError> {
    let value =
        parse_to_serde_value(text, &Default::default()).map_err(|e| StoreError::InvalidJson {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(value.filter(|v| !is_empty_document(v)))
}

fn is_empty_document(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(list) => list.is_empty(),
        _ => false,
    }
}

/// Elements of `value` when it is list-like: an array, or an object of
/// scalar values whose keys are exactly "0", "1", ... in order
fn list_items(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items.clone()),
        Value::Object(map)
            if !map.is_empty() && map.values().all(|v| !v.is_object() && !v.is_array()) =>
        {
            let mut items = Vec::with_capacity(map.len());
            for i in 0..map.len() {
                items.push(map.get(&i.to_string())?.clone());
            }
            Some(items)
        }
        _ => None,
    }
}

/// Merge `overlay` into `base`
///
/// Lists are concatenated without duplicates, maps are merged key by key,
/// anything else is replaced by the overlay.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    if let (Some(mut items), Some(more)) = (list_items(&base), list_items(&overlay)) {
        for item in more {
            if !items.contains(&item) {
                items.push(item);
            }
        }
        return Value::Array(items);
    }

    match (base, overlay) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let merged = match base.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            Value::Object(base)
        }
        // An empty list stands in for an empty map
        (Value::Object(base), Value::Array(list)) if list.is_empty() => Value::Object(base),
        (Value::Array(list), overlay @ Value::Object(_)) if list.is_empty() => overlay,
        (_, overlay) => overlay,
    }
}

/// Make map-valued fields maps and list-valued fields lists
fn normalize(document: &mut Value) {
    fn map_field(parent: &mut Map<String, Value>, key: &str) {
        if let Some(value) = parent.get_mut(key) {
            if matches!(value, Value::Array(list) if list.is_empty()) || value.is_null() {
                *value = Value::Object(Map::new());
            }
        }
    }

    let Value::Object(root) = document else {
        return;
    };
    map_field(root, "ssh");
    map_field(root, "pssh");
    map_field(root, "hosts");

    if let Some(Value::Object(hosts)) = root.get_mut("hosts") {
        for host in hosts.values_mut() {
            let Value::Object(host) = host else { continue };
            map_field(host, "ssh");
            map_field(host, "pssh");
            if let Some(Value::Object(pssh)) = host.get_mut("pssh") {
                if let Some(additional) = pssh.get_mut("alias_additional") {
                    if let Some(items) = list_items(additional) {
                        *additional = Value::Array(items);
                    } else if additional.is_null() {
                        *additional = Value::Array(Vec::new());
                    }
                }
            }
        }
    }
}

fn is_relaxed(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| RELAXED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

impl ConfigStore {
    /// Load and deep-merge JSON store files, in order
    ///
    /// Paths that don't exist yet are skipped (they will be created on
    /// write). With no existing path the store is left as it is.
    pub fn read_json<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<(), StoreError> {
        self.reset_derived();

        let mut documents = Vec::new();
        for path in paths {
            let path = path.as_ref();
            if !path.exists() {
                tracing::debug!("JSON config {} not found, skipping", path.display());
                continue;
            }

            let text = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
            self.reporter
                .log(&format!("Decoding data from {}...", path.display()));
            let document = parse_json(&text, path)?.ok_or_else(|| StoreError::EmptyJson {
                path: path.to_path_buf(),
            })?;
            documents.push((path.to_path_buf(), document));
        }

        let Some(origin) = documents.first().map(|(path, _)| path.clone()) else {
            return Ok(());
        };
        let mut merged = documents
            .into_iter()
            .map(|(_, document)| document)
            .reduce(deep_merge)
            .unwrap_or(Value::Null);
        normalize(&mut merged);

        let data: StoreData =
            serde_json::from_value(merged).map_err(|e| StoreError::InvalidJson {
                path: origin,
                message: e.to_string(),
            })?;

        tracing::debug!("Loaded {} hosts from {} file(s)", data.hosts.len(), paths.len());
        self.data = data;
        Ok(())
    }

    /// Serialize the store: pretty JSON, or commented JSONC for `.hjson`/`.jsonc`
    pub fn to_json_string(&self, relaxed: bool) -> Result<String, StoreError> {
        let json = serde_json::to_string_pretty(&self.data).map_err(|e| StoreError::InvalidHost {
            key: String::new(),
            message: e.to_string(),
        })?;
        if relaxed {
            Ok(format!("{RELAXED_HEADER}{json}\n"))
        } else {
            Ok(json)
        }
    }

    /// Write the whole store to `path`
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let content = self.to_json_string(is_relaxed(path))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }

        fs::write(path, content).map_err(|e| StoreError::io(path, e))?;
        tracing::debug!(
            "Saved {} hosts to {}",
            self.data.hosts.len(),
            path.display()
        );
        Ok(())
    }

    /// One host as commented JSONC, for editing by hand
    pub fn host_json(&self, alias: &str) -> Result<String, StoreError> {
        let (_, host) = self
            .get_host(alias)
            .ok_or_else(|| StoreError::HostNotFound(alias.to_string()))?;
        let json = serde_json::to_string_pretty(host).map_err(|e| StoreError::InvalidHost {
            key: alias.to_string(),
            message: e.to_string(),
        })?;
        Ok(format!("{RELAXED_HEADER}{json}\n"))
    }
}

/// Parse a host edited by hand; `None` when nothing is left
pub fn parse_host_json(text: &str, origin: &Path) -> Result<Option<HostRecord>, StoreError> {
    let Some(mut value) = parse_json(text, origin)? else {
        return Ok(None);
    };

    let mut wrapper = Map::new();
    let mut hosts = Map::new();
    hosts.insert("host".to_string(), value.take());
    wrapper.insert("hosts".to_string(), Value::Object(hosts));
    let mut document = Value::Object(wrapper);
    normalize(&mut document);

    let mut data: StoreData =
        serde_json::from_value(document).map_err(|e| StoreError::InvalidJson {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(data.hosts.remove("host"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::test_support::{StaticResolver, store, store_with};
    use serde_json::json;

    #[test]
    fn test_deep_merge_rules() {
        let base = json!({
            "ssh": {"forwardagent": "yes", "user": "amy"},
            "hosts": {"web": {"pssh": {"alias_additional": ["www", "w"]}}},
            "name": "first"
        });
        let overlay = json!({
            "ssh": {"user": "bob"},
            "hosts": {"web": {"pssh": {"alias_additional": ["w", "front"]}}},
            "name": {"nested": true}
        });

        assert_eq!(
            deep_merge(base, overlay),
            json!({
                "ssh": {"forwardagent": "yes", "user": "bob"},
                "hosts": {"web": {"pssh": {"alias_additional": ["www", "w", "front"]}}},
                "name": {"nested": true}
            })
        );
    }

    #[test]
    fn test_deep_merge_list_like_objects() {
        let merged = deep_merge(json!({"0": "a", "1": "b"}), json!(["b", "c"]));
        assert_eq!(merged, json!(["a", "b", "c"]));

        // Not contiguous from zero, so it is a map
        let merged = deep_merge(json!({"1": "a"}), json!({"2": "b"}));
        assert_eq!(merged, json!({"1": "a", "2": "b"}));

        // Maps of records keep their keys
        let merged = deep_merge(
            json!({"0": {"ssh": {"hostname": "10.0.0.1"}}}),
            json!({"0": {"ssh": {"port": "22"}}, "1": {"ssh": {"hostname": "10.0.0.2"}}}),
        );
        assert_eq!(
            merged,
            json!({
                "0": {"ssh": {"hostname": "10.0.0.1", "port": "22"}},
                "1": {"ssh": {"hostname": "10.0.0.2"}}
            })
        );

        assert_eq!(deep_merge(json!([]), json!({"k": 1})), json!({"k": 1}));
        assert_eq!(deep_merge(json!({"k": 1}), json!([])), json!({"k": 1}));
    }

    #[test]
    fn test_json_round_trip_is_fixed_point() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let resolver = StaticResolver::new().with("web.example.com", "10.0.0.1");
        let (mut store, _) = store_with(resolver);
        store
            .read_ssh_str(
                "ForwardAgent yes\nHost web\n  HostName web.example.com\n  User deploy\nHost db\n  HostName 10.0.0.2\n  Port 2200\n",
                Path::new("config"),
            )
            .unwrap();
        store.set_host(
            "mail",
            HostRecord::new("10.0.0.3")
                .with_additional_alias("smtp")
                .without_lookup(),
        );
        assert!(store.clean().unwrap());
        store.write_json(&path).unwrap();

        let (mut reloaded, _) = crate::host::test_support::store();
        reloaded.read_json(&[&path]).unwrap();
        assert_eq!(reloaded.data(), store.data());
    }

    #[test]
    fn test_relaxed_output_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.hjson");

        let (mut store, _) = store();
        store.set_host("web", HostRecord::new("10.0.0.1").with_alias("web"));
        store.clean().unwrap();
        store.write_json(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("// pssh host configuration"));

        let (mut reloaded, _) = crate::host::test_support::store();
        reloaded.read_json(&[&path]).unwrap();
        assert_eq!(reloaded.data(), store.data());
    }

    #[test]
    fn test_read_merges_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let work = dir.path().join("work.json");
        let personal = dir.path().join("personal.json");
        fs::write(
            &work,
            r#"{"ssh": {"user": "work"}, "pssh": [], "hosts": {"web": {"ssh": {"hostname": "10.0.0.1"}, "pssh": {"alias_additional": ["www"]}}}}"#,
        )
        .unwrap();
        fs::write(
            &personal,
            r#"{
                // personal overrides
                "ssh": {"user": "me"},
                "hosts": {"web": {"ssh": {"port": 2222}, "pssh": {"alias_additional": ["home"]}}}
            }"#,
        )
        .unwrap();

        let (mut store, reporter) = store();
        store
            .read_json(&[work.clone(), personal.clone(), dir.path().join("missing.json")])
            .unwrap();

        assert_eq!(store.global_options()["user"], "me");
        let web = &store.hosts()["web"];
        assert_eq!(web.hostname(), Some("10.0.0.1"));
        assert_eq!(web.port(), Some("2222"));
        assert_eq!(web.pssh.alias_additional, vec!["www", "home"]);
        assert_eq!(reporter.logs().len(), 2);
    }

    #[test]
    fn test_read_numeric_host_keys() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.json");
        let second = dir.path().join("second.json");
        fs::write(&first, r#"{"hosts": {"0": {"ssh": {"hostname": "10.0.0.1"}}}}"#).unwrap();
        fs::write(
            &second,
            r#"{"hosts": {"0": {"ssh": {"user": "amy"}}, "1": {"ssh": {"hostname": "10.0.0.2"}}}}"#,
        )
        .unwrap();

        let (mut store, _) = store();
        store.read_json(&[&first, &second]).unwrap();

        assert_eq!(store.hosts().len(), 2);
        assert_eq!(store.hosts()["0"].user(), Some("amy"));
        assert_eq!(store.hosts()["1"].hostname(), Some("10.0.0.2"));
    }

    #[test]
    fn test_read_rejects_empty_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.json");
        let broken = dir.path().join("broken.json");
        fs::write(&empty, "  \n").unwrap();
        fs::write(&broken, r#"{"hosts": {"#).unwrap();

        let (mut store, _) = store();
        assert!(matches!(
            store.read_json(&[&empty]),
            Err(StoreError::EmptyJson { .. })
        ));
        let err = store.read_json(&[&broken]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidJson { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_missing_files_leave_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let (mut store, _) = store();
        store.set_host("web", HostRecord::new("10.0.0.1"));
        store.read_json(&[dir.path().join("nope.json")]).unwrap();
        assert_eq!(store.hosts().len(), 1);
    }

    #[test]
    fn test_host_json_edit_cycle() {
        let (mut store, _) = store();
        store.set_host(
            "web",
            HostRecord::new("10.0.0.1").with_alias("web").with_user("deploy"),
        );

        let text = store.host_json("web").unwrap();
        assert!(text.contains("\"hostname\": \"10.0.0.1\""));
        let edited = text.replace("deploy", "admin");

        let host = parse_host_json(&edited, Path::new("web.hjson"))
            .unwrap()
            .unwrap();
        assert_eq!(host.user(), Some("admin"));
        assert_eq!(host.pssh.alias, "web");

        assert!(parse_host_json("// nothing\n", Path::new("web.hjson")).unwrap().is_none());
        assert!(matches!(
            store.host_json("missing"),
            Err(StoreError::HostNotFound(_))
        ));
    }
}
