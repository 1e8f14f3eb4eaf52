//! Configuration surface (spec §6): layered YAML + CLI overrides merged
//! into one canonical, hashed JSON document, then decoded into a typed
//! [`RunConfig`].
//!
//! The merge/canonicalize/hash pipeline is ported directly from
//! `mqk-config::load_layered_yaml` (`Hartman25-MiniQuantDeskV4/core-rs`):
//! deep-merge layered files into a `serde_json::Value`, sort every object's
//! keys recursively, and hash the canonical bytes with `sha2::Sha256` for
//! run provenance.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// The recognized configuration options from spec §6, with their
/// documented defaults. `db_config` is a free-form passthrough (spec
/// §9.C.5) for driver-specific settings this crate has no business
/// understanding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub db: String,
    #[serde(default = "default_nodes")]
    pub nodes: Vec<String>,
    #[serde(default = "default_request_count")]
    pub request_count: u64,
    #[serde(default = "default_run_time_secs")]
    pub run_time_secs: u64,
    #[serde(default = "default_run_round")]
    pub run_round: u32,
    pub history: String,
    #[serde(default)]
    pub nemesis: Vec<String>,
    pub checker: String,
    #[serde(default)]
    pub db_config: Value,
}

fn default_nodes() -> Vec<String> {
    (1..=5).map(|i| format!("n{i}")).collect()
}

fn default_request_count() -> u64 {
    10_000
}

fn default_run_time_secs() -> u64 {
    600
}

fn default_run_round() -> u32 {
    20
}

impl RunConfig {
    pub fn run_time(&self) -> Duration {
        Duration::from_secs(self.run_time_secs)
    }

    /// The history file for a given round: `<history>.<round>`.
    pub fn history_path(&self, round: u32) -> PathBuf {
        PathBuf::from(format!("{}.{round}", self.history))
    }
}

/// CLI flag overlay merged in last, over every layered file. Every field is
/// optional: `None` means "don't touch this key".
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub db: Option<String>,
    pub nodes: Option<Vec<String>>,
    pub request_count: Option<u64>,
    pub run_time_secs: Option<u64>,
    pub run_round: Option<u32>,
    pub history: Option<String>,
    pub nemesis: Option<Vec<String>>,
    pub checker: Option<String>,
}

impl ConfigOverrides {
    fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        if let Some(db) = &self.db {
            map.insert("db".into(), Value::String(db.clone()));
        }
        if let Some(nodes) = &self.nodes {
            map.insert("nodes".into(), serde_json::to_value(nodes).unwrap());
        }
        if let Some(n) = self.request_count {
            map.insert("request_count".into(), Value::from(n));
        }
        if let Some(secs) = self.run_time_secs {
            map.insert("run_time_secs".into(), Value::from(secs));
        }
        if let Some(rounds) = self.run_round {
            map.insert("run_round".into(), Value::from(rounds));
        }
        if let Some(history) = &self.history {
            map.insert("history".into(), Value::String(history.clone()));
        }
        if let Some(nemesis) = &self.nemesis {
            map.insert("nemesis".into(), serde_json::to_value(nemesis).unwrap());
        }
        if let Some(checker) = &self.checker {
            map.insert("checker".into(), Value::String(checker.clone()));
        }
        Value::Object(map)
    }
}

/// Result of merging and canonicalizing a set of config sources.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_json: Value,
    pub canonical_json: String,
    pub config_hash: String,
}

/// Deep-merges `paths` in order (base -> env -> engine -> ... overrides
/// win), canonicalizes, and hashes — with no schema applied. Exposed
/// separately from [`load_run_config`] because the CLI's `config-hash`
/// subcommand only needs the hash, not a validated `RunConfig`.
pub fn load_layered_yaml(paths: &[impl AsRef<Path>]) -> Result<LoadedConfig> {
    finish(merge_layered_yaml(paths)?)
}

/// Loads the layered YAML files, merges `overrides` in last, and decodes
/// the result into a [`RunConfig`]. This is the configuration surface
/// `fray-controller` actually consumes.
pub fn load_run_config(
    paths: &[impl AsRef<Path>],
    overrides: &ConfigOverrides,
) -> Result<(RunConfig, LoadedConfig)> {
    let mut merged = merge_layered_yaml(paths)?;
    deep_merge(&mut merged, overrides.to_json());

    let loaded = finish(merged)?;
    let run_config: RunConfig = serde_json::from_value(loaded.config_json.clone())
        .context("decoding merged configuration into RunConfig")?;
    Ok((run_config, loaded))
}

fn merge_layered_yaml(paths: &[impl AsRef<Path>]) -> Result<Value> {
    let mut merged = Value::Object(Default::default());
    for path in paths {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let yaml: serde_yaml::Value = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config file {} as yaml", path.display()))?;
        let json = serde_json::to_value(yaml).context("converting yaml config to json")?;
        deep_merge(&mut merged, json);
    }
    Ok(merged)
}

fn finish(merged: Value) -> Result<LoadedConfig> {
    let canonical_value = sort_keys(&merged);
    let canonical_json =
        serde_json::to_string(&canonical_value).context("serializing canonical config")?;

    let mut hasher = Sha256::new();
    hasher.update(canonical_json.as_bytes());
    let config_hash = hex::encode(hasher.finalize());

    Ok(LoadedConfig { config_json: canonical_value, canonical_json, config_hash })
}

fn deep_merge(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(dst_map), Value::Object(src_map)) => {
            for (k, v) in src_map {
                match dst_map.get_mut(&k) {
                    Some(existing) => deep_merge(existing, v),
                    None => {
                        dst_map.insert(k, v);
                    }
                }
            }
        }
        (dst_slot, src_val) => {
            *dst_slot = src_val;
        }
    }
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut new = serde_json::Map::new();
            for k in keys {
                new.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_yaml(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn later_files_override_earlier_ones() {
        let dir = tempfile::tempdir().unwrap();
        let base = write_yaml(&dir, "base.yaml", "db: tidb\nrequest_count: 100\n");
        let override_file = write_yaml(&dir, "override.yaml", "request_count: 200\n");
        let loaded = load_layered_yaml(&[base, override_file]).unwrap();
        assert_eq!(loaded.config_json["request_count"], 200);
        assert_eq!(loaded.config_json["db"], "tidb");
    }

    #[test]
    fn hash_is_stable_for_equivalent_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_yaml(&dir, "a.yaml", "db: tidb\nnodes: [n1, n2]\n");
        let b = write_yaml(&dir, "b.yaml", "nodes: [n1, n2]\ndb: tidb\n");
        let loaded_a = load_layered_yaml(&[a]).unwrap();
        let loaded_b = load_layered_yaml(&[b]).unwrap();
        assert_eq!(loaded_a.config_hash, loaded_b.config_hash);
    }

    #[test]
    fn cli_overrides_win_over_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let base = write_yaml(
            &dir,
            "base.yaml",
            "db: tidb\nhistory: /tmp/h\nchecker: linearizability\nrequest_count: 100\n",
        );
        let overrides = ConfigOverrides { request_count: Some(999), ..Default::default() };
        let (config, _) = load_run_config(&[base], &overrides).unwrap();
        assert_eq!(config.request_count, 999);
        assert_eq!(config.db, "tidb");
    }

    #[test]
    fn defaults_apply_when_unset() {
        let dir = tempfile::tempdir().unwrap();
        let base = write_yaml(
            &dir,
            "base.yaml",
            "db: tidb\nhistory: /tmp/h\nchecker: linearizability\n",
        );
        let (config, _) = load_run_config(&[base], &ConfigOverrides::default()).unwrap();
        assert_eq!(config.request_count, 10_000);
        assert_eq!(config.run_round, 20);
        assert_eq!(config.nodes, vec!["n1", "n2", "n3", "n4", "n5"]);
    }
}
