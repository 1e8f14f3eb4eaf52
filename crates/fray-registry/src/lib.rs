//! Explicit, startup-built registries of pluggable collaborators, replacing
//! the original's package-level mutable maps (`pkg/core/db.go`'s
//! `var dbs = map[string]Db{}`, `pkg/core/nemesis.go`'s `var nemesises`).
//! Built once in `fray-cli`'s `main` and passed by reference into
//! `fray-controller::Controller`, per spec §9's "Globals / process-wide
//! registries" redesign note.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use fray_core::db::{Db, NoopDb};
use fray_core::nemesis::{Nemesis, NoopNemesis};

/// Which domain checker a run should apply, looked up by the `checker`
/// configuration option (spec §6). Unlike `Db`/`Nemesis`, a checker is not
/// registered as a trait object here: `fray-checker`'s linearizability
/// search is generic over the workload's `Model`, so the concrete model a
/// `Linearizability` run uses is resolved by the caller (`fray-controller`
/// or `fray-cli`) from the chosen workload, not stored in this registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckerName {
    Linearizability,
    BankTso,
    LongFork,
}

impl CheckerName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckerName::Linearizability => "linearizability",
            CheckerName::BankTso => "bank-tso",
            CheckerName::LongFork => "long-fork",
        }
    }
}

impl FromStr for CheckerName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linearizability" => Ok(CheckerName::Linearizability),
            "bank-tso" => Ok(CheckerName::BankTso),
            "long-fork" => Ok(CheckerName::LongFork),
            other => bail!("unknown checker {other:?}"),
        }
    }
}

impl std::fmt::Display for CheckerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-wide table of named `Db` and `Nemesis` implementations,
/// populated once at startup (registration is single-threaded, per spec
/// §6) and shared read-only thereafter.
pub struct Registry {
    dbs: HashMap<String, Arc<dyn Db>>,
    nemeses: HashMap<String, Arc<dyn Nemesis>>,
}

impl Default for Registry {
    fn default() -> Self {
        let mut registry = Self { dbs: HashMap::new(), nemeses: HashMap::new() };
        registry
            .register_db(Arc::new(NoopDb))
            .expect("noop db registers cleanly");
        registry
            .register_nemesis(Arc::new(NoopNemesis))
            .expect("noop nemesis registers cleanly");
        registry
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_db(&mut self, db: Arc<dyn Db>) -> Result<()> {
        let name = db.name().to_string();
        if self.dbs.insert(name.clone(), db).is_some() {
            bail!("db {name:?} is already registered");
        }
        Ok(())
    }

    pub fn get_db(&self, name: &str) -> Result<Arc<dyn Db>> {
        self.dbs.get(name).cloned().ok_or_else(|| anyhow!("no db registered under {name:?}"))
    }

    pub fn register_nemesis(&mut self, nemesis: Arc<dyn Nemesis>) -> Result<()> {
        let name = nemesis.name().to_string();
        if self.nemeses.insert(name.clone(), nemesis).is_some() {
            bail!("nemesis {name:?} is already registered");
        }
        Ok(())
    }

    pub fn get_nemesis(&self, name: &str) -> Result<Arc<dyn Nemesis>> {
        self.nemeses
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("no nemesis registered under {name:?}"))
    }
}
