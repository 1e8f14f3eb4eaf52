//! Long-fork workload: detects the classic snapshot-isolation anomaly where
//! two read transactions over the same key-group observe the committed
//! write order inconsistently.
//!
//! Grounded in `original_source/db/tidb/long_fork.go` (`longForkClient`,
//! `lfRequest`/`lfResponse`, the worker-pairing `lfState`) and
//! `long_fork_test.go`'s `ensureNoLongForks` fixtures, which this crate's
//! checker tests reproduce.

pub mod checker;
pub mod generator;
pub mod parser;

pub use checker::{check_long_fork, LongForkError};
pub use generator::LongForkState;
pub use parser::LongForkParser;

use fray_core::operation::UnknownResponse;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LongForkRequest {
    Write { key: u64 },
    Read { keys: Vec<u64> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongForkResponse {
    pub ok: bool,
    #[serde(default)]
    pub unknown: bool,
    #[serde(default)]
    pub keys: Vec<u64>,
    #[serde(default)]
    pub values: Vec<u64>,
}

impl LongForkResponse {
    pub fn write_ok() -> Self {
        Self { ok: true, ..Default::default() }
    }

    pub fn write_failed() -> Self {
        Self { ok: false, ..Default::default() }
    }

    pub fn read(keys: Vec<u64>, values: Vec<u64>) -> Self {
        Self { ok: true, keys, values, ..Default::default() }
    }

    pub fn unknown() -> Self {
        Self { unknown: true, ..Default::default() }
    }
}

impl UnknownResponse for LongForkResponse {
    fn is_unknown(&self) -> bool {
        self.unknown
    }
}
