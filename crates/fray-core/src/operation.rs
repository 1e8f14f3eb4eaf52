use serde::{Deserialize, Serialize};

/// One half of a call/return pair as it is written to or read from the
/// history file. `proc` identifies the worker slot that issued the call;
/// it is not a stable client identity across the whole run (see the
/// process-ID rotation note on [`UnknownResponse`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub action: Action,
    pub proc: i64,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Call,
    Return,
}

/// A completed call or return the checker consumes, keyed by a synthetic
/// monotonic `id` rather than by `proc` (many `proc`s can reuse the same
/// slot once their prior operation is known-unknown; the `id` pairing is
/// what keeps the concurrency structure correct). `Req` and `Resp` are the
/// workload's own typed request/response, not the raw JSON payload.
#[derive(Debug, Clone)]
pub enum HistoryEntry<Req, Resp> {
    Call { id: u64, value: Req },
    Return { id: u64, value: Resp },
}

impl<Req, Resp> HistoryEntry<Req, Resp> {
    pub fn id(&self) -> u64 {
        match self {
            HistoryEntry::Call { id, .. } => *id,
            HistoryEntry::Return { id, .. } => *id,
        }
    }
}

/// Implemented by a workload's response type so the history completer and
/// the controller's worker loop can recognize a connection-lost response
/// without matching on workload-specific fields.
///
/// A response that reports `is_unknown() == true` forces the worker that
/// produced it to rotate onto a fresh `proc` before issuing its next call:
/// the real outcome of an unknown operation may still land at the database
/// at an arbitrary point in the future, so the next call from that worker
/// must not appear to happen-after it in the history.
pub trait UnknownResponse {
    fn is_unknown(&self) -> bool;
}

/// An invoke/recover pair the nemesis dispatcher issues against one node.
/// A generator produces one of these per node per dispatch cycle (see
/// `fray-nemesis`'s selection policy); it is never written to the history
/// file — the workload's `Operation`s are the only thing the checker reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NemesisOperation {
    pub name: String,
    pub invoke_args: Vec<String>,
    pub recover_args: Vec<String>,
    #[serde(with = "duration_millis")]
    pub run_time: std::time::Duration,
}

impl NemesisOperation {
    pub fn new(
        name: impl Into<String>,
        invoke_args: Vec<String>,
        recover_args: Vec<String>,
        run_time: std::time::Duration,
    ) -> Self {
        Self { name: name.into(), invoke_args, recover_args, run_time }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
