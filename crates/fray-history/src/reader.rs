use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use fray_core::error::FrayError;
use fray_core::operation::{Action, HistoryEntry, Operation};

use crate::parser::RecordParser;

/// Reads a history file and completes it into an ordered list of
/// call/return [`HistoryEntry`] values a linearizability checker can consume.
///
/// Entries are paired by a synthetic monotonic `id`, not by `proc`: a
/// worker that received an unknown response rotates to a fresh `proc` for
/// its next call (see [`fray_core::operation::UnknownResponse`]), so the
/// same `proc` value can legitimately appear more than once in a history
/// with no ambiguity, as long as each occurrence's call is matched before
/// that `proc` is reused.
///
/// Any call left unmatched at end of file is synthesized a noop return
/// placed after every real event, in ascending `proc` order. This differs
/// deliberately from "whatever order the pending set iterates in":
/// ascending order keeps completion deterministic run to run, which
/// matters because the checker's result must not depend on iteration
/// order over a hash map.
pub fn read_events<P: RecordParser>(
    path: impl AsRef<Path>,
    parser: &mut P,
) -> Result<Vec<HistoryEntry<P::Request, P::Response>>, FrayError> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);

    let mut pending: BTreeMap<i64, u64> = BTreeMap::new();
    let mut next_id: u64 = 0;
    let mut entries = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let op: Operation = serde_json::from_str(&line)
            .map_err(|e| FrayError::Parse(format!("invalid history line: {e}")))?;

        match op.action {
            Action::Call => {
                if pending.contains_key(&op.proc) {
                    return Err(FrayError::MissingReturn(op.proc));
                }
                let value = parser
                    .on_request(&op.data)
                    .map_err(|e| FrayError::Parse(format!("decoding request: {e}")))?;
                let id = next_id;
                next_id += 1;
                entries.push(HistoryEntry::Call { id, value });
                pending.insert(op.proc, id);
            }
            Action::Return => {
                let value = parser
                    .on_response(&op.data)
                    .map_err(|e| FrayError::Parse(format!("decoding response: {e}")))?;
                let Some(value) = value else {
                    continue;
                };
                let Some(id) = pending.remove(&op.proc) else {
                    return Err(FrayError::MissingInvoke(op.proc));
                };
                entries.push(HistoryEntry::Return { id, value });
            }
        }
    }

    for (proc, id) in pending {
        let _ = proc;
        entries.push(HistoryEntry::Return {
            id,
            value: parser.on_noop_response(),
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::Recorder;
    use serde_json::{json, Value};

    struct EchoParser;

    impl RecordParser for EchoParser {
        type Request = Value;
        type Response = Value;

        fn on_request(&mut self, data: &Value) -> anyhow::Result<Value> {
            Ok(data.clone())
        }

        fn on_response(&mut self, data: &Value) -> anyhow::Result<Option<Value>> {
            Ok(Some(data.clone()))
        }

        fn on_noop_response(&mut self) -> Value {
            json!({"unknown": true})
        }
    }

    #[test]
    fn pairs_calls_and_returns_in_call_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let recorder = Recorder::create(&path).unwrap();
        recorder.record_request(0, &json!({"op": "a"})).unwrap();
        recorder.record_request(1, &json!({"op": "b"})).unwrap();
        recorder.record_response(0, &json!({"ok": true})).unwrap();
        recorder.record_response(1, &json!({"ok": true})).unwrap();
        recorder.flush().unwrap();

        let mut parser = EchoParser;
        let entries = read_events(&path, &mut parser).unwrap();
        assert_eq!(entries.len(), 4);
        assert!(matches!(entries[0], HistoryEntry::Call { id: 0, .. }));
        assert!(matches!(entries[2], HistoryEntry::Return { id: 0, .. }));
    }

    #[test]
    fn synthesizes_noop_returns_in_ascending_proc_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let recorder = Recorder::create(&path).unwrap();
        recorder.record_request(5, &json!({})).unwrap();
        recorder.record_request(2, &json!({})).unwrap();
        recorder.record_request(9, &json!({})).unwrap();
        recorder.flush().unwrap();

        let mut parser = EchoParser;
        let entries = read_events(&path, &mut parser).unwrap();
        let returns: Vec<u64> = entries
            .iter()
            .filter_map(|e| match e {
                HistoryEntry::Return { id, .. } => Some(*id),
                HistoryEntry::Call { .. } => None,
            })
            .collect();
        // proc 5's call was issued first (id=0), proc 2 second (id=1), proc 9 third (id=2);
        // ascending proc order means the synthetic returns come back 2, 5, 9 -> ids 1, 0, 2.
        assert_eq!(returns, vec![1, 0, 2]);
    }

    #[test]
    fn errors_on_return_with_no_matching_invoke() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let recorder = Recorder::create(&path).unwrap();
        recorder.record_response(0, &json!({"ok": true})).unwrap();
        recorder.flush().unwrap();

        let mut parser = EchoParser;
        let err = read_events(&path, &mut parser).unwrap_err();
        assert!(matches!(err, FrayError::MissingInvoke(0)));
    }

    #[test]
    fn errors_on_duplicate_call_before_return() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let recorder = Recorder::create(&path).unwrap();
        recorder.record_request(0, &json!({})).unwrap();
        recorder.record_request(0, &json!({})).unwrap();
        recorder.flush().unwrap();

        let mut parser = EchoParser;
        let err = read_events(&path, &mut parser).unwrap_err();
        assert!(matches!(err, FrayError::MissingReturn(0)));
    }
}
