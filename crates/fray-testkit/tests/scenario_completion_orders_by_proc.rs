//! End-to-end: several real tokio tasks race to append to one `Recorder`
//! concurrently, some completing their call/return pair and some dying
//! mid-flight (crash simulated by simply never recording a return). Confirms
//! the full `Recorder -> read_events` pipeline synthesizes the dangling
//! calls' returns in ascending `proc` order, after every real event, under
//! genuine concurrent writers rather than a hand-sequenced log.

use std::sync::Arc;

use fray_core::operation::HistoryEntry;
use fray_history::{read_events, RecordParser, Recorder};
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

#[tokio::test]
async fn dangling_calls_complete_in_ascending_proc_order_after_real_events() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Arc::new(Recorder::create(dir.path().join("history.jsonl")).unwrap());

    // procs 7 and 3 finish cleanly; procs 9, 4, and 1 crash after their call
    // is recorded but before a response ever comes back, interleaved by
    // real task scheduling rather than a fixed order.
    let mut tasks = Vec::new();
    for (proc, completes) in [(7i64, true), (3, true), (9, false), (4, false), (1, false)] {
        let recorder = recorder.clone();
        tasks.push(tokio::spawn(async move {
            recorder.record_request(proc, &json!({ "proc": proc })).unwrap();
            tokio::task::yield_now().await;
            if completes {
                recorder.record_response(proc, &json!({ "ok": true })).unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    recorder.flush().unwrap();

    let mut parser = EchoParser;
    let entries = read_events(recorder.path(), &mut parser).unwrap();

    // 5 calls + 2 real returns + 3 synthesized returns = 10 entries.
    assert_eq!(entries.len(), 10);

    let real_returns = entries.iter().filter(|e| matches!(e, HistoryEntry::Return { value, .. } if value.get("ok").is_some())).count();
    assert_eq!(real_returns, 2);

    let proc_by_id: std::collections::HashMap<u64, i64> = entries
        .iter()
        .filter_map(|e| match e {
            HistoryEntry::Call { id, value } => {
                Some((*id, value.get("proc").and_then(Value::as_i64).unwrap()))
            }
            HistoryEntry::Return { .. } => None,
        })
        .collect();

    // The synthesized returns are the final three entries (every real event
    // sorts before any synthetic one), and their underlying procs come back
    // in ascending order (1, 4, 9) regardless of the random completion
    // order of the tasks above.
    let tail: Vec<&HistoryEntry<Value, Value>> = entries.iter().rev().take(3).collect();
    let mut tail_procs = Vec::new();
    for entry in &tail {
        match entry {
            HistoryEntry::Return { id, value } => {
                assert_eq!(value.get("unknown").and_then(Value::as_bool), Some(true));
                tail_procs.push(proc_by_id[id]);
            }
            HistoryEntry::Call { .. } => panic!("expected a synthesized return in the tail"),
        }
    }
    tail_procs.reverse();
    assert_eq!(tail_procs, vec![1, 4, 9]);
}
