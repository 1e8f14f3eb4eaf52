use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::{Context, Result};
use fray_core::client::Client;
use fray_core::operation::UnknownResponse;
use fray_core::CancelToken;
use fray_history::Recorder;
use serde::Serialize;
use tracing::error;

/// Runs one node's request loop for a single round: generate, record,
/// invoke, record, rotating `proc` whenever a response comes back unknown.
/// A worker keeps the same `proc` across sequential requests — it only
/// acquires a fresh one after an unknown response, since that response's
/// real outcome may still land at the database at an arbitrary point in
/// the future and must not appear to happen-after the worker's next call.
///
/// `remaining` is a budget shared by every worker in the round; a worker
/// exits as soon as it observes the budget exhausted, not after issuing a
/// fixed share of it. Returns `Err` only when the history file itself can't
/// be written — a failing `Client::invoke` is expected to be reported
/// through `Response::is_unknown`, not propagated here.
pub(crate) async fn run_client_round<C>(
    client: &mut C,
    node: &str,
    recorder: &Recorder,
    remaining: &AtomicI64,
    proc_counter: &AtomicI64,
    round_token: &CancelToken,
) -> Result<()>
where
    C: Client,
    C::Request: Serialize,
    C::Response: Serialize + UnknownResponse,
{
    let mut proc = proc_counter.fetch_add(1, Ordering::SeqCst);

    loop {
        if round_token.is_cancelled() {
            return Ok(());
        }

        if remaining.fetch_sub(1, Ordering::SeqCst) <= 0 {
            remaining.fetch_add(1, Ordering::SeqCst);
            return Ok(());
        }

        let request = client.next_request();
        if let Err(err) = recorder.record_request(proc, &request) {
            error!(node, %err, "failed to record request");
            round_token.cancel();
            return Err(err).context("recording request");
        }

        let response = client.invoke(node, &request);

        if let Err(err) = recorder.record_response(proc, &response) {
            error!(node, %err, "failed to record response");
            round_token.cancel();
            return Err(err).context("recording response");
        }

        if response.is_unknown() {
            proc = proc_counter.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fray_core::client::Client as ClientTrait;

    #[derive(Debug, Clone, Copy, serde::Serialize)]
    struct Req(u32);

    #[derive(Debug, Clone, Copy, serde::Serialize)]
    struct Resp {
        unknown: bool,
    }

    impl UnknownResponse for Resp {
        fn is_unknown(&self) -> bool {
            self.unknown
        }
    }

    /// Returns an unknown response every third call; otherwise echoes ok.
    struct FlakyClient {
        calls: u32,
    }

    impl ClientTrait for FlakyClient {
        type Request = Req;
        type Response = Resp;

        fn invoke(&mut self, _node: &str, request: &Req) -> Resp {
            self.calls += 1;
            Resp { unknown: request.0 % 3 == 0 }
        }

        fn next_request(&mut self) -> Req {
            Req(self.calls)
        }
    }

    fn read_procs(path: &std::path::Path) -> Vec<i64> {
        let contents = std::fs::read_to_string(path).unwrap();
        contents
            .lines()
            .map(|line| {
                let op: fray_core::operation::Operation = serde_json::from_str(line).unwrap();
                op.proc
            })
            .collect()
    }

    #[tokio::test]
    async fn stops_once_shared_budget_is_exhausted() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::create(dir.path().join("history")).unwrap();
        let remaining = AtomicI64::new(4);
        let proc_counter = AtomicI64::new(0);
        let round_token = CancelToken::new();
        let mut client = FlakyClient { calls: 0 };

        run_client_round(&mut client, "n1", &recorder, &remaining, &proc_counter, &round_token)
            .await
            .unwrap();

        assert_eq!(remaining.load(Ordering::SeqCst), 0);
        recorder.flush().unwrap();
        // 4 requests -> 8 recorded lines (call + return each).
        assert_eq!(read_procs(recorder.path()).len(), 8);
    }

    #[tokio::test]
    async fn unknown_response_rotates_onto_a_fresh_proc() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::create(dir.path().join("history")).unwrap();
        let remaining = AtomicI64::new(3);
        let proc_counter = AtomicI64::new(0);
        let round_token = CancelToken::new();
        let mut client = FlakyClient { calls: 0 };

        run_client_round(&mut client, "n1", &recorder, &remaining, &proc_counter, &round_token)
            .await
            .unwrap();

        recorder.flush().unwrap();
        let procs = read_procs(recorder.path());
        // calls: 0 (unknown, rotates), 1 (ok), 2 (ok) -> proc sequence 0,0,1,1,1,1
        assert_eq!(procs, vec![0, 0, 1, 1, 1, 1]);
    }

    #[tokio::test]
    async fn cancelled_round_token_stops_the_loop_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::create(dir.path().join("history")).unwrap();
        let remaining = AtomicI64::new(100);
        let proc_counter = AtomicI64::new(0);
        let round_token = CancelToken::new();
        round_token.cancel();
        let mut client = FlakyClient { calls: 0 };

        run_client_round(&mut client, "n1", &recorder, &remaining, &proc_counter, &round_token)
            .await
            .unwrap();

        assert_eq!(remaining.load(Ordering::SeqCst), 100);
    }
}
