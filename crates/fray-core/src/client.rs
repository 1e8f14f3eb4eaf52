use anyhow::Result;

use crate::operation::UnknownResponse;

/// Applies requests to the database under test. The controller creates one
/// `Client` per node and drives it from a single worker task, so
/// implementations do not need to be `Sync` — only `Send`, to move across
/// the `tokio::spawn` boundary.
pub trait Client: Send {
    type Request: Send;
    type Response: Send;

    fn set_up(&mut self, nodes: &[String], node: &str) -> Result<()> {
        let _ = (nodes, node);
        Ok(())
    }

    fn tear_down(&mut self, nodes: &[String], node: &str) -> Result<()> {
        let _ = (nodes, node);
        Ok(())
    }

    /// Invokes a single request against `node` and returns its response.
    /// Most workloads implement `UnknownResponse` on `Response` so the
    /// controller can tell a confirmed outcome from a connection-lost one.
    fn invoke(&mut self, node: &str, request: &Self::Request) -> Self::Response;

    /// Produces the next request this client's worker should issue. Called
    /// once per round by the controller; workloads that need cross-worker
    /// coordination (long-fork's read-after-write pairing) keep that state
    /// behind their `ClientCreator`.
    fn next_request(&mut self) -> Self::Request;

    /// Snapshots live database state outside the normal invoke/record path,
    /// for post-mortem debugging. Most clients have nothing useful to add
    /// here and can rely on the default.
    fn dump_state(&mut self) -> Result<Option<serde_json::Value>> {
        Ok(None)
    }
}

/// Creates one `Client` per node. The controller calls `create` once per
/// node at setup time; a `ClientCreator` implementation is the natural
/// place to hold cross-node state a workload's clients must share (the
/// long-fork key-group allocator, for instance).
pub trait ClientCreator: Send + Sync {
    type Client: Client;

    fn create(&self, node: &str) -> Self::Client;
}

/// A `Client` that issues no requests and answers every invocation with
/// `()`. Ported from `NoopClient`/`NoopClientCreator` in
/// `original_source/pkg/core/client.go`; pairs with
/// [`crate::db::NoopDb`] and [`crate::nemesis::NoopNemesis`] as the
/// zero-value registration `fray-registry` falls back to and the fixture a
/// scenario test drives when it only cares about the controller's own
/// plumbing, not a workload's semantics.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopClient;

impl UnknownResponse for () {
    fn is_unknown(&self) -> bool {
        false
    }
}

impl Client for NoopClient {
    type Request = ();
    type Response = ();

    fn invoke(&mut self, _node: &str, _request: &()) {}

    fn next_request(&mut self) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopClientCreator;

impl ClientCreator for NoopClientCreator {
    type Client = NoopClient;

    fn create(&self, _node: &str) -> NoopClient {
        NoopClient
    }
}
