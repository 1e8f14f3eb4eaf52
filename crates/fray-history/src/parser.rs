use anyhow::Result;

/// Decodes a workload's untyped `data` payloads back into the strongly
/// typed request and response values its `Model` understands. One
/// implementation per workload (register, bank, long-fork); the completer
/// is generic over this trait so it never has to know a workload's
/// concrete types.
pub trait RecordParser {
    type Request: Clone;
    type Response: Clone;

    fn on_request(&mut self, data: &serde_json::Value) -> Result<Self::Request>;

    /// Returns `None` when the recorded return means "no return was ever
    /// observed" — an infinite-duration operation the completer must
    /// synthesize an unknown return for.
    fn on_response(&mut self, data: &serde_json::Value) -> Result<Option<Self::Response>>;

    /// Produces the synthetic response used to close out an operation that
    /// never returned by the end of the history.
    fn on_noop_response(&mut self) -> Self::Response;
}
