use fray_core::operation::UnknownResponse;
use fray_history::parser::RecordParser;

use crate::{BankRequest, BankResponse};

/// Decodes the bank workload's JSON payloads for [`fray_history::read_events`],
/// ported from `bankParser` in `original_source/db/tidb/bank.go`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BankParser;

impl RecordParser for BankParser {
    type Request = BankRequest;
    type Response = BankResponse;

    fn on_request(&mut self, data: &serde_json::Value) -> anyhow::Result<Self::Request> {
        Ok(serde_json::from_value(data.clone())?)
    }

    fn on_response(&mut self, data: &serde_json::Value) -> anyhow::Result<Option<Self::Response>> {
        let response: BankResponse = serde_json::from_value(data.clone())?;
        if response.is_unknown() {
            return Ok(None);
        }
        Ok(Some(response))
    }

    fn on_noop_response(&mut self) -> Self::Response {
        BankResponse::read_unknown()
    }
}
