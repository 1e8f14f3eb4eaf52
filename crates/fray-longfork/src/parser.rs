use fray_core::operation::UnknownResponse;
use fray_history::parser::RecordParser;

use crate::{LongForkRequest, LongForkResponse};

/// Decodes the long-fork workload's JSON payloads for [`fray_history::read_events`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LongForkParser;

impl RecordParser for LongForkParser {
    type Request = LongForkRequest;
    type Response = LongForkResponse;

    fn on_request(&mut self, data: &serde_json::Value) -> anyhow::Result<Self::Request> {
        Ok(serde_json::from_value(data.clone())?)
    }

    fn on_response(&mut self, data: &serde_json::Value) -> anyhow::Result<Option<Self::Response>> {
        let response: LongForkResponse = serde_json::from_value(data.clone())?;
        if response.is_unknown() {
            return Ok(None);
        }
        Ok(Some(response))
    }

    fn on_noop_response(&mut self) -> Self::Response {
        LongForkResponse::unknown()
    }
}
