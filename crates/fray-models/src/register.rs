use fray_core::model::Model;
use fray_history::parser::RecordParser;
use serde::{Deserialize, Serialize};

/// A single-value read/write register. The reference example from the
/// checker's test suite (the MIT 6.824 linearizability quiz) is this model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegisterRequest {
    Read,
    Write(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub unknown: bool,
    /// Only meaningful for `Read` responses.
    #[serde(default)]
    pub value: i64,
}

impl RegisterResponse {
    pub fn read(value: i64) -> Self {
        Self { unknown: false, value }
    }

    pub fn write() -> Self {
        Self { unknown: false, value: 0 }
    }

    pub fn unknown() -> Self {
        Self { unknown: true, value: 0 }
    }
}

impl fray_core::operation::UnknownResponse for RegisterResponse {
    fn is_unknown(&self) -> bool {
        self.unknown
    }
}

/// `init = 0`; a write replaces the state unconditionally, a read must
/// observe the current state (or be unknown, which matches anything).
#[derive(Debug, Clone, Copy, Default)]
pub struct RegisterModel {
    initial: i64,
}

impl RegisterModel {
    pub fn new(initial: i64) -> Self {
        Self { initial }
    }
}

impl Model for RegisterModel {
    type State = i64;
    type Request = RegisterRequest;
    type Response = RegisterResponse;

    fn init(&self) -> Self::State {
        self.initial
    }

    fn step(
        &self,
        state: &Self::State,
        input: &Self::Request,
        output: &Self::Response,
    ) -> Option<Self::State> {
        match input {
            RegisterRequest::Read => {
                if output.unknown || output.value == *state {
                    Some(*state)
                } else {
                    None
                }
            }
            RegisterRequest::Write(v) => Some(*v),
        }
    }

    fn equal(&self, a: &Self::State, b: &Self::State) -> bool {
        a == b
    }
}

/// Decodes the register workload's JSON payloads for [`fray_history::read_events`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RegisterParser;

impl RecordParser for RegisterParser {
    type Request = RegisterRequest;
    type Response = RegisterResponse;

    fn on_request(&mut self, data: &serde_json::Value) -> anyhow::Result<Self::Request> {
        Ok(serde_json::from_value(data.clone())?)
    }

    fn on_response(&mut self, data: &serde_json::Value) -> anyhow::Result<Option<Self::Response>> {
        let response: RegisterResponse = serde_json::from_value(data.clone())?;
        if response.unknown {
            return Ok(None);
        }
        Ok(Some(response))
    }

    fn on_noop_response(&mut self) -> Self::Response {
        RegisterResponse::unknown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_always_admissible() {
        let model = RegisterModel::new(0);
        let next = model.step(&0, &RegisterRequest::Write(7), &RegisterResponse::write());
        assert_eq!(next, Some(7));
    }

    #[test]
    fn read_must_match_current_state() {
        let model = RegisterModel::new(5);
        assert_eq!(
            model.step(&5, &RegisterRequest::Read, &RegisterResponse::read(5)),
            Some(5)
        );
        assert_eq!(
            model.step(&5, &RegisterRequest::Read, &RegisterResponse::read(6)),
            None
        );
    }

    #[test]
    fn unknown_read_matches_any_state() {
        let model = RegisterModel::new(5);
        assert_eq!(
            model.step(&5, &RegisterRequest::Read, &RegisterResponse::unknown()),
            Some(5)
        );
    }
}
