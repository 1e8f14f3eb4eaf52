use fray_core::model::Model;
use fray_history::parser::RecordParser;
use serde::{Deserialize, Serialize};

/// A register supporting read, unconditional write, and compare-and-swap.
/// Ported from `original_source/pkg/model/cas_register.go`: the richer
/// operation set exercises the checker against branching transitions the
/// plain register model never produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CasRegisterRequest {
    Read,
    Write(i64),
    /// Compare-and-swap from the first value to the second.
    Cas(i64, i64),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasRegisterResponse {
    /// Set for a `Read`: whether the register has ever been written.
    #[serde(default)]
    pub exists: bool,
    /// Set for a `Read`: the observed value, meaningful only if `exists`.
    #[serde(default)]
    pub value: i64,
    /// Set for a `Cas`: whether the swap took effect.
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub unknown: bool,
}

impl CasRegisterResponse {
    pub fn read_missing() -> Self {
        Self { exists: false, ..Default::default() }
    }

    pub fn read(value: i64) -> Self {
        Self { exists: true, value, ..Default::default() }
    }

    pub fn write() -> Self {
        Self::default()
    }

    pub fn cas(ok: bool) -> Self {
        Self { ok, ..Default::default() }
    }

    pub fn unknown() -> Self {
        Self { unknown: true, ..Default::default() }
    }
}

impl fray_core::operation::UnknownResponse for CasRegisterResponse {
    fn is_unknown(&self) -> bool {
        self.unknown
    }
}

/// `init = None` (no value has ever been written). `None` is modeled as
/// `-1` in the original Go source's `int` state; here it is a real `Option`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CasRegisterModel;

impl Model for CasRegisterModel {
    type State = Option<i64>;
    type Request = CasRegisterRequest;
    type Response = CasRegisterResponse;

    fn init(&self) -> Self::State {
        None
    }

    fn step(
        &self,
        state: &Self::State,
        input: &Self::Request,
        output: &Self::Response,
    ) -> Option<Self::State> {
        match input {
            CasRegisterRequest::Read => {
                let ok = output.unknown
                    || (!output.exists && state.is_none())
                    || (output.exists && Some(output.value) == *state);
                ok.then(|| *state)
            }
            CasRegisterRequest::Write(v) => Some(Some(*v)),
            CasRegisterRequest::Cas(from, to) => {
                let matches = *state == Some(*from);
                let ok = (matches && output.ok) || (!matches && !output.ok) || output.unknown;
                if !ok {
                    return None;
                }
                if matches {
                    Some(Some(*to))
                } else {
                    Some(*state)
                }
            }
        }
    }

    fn equal(&self, a: &Self::State, b: &Self::State) -> bool {
        a == b
    }
}

/// Decodes the CAS-register workload's JSON payloads for
/// [`fray_history::read_events`].
#[derive(Debug, Default, Clone, Copy)]
pub struct CasRegisterParser;

impl RecordParser for CasRegisterParser {
    type Request = CasRegisterRequest;
    type Response = CasRegisterResponse;

    fn on_request(&mut self, data: &serde_json::Value) -> anyhow::Result<Self::Request> {
        Ok(serde_json::from_value(data.clone())?)
    }

    fn on_response(&mut self, data: &serde_json::Value) -> anyhow::Result<Option<Self::Response>> {
        let response: CasRegisterResponse = serde_json::from_value(data.clone())?;
        if response.unknown {
            return Ok(None);
        }
        Ok(Some(response))
    }

    fn on_noop_response(&mut self) -> Self::Response {
        CasRegisterResponse::unknown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cas_succeeds_only_from_matching_state() {
        let model = CasRegisterModel;
        assert_eq!(
            model.step(&Some(1), &CasRegisterRequest::Cas(1, 2), &CasRegisterResponse::cas(true)),
            Some(Some(2))
        );
        assert_eq!(
            model.step(&Some(1), &CasRegisterRequest::Cas(9, 2), &CasRegisterResponse::cas(true)),
            None
        );
    }

    #[test]
    fn read_before_any_write_must_report_missing() {
        let model = CasRegisterModel;
        assert_eq!(
            model.step(&None, &CasRegisterRequest::Read, &CasRegisterResponse::read_missing()),
            Some(None)
        );
        assert_eq!(
            model.step(&None, &CasRegisterRequest::Read, &CasRegisterResponse::read(0)),
            None
        );
    }

    #[test]
    fn unknown_cas_matches_either_outcome() {
        let model = CasRegisterModel;
        assert!(model
            .step(&Some(1), &CasRegisterRequest::Cas(1, 2), &CasRegisterResponse::unknown())
            .is_some());
    }
}
