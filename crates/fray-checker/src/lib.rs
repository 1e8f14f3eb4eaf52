//! Linearizability checking via exhaustive search over compatible
//! linearizations of a completed operation history.
//!
//! The history is represented as the sequence of call/return entries in
//! the order they actually occurred (real time order, including any
//! synthesized unknown returns appended at the tail by the completer). The
//! search repeatedly picks an operation whose call can legally linearize
//! next, applies the model's `step`, and recurses on what remains; a
//! state-equivalence cache prunes branches already shown to be dead ends.

use std::collections::HashMap;

use fray_core::model::Model;
use fray_core::operation::HistoryEntry;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Call,
    Return,
}

/// Checks whether `history` is linearizable with respect to `model`.
///
/// Returns `true` iff some permutation of the operations both respects the
/// real-time order recorded in `history` and is accepted step by step by
/// `model` starting from `model.init()`.
pub fn check<M: Model>(model: &M, history: &[HistoryEntry<M::Request, M::Response>]) -> bool {
    if history.is_empty() {
        return true;
    }

    let len = history.len();
    let mut kinds = Vec::with_capacity(len);
    let mut ids = Vec::with_capacity(len);
    let mut requests: HashMap<u64, M::Request> = HashMap::new();
    let mut responses: HashMap<u64, M::Response> = HashMap::new();
    let mut return_pos: HashMap<u64, usize> = HashMap::new();
    let mut call_pos: HashMap<u64, usize> = HashMap::new();

    for (pos, entry) in history.iter().enumerate() {
        match entry {
            HistoryEntry::Call { id, value } => {
                kinds.push(Kind::Call);
                ids.push(*id);
                requests.insert(*id, value.clone());
                call_pos.insert(*id, pos);
            }
            HistoryEntry::Return { id, value } => {
                kinds.push(Kind::Return);
                ids.push(*id);
                responses.insert(*id, value.clone());
                return_pos.insert(*id, pos);
            }
        }
    }

    info!(operations = call_pos.len(), "begin linearizability search");

    let mut search = Search {
        model,
        kinds,
        ids,
        requests,
        responses,
        return_pos,
        call_pos,
        cache: HashMap::new(),
    };

    let active = vec![true; len];
    let ok = search.check(active, model.init());
    debug!(linearizable = ok, "linearizability search finished");
    ok
}

struct Search<'a, M: Model> {
    model: &'a M,
    kinds: Vec<Kind>,
    ids: Vec<u64>,
    requests: HashMap<u64, M::Request>,
    responses: HashMap<u64, M::Response>,
    return_pos: HashMap<u64, usize>,
    call_pos: HashMap<u64, usize>,
    cache: HashMap<Vec<u64>, Vec<M::State>>,
}

impl<'a, M: Model> Search<'a, M> {
    fn remaining_ids(&self, active: &[bool]) -> Vec<u64> {
        let mut remaining: Vec<u64> = self
            .call_pos
            .iter()
            .filter(|(_, &pos)| active[pos])
            .map(|(&id, _)| id)
            .collect();
        remaining.sort_unstable();
        remaining
    }

    fn check(&mut self, mut active: Vec<bool>, state: M::State) -> bool {
        let remaining = self.remaining_ids(&active);
        if remaining.is_empty() {
            return true;
        }

        if let Some(dead_states) = self.cache.get(&remaining) {
            if dead_states.iter().any(|s| self.model.equal(s, &state)) {
                return false;
            }
        }

        for pos in 0..active.len() {
            if !active[pos] {
                continue;
            }
            match self.kinds[pos] {
                // An in-flight return we haven't linearized yet blocks every
                // later call in the list: real-time order requires that
                // operation to linearize first.
                Kind::Return => break,
                Kind::Call => {
                    let id = self.ids[pos];
                    let ret_pos = self.return_pos[&id];
                    let request = self.requests[&id].clone();
                    let response = self.responses[&id].clone();
                    if let Some(next_state) = self.model.step(&state, &request, &response) {
                        active[pos] = false;
                        active[ret_pos] = false;
                        if self.check(active.clone(), next_state) {
                            return true;
                        }
                        active[pos] = true;
                        active[ret_pos] = true;
                    }
                }
            }
        }

        self.cache.entry(remaining).or_default().push(state);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fray_models::register::{RegisterModel, RegisterRequest, RegisterResponse};

    fn call(id: u64, value: RegisterRequest) -> HistoryEntry<RegisterRequest, RegisterResponse> {
        HistoryEntry::Call { id, value }
    }

    fn ret(id: u64, value: RegisterResponse) -> HistoryEntry<RegisterRequest, RegisterResponse> {
        HistoryEntry::Return { id, value }
    }

    #[test]
    fn register_quiz_example_is_linearizable() {
        // W(100)@[0,100], R->100@[25,75], R->0@[30,60]
        let history = vec![
            call(0, RegisterRequest::Write(100)),
            call(1, RegisterRequest::Read),
            call(2, RegisterRequest::Read),
            ret(2, RegisterResponse::Read(0)),
            ret(1, RegisterResponse::Read(100)),
            ret(0, RegisterResponse::Write),
        ];
        let model = RegisterModel::new(0);
        assert!(check(&model, &history));
    }

    #[test]
    fn register_quiz_counterexample_is_not_linearizable() {
        // W(200)@[0,100], R->200@[10,30], R->0@[40,90]
        let history = vec![
            call(0, RegisterRequest::Write(200)),
            call(1, RegisterRequest::Read),
            ret(1, RegisterResponse::Read(200)),
            call(2, RegisterRequest::Read),
            ret(2, RegisterResponse::Read(0)),
            ret(0, RegisterResponse::Write),
        ];
        let model = RegisterModel::new(0);
        assert!(!check(&model, &history));
    }

    #[test]
    fn empty_history_is_linearizable() {
        let model = RegisterModel::new(0);
        let history: Vec<HistoryEntry<RegisterRequest, RegisterResponse>> = vec![];
        assert!(check(&model, &history));
    }
}
