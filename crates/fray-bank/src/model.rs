use fray_core::model::Model;
use fray_core::operation::UnknownResponse;

use crate::{BankRequest, BankResponse};

/// Porcupine-compatible sequential specification for the bank workload,
/// ported from `getBankModel` in `original_source/db/tidb/bank.go`. Used by
/// the general linearizability checker (`fray-checker`) as a fallback when
/// the direct TSO replay ([`crate::check_bank_tso`]) is not applicable
/// (responses carrying no timestamp).
#[derive(Debug, Clone)]
pub struct BankModel {
    accounts: usize,
    initial_balance: i64,
}

impl BankModel {
    pub fn new(accounts: usize, initial_balance: i64) -> Self {
        Self { accounts, initial_balance }
    }
}

impl Model for BankModel {
    type State = Vec<i64>;
    type Request = BankRequest;
    type Response = BankResponse;

    fn init(&self) -> Self::State {
        vec![self.initial_balance; self.accounts]
    }

    fn step(
        &self,
        state: &Self::State,
        input: &Self::Request,
        output: &Self::Response,
    ) -> Option<Self::State> {
        // Dispatch on the *request*'s kind, not the paired response's: a
        // noop response synthesized for a dangling call (spec §4.2) carries
        // no information about which request it is closing out, so an
        // unknown outcome must be admissible regardless of which `Response`
        // variant it happens to be wrapped in. Ported from `getBankModel`'s
        // `inp.Op`-keyed dispatch in `original_source/db/tidb/bank.go`.
        match input {
            BankRequest::Read => {
                if output.is_unknown() {
                    return Some(state.clone());
                }
                match output {
                    BankResponse::Read { balances, .. } if balances == state => {
                        Some(state.clone())
                    }
                    _ => None,
                }
            }
            BankRequest::Transfer { from, to, amount } => {
                if output.is_unknown() {
                    let mut next = state.clone();
                    next[*from] -= amount;
                    next[*to] += amount;
                    return Some(next);
                }
                match output {
                    BankResponse::Transfer { ok, .. } => {
                        if !*ok {
                            // A definitely-rejected transfer never touched the balances.
                            return Some(state.clone());
                        }
                        let mut next = state.clone();
                        next[*from] -= amount;
                        next[*to] += amount;
                        Some(next)
                    }
                    _ => None,
                }
            }
        }
    }

    fn equal(&self, a: &Self::State, b: &Self::State) -> bool {
        a == b
    }
}
