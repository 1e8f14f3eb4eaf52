use rand::Rng;

use crate::{BankRequest, DEFAULT_TRANSFER_AMOUNT};

/// Produces the next bank request for one worker: a coin flip between a
/// whole-ledger read and a fixed-amount transfer between two distinct
/// accounts, ported from `bankClient.NextRequest` in
/// `original_source/db/tidb/bank.go`.
pub struct BankRequestGenerator {
    accounts: usize,
    amount: i64,
}

impl BankRequestGenerator {
    pub fn new(accounts: usize) -> Self {
        Self { accounts, amount: DEFAULT_TRANSFER_AMOUNT }
    }

    pub fn next_request<R: Rng + ?Sized>(&self, rng: &mut R) -> BankRequest {
        if rng.gen_bool(0.5) {
            return BankRequest::Read;
        }
        let from = rng.gen_range(0..self.accounts);
        let mut to = rng.gen_range(0..self.accounts);
        if to == from {
            to = (to + 1) % self.accounts;
        }
        BankRequest::Transfer { from, to, amount: self.amount }
    }
}
