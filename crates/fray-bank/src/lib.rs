//! Bank-transfer workload: request/response types, a Porcupine-compatible
//! [`fray_core::model::Model`] for the general linearizability checker, and
//! the direct TSO-replay checker described in spec §4.4 that exploits the
//! server-issued transaction timestamp to avoid a full search.
//!
//! Grounded in `original_source/db/tidb/bank.go` (`bankClient`, `bankRequest`,
//! `bankResponse`, `getBankModel`, `verifyTsoEvents`).

pub mod generator;
pub mod model;
pub mod parser;
pub mod tso_checker;

pub use generator::BankRequestGenerator;
pub use model::BankModel;
pub use parser::BankParser;
pub use tso_checker::check_bank_tso;

use fray_core::operation::UnknownResponse;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ACCOUNTS: usize = 5;
pub const DEFAULT_INITIAL_BALANCE: i64 = 1000;
pub const DEFAULT_TRANSFER_AMOUNT: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BankRequest {
    Read,
    Transfer { from: usize, to: usize, amount: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BankResponse {
    Read {
        tso: u64,
        balances: Vec<i64>,
        unknown: bool,
    },
    Transfer {
        tso: u64,
        ok: bool,
        from_balance: i64,
        to_balance: i64,
        unknown: bool,
    },
}

impl BankResponse {
    pub fn read(tso: u64, balances: Vec<i64>) -> Self {
        BankResponse::Read { tso, balances, unknown: false }
    }

    pub fn read_unknown() -> Self {
        BankResponse::Read { tso: 0, balances: Vec::new(), unknown: true }
    }

    pub fn transfer(tso: u64, ok: bool, from_balance: i64, to_balance: i64) -> Self {
        BankResponse::Transfer { tso, ok, from_balance, to_balance, unknown: false }
    }

    pub fn transfer_unknown(tso: u64, from_balance: i64, to_balance: i64) -> Self {
        BankResponse::Transfer { tso, ok: false, from_balance, to_balance, unknown: true }
    }

    /// The server-issued transaction start timestamp, or `0` if this
    /// response never reached a transaction (e.g. a connection failure
    /// before `tso` was even assigned).
    pub fn tso(&self) -> u64 {
        match self {
            BankResponse::Read { tso, .. } => *tso,
            BankResponse::Transfer { tso, .. } => *tso,
        }
    }
}

impl UnknownResponse for BankResponse {
    fn is_unknown(&self) -> bool {
        match self {
            BankResponse::Read { unknown, .. } => *unknown,
            BankResponse::Transfer { unknown, .. } => *unknown,
        }
    }
}
