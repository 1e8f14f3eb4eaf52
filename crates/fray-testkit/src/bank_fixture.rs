use std::sync::{Arc, Mutex};

use fray_bank::{BankRequest, BankRequestGenerator, BankResponse};
use fray_core::client::{Client, ClientCreator};
use fray_core::db::Db;
use rand::rngs::StdRng;
use rand::SeedableRng;

struct BankState {
    balances: Vec<i64>,
    next_tso: u64,
}

/// Shared bank ledger every `BankFixtureClient` transacts against under one
/// mutex — a stand-in for a real database issuing a monotonic commit
/// timestamp per transaction, which is exactly what
/// [`fray_bank::check_bank_tso`] needs to replay the history directly
/// instead of searching it.
pub struct BankFixture {
    state: Mutex<BankState>,
    accounts: usize,
}

impl BankFixture {
    pub fn new(accounts: usize, initial_balance: i64) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(BankState { balances: vec![initial_balance; accounts], next_tso: 1 }),
            accounts,
        })
    }
}

impl Db for BankFixture {
    fn name(&self) -> &str {
        "bank-fixture"
    }

    fn set_up(&self, _node: &str) -> anyhow::Result<()> {
        Ok(())
    }

    fn tear_down(&self, _node: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

pub struct BankFixtureClient {
    fixture: Arc<BankFixture>,
    generator: BankRequestGenerator,
    rng: StdRng,
}

impl Client for BankFixtureClient {
    type Request = BankRequest;
    type Response = BankResponse;

    fn invoke(&mut self, _node: &str, request: &BankRequest) -> BankResponse {
        let mut state = self.fixture.state.lock().expect("bank fixture mutex poisoned");
        let tso = state.next_tso;
        state.next_tso += 1;
        match request {
            BankRequest::Read => BankResponse::read(tso, state.balances.clone()),
            BankRequest::Transfer { from, to, amount } => {
                let from_balance = state.balances[*from];
                let to_balance = state.balances[*to];
                state.balances[*from] -= amount;
                state.balances[*to] += amount;
                BankResponse::transfer(tso, true, from_balance, to_balance)
            }
        }
    }

    fn next_request(&mut self) -> BankRequest {
        self.generator.next_request(&mut self.rng)
    }
}

pub struct BankFixtureClientCreator {
    fixture: Arc<BankFixture>,
}

impl BankFixtureClientCreator {
    pub fn new(fixture: Arc<BankFixture>) -> Self {
        Self { fixture }
    }
}

impl ClientCreator for BankFixtureClientCreator {
    type Client = BankFixtureClient;

    fn create(&self, node: &str) -> BankFixtureClient {
        let seed = node.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        BankFixtureClient {
            fixture: self.fixture.clone(),
            generator: BankRequestGenerator::new(self.fixture.accounts),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}
