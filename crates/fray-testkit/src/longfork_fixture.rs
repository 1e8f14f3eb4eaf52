use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use fray_core::client::{Client, ClientCreator};
use fray_core::db::Db;
use fray_longfork::{LongForkRequest, LongForkResponse, LongForkState};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Shared key-value table every `LongForkFixtureClient` writes distinct,
/// nonzero values into and reads back from — a stand-in for a store that
/// (absent any nemesis) never actually forks, so
/// [`fray_longfork::check_long_fork`] should always accept a fixture-only
/// run.
pub struct LongForkFixture {
    table: Mutex<HashMap<u64, u64>>,
    group_size: u64,
}

impl LongForkFixture {
    pub fn new(group_size: u64) -> Arc<Self> {
        Arc::new(Self { table: Mutex::new(HashMap::new()), group_size })
    }
}

impl Db for LongForkFixture {
    fn name(&self) -> &str {
        "long-fork-fixture"
    }

    fn set_up(&self, _node: &str) -> anyhow::Result<()> {
        Ok(())
    }

    fn tear_down(&self, _node: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

pub struct LongForkFixtureClient {
    fixture: Arc<LongForkFixture>,
    state: Arc<LongForkState>,
    node: String,
    rng: StdRng,
}

impl Client for LongForkFixtureClient {
    type Request = LongForkRequest;
    type Response = LongForkResponse;

    fn invoke(&mut self, _node: &str, request: &LongForkRequest) -> LongForkResponse {
        let mut table = self.fixture.table.lock().expect("long-fork fixture mutex poisoned");
        match request {
            LongForkRequest::Write { key } => {
                table.insert(*key, key + 1);
                LongForkResponse::write_ok()
            }
            LongForkRequest::Read { keys } => {
                let values = keys.iter().map(|k| table.get(k).copied().unwrap_or(0)).collect();
                LongForkResponse::read(keys.clone(), values)
            }
        }
    }

    fn next_request(&mut self) -> LongForkRequest {
        self.state.next_request(&mut self.rng, &self.node, self.fixture.group_size)
    }
}

pub struct LongForkFixtureClientCreator {
    fixture: Arc<LongForkFixture>,
    state: Arc<LongForkState>,
}

impl LongForkFixtureClientCreator {
    pub fn new(fixture: Arc<LongForkFixture>) -> Self {
        Self { fixture, state: Arc::new(LongForkState::new()) }
    }
}

impl ClientCreator for LongForkFixtureClientCreator {
    type Client = LongForkFixtureClient;

    fn create(&self, node: &str) -> LongForkFixtureClient {
        let seed = node.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        LongForkFixtureClient {
            fixture: self.fixture.clone(),
            state: self.state.clone(),
            node: node.to_string(),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}
