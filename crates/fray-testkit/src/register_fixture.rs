use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use fray_core::client::{Client, ClientCreator};
use fray_core::db::Db;
use fray_models::register::{RegisterRequest, RegisterResponse};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Shared linearizable register every `RegisterFixtureClient` reads and
/// writes through a single `AtomicI64` — a stand-in for a real replicated
/// register, so a controller run against it checks out linearizable as
/// long as nothing else is wired in to break it.
#[derive(Default)]
pub struct RegisterFixture {
    value: AtomicI64,
}

impl RegisterFixture {
    pub fn new(initial: i64) -> Arc<Self> {
        Arc::new(Self { value: AtomicI64::new(initial) })
    }
}

impl Db for RegisterFixture {
    fn name(&self) -> &str {
        "register-fixture"
    }

    fn set_up(&self, _node: &str) -> anyhow::Result<()> {
        Ok(())
    }

    fn tear_down(&self, _node: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

pub struct RegisterFixtureClient {
    fixture: Arc<RegisterFixture>,
    rng: StdRng,
}

impl Client for RegisterFixtureClient {
    type Request = RegisterRequest;
    type Response = RegisterResponse;

    fn invoke(&mut self, _node: &str, request: &RegisterRequest) -> RegisterResponse {
        match request {
            RegisterRequest::Read => {
                RegisterResponse::read(self.fixture.value.load(Ordering::SeqCst))
            }
            RegisterRequest::Write(v) => {
                self.fixture.value.store(*v, Ordering::SeqCst);
                RegisterResponse::write()
            }
        }
    }

    fn next_request(&mut self) -> RegisterRequest {
        if self.rng.gen_bool(0.5) {
            RegisterRequest::Read
        } else {
            RegisterRequest::Write(self.rng.gen_range(0..100))
        }
    }
}

pub struct RegisterFixtureClientCreator {
    fixture: Arc<RegisterFixture>,
}

impl RegisterFixtureClientCreator {
    pub fn new(fixture: Arc<RegisterFixture>) -> Self {
        Self { fixture }
    }
}

impl ClientCreator for RegisterFixtureClientCreator {
    type Client = RegisterFixtureClient;

    fn create(&self, node: &str) -> RegisterFixtureClient {
        // Seeded from the node name so a scenario run is reproducible
        // without sharing mutable RNG state across nodes.
        let seed = node.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        RegisterFixtureClient { fixture: self.fixture.clone(), rng: StdRng::seed_from_u64(seed) }
    }
}
