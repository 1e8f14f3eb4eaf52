use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use fray_core::client::{Client, ClientCreator};
use fray_core::operation::UnknownResponse;
use fray_core::CancelToken;
use fray_history::Recorder;
use fray_nemesis::NemesisGenerator;
use fray_registry::Registry;
use serde::Serialize;
use tracing::{info, warn};

use crate::nemesis_dispatcher;
use crate::worker::run_client_round;

/// Static configuration for one controller run (spec §4.6's state machine),
/// decoded from a [`fray_config::RunConfig`] by the caller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub nodes: Vec<String>,
    pub db_name: String,
    pub request_count: u64,
    pub round_time: Duration,
    pub rounds: u32,
    pub history_base: String,
}

impl ControllerConfig {
    fn history_path(&self, round: u32) -> PathBuf {
        PathBuf::from(format!("{}.{round}", self.history_base))
    }
}

/// Outcome of one round: how many requests the shared budget actually
/// admitted (a round that hits its time limit before exhausting
/// `request_count` issues fewer) and where its history landed.
#[derive(Debug, Clone)]
pub struct RoundReport {
    pub round: u32,
    pub history_path: PathBuf,
    pub requests_issued: u64,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub rounds: Vec<RoundReport>,
}

/// Drives `CC::Client` instances against the cluster under test for one
/// run: `SetUpDB -> SetUpClients -> rounds -> TearDownClients -> TearDownDB`.
/// One `Controller` is built per workload; the workload's checker runs
/// separately over the history files this produces.
pub struct Controller<CC: ClientCreator> {
    config: ControllerConfig,
    registry: Arc<Registry>,
    clients: Vec<CC::Client>,
    nemesis_generators: Vec<Box<dyn NemesisGenerator>>,
}

impl<CC: ClientCreator> Controller<CC> {
    pub fn new(config: ControllerConfig, registry: Arc<Registry>, client_creator: &CC) -> Self {
        let clients = config.nodes.iter().map(|node| client_creator.create(node)).collect();
        Self { config, registry, clients, nemesis_generators: Vec::new() }
    }

    pub fn add_nemesis_generator(&mut self, generator: Box<dyn NemesisGenerator>) {
        self.nemesis_generators.push(generator);
    }
}

impl<CC> Controller<CC>
where
    CC: ClientCreator,
    <CC::Client as Client>::Request: Serialize,
    <CC::Client as Client>::Response: Serialize + UnknownResponse,
{
    /// Runs the full state machine to completion, returning one report per
    /// round. Db setup/teardown failures are fatal (propagated); a client's
    /// own setup/teardown failure is logged and does not abort the run,
    /// matching `onClientLoop`'s `log.Printf`-and-continue in the original.
    pub async fn run(&mut self) -> Result<RunReport> {
        self.setup_db().await?;
        self.setup_clients();

        let run_token = CancelToken::new();
        let generators = std::mem::take(&mut self.nemesis_generators);
        let dispatcher = if generators.is_empty() {
            None
        } else {
            info!(count = generators.len(), "starting nemesis dispatcher");
            Some(tokio::spawn(nemesis_dispatcher::run(
                self.config.nodes.clone(),
                self.registry.clone(),
                generators,
                run_token.clone(),
            )))
        };

        let mut report = RunReport::default();
        for round in 1..=self.config.rounds {
            if run_token.is_cancelled() {
                break;
            }
            info!(round, "starting round");
            let round_report = self.run_round(round, &run_token).await?;
            report.rounds.push(round_report);
        }

        run_token.cancel();
        if let Some(handle) = dispatcher {
            let _ = handle.await;
        }

        self.teardown_clients();
        self.teardown_db().await?;

        Ok(report)
    }

    async fn run_round(&mut self, round: u32, run_token: &CancelToken) -> Result<RoundReport> {
        let recorder = Recorder::create(self.config.history_path(round))
            .with_context(|| format!("creating history file for round {round}"))?;
        let remaining = AtomicI64::new(self.config.request_count as i64);
        let proc_counter = AtomicI64::new(0);
        let round_token = CancelToken::new();

        let outer_token = run_token.clone();
        let timer_token = round_token.clone();
        let deadline = self.config.round_time;
        let timer = async move {
            tokio::select! {
                _ = tokio::time::sleep(deadline) => {}
                _ = outer_token.cancelled() => {}
            }
            timer_token.cancel();
        };

        let nodes = self.config.nodes.clone();
        let recorder_ref = &recorder;
        let remaining_ref = &remaining;
        let proc_counter_ref = &proc_counter;
        let round_token_ref = &round_token;
        let workers = self.clients.iter_mut().zip(nodes.iter()).map(|(client, node)| {
            run_client_round(client, node, recorder_ref, remaining_ref, proc_counter_ref, round_token_ref)
        });

        let (_, results) = tokio::join!(timer, futures_util::future::join_all(workers));

        for result in results {
            result.with_context(|| format!("round {round} worker failed"))?;
        }

        recorder.flush().with_context(|| format!("flushing history for round {round}"))?;
        let issued =
            (self.config.request_count as i64 - remaining.load(Ordering::SeqCst)).max(0) as u64;
        Ok(RoundReport { round, history_path: recorder.path().to_path_buf(), requests_issued: issued })
    }

    async fn setup_db(&self) -> Result<()> {
        let db = self.registry.get_db(&self.config.db_name)?;
        info!(db = %self.config.db_name, "begin to set up database");
        let mut handles = Vec::new();
        for node in self.config.nodes.clone() {
            let db = db.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                db.set_up(&node).with_context(|| format!("setting up db on node {node}"))
            }));
        }
        for handle in handles {
            handle.await.context("db setup task panicked")??;
        }
        Ok(())
    }

    async fn teardown_db(&self) -> Result<()> {
        let db = self.registry.get_db(&self.config.db_name)?;
        info!(db = %self.config.db_name, "begin to tear down database");
        let mut handles = Vec::new();
        for node in self.config.nodes.clone() {
            let db = db.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                db.tear_down(&node).with_context(|| format!("tearing down db on node {node}"))
            }));
        }
        for handle in handles {
            handle.await.context("db teardown task panicked")??;
        }
        Ok(())
    }

    fn setup_clients(&mut self) {
        let nodes = self.config.nodes.clone();
        for (client, node) in self.clients.iter_mut().zip(nodes.iter()) {
            info!(node, "begin to set up db client");
            if let Err(err) = client.set_up(&nodes, node) {
                warn!(node, %err, "client set_up failed");
            }
        }
    }

    fn teardown_clients(&mut self) {
        let nodes = self.config.nodes.clone();
        for (client, node) in self.clients.iter_mut().zip(nodes.iter()) {
            info!(node, "begin to tear down db client");
            if let Err(err) = client.tear_down(&nodes, node) {
                warn!(node, %err, "client tear_down failed");
            }
        }
    }
}
