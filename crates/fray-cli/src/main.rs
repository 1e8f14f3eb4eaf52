//! Command-line entry point wiring the configuration, registry, controller
//! and checker crates into runnable subcommands.
//!
//! `run`'s database is deliberately one of `fray-testkit`'s in-memory
//! fixtures rather than a real cluster driver: spec §1 treats concrete
//! database lifecycle/clients as external collaborators reached through
//! `fray-core`'s `Db`/`Client` traits, so this binary ships the workloads
//! it can demonstrate end to end without depending on anything outside
//! the workspace (see DESIGN.md).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fray_bank::{BankModel, BankParser};
use fray_config::{ConfigOverrides, RunConfig};
use fray_controller::{Controller, ControllerConfig, RunReport};
use fray_longfork::LongForkParser;
use fray_models::register::{RegisterModel, RegisterParser};
use fray_models::{CasRegisterModel, CasRegisterParser};
use fray_nemesis::{DropGenerator, KillGenerator, NemesisGenerator, Selection};
use fray_registry::{CheckerName, Registry};
use fray_testkit::{
    BankFixture, BankFixtureClientCreator, LongForkFixture, LongForkFixtureClientCreator,
    RegisterFixture, RegisterFixtureClientCreator, ScriptedNemesis,
};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "fray")]
#[command(about = "Distributed-systems correctness test harness", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a layered config hash and print the canonical JSON.
    ConfigHash {
        /// Paths in merge order (base -> env -> overrides...).
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Drive one workload's in-memory fixture through a full run and check
    /// every round's history with its workload's default checker.
    Run {
        /// Layered config paths in merge order.
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Which bundled workload fixture to drive.
        #[arg(long, value_enum)]
        workload: Workload,

        #[arg(long)]
        db: Option<String>,
        #[arg(long)]
        nodes: Option<Vec<String>>,
        #[arg(long)]
        request_count: Option<u64>,
        #[arg(long)]
        run_time_secs: Option<u64>,
        #[arg(long)]
        run_round: Option<u32>,
        #[arg(long)]
        history: Option<String>,
        #[arg(long)]
        nemesis: Option<Vec<String>>,
    },

    /// Check an already-recorded history file against a workload's model.
    Check {
        /// Path to a recorded history file (one JSON object per line).
        #[arg(long)]
        history: PathBuf,

        /// Which workload parsed this history.
        #[arg(long, value_enum)]
        workload: Workload,

        #[arg(long, default_value_t = fray_bank::DEFAULT_ACCOUNTS)]
        accounts: usize,
        #[arg(long, default_value_t = fray_bank::DEFAULT_INITIAL_BALANCE)]
        initial_balance: i64,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Workload {
    Register,
    CasRegister,
    Bank,
    LongFork,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let exit_ok = match cli.cmd {
        Commands::ConfigHash { paths } => {
            run_config_hash(&paths)?;
            true
        }
        Commands::Run { config_paths, workload, db, nodes, request_count, run_time_secs, run_round, history, nemesis } => {
            let overrides = ConfigOverrides {
                db,
                nodes,
                request_count,
                run_time_secs,
                run_round,
                history,
                nemesis,
                checker: None,
            };
            run_workload(&config_paths, &overrides, workload).await?
        }
        Commands::Check { history, workload, accounts, initial_balance } => {
            check_history(&history, workload, accounts, initial_balance)?
        }
    };

    if exit_ok {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn run_config_hash(paths: &[String]) -> Result<()> {
    let loaded = fray_config::load_layered_yaml(paths)?;
    println!("config_hash={}", loaded.config_hash);
    println!("{}", loaded.canonical_json);
    Ok(())
}

/// Builds a [`ControllerConfig`] and the nemesis generators named in
/// `config.nemesis`, runs the controller to completion, then checks every
/// round's history. Returns `true` iff setup succeeded and every round's
/// history is admissible under the workload's model.
async fn run_workload(
    config_paths: &[String],
    overrides: &ConfigOverrides,
    workload: Workload,
) -> Result<bool> {
    let (config, _) = fray_config::load_run_config(config_paths, overrides)
        .context("loading run configuration")?;

    let mut registry = Registry::new();
    registry.register_nemesis(Arc::new(ScriptedNemesis::new("kill"))).ok();
    registry.register_nemesis(Arc::new(ScriptedNemesis::new("drop"))).ok();

    let controller_config = ControllerConfig {
        nodes: config.nodes.clone(),
        db_name: config.db.clone(),
        request_count: config.request_count,
        round_time: config.run_time(),
        rounds: config.run_round,
        history_base: config.history.clone(),
    };

    let report = match workload {
        Workload::Register => {
            let fixture = RegisterFixture::new(0);
            registry.register_db(fixture.clone())?;
            let mut controller = build_controller(
                controller_config,
                Arc::new(registry),
                &RegisterFixtureClientCreator::new(fixture),
                &config,
            )?;
            controller.run().await?
        }
        Workload::Bank => {
            let fixture = BankFixture::new(fray_bank::DEFAULT_ACCOUNTS, fray_bank::DEFAULT_INITIAL_BALANCE);
            registry.register_db(fixture.clone())?;
            let mut controller = build_controller(
                controller_config,
                Arc::new(registry),
                &BankFixtureClientCreator::new(fixture),
                &config,
            )?;
            controller.run().await?
        }
        Workload::LongFork => {
            let fixture = LongForkFixture::new(10);
            registry.register_db(fixture.clone())?;
            let mut controller = build_controller(
                controller_config,
                Arc::new(registry),
                &LongForkFixtureClientCreator::new(fixture),
                &config,
            )?;
            controller.run().await?
        }
        Workload::CasRegister => {
            bail!("workload cas-register has no bundled fixture; use `fray check` against a history recorded elsewhere")
        }
    };

    report_rounds(&report);
    check_report(&report, workload, &config)
}

fn build_controller<CC>(
    controller_config: ControllerConfig,
    registry: Arc<Registry>,
    client_creator: &CC,
    config: &RunConfig,
) -> Result<Controller<CC>>
where
    CC: fray_core::client::ClientCreator,
    <CC::Client as fray_core::client::Client>::Request: serde::Serialize,
    <CC::Client as fray_core::client::Client>::Response:
        serde::Serialize + fray_core::operation::UnknownResponse,
{
    let mut controller = Controller::new(controller_config, registry, client_creator);
    for name in &config.nemesis {
        controller.add_nemesis_generator(parse_nemesis_generator(name, &config.db)?);
    }
    Ok(controller)
}

fn parse_nemesis_generator(name: &str, db: &str) -> Result<Box<dyn NemesisGenerator>> {
    let generator: Box<dyn NemesisGenerator> = match name {
        "random_kill" => Box::new(KillGenerator::new(db, Selection::Random)),
        "minor_kill" => Box::new(KillGenerator::new(db, Selection::Minor)),
        "major_kill" => Box::new(KillGenerator::new(db, Selection::Major)),
        "all_kill" => Box::new(KillGenerator::new(db, Selection::All)),
        "random_drop" => Box::new(DropGenerator::new(Selection::Random)),
        "minor_drop" => Box::new(DropGenerator::new(Selection::Minor)),
        "major_drop" => Box::new(DropGenerator::new(Selection::Major)),
        "all_drop" => Box::new(DropGenerator::new(Selection::All)),
        other => bail!("unknown nemesis generator {other:?}"),
    };
    Ok(generator)
}

fn report_rounds(report: &RunReport) {
    for round in &report.rounds {
        info!(
            round = round.round,
            requests = round.requests_issued,
            history = %round.history_path.display(),
            "round finished"
        );
    }
}

fn check_report(report: &RunReport, workload: Workload, config: &RunConfig) -> Result<bool> {
    let mut all_ok = true;
    for round in &report.rounds {
        let ok = match workload {
            Workload::Register => {
                let mut parser = RegisterParser;
                let entries = fray_history::read_events(&round.history_path, &mut parser)?;
                fray_checker::check(&RegisterModel::new(0), &entries)
            }
            Workload::Bank => match config.checker.parse::<CheckerName>()? {
                CheckerName::BankTso => {
                    let mut parser = BankParser;
                    let entries = fray_history::read_events(&round.history_path, &mut parser)?;
                    fray_bank::check_bank_tso(
                        fray_bank::DEFAULT_ACCOUNTS,
                        fray_bank::DEFAULT_INITIAL_BALANCE,
                        &entries,
                    )
                }
                _ => {
                    let mut parser = BankParser;
                    let entries = fray_history::read_events(&round.history_path, &mut parser)?;
                    fray_checker::check(
                        &BankModel::new(fray_bank::DEFAULT_ACCOUNTS, fray_bank::DEFAULT_INITIAL_BALANCE),
                        &entries,
                    )
                }
            },
            Workload::LongFork => {
                let mut parser = LongForkParser;
                let entries = fray_history::read_events(&round.history_path, &mut parser)?;
                fray_longfork::check_long_fork(&entries)?
            }
            Workload::CasRegister => unreachable!("no fixture for cas-register"),
        };

        if !ok {
            error!(round = round.round, "round failed its checker");
        }
        all_ok &= ok;
    }
    Ok(all_ok)
}

fn check_history(path: &PathBuf, workload: Workload, accounts: usize, initial_balance: i64) -> Result<bool> {
    let ok = match workload {
        Workload::Register => {
            let mut parser = RegisterParser;
            let entries = fray_history::read_events(path, &mut parser)?;
            fray_checker::check(&RegisterModel::new(0), &entries)
        }
        Workload::CasRegister => {
            let mut parser = CasRegisterParser;
            let entries = fray_history::read_events(path, &mut parser)?;
            fray_checker::check(&CasRegisterModel, &entries)
        }
        Workload::Bank => {
            let mut parser = BankParser;
            let entries = fray_history::read_events(path, &mut parser)?;
            fray_bank::check_bank_tso(accounts, initial_balance, &entries)
        }
        Workload::LongFork => {
            let mut parser = LongForkParser;
            let entries = fray_history::read_events(path, &mut parser)?;
            fray_longfork::check_long_fork(&entries)?
        }
    };

    println!("linearizable={ok}");
    Ok(ok)
}
