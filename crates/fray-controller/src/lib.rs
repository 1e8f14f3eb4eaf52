//! Orchestration engine (spec §4.6): drives one workload's clients against
//! the cluster under test, recording every call/return to a per-round
//! history file while a nemesis dispatcher injects faults in the
//! background.
//!
//! Grounded in `original_source/pkg/control/control.go`'s `Controller`
//! (`NewController`, `Run`, `setUpDB`/`tearDownDB`, `onClientLoop`,
//! `dispatchNemesis`/`onNemesisLoop`), generalized from one fixed run to
//! `fray-config`'s round-based configuration and restructured around
//! `fray-registry`'s `Db`/`Nemesis` lookup instead of the original's
//! package-level globals. The struct/config/report shape follows
//! `mqk-testkit::orchestrator::Orchestrator`.

mod controller;
mod nemesis_dispatcher;
mod worker;

pub use controller::{Controller, ControllerConfig, RoundReport, RunReport};
