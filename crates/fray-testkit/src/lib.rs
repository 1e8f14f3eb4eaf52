//! In-memory `Db`/`Client`/`Nemesis` test doubles exercising the full
//! controller/recorder/checker pipeline without a real cluster, the way
//! `mqk-testkit`'s fixtures back `core-rs`'s integration tests.
//!
//! Each workload fixture here is an in-process stand-in for the database
//! under test: state lives behind an `Arc<Mutex<_>>` shared by every node's
//! `Client`, so concurrent workers actually race the way real nodes would,
//! which is what makes these fixtures useful for driving the controller and
//! checkers end to end in `tests/`.

pub mod bank_fixture;
pub mod longfork_fixture;
pub mod register_fixture;
pub mod scripted_nemesis;

pub use bank_fixture::{BankFixture, BankFixtureClientCreator};
pub use longfork_fixture::{LongForkFixture, LongForkFixtureClientCreator};
pub use register_fixture::{RegisterFixture, RegisterFixtureClientCreator};
pub use scripted_nemesis::ScriptedNemesis;
