pub mod cancel;
pub mod client;
pub mod db;
pub mod error;
pub mod model;
pub mod nemesis;
pub mod operation;

pub use cancel::CancelToken;
pub use client::{Client, ClientCreator, NoopClient, NoopClientCreator};
pub use db::{Db, NoopDb};
pub use error::FrayError;
pub use model::Model;
pub use nemesis::{Nemesis, NoopNemesis};
pub use operation::{Action, HistoryEntry, NemesisOperation, Operation, UnknownResponse};
