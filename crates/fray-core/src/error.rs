use thiserror::Error;

/// The error taxonomy shared across the history, checker and controller
/// crates. Domain verdicts that are themselves the interesting result of a
/// call (a model violation, a gate refusal) are not routed through this
/// enum — only failures that mean the run could not proceed as asked.
#[derive(Debug, Error)]
pub enum FrayError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("history is missing a return for proc {0}")]
    MissingReturn(i64),

    #[error("history is missing an invoke for proc {0}")]
    MissingInvoke(i64),

    #[error("client error: {0}")]
    Client(String),

    #[error("nemesis error: {0}")]
    Nemesis(String),

    #[error("run was cancelled")]
    Cancelled,
}
