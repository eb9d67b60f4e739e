use thiserror::Error;

use crate::instrument::Pair;

/// An order the matcher refuses to touch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("order `{id}` has zero amount")]
    ZeroAmount { id: String },
    #[error("order `{id}` is for {got}, book trades {expected}")]
    WrongInstrument { id: String, expected: Pair, got: Pair },
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error("no book for instrument `{0}`")]
    UnknownInstrument(String),
    /// A previous call panicked while holding the book lock.
    #[error("book for {0} is poisoned")]
    Poisoned(Pair),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode trade: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("pipeline needs at least one worker")]
    NoWorkers,
    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
