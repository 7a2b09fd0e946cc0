//! Typed error taxonomy shared by the engine crates.
//!
//! `anyhow` remains at the process boundary (`main`); everywhere a caller
//! might want to branch on *why* something failed, it gets a `GameError`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("framing error: {0}")]
    Framing(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("backpressure: queue full")]
    Backpressure,

    #[error("handler panicked: {0}")]
    HandlerPanic(String),

    #[error("script error: {0}")]
    Script(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("wal replay failed: {0}")]
    WalReplay(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("not found")]
    NotFound,

    #[error("invalid state: {0}")]
    InvalidState(String),
}

pub type GameResult<T> = Result<T, GameError>;
