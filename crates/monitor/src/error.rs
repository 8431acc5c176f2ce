//! Errors surfaced by the monitor library.

use crate::guard::FatalCondition;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("node not ready after {0:?}")]
    NotReady(Duration),
    #[error("{0}")]
    Fatal(FatalCondition),
}

pub type Result<T, E = MonitorError> = std::result::Result<T, E>;
