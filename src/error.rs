use std::io;
use std::result::Result as StdResult;

use thiserror::Error;

/// Everything that can go wrong during a run. None of these abort the process.
#[derive(Error, Debug)]
pub enum Error {
    #[error("missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("sightings request failed: {0}")]
    Fetch(#[source] reqwest::Error),

    #[error("sightings API returned {status}: {body}")]
    FetchStatus { status: u16, body: String },

    #[error("malformed sightings response: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("{sink} post failed: {source}")]
    Notify {
        sink: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{sink} returned {status}: {body}")]
    NotifyStatus {
        sink: &'static str,
        status: u16,
        body: String,
    },

    #[error("local log write failed: {0}")]
    LocalLog(#[from] csv::Error),

    #[error("could not persist seen cache: {0}")]
    Persist(#[from] io::Error),
}

pub type Result<T> = StdResult<T, Error>;
