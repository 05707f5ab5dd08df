use std::time::Duration;

use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

use crate::models::{Direction, WatchId};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("an active watch on {symbol} {direction} {target_price} already exists")]
    Duplicate {
        symbol: String,
        target_price: f64,
        direction: Direction,
    },

    #[error("watch {0} not found")]
    NotFound(WatchId),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<mongodb::error::Error> for WatchError {
    fn from(e: mongodb::error::Error) -> Self {
        WatchError::StoreUnavailable(e.to_string())
    }
}

pub(crate) fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    match e.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(we)) => we.code == DUPLICATE_KEY,
        _ => false,
    }
}

#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("quote timed out after {0:?}")]
    Timeout(Duration),

    #[error("quote unavailable: {0}")]
    Unavailable(String),

    #[error("quote request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed quote response: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("delivery rejected: {0}")]
    Rejected(String),

    #[error("delivery request failed: {0}")]
    Http(#[from] reqwest::Error),
}
