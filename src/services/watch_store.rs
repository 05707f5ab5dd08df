use async_trait::async_trait;

use crate::{
    error::WatchError,
    models::{NewWatch, PriceSample, Statistics, Watch, WatchId},
};

use super::symbols::normalize_symbol;

/// Durable home of watches and the price history log.
///
/// Per-row writes must be serialized by the implementation: `record_check` and
/// `record_alert` never write `active`, so they cannot undo a concurrent `remove_watch`,
/// and `record_alert` bumps `alert_count` in a single atomic update.
#[async_trait]
pub trait WatchStore: Send + Sync {
    /// Validates and normalizes `new`, rejects duplicates of an active watch, and
    /// persists it with `active = true` and `alert_count = 0`.
    async fn add_watch(&self, new: NewWatch) -> Result<Watch, WatchError>;

    /// Active watches of `owner`, newest first.
    async fn list_watches(&self, owner: &str) -> Result<Vec<Watch>, WatchError>;

    /// Soft delete. `NotFound` unless an active watch with this id belongs to `owner`.
    async fn remove_watch(&self, owner: &str, id: WatchId) -> Result<(), WatchError>;

    /// Active watches of every owner, by id.
    async fn list_active_watches(&self) -> Result<Vec<Watch>, WatchError>;

    async fn record_check(&self, id: WatchId, checked_at: i64) -> Result<(), WatchError>;

    async fn record_alert(&self, id: WatchId, alerted_at: i64) -> Result<(), WatchError>;

    async fn append_price_sample(&self, sample: PriceSample) -> Result<(), WatchError>;

    /// Latest samples for a (normalized) symbol, newest first.
    async fn recent_prices(&self, symbol: &str, limit: usize) -> Result<Vec<PriceSample>, WatchError>;

    async fn statistics(&self, now: i64) -> Result<Statistics, WatchError>;
}

/// Shared input checks for every store implementation.
pub fn validate_new_watch(mut new: NewWatch) -> Result<NewWatch, WatchError> {
    if !new.target_price.is_finite() || new.target_price <= 0.0 {
        return Err(WatchError::Validation(
            "target price must be a positive number".to_string(),
        ));
    }

    new.owner = new.owner.trim().to_string();
    new.destination = new.destination.trim().to_string();
    if new.owner.is_empty() {
        return Err(WatchError::Validation("missing owner".to_string()));
    }
    if new.destination.is_empty() {
        return Err(WatchError::Validation("missing destination".to_string()));
    }

    new.symbol = normalize_symbol(&new.symbol);
    if new.symbol.is_empty() {
        return Err(WatchError::Validation("missing symbol".to_string()));
    }

    Ok(new)
}

pub(crate) fn duplicate_of(new: &NewWatch) -> WatchError {
    WatchError::Duplicate {
        symbol: new.symbol.clone(),
        target_price: new.target_price,
        direction: new.direction,
    }
}

/// Midnight UTC of the day containing `now`, in unix seconds.
pub(crate) fn start_of_utc_day(now: i64) -> i64 {
    now - now.rem_euclid(86_400)
}
