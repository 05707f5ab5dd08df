use std::time::Duration;

use async_trait::async_trait;

use crate::{error::QuoteError, models::Quote};

/// Anything that can price a symbol. `Err` covers every flavour of "unavailable".
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn get_quote(&self, symbol: &str, timeout: Duration) -> Result<Quote, QuoteError>;
}
