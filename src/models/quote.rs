use serde::{Deserialize, Serialize};

use super::PriceSample;

/// A point-in-time observation handed back by a quote source. Never persisted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub volume: Option<i64>,
    pub observed_at: i64,
}

impl Quote {
    pub fn to_sample(&self) -> PriceSample {
        PriceSample {
            symbol: self.symbol.clone(),
            price: self.price,
            volume: self.volume,
            observed_at: self.observed_at,
        }
    }
}
