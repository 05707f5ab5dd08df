use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub symbol: String,
    pub price: f64,

    #[serde(default)]
    pub volume: Option<i64>,

    pub observed_at: i64,
}
