use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;

use crate::{error::QuoteError, models::Quote};

use super::{quote_source::QuoteSource, symbols::normalize_symbol};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

// the chart endpoint rejects requests without a browser-like agent
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

#[derive(Clone)]
pub struct YahooQuoteClient {
    http: Client,
    base_url: String,
}

impl YahooQuoteClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for YahooQuoteClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl QuoteSource for YahooQuoteClient {
    async fn get_quote(&self, symbol: &str, timeout: Duration) -> Result<Quote, QuoteError> {
        let sym = normalize_symbol(symbol);
        let url = format!("{}/v8/finance/chart/{}", self.base_url, sym);

        let res = self
            .http
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    QuoteError::Timeout(timeout)
                } else {
                    QuoteError::Http(e)
                }
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(QuoteError::Unavailable(format!("chart request failed: {status} {body}")));
        }

        let body = res
            .json::<ChartResponse>()
            .await
            .map_err(|e| QuoteError::Malformed(e.to_string()))?;

        quote_from_chart(&sym, body)
    }
}

fn quote_from_chart(symbol: &str, body: ChartResponse) -> Result<Quote, QuoteError> {
    let meta = body
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .map(|r| r.meta)
        .ok_or_else(|| QuoteError::Unavailable(format!("no chart data for {symbol}")))?;

    let price = match meta.regular_market_price {
        Some(p) if p.is_finite() && p > 0.0 => p,
        _ => return Err(QuoteError::Unavailable(format!("no market price for {symbol}"))),
    };

    Ok(Quote {
        symbol: symbol.to_string(),
        price,
        volume: meta.regular_market_volume,
        observed_at: meta
            .regular_market_time
            .unwrap_or_else(|| Utc::now().timestamp()),
    })
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    regular_market_volume: Option<i64>,
    // seconds since epoch
    regular_market_time: Option<i64>,
}
