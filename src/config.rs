use std::{env, time::Duration};

use crate::services::{alert_monitor::MonitorConfig, notifier::TELEGRAM_API_BASE, yahoo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub mongodb_uri: String,
    pub mongodb_db: String,
    pub host: String,
    pub port: u16,

    pub store_backend: StoreBackend,

    pub quote_api_base: String,
    pub telegram_api_base: String,
    pub telegram_bot_token: Option<String>,

    pub monitor: MonitorConfig,
    pub monitor_autostart: bool,
}

fn env_secs(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

pub fn load() -> Settings {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    let mongodb_uri = env::var("MONGODB_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

    let mongodb_db = env::var("MONGODB_DB")
        .unwrap_or_else(|_| "stockwatch".to_string());

    let host = env::var("HOST")
        .unwrap_or_else(|_| "127.0.0.1".to_string());

    let port = env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let store_backend = match env::var("STORE_BACKEND").ok().as_deref().map(str::trim) {
        Some(v) if v.eq_ignore_ascii_case("memory") => StoreBackend::Memory,
        _ => StoreBackend::Mongo,
    };

    let quote_api_base = env::var("QUOTE_API_BASE")
        .unwrap_or_else(|_| yahoo::DEFAULT_BASE_URL.to_string());
    let telegram_api_base = env::var("TELEGRAM_API_BASE")
        .unwrap_or_else(|_| TELEGRAM_API_BASE.to_string());
    let telegram_bot_token = env::var("TELEGRAM_BOT_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty());

    let defaults = MonitorConfig::default();
    let monitor = MonitorConfig {
        poll_interval: env_secs("POLL_INTERVAL_SECS", defaults.poll_interval),
        cooldown: env_secs("ALERT_COOLDOWN_SECS", defaults.cooldown),
        quote_timeout: env_secs("QUOTE_TIMEOUT_SECS", defaults.quote_timeout),
        error_backoff: env_secs("ERROR_BACKOFF_SECS", defaults.error_backoff),
    };

    let monitor_autostart = env::var("MONITOR_AUTOSTART")
        .map(|v| !matches!(v.trim().to_lowercase().as_str(), "0" | "false" | "no" | "off"))
        .unwrap_or(true);

    Settings {
        mongodb_uri,
        mongodb_db,
        host,
        port,
        store_backend,
        quote_api_base,
        telegram_api_base,
        telegram_bot_token,
        monitor,
        monitor_autostart,
    }
}
