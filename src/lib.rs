//! Library entrypoint for StockWatch.
//!
//! The binary only wires settings, storage and the HTTP listener together; everything
//! else lives here so integration tests under `tests/` can drive the store, the alert
//! monitor and the routers directly.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod models;

pub mod services;

#[path = "views/render.rs"]
pub mod render;

pub mod controllers;
pub mod routes;

use services::{alert_monitor::AlertMonitor, watch_store::WatchStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn WatchStore>,
    pub monitor: Arc<AlertMonitor>,
    // None when running on the in-memory store
    pub db: Option<mongodb::Database>,
}
