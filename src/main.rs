use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use mongodb::Client;
use tracing_subscriber::EnvFilter;

use stockwatch::{
    config::{self, StoreBackend},
    routes,
    services::{
        alert_monitor::{AlertMonitor, StartOutcome},
        db_init,
        memory_store::MemoryWatchStore,
        mongo_store::MongoWatchStore,
        notifier::{LogNotifier, NotificationSink, TelegramNotifier},
        watch_store::WatchStore,
        yahoo::YahooQuoteClient,
    },
    AppState,
};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let settings = config::load();

    let (store, db) = match settings.store_backend {
        StoreBackend::Mongo => {
            let client = Client::with_uri_str(&settings.mongodb_uri)
                .await
                .context("failed to connect to MongoDB")?;
            let db = client.database(&settings.mongodb_db);

            db_init::ensure_indexes(&db)
                .await
                .context("failed to create indexes")?;

            let store: Arc<dyn WatchStore> = Arc::new(MongoWatchStore::new(&db));
            (store, Some(db))
        }
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store; watches will not survive a restart");
            let store: Arc<dyn WatchStore> = Arc::new(MemoryWatchStore::new());
            (store, None)
        }
    };

    let sink: Arc<dyn NotificationSink> = match &settings.telegram_bot_token {
        Some(token) => Arc::new(TelegramNotifier::new(&settings.telegram_api_base, token)),
        None => {
            tracing::warn!("TELEGRAM_BOT_TOKEN not set; alerts will only be logged");
            Arc::new(LogNotifier)
        }
    };
    let quotes = Arc::new(YahooQuoteClient::new(&settings.quote_api_base));

    let monitor = Arc::new(AlertMonitor::new(
        Arc::clone(&store),
        quotes,
        sink,
        settings.monitor,
    ));

    if settings.monitor_autostart && monitor.start(None).await == StartOutcome::AlreadyRunning {
        tracing::warn!("alert monitor was already running");
    }

    let state = AppState {
        store,
        monitor: Arc::clone(&monitor),
        db,
    };
    let app = routes::app(state);

    let ip = settings
        .host
        .parse::<std::net::IpAddr>()
        .with_context(|| format!("invalid HOST {:?}", settings.host))?;
    let addr = SocketAddr::from((ip, settings.port));
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("received Ctrl-C, shutting down");
        })
        .await?;

    monitor.stop().await;
    Ok(())
}
