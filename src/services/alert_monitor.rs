use std::{collections::BTreeMap, panic::AssertUnwindSafe, sync::Arc, time::Duration};

use chrono::Utc;
use futures_util::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, error, info, warn};

use crate::{
    error::{QuoteError, WatchError},
    models::{Quote, Watch},
    render,
};

use super::{
    cooldown::{CooldownPolicy, DEFAULT_COOLDOWN},
    evaluator,
    notifier::NotificationSink,
    quote_source::QuoteSource,
    watch_store::WatchStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    pub cooldown: Duration,
    pub quote_timeout: Duration,
    pub error_backoff: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(300),
            cooldown: DEFAULT_COOLDOWN,
            quote_timeout: Duration::from_secs(10),
            error_backoff: Duration::from_secs(60),
        }
    }
}

/// Per-start overrides, in seconds. Missing fields keep the current value.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ConfigOverrides {
    pub poll_interval_secs: Option<u64>,
    pub cooldown_secs: Option<u64>,
    pub quote_timeout_secs: Option<u64>,
    pub error_backoff_secs: Option<u64>,
}

impl MonitorConfig {
    pub fn apply(&mut self, o: ConfigOverrides) {
        if let Some(s) = o.poll_interval_secs {
            self.poll_interval = Duration::from_secs(s.max(1));
        }
        if let Some(s) = o.cooldown_secs {
            self.cooldown = Duration::from_secs(s);
        }
        if let Some(s) = o.quote_timeout_secs {
            self.quote_timeout = Duration::from_secs(s.max(1));
        }
        if let Some(s) = o.error_backoff_secs {
            self.error_backoff = Duration::from_secs(s.max(1));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorState {
    Idle,
    Running,
    Stopping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub state: MonitorState,
    pub poll_interval_secs: u64,
    pub cooldown_secs: u64,
    pub quote_timeout_secs: u64,
    pub error_backoff_secs: u64,
    pub cycles_completed: u64,
    pub last_cycle_at: Option<i64>,
}

/// What one sweep did. Counters only; every decision is already persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub watches: usize,
    pub symbols: usize,
    pub quotes_failed: usize,
    pub triggered: usize,
    pub alerts_sent: usize,
    pub suppressed: usize,
    pub delivery_failures: usize,
    pub store_errors: usize,
    pub panics: usize,
}

#[derive(Default)]
struct CycleCounters {
    completed: u64,
    last_at: Option<i64>,
}

struct RunningTask {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Periodic price sweep over every active watch.
///
/// Holds no authoritative state: each cycle re-reads the store and fetches fresh quotes,
/// so it can be stopped and restarted at any time.
pub struct AlertMonitor {
    store: Arc<dyn WatchStore>,
    quotes: Arc<dyn QuoteSource>,
    sink: Arc<dyn NotificationSink>,
    config: Mutex<MonitorConfig>,
    state: Mutex<MonitorState>,
    counters: Mutex<CycleCounters>,
    task: tokio::sync::Mutex<Option<RunningTask>>,
}

impl AlertMonitor {
    pub fn new(
        store: Arc<dyn WatchStore>,
        quotes: Arc<dyn QuoteSource>,
        sink: Arc<dyn NotificationSink>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            store,
            quotes,
            sink,
            config: Mutex::new(config),
            state: Mutex::new(MonitorState::Idle),
            counters: Mutex::new(CycleCounters::default()),
            task: tokio::sync::Mutex::new(None),
        }
    }

    pub fn config(&self) -> MonitorConfig {
        *self.config.lock()
    }

    pub fn state(&self) -> MonitorState {
        *self.state.lock()
    }

    pub fn status(&self) -> MonitorStatus {
        let config = self.config();
        let counters = self.counters.lock();
        MonitorStatus {
            state: self.state(),
            poll_interval_secs: config.poll_interval.as_secs(),
            cooldown_secs: config.cooldown.as_secs(),
            quote_timeout_secs: config.quote_timeout.as_secs(),
            error_backoff_secs: config.error_backoff.as_secs(),
            cycles_completed: counters.completed,
            last_cycle_at: counters.last_at,
        }
    }

    /// Spawns the polling loop. Starting a running monitor changes nothing, and neither does
    /// starting one whose previous loop has been told to stop but is still finishing a cycle.
    pub async fn start(self: &Arc<Self>, overrides: Option<ConfigOverrides>) -> StartOutcome {
        let mut task = self.task.lock().await;
        if task.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            return StartOutcome::AlreadyRunning;
        }

        if let Some(o) = overrides {
            self.config.lock().apply(o);
        }
        let config = self.config();

        let (stop_tx, stop_rx) = watch::channel(false);
        *self.state.lock() = MonitorState::Running;

        let me = Arc::clone(self);
        let handle = tokio::spawn(async move {
            Arc::clone(&me).run_loop(stop_rx).await;
            *me.state.lock() = MonitorState::Idle;
        });
        *task = Some(RunningTask { stop_tx, handle });

        info!(
            poll_interval_secs = config.poll_interval.as_secs(),
            cooldown_secs = config.cooldown.as_secs(),
            "alert monitor started"
        );
        StartOutcome::Started
    }

    /// Signals the loop and waits for the in-flight cycle, if any, to finish.
    ///
    /// The task stays in its slot until the join completes, so a caller that gives up
    /// waiting leaves a stopping loop behind rather than an untracked one.
    pub async fn stop(&self) -> StopOutcome {
        let mut task = self.task.lock().await;
        let Some(running) = task.as_mut() else {
            return StopOutcome::NotRunning;
        };
        if running.handle.is_finished() {
            *task = None;
            return StopOutcome::NotRunning;
        }

        *self.state.lock() = MonitorState::Stopping;
        let _ = running.stop_tx.send(true);

        let joined = (&mut running.handle).await;
        *task = None;
        if let Err(e) = joined {
            warn!(error = %e, "alert monitor task ended abnormally");
        }

        *self.state.lock() = MonitorState::Idle;
        info!("alert monitor stopped");
        StopOutcome::Stopped
    }

    async fn run_loop(self: Arc<Self>, mut stop_rx: watch::Receiver<bool>) {
        loop {
            if *stop_rx.borrow() {
                break;
            }

            let config = self.config();
            let now = Utc::now().timestamp();

            // the stop signal is only looked at between cycles
            let outcome = AssertUnwindSafe(self.run_cycle(now)).catch_unwind().await;
            let pause = match outcome {
                Ok(Ok(report)) => {
                    info!(
                        watches = report.watches,
                        symbols = report.symbols,
                        alerts_sent = report.alerts_sent,
                        suppressed = report.suppressed,
                        quotes_failed = report.quotes_failed,
                        panics = report.panics,
                        "alert cycle done"
                    );
                    config.poll_interval
                }
                Ok(Err(e)) => {
                    error!(
                        error = %e,
                        backoff_secs = config.error_backoff.as_secs(),
                        "alert cycle failed"
                    );
                    config.error_backoff
                }
                Err(_) => {
                    error!(
                        backoff_secs = config.error_backoff.as_secs(),
                        "alert cycle panicked"
                    );
                    config.error_backoff
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                res = stop_rx.changed() => {
                    if res.is_err() {
                        break;
                    }
                }
            }
        }
    }

    /// One full sweep at time `now` (unix seconds).
    ///
    /// Only a failure to read the active watches is returned. Errors and panics per symbol
    /// or per watch are logged, counted in the report and left for the next cycle.
    pub async fn run_cycle(&self, now: i64) -> Result<CycleReport, WatchError> {
        let config = self.config();
        let cooldown = CooldownPolicy::new(config.cooldown);

        let watches = self.store.list_active_watches().await?;
        let mut report = CycleReport {
            watches: watches.len(),
            ..CycleReport::default()
        };

        // one quote per symbol per cycle
        let mut by_symbol: BTreeMap<String, Vec<Watch>> = BTreeMap::new();
        for w in watches {
            by_symbol.entry(w.symbol.clone()).or_default().push(w);
        }
        report.symbols = by_symbol.len();

        for (sym, group) in by_symbol {
            let fetched = AssertUnwindSafe(self.fetch_quote(&sym, config.quote_timeout))
                .catch_unwind()
                .await;
            let quote = match fetched {
                Ok(Ok(q)) => q,
                Ok(Err(e)) => {
                    warn!(symbol = %sym, watches = group.len(), error = %e, "quote unavailable, skipping");
                    report.quotes_failed += 1;
                    continue;
                }
                Err(_) => {
                    error!(symbol = %sym, watches = group.len(), "quote source panicked, skipping");
                    report.panics += 1;
                    continue;
                }
            };

            if let Err(e) = self.store.append_price_sample(quote.to_sample()).await {
                warn!(symbol = %sym, error = %e, "failed to record price sample");
                report.store_errors += 1;
            }

            for watch in &group {
                let handled = AssertUnwindSafe(self.process_watch(watch, &quote, now, &cooldown, &mut report))
                    .catch_unwind()
                    .await;
                if handled.is_err() {
                    error!(watch_id = %watch.id, symbol = %watch.symbol, "watch processing panicked");
                    report.panics += 1;
                }
            }
        }

        let mut counters = self.counters.lock();
        counters.completed += 1;
        counters.last_at = Some(now);

        Ok(report)
    }

    async fn fetch_quote(&self, symbol: &str, timeout: Duration) -> Result<Quote, QuoteError> {
        let mut quote = tokio::time::timeout(timeout, self.quotes.get_quote(symbol, timeout))
            .await
            .map_err(|_| QuoteError::Timeout(timeout))??;

        if !quote.price.is_finite() || quote.price <= 0.0 {
            return Err(QuoteError::Unavailable(format!(
                "unusable price {} for {symbol}",
                quote.price
            )));
        }

        quote.symbol = symbol.to_string();
        Ok(quote)
    }

    async fn process_watch(
        &self,
        watch: &Watch,
        quote: &Quote,
        now: i64,
        cooldown: &CooldownPolicy,
        report: &mut CycleReport,
    ) {
        if evaluator::should_trigger(watch, Some(quote)) {
            report.triggered += 1;

            if !cooldown.may_notify(watch, now) {
                debug!(watch_id = %watch.id, symbol = %watch.symbol, "in cooldown, not notifying");
                report.suppressed += 1;
            } else {
                let text = render::alert_message(watch, quote);
                match self.sink.send(&watch.destination, &text).await {
                    Ok(()) => match self.store.record_alert(watch.id, now).await {
                        Ok(()) => {
                            info!(
                                watch_id = %watch.id,
                                symbol = %watch.symbol,
                                price = quote.price,
                                target = watch.target_price,
                                "alert sent"
                            );
                            report.alerts_sent += 1;
                        }
                        Err(e) => {
                            error!(watch_id = %watch.id, error = %e, "alert delivered but not recorded");
                            report.store_errors += 1;
                        }
                    },
                    Err(e) => {
                        // alert state untouched, so the next cycle tries again
                        warn!(watch_id = %watch.id, destination = %watch.destination, error = %e, "alert delivery failed");
                        report.delivery_failures += 1;
                    }
                }
            }
        }

        if let Err(e) = self.store.record_check(watch.id, now).await {
            warn!(watch_id = %watch.id, error = %e, "failed to record check");
            report.store_errors += 1;
        }
    }
}
