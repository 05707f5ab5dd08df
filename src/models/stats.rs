use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub active_watch_count: u64,
    pub alerts_sent_today: u64,
    pub alerts_sent_total: i64,
}
