//! Process-local `WatchStore`. Nothing survives a restart, so this backs tests and
//! `STORE_BACKEND=memory` dev runs only.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::{
    error::WatchError,
    models::{NewWatch, PriceSample, Statistics, Watch, WatchId},
};

use super::{
    symbols::normalize_symbol,
    watch_store::{duplicate_of, start_of_utc_day, validate_new_watch, WatchStore},
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    watches: BTreeMap<WatchId, Watch>,
    samples: Vec<PriceSample>,
}

#[derive(Default)]
pub struct MemoryWatchStore {
    tables: RwLock<Tables>,
}

impl MemoryWatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored watch, including removed ones.
    pub fn all_watches(&self) -> Vec<Watch> {
        self.tables.read().watches.values().cloned().collect()
    }

    pub fn sample_count(&self) -> usize {
        self.tables.read().samples.len()
    }
}

#[async_trait]
impl WatchStore for MemoryWatchStore {
    async fn add_watch(&self, new: NewWatch) -> Result<Watch, WatchError> {
        let new = validate_new_watch(new)?;

        // check and insert under one lock so racing duplicates can't both land
        let mut t = self.tables.write();
        let exists = t
            .watches
            .values()
            .any(|w| w.same_intent(&new.owner, &new.symbol, new.target_price, new.direction));
        if exists {
            return Err(duplicate_of(&new));
        }

        t.next_id += 1;
        let id = WatchId(t.next_id);
        let watch = Watch::from_new(id, new);
        t.watches.insert(id, watch.clone());
        Ok(watch)
    }

    async fn list_watches(&self, owner: &str) -> Result<Vec<Watch>, WatchError> {
        let t = self.tables.read();
        let mut out: Vec<Watch> = t
            .watches
            .values()
            .filter(|w| w.active && w.owner == owner)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(out)
    }

    async fn remove_watch(&self, owner: &str, id: WatchId) -> Result<(), WatchError> {
        let mut t = self.tables.write();
        match t.watches.get_mut(&id) {
            Some(w) if w.active && w.owner == owner => {
                w.active = false;
                Ok(())
            }
            _ => Err(WatchError::NotFound(id)),
        }
    }

    async fn list_active_watches(&self) -> Result<Vec<Watch>, WatchError> {
        let t = self.tables.read();
        Ok(t.watches.values().filter(|w| w.active).cloned().collect())
    }

    async fn record_check(&self, id: WatchId, checked_at: i64) -> Result<(), WatchError> {
        let mut t = self.tables.write();
        let w = t.watches.get_mut(&id).ok_or(WatchError::NotFound(id))?;
        w.last_checked_at = Some(checked_at);
        Ok(())
    }

    async fn record_alert(&self, id: WatchId, alerted_at: i64) -> Result<(), WatchError> {
        let mut t = self.tables.write();
        let w = t.watches.get_mut(&id).ok_or(WatchError::NotFound(id))?;
        w.last_alerted_at = Some(alerted_at);
        w.alert_count += 1;
        Ok(())
    }

    async fn append_price_sample(&self, sample: PriceSample) -> Result<(), WatchError> {
        self.tables.write().samples.push(sample);
        Ok(())
    }

    async fn recent_prices(&self, symbol: &str, limit: usize) -> Result<Vec<PriceSample>, WatchError> {
        let sym = normalize_symbol(symbol);
        let t = self.tables.read();
        let mut out: Vec<PriceSample> = t
            .samples
            .iter()
            .rev()
            .filter(|s| s.symbol == sym)
            .cloned()
            .collect();
        // stable sort keeps insertion order (newest first) among equal timestamps
        out.sort_by(|a, b| b.observed_at.cmp(&a.observed_at));
        out.truncate(limit);
        Ok(out)
    }

    async fn statistics(&self, now: i64) -> Result<Statistics, WatchError> {
        let day_start = start_of_utc_day(now);
        let t = self.tables.read();

        let mut stats = Statistics::default();
        for w in t.watches.values().filter(|w| w.active) {
            stats.active_watch_count += 1;
            stats.alerts_sent_total += w.alert_count;
            if w.last_alerted_at.is_some_and(|at| at >= day_start && at < day_start + 86_400) {
                stats.alerts_sent_today += 1;
            }
        }
        Ok(stats)
    }
}
