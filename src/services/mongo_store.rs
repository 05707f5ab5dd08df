use async_trait::async_trait;
use futures_util::StreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    options::{
        CollectionOptions, FindOneAndUpdateOptions, FindOptions, ReturnDocument, WriteConcern,
    },
    Collection, Database,
};
use serde::Deserialize;

use crate::{
    error::{is_duplicate_key, WatchError},
    models::{NewWatch, PriceSample, Statistics, Watch, WatchId},
};

use super::{
    symbols::normalize_symbol,
    watch_store::{duplicate_of, start_of_utc_day, validate_new_watch, WatchStore},
};

pub const WATCHES: &str = "watches";
pub const PRICE_SAMPLES: &str = "price_samples";
pub const COUNTERS: &str = "counters";

#[derive(Debug, Deserialize)]
struct Counter {
    seq: i64,
}

#[derive(Clone)]
pub struct MongoWatchStore {
    watches: Collection<Watch>,
    samples: Collection<PriceSample>,
    counters: Collection<Counter>,
}

impl MongoWatchStore {
    pub fn new(db: &Database) -> Self {
        // journaled writes: a mutation is on disk before we report success
        let opts = CollectionOptions::builder()
            .write_concern(WriteConcern::builder().journal(true).build())
            .build();

        Self {
            watches: db.collection_with_options(WATCHES, opts.clone()),
            samples: db.collection_with_options(PRICE_SAMPLES, opts.clone()),
            counters: db.collection_with_options(COUNTERS, opts),
        }
    }

    async fn next_watch_id(&self) -> Result<WatchId, WatchError> {
        let opts = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let counter = self
            .counters
            .find_one_and_update(doc! { "_id": WATCHES }, doc! { "$inc": { "seq": 1_i64 } }, opts)
            .await?
            .ok_or_else(|| WatchError::StoreUnavailable("id counter missing after upsert".into()))?;

        Ok(WatchId(counter.seq))
    }

    async fn collect_watches(
        &self,
        filter: Document,
        opts: FindOptions,
    ) -> Result<Vec<Watch>, WatchError> {
        let mut cursor = self.watches.find(filter, opts).await?;

        let mut out: Vec<Watch> = Vec::new();
        while let Some(res) = cursor.next().await {
            out.push(res?);
        }
        Ok(out)
    }
}

#[async_trait]
impl WatchStore for MongoWatchStore {
    async fn add_watch(&self, new: NewWatch) -> Result<Watch, WatchError> {
        let new = validate_new_watch(new)?;

        let existing = self
            .watches
            .find_one(
                doc! {
                    "owner": &new.owner,
                    "symbol": &new.symbol,
                    "target_price": new.target_price,
                    "direction": new.direction.as_str(),
                    "active": true,
                },
                None,
            )
            .await?;
        if existing.is_some() {
            return Err(duplicate_of(&new));
        }

        let id = self.next_watch_id().await?;
        let watch = Watch::from_new(id, new);

        // the unique partial index catches a racing insert that passed the check above
        match self.watches.insert_one(&watch, None).await {
            Ok(_) => Ok(watch),
            Err(e) if is_duplicate_key(&e) => Err(WatchError::Duplicate {
                symbol: watch.symbol,
                target_price: watch.target_price,
                direction: watch.direction,
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_watches(&self, owner: &str) -> Result<Vec<Watch>, WatchError> {
        let opts = FindOptions::builder()
            .sort(doc! { "created_at": -1, "_id": -1 })
            .build();

        self.collect_watches(doc! { "owner": owner, "active": true }, opts)
            .await
    }

    async fn remove_watch(&self, owner: &str, id: WatchId) -> Result<(), WatchError> {
        let res = self
            .watches
            .update_one(
                doc! { "_id": id.0, "owner": owner, "active": true },
                doc! { "$set": { "active": false } },
                None,
            )
            .await?;

        if res.matched_count == 0 {
            return Err(WatchError::NotFound(id));
        }
        Ok(())
    }

    async fn list_active_watches(&self) -> Result<Vec<Watch>, WatchError> {
        let opts = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        self.collect_watches(doc! { "active": true }, opts).await
    }

    async fn record_check(&self, id: WatchId, checked_at: i64) -> Result<(), WatchError> {
        let res = self
            .watches
            .update_one(
                doc! { "_id": id.0 },
                doc! { "$set": { "last_checked_at": checked_at } },
                None,
            )
            .await?;

        if res.matched_count == 0 {
            return Err(WatchError::NotFound(id));
        }
        Ok(())
    }

    async fn record_alert(&self, id: WatchId, alerted_at: i64) -> Result<(), WatchError> {
        let res = self
            .watches
            .update_one(
                doc! { "_id": id.0 },
                doc! {
                    "$set": { "last_alerted_at": alerted_at },
                    "$inc": { "alert_count": 1_i64 },
                },
                None,
            )
            .await?;

        if res.matched_count == 0 {
            return Err(WatchError::NotFound(id));
        }
        Ok(())
    }

    async fn append_price_sample(&self, sample: PriceSample) -> Result<(), WatchError> {
        self.samples.insert_one(&sample, None).await?;
        Ok(())
    }

    async fn recent_prices(&self, symbol: &str, limit: usize) -> Result<Vec<PriceSample>, WatchError> {
        let sym = normalize_symbol(symbol);
        let opts = FindOptions::builder()
            .sort(doc! { "observed_at": -1, "_id": -1 })
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .build();

        let mut cursor = self.samples.find(doc! { "symbol": &sym }, opts).await?;

        let mut out: Vec<PriceSample> = Vec::new();
        while let Some(res) = cursor.next().await {
            out.push(res?);
        }
        Ok(out)
    }

    async fn statistics(&self, now: i64) -> Result<Statistics, WatchError> {
        let day_start = start_of_utc_day(now);

        let active_watch_count = self
            .watches
            .count_documents(doc! { "active": true }, None)
            .await?;

        let alerts_sent_today = self
            .watches
            .count_documents(
                doc! {
                    "active": true,
                    "last_alerted_at": { "$gte": day_start, "$lt": day_start + 86_400 },
                },
                None,
            )
            .await?;

        let pipeline = vec![
            doc! { "$match": { "active": true } },
            doc! { "$group": { "_id": Bson::Null, "total": { "$sum": "$alert_count" } } },
        ];
        let mut cursor = self.watches.aggregate(pipeline, None).await?;

        let mut alerts_sent_total = 0_i64;
        if let Some(res) = cursor.next().await {
            alerts_sent_total = match res?.get("total") {
                Some(Bson::Int64(n)) => *n,
                Some(Bson::Int32(n)) => i64::from(*n),
                Some(Bson::Double(n)) => *n as i64,
                _ => 0,
            };
        }

        Ok(Statistics {
            active_watch_count,
            alerts_sent_today,
            alerts_sent_total,
        })
    }
}
