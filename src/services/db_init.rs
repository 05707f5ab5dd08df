use mongodb::{bson::doc, options::IndexOptions, Database, IndexModel};

use crate::error::WatchError;

use super::mongo_store::{PRICE_SAMPLES, WATCHES};

pub async fn ensure_indexes(db: &Database) -> Result<(), WatchError> {
    // watches: one active watch per (owner, symbol, target, direction)
    {
        let col = db.collection::<mongodb::bson::Document>(WATCHES);
        let model = IndexModel::builder()
            .keys(doc! { "owner": 1, "symbol": 1, "target_price": 1, "direction": 1 })
            .options(
                IndexOptions::builder()
                    .name("active_watch_unique".to_string())
                    .unique(true)
                    .partial_filter_expression(doc! { "active": true })
                    .build(),
            )
            .build();

        col.create_index(model, None).await?;
    }

    // watches: owner listing, newest first
    {
        let col = db.collection::<mongodb::bson::Document>(WATCHES);
        let model = IndexModel::builder()
            .keys(doc! { "owner": 1, "active": 1, "created_at": -1 })
            .build();

        col.create_index(model, None).await?;
    }

    // price_samples: history per symbol
    {
        let col = db.collection::<mongodb::bson::Document>(PRICE_SAMPLES);
        let model = IndexModel::builder()
            .keys(doc! { "symbol": 1, "observed_at": -1 })
            .build();

        col.create_index(model, None).await?;
    }

    Ok(())
}
