use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};
use uuid::Uuid;

use crate::{
    db::{DbPool, OrmConn},
    entity::sync_records::{ActiveModel as SyncRecordActive, Column as SyncCol, Entity as SyncRecords},
    error::{AppError, AppResult},
    services::cart_sync::ABANDONMENT_WINDOW_HOURS,
};

/// Number of carts currently eligible for (re-)synchronization.
///
/// This counts the cart/customer/sync-record join under the same eligibility
/// filter as selection, not rows in `sync_records`.
pub async fn count_remaining(pool: &DbPool, shop_id: Uuid, remaining: bool) -> AppResult<i64> {
    let cutoff = Utc::now() - Duration::hours(ABANDONMENT_WINDOW_HOURS);
    let stale_filter = remaining && carts_synced_marker(pool, shop_id).await?.is_some();

    let mut sql = String::from(
        r#"
        SELECT COUNT(c.id)
        FROM carts c
        INNER JOIN customers cu ON cu.id = c.customer_id
        LEFT JOIN sync_records sr ON sr.cart_id = c.id
        WHERE c.shop_id = $1
          AND c.updated_at > $2
          AND c.id NOT IN (SELECT cart_id FROM orders)
        "#,
    );
    if stale_filter {
        sql.push_str(" AND (sr.last_synced_at IS NULL OR sr.last_synced_at < c.updated_at)");
    }

    let total: (i64,) = sqlx::query_as(&sql)
        .bind(shop_id)
        .bind(cutoff)
        .fetch_one(pool)
        .await?;

    Ok(total.0)
}

/// Atomically replace the sync record of every cart in the batch with a fresh
/// one stamped at the current time. Delete and insert run in one transaction;
/// a failed batch leaves no mix of stale and fresh rows behind.
///
/// An empty batch is rejected so callers can tell "nothing to sync" apart
/// from a trivially successful call.
pub async fn mark_synced(orm: &OrmConn, cart_ids: &[Uuid]) -> AppResult<usize> {
    if cart_ids.is_empty() {
        return Err(AppError::EmptyBatch);
    }

    let now = Utc::now();
    let txn = orm.begin().await?;

    SyncRecords::delete_many()
        .filter(SyncCol::CartId.is_in(cart_ids.iter().copied()))
        .exec(&txn)
        .await?;

    let records = cart_ids.iter().map(|cart_id| SyncRecordActive {
        cart_id: Set(*cart_id),
        last_synced_at: Set(now.into()),
    });
    SyncRecords::insert_many(records).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(carts = cart_ids.len(), "marked carts as synced");
    Ok(cart_ids.len())
}

/// Per-shop "carts last synchronized" marker. Its presence gates the
/// stale-only clause of the eligibility filter.
async fn carts_synced_marker(
    pool: &DbPool,
    shop_id: Uuid,
) -> AppResult<Option<DateTime<Utc>>> {
    let row: Option<(Option<DateTime<Utc>>,)> =
        sqlx::query_as("SELECT carts_synced_at FROM shop_settings WHERE shop_id = $1")
            .bind(shop_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.and_then(|(marker,)| marker))
}
