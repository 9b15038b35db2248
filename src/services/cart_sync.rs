use chrono::{Duration, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::sync::{CartLinePayload, EnrichedCartPayload},
    error::{AppError, AppResult},
    models::{Currency, ShopSettings, Tax},
    recovery,
    state::AppState,
};

/// How far back a cart modification may lie and still count as abandoned.
/// The boundary is strict: a cart modified exactly 24 hours ago is out.
pub const ABANDONMENT_WINDOW_HOURS: i64 = 24;

#[derive(FromRow)]
struct CandidateCartRow {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    newsletter: bool,
    language: String,
    birthday: Option<NaiveDate>,
}

#[derive(FromRow)]
struct CartLineRow {
    product_id: Uuid,
    attribute_id: Option<Uuid>,
    quantity: i32,
    price: i64,
}

/// Select the page of abandoned carts currently eligible for synchronization
/// and enrich each with customer contact data, tax-adjusted totals, and a
/// checkout recovery link.
///
/// Every call re-queries current state; nothing is cached between calls.
/// With `remaining` set, carts whose watermark is at or past their last
/// modification are skipped, provided the shop has a "carts last
/// synchronized" marker. Before that marker exists everything in the recency
/// window is returned, so a first full pass sees every cart at least once.
pub async fn select_carts(
    state: &AppState,
    shop_id: Uuid,
    offset: i64,
    limit: Option<i64>,
    remaining: bool,
) -> AppResult<Vec<EnrichedCartPayload>> {
    let settings = shop_settings(&state.pool, shop_id)
        .await?
        .ok_or(AppError::ShopNotConfigured)?;

    let rows = candidate_carts(&state.pool, &settings, offset, limit, remaining).await?;
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let currency_code = default_currency_code(&state.pool).await?;
    let rate = tax_factor(tax_for(&state.pool, &settings).await?.as_ref());

    let mut payloads = Vec::with_capacity(rows.len());
    for row in rows {
        let line_rows = sqlx::query_as::<_, CartLineRow>(
            r#"
            SELECT cl.product_id, cl.attribute_id, cl.quantity, p.price
            FROM cart_lines cl
            INNER JOIN products p ON p.id = cl.product_id
            WHERE cl.cart_id = $1
            ORDER BY cl.created_at
            "#,
        )
        .bind(row.id)
        .fetch_all(&state.pool)
        .await?;

        let subtotal: i64 = line_rows
            .iter()
            .map(|line| line.price * i64::from(line.quantity))
            .sum();

        let lines = line_rows
            .into_iter()
            .map(|line| CartLinePayload {
                product_id: line.product_id,
                product_variant_id: variant_id(line.product_id, line.attribute_id),
                quantity: line.quantity,
                price: to_major(line.price) * rate,
            })
            .collect();

        let token = recovery::recovery_token(&state.config.site_secret, row.id);
        payloads.push(EnrichedCartPayload {
            cart_id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            newsletter: row.newsletter,
            language: row.language,
            birthday: row.birthday,
            currency_code: currency_code.clone(),
            order_total: to_major(subtotal) * rate,
            checkout_url: recovery::checkout_url(&state.config.storefront_url, row.id, &token),
            lines,
        });
    }

    tracing::debug!(shop_id = %shop_id, carts = payloads.len(), "selected abandoned carts");
    Ok(payloads)
}

async fn candidate_carts(
    pool: &DbPool,
    settings: &ShopSettings,
    offset: i64,
    limit: Option<i64>,
    remaining: bool,
) -> AppResult<Vec<CandidateCartRow>> {
    let cutoff = Utc::now() - Duration::hours(ABANDONMENT_WINDOW_HOURS);
    // Until the shop's first full pass is recorded, the stale filter is
    // skipped so bootstrap returns everything in the window.
    let stale_filter = remaining && settings.carts_synced_at.is_some();

    let mut sql = String::from(
        r#"
        SELECT c.id,
               cu.email, cu.first_name, cu.last_name, cu.newsletter, cu.language, cu.birthday
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

    let rows = if let Some(limit) = limit {
        sql.push_str(" LIMIT $3 OFFSET $4");
        sqlx::query_as::<_, CandidateCartRow>(&sql)
            .bind(settings.shop_id)
            .bind(cutoff)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
    } else {
        sql.push_str(" OFFSET $3");
        sqlx::query_as::<_, CandidateCartRow>(&sql)
            .bind(settings.shop_id)
            .bind(cutoff)
            .bind(offset)
            .fetch_all(pool)
            .await?
    };

    Ok(rows)
}

async fn shop_settings(pool: &DbPool, shop_id: Uuid) -> AppResult<Option<ShopSettings>> {
    let settings =
        sqlx::query_as::<_, ShopSettings>("SELECT * FROM shop_settings WHERE shop_id = $1")
            .bind(shop_id)
            .fetch_optional(pool)
            .await?;
    Ok(settings)
}

async fn tax_for(pool: &DbPool, settings: &ShopSettings) -> AppResult<Option<Tax>> {
    let Some(tax_id) = settings.tax_id else {
        return Ok(None);
    };
    let tax = sqlx::query_as::<_, Tax>("SELECT * FROM taxes WHERE id = $1")
        .bind(tax_id)
        .fetch_optional(pool)
        .await?;
    Ok(tax)
}

async fn default_currency_code(pool: &DbPool) -> AppResult<String> {
    let currency =
        sqlx::query_as::<_, Currency>("SELECT * FROM currencies WHERE is_default = TRUE")
            .fetch_optional(pool)
            .await?;
    // No default currency means the storefront is not provisioned for sync.
    currency
        .map(|currency| currency.iso_code)
        .ok_or(AppError::ShopNotConfigured)
}

/// Multiplier applied to every price. Inactive or missing taxes contribute
/// nothing.
pub fn tax_factor(tax: Option<&Tax>) -> f64 {
    match tax {
        Some(tax) if tax.active => 1.0 + tax.rate / 100.0,
        _ => 1.0,
    }
}

/// Variant identifier as the marketing service expects it: the attribute id
/// is appended only when the line actually selects a variant. A nil attribute
/// id counts as "no variant".
pub fn variant_id(product_id: Uuid, attribute_id: Option<Uuid>) -> String {
    match attribute_id.filter(|id| !id.is_nil()) {
        Some(attribute_id) => format!("{product_id}-{attribute_id}"),
        None => product_id.to_string(),
    }
}

/// Prices are stored in minor units; the outbound payload wants major units.
pub fn to_major(minor: i64) -> f64 {
    minor as f64 / 100.0
}
