use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Per-shop sync provisioning. A shop without a row here cannot be synced.
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ShopSettings {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub tax_id: Option<Uuid>,
    /// Set once the shop has completed a full cart sync pass; gates the
    /// stale-only filter on selection.
    pub carts_synced_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Tax {
    pub id: Uuid,
    pub name: String,
    /// Percentage, e.g. 20.0 for a 20% rate.
    pub rate: f64,
    pub active: bool,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Currency {
    pub id: Uuid,
    pub iso_code: String,
    pub is_default: bool,
}
