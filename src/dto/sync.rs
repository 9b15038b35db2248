use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Normalized abandoned-cart record as handed to the marketing service.
/// Computed per request; totals reflect the tax and pricing configuration at
/// read time.
#[derive(Debug, Serialize, ToSchema)]
pub struct EnrichedCartPayload {
    pub cart_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub newsletter: bool,
    pub language: String,
    pub birthday: Option<NaiveDate>,
    pub currency_code: String,
    /// Tax-inclusive cart total in major currency units.
    pub order_total: f64,
    /// Deep link that resumes checkout for this cart.
    pub checkout_url: String,
    pub lines: Vec<CartLinePayload>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLinePayload {
    pub product_id: Uuid,
    /// `"{product_id}-{attribute_id}"` when the line selects a variant,
    /// plain `"{product_id}"` otherwise.
    pub product_variant_id: String,
    pub quantity: i32,
    /// Tax-adjusted unit price in major currency units.
    pub price: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AbandonedCartList {
    pub items: Vec<EnrichedCartPayload>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkSyncedRequest {
    pub cart_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkSyncedData {
    pub marked: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RemainingCount {
    pub remaining: i64,
}
