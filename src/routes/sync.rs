use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::sync::{AbandonedCartList, MarkSyncedData, MarkSyncedRequest, RemainingCount},
    error::AppResult,
    response::{ApiResponse, Meta},
    routes::params::{RemainingQuery, SyncSelection},
    services::{cart_sync, sync_state},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shops/{shop_id}/carts", get(list_abandoned_carts))
        .route("/shops/{shop_id}/carts/count", get(count_remaining))
        .route("/carts/mark-synced", post(mark_synced))
}

#[utoipa::path(
    get,
    path = "/api/sync/shops/{shop_id}/carts",
    params(
        ("shop_id" = Uuid, Path, description = "Shop ID"),
        ("offset" = Option<i64>, Query, description = "Rows to skip, default 0"),
        ("limit" = Option<i64>, Query, description = "Page size; 0 or absent means unbounded"),
        ("remaining" = Option<bool>, Query, description = "Only carts changed since their last sync"),
    ),
    responses(
        (status = 200, description = "Enriched abandoned carts eligible for sync", body = ApiResponse<AbandonedCartList>),
        (status = 409, description = "Shop is not provisioned for cart sync"),
    ),
    tag = "Sync"
)]
pub async fn list_abandoned_carts(
    State(state): State<AppState>,
    Path(shop_id): Path<Uuid>,
    Query(selection): Query<SyncSelection>,
) -> AppResult<Json<ApiResponse<AbandonedCartList>>> {
    let (offset, limit, remaining) = selection.normalize();

    let items = cart_sync::select_carts(&state, shop_id, offset, limit, remaining).await?;
    let total = sync_state::count_remaining(&state.pool, shop_id, remaining).await?;

    let meta = Meta::new(offset, limit, total);
    let data = AbandonedCartList { items };

    Ok(Json(ApiResponse::success("Abandoned carts", data, Some(meta))))
}

#[utoipa::path(
    get,
    path = "/api/sync/shops/{shop_id}/carts/count",
    params(
        ("shop_id" = Uuid, Path, description = "Shop ID"),
        ("remaining" = Option<bool>, Query, description = "Only carts changed since their last sync"),
    ),
    responses(
        (status = 200, description = "Number of carts eligible for sync", body = ApiResponse<RemainingCount>),
    ),
    tag = "Sync"
)]
pub async fn count_remaining(
    State(state): State<AppState>,
    Path(shop_id): Path<Uuid>,
    Query(query): Query<RemainingQuery>,
) -> AppResult<Json<ApiResponse<RemainingCount>>> {
    let remaining = query.remaining.unwrap_or(false);
    let count = sync_state::count_remaining(&state.pool, shop_id, remaining).await?;

    Ok(Json(ApiResponse::success(
        "Remaining carts",
        RemainingCount { remaining: count },
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    post,
    path = "/api/sync/carts/mark-synced",
    request_body = MarkSyncedRequest,
    responses(
        (status = 200, description = "Batch recorded as synced", body = ApiResponse<MarkSyncedData>),
        (status = 400, description = "Empty batch"),
    ),
    tag = "Sync"
)]
pub async fn mark_synced(
    State(state): State<AppState>,
    Json(payload): Json<MarkSyncedRequest>,
) -> AppResult<Json<ApiResponse<MarkSyncedData>>> {
    let marked = sync_state::mark_synced(&state.orm, &payload.cart_ids).await?;

    Ok(Json(ApiResponse::success(
        "Marked synced",
        MarkSyncedData { marked },
        Some(Meta::empty()),
    )))
}
