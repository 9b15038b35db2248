use utoipa::{OpenApi, openapi::OpenApi as OpenApiSpec};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::sync::{
        AbandonedCartList, CartLinePayload, EnrichedCartPayload, MarkSyncedData,
        MarkSyncedRequest, RemainingCount,
    },
    response::{ApiResponse, Meta},
    routes::{health, params, sync},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        sync::list_abandoned_carts,
        sync::count_remaining,
        sync::mark_synced,
    ),
    components(
        schemas(
            AbandonedCartList,
            CartLinePayload,
            EnrichedCartPayload,
            MarkSyncedData,
            MarkSyncedRequest,
            RemainingCount,
            params::SyncSelection,
            params::RemainingQuery,
            Meta,
            ApiResponse<AbandonedCartList>,
            ApiResponse<MarkSyncedData>,
            ApiResponse<RemainingCount>,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Sync", description = "Abandoned-cart delta selection and sync state"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
