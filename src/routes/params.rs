use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SyncSelection {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    pub remaining: Option<bool>,
}

impl SyncSelection {
    /// A limit of zero (or no limit at all) means unbounded.
    pub fn normalize(&self) -> (i64, Option<i64>, bool) {
        let offset = self.offset.unwrap_or(0).max(0);
        let limit = self.limit.filter(|l| *l > 0);
        let remaining = self.remaining.unwrap_or(false);
        (offset, limit, remaining)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemainingQuery {
    pub remaining: Option<bool>,
}
