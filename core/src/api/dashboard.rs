use super::{blocking, ApiResult, SharedContext};
use crate::reporting::DashboardStats;
use axum::{extract::State, Json};

pub async fn stats(State(ctx): State<SharedContext>) -> ApiResult<Json<DashboardStats>> {
    blocking(&ctx, "Failed to fetch dashboard stats", |c| {
        c.store.dashboard_stats()
    })
    .await
    .map(Json)
}
