use super::{blocking, rejected, ApiJson, ApiResult, SharedContext};
use crate::feedback::{Feedback, FeedbackStats, NewFeedback};
use axum::{extract::State, http::StatusCode, Json};

pub async fn list(State(ctx): State<SharedContext>) -> ApiResult<Json<Vec<Feedback>>> {
    blocking(&ctx, "Failed to fetch feedback", |c| c.store.feedback())
        .await
        .map(Json)
}

pub async fn create(
    State(ctx): State<SharedContext>,
    ApiJson(body): ApiJson<NewFeedback>,
) -> ApiResult<(StatusCode, Json<Feedback>)> {
    body.validate().map_err(rejected)?;
    let feedback = blocking(&ctx, "Failed to create feedback", move |c| {
        c.store.insert_feedback(&body, c.clock.now())
    })
    .await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}

pub async fn stats(State(ctx): State<SharedContext>) -> ApiResult<Json<FeedbackStats>> {
    blocking(&ctx, "Failed to fetch feedback stats", |c| {
        c.store.feedback_stats()
    })
    .await
    .map(Json)
}
