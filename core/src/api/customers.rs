use super::{blocking, parse_id, rejected, ApiError, ApiJson, ApiResult, SharedContext};
use crate::{
    customer::{
        Activity, Customer, CustomerUpdate, NewActivity, NewCustomer, NewTier, Tier, TierUpdate,
        DEFAULT_ACTIVITY_LIMIT,
    },
    error::LoyaltyError,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

// ── Customers ─────────────────────────────────────────────────

pub async fn list(State(ctx): State<SharedContext>) -> ApiResult<Json<Vec<Customer>>> {
    blocking(&ctx, "Failed to fetch customers", |c| c.store.customers())
        .await
        .map(Json)
}

pub async fn get_one(
    State(ctx): State<SharedContext>,
    Path(raw): Path<String>,
) -> ApiResult<Json<Customer>> {
    let id = parse_id(&raw, "customer")?;
    blocking(&ctx, "Failed to fetch customer", move |c| {
        c.store
            .customer(id)?
            .ok_or_else(|| LoyaltyError::not_found("Customer", id))
    })
    .await
    .map(Json)
}

pub async fn create(
    State(ctx): State<SharedContext>,
    ApiJson(body): ApiJson<NewCustomer>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    body.validate().map_err(rejected)?;
    let customer = blocking(&ctx, "Failed to create customer", move |c| {
        let customer = c.store.insert_customer(&body)?;
        log::info!("customer {} created", customer.id);
        Ok(customer)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn update(
    State(ctx): State<SharedContext>,
    Path(raw): Path<String>,
    ApiJson(body): ApiJson<CustomerUpdate>,
) -> ApiResult<Json<Customer>> {
    let id = parse_id(&raw, "customer")?;
    body.validate().map_err(rejected)?;
    blocking(&ctx, "Failed to update customer", move |c| {
        c.store
            .update_customer(id, &body)?
            .ok_or_else(|| LoyaltyError::not_found("Customer", id))
    })
    .await
    .map(Json)
}

pub async fn remove(
    State(ctx): State<SharedContext>,
    Path(raw): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&raw, "customer")?;
    blocking(&ctx, "Failed to delete customer", move |c| {
        if c.store.delete_customer(id)? {
            Ok(())
        } else {
            Err(LoyaltyError::not_found("Customer", id))
        }
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn activities(
    State(ctx): State<SharedContext>,
    Path(raw): Path<String>,
) -> ApiResult<Json<Vec<Activity>>> {
    let id = parse_id(&raw, "customer")?;
    blocking(&ctx, "Failed to fetch customer activities", move |c| {
        c.store.customer_activities(id)
    })
    .await
    .map(Json)
}

// ── Activity ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<String>,
}

fn parse_limit(raw: Option<&str>) -> ApiResult<u32> {
    match raw {
        None => Ok(DEFAULT_ACTIVITY_LIMIT),
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| ApiError::BadRequest("Invalid limit parameter".to_string())),
    }
}

pub async fn recent_activities(
    State(ctx): State<SharedContext>,
    Query(query): Query<ActivityQuery>,
) -> ApiResult<Json<Vec<Activity>>> {
    let limit = parse_limit(query.limit.as_deref())?;
    blocking(&ctx, "Failed to fetch activities", move |c| {
        c.store.activities(limit)
    })
    .await
    .map(Json)
}

pub async fn create_activity(
    State(ctx): State<SharedContext>,
    ApiJson(body): ApiJson<NewActivity>,
) -> ApiResult<(StatusCode, Json<Activity>)> {
    let kind = body.validate().map_err(rejected)?;
    let activity = blocking(&ctx, "Failed to create activity", move |c| {
        c.store.insert_activity(
            body.customer_id,
            kind,
            body.amount.unwrap_or(0.0),
            body.reward_used.as_deref(),
            c.clock.now(),
        )
    })
    .await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

// ── Tiers ─────────────────────────────────────────────────────

pub async fn tiers(State(ctx): State<SharedContext>) -> ApiResult<Json<Vec<Tier>>> {
    blocking(&ctx, "Failed to fetch tiers", |c| c.store.tiers())
        .await
        .map(Json)
}

pub async fn create_tier(
    State(ctx): State<SharedContext>,
    ApiJson(body): ApiJson<NewTier>,
) -> ApiResult<(StatusCode, Json<Tier>)> {
    body.validate().map_err(rejected)?;
    let tier = blocking(&ctx, "Failed to create tier", move |c| {
        c.store.insert_tier(&body)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(tier)))
}

pub async fn update_tier(
    State(ctx): State<SharedContext>,
    Path(raw): Path<String>,
    ApiJson(body): ApiJson<TierUpdate>,
) -> ApiResult<Json<Tier>> {
    let id = parse_id(&raw, "tier")?;
    body.validate().map_err(rejected)?;
    blocking(&ctx, "Failed to update tier", move |c| {
        c.store
            .update_tier(id, &body)?
            .ok_or_else(|| LoyaltyError::not_found("Tier", id))
    })
    .await
    .map(Json)
}
