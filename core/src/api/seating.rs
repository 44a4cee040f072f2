use super::{blocking, parse_id, rejected, ApiJson, ApiResult, SharedContext};
use crate::{
    error::LoyaltyError,
    seating::{NewSession, NewTable, RestaurantTable, SessionUpdate, TableSession, TableUpdate},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

// ── Tables ────────────────────────────────────────────────────

pub async fn list_tables(
    State(ctx): State<SharedContext>,
) -> ApiResult<Json<Vec<RestaurantTable>>> {
    blocking(&ctx, "Failed to fetch tables", |c| c.store.tables())
        .await
        .map(Json)
}

pub async fn get_table(
    State(ctx): State<SharedContext>,
    Path(raw): Path<String>,
) -> ApiResult<Json<RestaurantTable>> {
    let id = parse_id(&raw, "table")?;
    blocking(&ctx, "Failed to fetch table", move |c| {
        c.store
            .table(id)?
            .ok_or_else(|| LoyaltyError::not_found("Table", id))
    })
    .await
    .map(Json)
}

pub async fn create_table(
    State(ctx): State<SharedContext>,
    ApiJson(body): ApiJson<NewTable>,
) -> ApiResult<(StatusCode, Json<RestaurantTable>)> {
    body.validate().map_err(rejected)?;
    let table = blocking(&ctx, "Failed to create table", move |c| {
        c.store.insert_table(&body)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(table)))
}

pub async fn update_table(
    State(ctx): State<SharedContext>,
    Path(raw): Path<String>,
    ApiJson(body): ApiJson<TableUpdate>,
) -> ApiResult<Json<RestaurantTable>> {
    let id = parse_id(&raw, "table")?;
    body.validate().map_err(rejected)?;
    blocking(&ctx, "Failed to update table", move |c| {
        c.store
            .update_table(id, &body)?
            .ok_or_else(|| LoyaltyError::not_found("Table", id))
    })
    .await
    .map(Json)
}

pub async fn remove_table(
    State(ctx): State<SharedContext>,
    Path(raw): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&raw, "table")?;
    blocking(&ctx, "Failed to delete table", move |c| {
        if c.store.delete_table(id)? {
            Ok(())
        } else {
            Err(LoyaltyError::not_found("Table", id))
        }
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Sessions ──────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct SessionQuery {
    pub active: Option<String>,
}

impl SessionQuery {
    fn active_only(&self) -> bool {
        matches!(self.active.as_deref(), Some("true") | Some("1"))
    }
}

pub async fn list_sessions(
    State(ctx): State<SharedContext>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Json<Vec<TableSession>>> {
    let active_only = query.active_only();
    blocking(&ctx, "Failed to fetch table sessions", move |c| {
        c.store.sessions(active_only)
    })
    .await
    .map(Json)
}

pub async fn create_session(
    State(ctx): State<SharedContext>,
    ApiJson(body): ApiJson<NewSession>,
) -> ApiResult<(StatusCode, Json<TableSession>)> {
    body.validate().map_err(rejected)?;
    let session = blocking(&ctx, "Failed to create table session", move |c| {
        let session = c.store.insert_session(&body, c.clock.now())?;
        log::info!("table {} seated (session {})", session.table_id, session.id);
        Ok(session)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn update_session(
    State(ctx): State<SharedContext>,
    Path(raw): Path<String>,
    ApiJson(body): ApiJson<SessionUpdate>,
) -> ApiResult<Json<TableSession>> {
    let id = parse_id(&raw, "session")?;
    body.validate().map_err(rejected)?;
    blocking(&ctx, "Failed to update table session", move |c| {
        c.store
            .update_session(id, &body, c.clock.now())?
            .ok_or_else(|| LoyaltyError::not_found("Session", id))
    })
    .await
    .map(Json)
}
