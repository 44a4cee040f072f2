//! HTTP surface: an axum router mounted under `/api`.
//!
//! Handlers parse and validate at the boundary, then run the store call on
//! the blocking pool. Core errors map onto status codes in `error.rs`.

mod customers;
mod dashboard;
mod error;
mod feedback;
mod seating;
mod wallets;

pub use error::{ApiError, ApiJson, ApiResult};

use crate::{
    clock::Clock,
    config::ServerConfig,
    error::{LoyaltyError, LoyaltyResult},
    ledger::LedgerService,
    store::LoyaltyStore,
    types::RecordId,
};
use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch},
    Router,
};
use std::{sync::Arc, time::Instant};

/// Everything a handler needs. Shared behind an `Arc`.
pub struct AppContext {
    pub store: Arc<LoyaltyStore>,
    pub ledger: LedgerService<Arc<LoyaltyStore>>,
    pub clock: Arc<dyn Clock>,
}

impl AppContext {
    pub fn new(store: Arc<LoyaltyStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger: LedgerService::new(Arc::clone(&store), Arc::clone(&clock)),
            store,
            clock,
        }
    }
}

pub type SharedContext = Arc<AppContext>;

pub fn router(ctx: SharedContext, config: &ServerConfig) -> Router {
    let api = Router::new()
        .route("/dashboard/stats", get(dashboard::stats))
        // Wallet ledger
        .route("/wallets", get(wallets::list).post(wallets::create))
        .route("/wallets/:id", get(wallets::get_one).patch(wallets::set_status))
        .route("/wallets/customer/:customer_id", get(wallets::by_customer))
        .route(
            "/wallets/:id/transactions",
            get(wallets::transactions).post(wallets::record),
        )
        .route("/reports/wallets", get(wallets::overview))
        // Customers, activity, tiers
        .route("/customers", get(customers::list).post(customers::create))
        .route(
            "/customers/:id",
            get(customers::get_one)
                .patch(customers::update)
                .delete(customers::remove),
        )
        .route("/customers/:id/activities", get(customers::activities))
        .route(
            "/activities",
            get(customers::recent_activities).post(customers::create_activity),
        )
        .route("/tiers", get(customers::tiers).post(customers::create_tier))
        .route("/tiers/:id", patch(customers::update_tier))
        // Seating
        .route("/tables", get(seating::list_tables).post(seating::create_table))
        .route(
            "/tables/:id",
            get(seating::get_table)
                .patch(seating::update_table)
                .delete(seating::remove_table),
        )
        .route(
            "/table-sessions",
            get(seating::list_sessions).post(seating::create_session),
        )
        .route("/table-sessions/:id", patch(seating::update_session))
        // Feedback
        .route("/feedback", get(feedback::list).post(feedback::create))
        .route("/feedback/stats", get(feedback::stats));

    Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(middleware::from_fn(log_requests))
        .with_state(ctx)
}

/// Bind `config.bind_addr` and serve until the process is stopped.
pub async fn serve(ctx: SharedContext, config: &ServerConfig) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    log::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router(ctx, config)).await?;
    Ok(())
}

async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let started = Instant::now();
    let response = next.run(req).await;
    log::info!(
        "{method} {path} -> {} ({} ms)",
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

/// Parse a path segment as a positive id, or answer "Invalid <entity> ID".
pub(crate) fn parse_id(raw: &str, entity: &'static str) -> ApiResult<RecordId> {
    raw.trim()
        .parse::<RecordId>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or(ApiError::InvalidId(entity))
}

/// Input rejected before any store call.
pub(crate) fn rejected(err: LoyaltyError) -> ApiError {
    ApiError::from_core(err, "Invalid request")
}

/// Run a store call on the blocking pool. `action` is the 500 message.
pub(crate) async fn blocking<T, F>(ctx: &SharedContext, action: &'static str, f: F) -> ApiResult<T>
where
    F: FnOnce(&AppContext) -> LoyaltyResult<T> + Send + 'static,
    T: Send + 'static,
{
    let ctx = Arc::clone(ctx);
    match tokio::task::spawn_blocking(move || f(&ctx)).await {
        Ok(result) => result.map_err(|e| ApiError::from_core(e, action)),
        Err(join) => {
            log::error!("{action}: worker task failed: {join}");
            Err(ApiError::Internal(action))
        }
    }
}
