use super::{blocking, parse_id, rejected, ApiJson, ApiResult, SharedContext};
use crate::{
    error::{FieldError, LoyaltyError, LoyaltyResult},
    reporting::{wallet_overview, WalletOverview},
    types::{Points, RecordId, MAX_POINTS, MIN_POINTS},
    wallet::{TransactionType, Wallet, WalletStatus, WalletTransaction},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWalletBody {
    pub customer_id: RecordId,
    #[serde(default, alias = "balancePuntos")]
    pub balance: Points,
    #[serde(default)]
    pub status: Option<String>,
}

impl CreateWalletBody {
    fn validate(&self) -> LoyaltyResult<WalletStatus> {
        let mut errors = Vec::new();
        if self.customer_id <= 0 {
            errors.push(FieldError::new("customerId", "must be a positive integer"));
        }
        if !(MIN_POINTS..=MAX_POINTS).contains(&self.balance) {
            errors.push(FieldError::new(
                "balance",
                format!("must be between {MIN_POINTS} and {MAX_POINTS}"),
            ));
        }
        let status = match self.status.as_deref() {
            None => Some(WalletStatus::Active),
            Some(raw) => collect(raw.parse(), &mut errors),
        };
        into_result(errors, status)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordTransactionBody {
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: Points,
    #[serde(default)]
    pub description: Option<String>,
}

impl RecordTransactionBody {
    fn validate(&self) -> LoyaltyResult<TransactionType> {
        let mut errors = Vec::new();
        let kind = collect(self.kind.parse(), &mut errors);
        if self.amount <= 0 {
            errors.push(FieldError::new("amount", "must be greater than zero"));
        } else if self.amount > MAX_POINTS {
            errors.push(FieldError::new("amount", format!("must be at most {MAX_POINTS}")));
        }
        into_result(errors, kind)
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

/// Keep a parsed value, or move its field errors into `errors`.
fn collect<T>(parsed: LoyaltyResult<T>, errors: &mut Vec<FieldError>) -> Option<T> {
    match parsed {
        Ok(value) => Some(value),
        Err(LoyaltyError::Validation(mut e)) => {
            errors.append(&mut e);
            None
        }
        Err(other) => {
            errors.push(FieldError::new("body", other.to_string()));
            None
        }
    }
}

fn into_result<T>(errors: Vec<FieldError>, value: Option<T>) -> LoyaltyResult<T> {
    match value {
        Some(value) if errors.is_empty() => Ok(value),
        _ => Err(LoyaltyError::Validation(errors)),
    }
}

pub async fn list(State(ctx): State<SharedContext>) -> ApiResult<Json<Vec<Wallet>>> {
    blocking(&ctx, "Failed to fetch wallets", |c| c.ledger.wallets())
        .await
        .map(Json)
}

pub async fn get_one(
    State(ctx): State<SharedContext>,
    Path(raw): Path<String>,
) -> ApiResult<Json<Wallet>> {
    let id = parse_id(&raw, "wallet")?;
    blocking(&ctx, "Failed to fetch wallet", move |c| c.ledger.wallet(id))
        .await
        .map(Json)
}

/// 200 with `null` when the customer has no wallet.
pub async fn by_customer(
    State(ctx): State<SharedContext>,
    Path(raw): Path<String>,
) -> ApiResult<Json<Option<Wallet>>> {
    let customer_id = parse_id(&raw, "customer")?;
    blocking(&ctx, "Failed to fetch wallet", move |c| {
        c.ledger.wallet_for_customer(customer_id)
    })
    .await
    .map(Json)
}

pub async fn create(
    State(ctx): State<SharedContext>,
    ApiJson(body): ApiJson<CreateWalletBody>,
) -> ApiResult<(StatusCode, Json<Wallet>)> {
    let status = body.validate().map_err(rejected)?;
    let wallet = blocking(&ctx, "Failed to create wallet", move |c| {
        c.ledger.create_wallet(body.customer_id, body.balance, status)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(wallet)))
}

pub async fn set_status(
    State(ctx): State<SharedContext>,
    Path(raw): Path<String>,
    ApiJson(body): ApiJson<StatusBody>,
) -> ApiResult<Json<Wallet>> {
    let id = parse_id(&raw, "wallet")?;
    let status: WalletStatus = body.status.parse().map_err(rejected)?;
    blocking(&ctx, "Failed to update wallet", move |c| {
        c.ledger.set_status(id, status)
    })
    .await
    .map(Json)
}

pub async fn transactions(
    State(ctx): State<SharedContext>,
    Path(raw): Path<String>,
) -> ApiResult<Json<Vec<WalletTransaction>>> {
    let wallet_id = parse_id(&raw, "wallet")?;
    blocking(&ctx, "Failed to fetch transactions", move |c| {
        c.ledger.transactions(wallet_id)
    })
    .await
    .map(Json)
}

pub async fn record(
    State(ctx): State<SharedContext>,
    Path(raw): Path<String>,
    ApiJson(body): ApiJson<RecordTransactionBody>,
) -> ApiResult<(StatusCode, Json<WalletTransaction>)> {
    let wallet_id = parse_id(&raw, "wallet")?;
    let kind = body.validate().map_err(rejected)?;
    let txn = blocking(&ctx, "Failed to create transaction", move |c| {
        c.ledger.record_transaction(
            wallet_id,
            kind,
            body.amount,
            body.description.as_deref(),
        )
    })
    .await?;
    Ok((StatusCode::CREATED, Json(txn)))
}

pub async fn overview(State(ctx): State<SharedContext>) -> ApiResult<Json<WalletOverview>> {
    blocking(&ctx, "Failed to build wallet report", |c| {
        wallet_overview(c.store.as_ref(), c.store.as_ref())
    })
    .await
    .map(Json)
}
