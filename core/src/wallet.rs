//! Wallet and ledger records, and the storage seam the ledger writes through.
//!
//! RULE: a wallet's balance only moves through `WalletStore::append_transaction`,
//! which must apply the delta as store-side arithmetic in the same atomic
//! unit as the ledger insert.

use crate::{
    error::{LoyaltyError, LoyaltyResult},
    types::{Points, RecordId, Timestamp},
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, sync::Arc};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WalletStatus {
    Active,
    Inactive,
}

impl WalletStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl FromStr for WalletStatus {
    type Err = LoyaltyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(LoyaltyError::invalid(
                "status",
                format!("expected 'active' or 'inactive', got '{other}'"),
            )),
        }
    }
}

impl fmt::Display for WalletStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }

    /// Signed balance delta for a positive `amount`.
    pub fn signed(&self, amount: Points) -> Points {
        match self {
            Self::Credit => amount,
            Self::Debit => -amount,
        }
    }
}

impl FromStr for TransactionType {
    type Err = LoyaltyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            other => Err(LoyaltyError::invalid(
                "type",
                format!("expected 'credit' or 'debit', got '{other}'"),
            )),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: RecordId,
    pub customer_id: RecordId,
    pub balance: Points,
    pub status: WalletStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransaction {
    pub id: RecordId,
    pub wallet_id: RecordId,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Always positive; the sign comes from `kind`.
    pub amount: Points,
    pub description: Option<String>,
    pub created_at: Timestamp,
}

impl WalletTransaction {
    pub fn signed_amount(&self) -> Points {
        self.kind.signed(self.amount)
    }
}

/// Storage operations the ledger needs.
///
/// `LoyaltyStore` is the production implementation; tests substitute
/// their own.
pub trait WalletStore: Send + Sync {
    /// Fails with `Conflict` if the customer already owns a wallet and
    /// with `NotFound` if the customer does not exist.
    fn create_wallet(
        &self,
        customer_id: RecordId,
        initial_balance: Points,
        status: WalletStatus,
        now: Timestamp,
    ) -> LoyaltyResult<Wallet>;

    fn wallet(&self, id: RecordId) -> LoyaltyResult<Option<Wallet>>;

    fn wallet_by_customer(&self, customer_id: RecordId) -> LoyaltyResult<Option<Wallet>>;

    /// All wallets, newest first.
    fn wallets(&self) -> LoyaltyResult<Vec<Wallet>>;

    /// Newest first.
    fn transactions(&self, wallet_id: RecordId) -> LoyaltyResult<Vec<WalletTransaction>>;

    /// Insert one ledger row and apply its signed amount to the wallet
    /// balance, all or nothing. Fails with `NotFound` if the wallet is missing.
    fn append_transaction(
        &self,
        wallet_id: RecordId,
        kind: TransactionType,
        amount: Points,
        description: Option<&str>,
        now: Timestamp,
    ) -> LoyaltyResult<WalletTransaction>;

    fn set_wallet_status(
        &self,
        id: RecordId,
        status: WalletStatus,
        now: Timestamp,
    ) -> LoyaltyResult<Option<Wallet>>;
}

impl<T: WalletStore + ?Sized> WalletStore for Arc<T> {
    fn create_wallet(
        &self,
        customer_id: RecordId,
        initial_balance: Points,
        status: WalletStatus,
        now: Timestamp,
    ) -> LoyaltyResult<Wallet> {
        (**self).create_wallet(customer_id, initial_balance, status, now)
    }

    fn wallet(&self, id: RecordId) -> LoyaltyResult<Option<Wallet>> {
        (**self).wallet(id)
    }

    fn wallet_by_customer(&self, customer_id: RecordId) -> LoyaltyResult<Option<Wallet>> {
        (**self).wallet_by_customer(customer_id)
    }

    fn wallets(&self) -> LoyaltyResult<Vec<Wallet>> {
        (**self).wallets()
    }

    fn transactions(&self, wallet_id: RecordId) -> LoyaltyResult<Vec<WalletTransaction>> {
        (**self).transactions(wallet_id)
    }

    fn append_transaction(
        &self,
        wallet_id: RecordId,
        kind: TransactionType,
        amount: Points,
        description: Option<&str>,
        now: Timestamp,
    ) -> LoyaltyResult<WalletTransaction> {
        (**self).append_transaction(wallet_id, kind, amount, description, now)
    }

    fn set_wallet_status(
        &self,
        id: RecordId,
        status: WalletStatus,
        now: Timestamp,
    ) -> LoyaltyResult<Option<Wallet>> {
        (**self).set_wallet_status(id, status, now)
    }
}
