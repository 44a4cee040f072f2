//! The wallet ledger: the only writer of wallet transactions.
//!
//! RULE: the service never reads a balance to compute a new one.
//! It validates, then hands the signed delta to `WalletStore::append_transaction`,
//! which applies it as store-side arithmetic together with the ledger insert.
//!
//! Not enforced here:
//!   - an inactive wallet still accepts transactions
//!   - a debit may take the balance below zero
//!   - the initial balance is seeded directly, with no ledger row

use crate::{
    clock::Clock,
    error::{FieldError, LoyaltyError, LoyaltyResult},
    types::{require_positive_id, Points, RecordId, MAX_POINTS, MIN_POINTS},
    wallet::{TransactionType, Wallet, WalletStatus, WalletStore, WalletTransaction},
};
use std::sync::Arc;

/// Longest description kept on a ledger row.
pub const MAX_DESCRIPTION_LEN: usize = 500;

pub struct LedgerService<S: WalletStore> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: WalletStore> LedgerService<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Open a wallet for a customer. Fails with `Conflict` if one exists.
    pub fn create_wallet(
        &self,
        customer_id: RecordId,
        initial_balance: Points,
        status: WalletStatus,
    ) -> LoyaltyResult<Wallet> {
        require_positive_id("customerId", customer_id)?;
        if !(MIN_POINTS..=MAX_POINTS).contains(&initial_balance) {
            return Err(LoyaltyError::invalid(
                "balance",
                format!("must be between {MIN_POINTS} and {MAX_POINTS}"),
            ));
        }
        let wallet = self
            .store
            .create_wallet(customer_id, initial_balance, status, self.clock.now())?;
        log::info!(
            "wallet {} opened for customer {} with {} points",
            wallet.id,
            customer_id,
            initial_balance
        );
        Ok(wallet)
    }

    pub fn wallet(&self, id: RecordId) -> LoyaltyResult<Wallet> {
        require_positive_id("id", id)?;
        self.store
            .wallet(id)?
            .ok_or_else(|| LoyaltyError::not_found("Wallet", id))
    }

    /// `None` is an answer, not an error: most customers have no wallet yet.
    pub fn wallet_for_customer(&self, customer_id: RecordId) -> LoyaltyResult<Option<Wallet>> {
        require_positive_id("customerId", customer_id)?;
        self.store.wallet_by_customer(customer_id)
    }

    pub fn wallets(&self) -> LoyaltyResult<Vec<Wallet>> {
        self.store.wallets()
    }

    /// Newest first. An unknown wallet has no transactions.
    pub fn transactions(&self, wallet_id: RecordId) -> LoyaltyResult<Vec<WalletTransaction>> {
        require_positive_id("walletId", wallet_id)?;
        self.store.transactions(wallet_id)
    }

    pub fn set_status(&self, id: RecordId, status: WalletStatus) -> LoyaltyResult<Wallet> {
        require_positive_id("id", id)?;
        let wallet = self
            .store
            .set_wallet_status(id, status, self.clock.now())?
            .ok_or_else(|| LoyaltyError::not_found("Wallet", id))?;
        log::info!("wallet {id} is now {status}");
        Ok(wallet)
    }

    /// Append a credit or debit and move the balance by the same amount,
    /// atomically.
    pub fn record_transaction(
        &self,
        wallet_id: RecordId,
        kind: TransactionType,
        amount: Points,
        description: Option<&str>,
    ) -> LoyaltyResult<WalletTransaction> {
        let description = description.map(str::trim).filter(|d| !d.is_empty());
        validate_entry(wallet_id, amount, description).inspect_err(|e| {
            log::warn!("wallet {wallet_id}: rejected {kind} of {amount}: {e}");
        })?;

        let txn = self
            .store
            .append_transaction(wallet_id, kind, amount, description, self.clock.now())?;
        log::debug!(
            "wallet {wallet_id}: recorded {} {} (txn {})",
            kind,
            amount,
            txn.id
        );
        Ok(txn)
    }

    /// Same as `record_transaction`, with the type given as text
    /// ("credit" / "debit").
    pub fn record(
        &self,
        wallet_id: RecordId,
        kind: &str,
        amount: Points,
        description: Option<&str>,
    ) -> LoyaltyResult<WalletTransaction> {
        let kind: TransactionType = kind.parse()?;
        self.record_transaction(wallet_id, kind, amount, description)
    }
}

fn validate_entry(
    wallet_id: RecordId,
    amount: Points,
    description: Option<&str>,
) -> LoyaltyResult<()> {
    let mut errors = Vec::new();
    if wallet_id <= 0 {
        errors.push(FieldError::new("walletId", "must be a positive integer"));
    }
    if amount <= 0 {
        errors.push(FieldError::new("amount", "must be greater than zero"));
    } else if amount > MAX_POINTS {
        errors.push(FieldError::new("amount", format!("must be at most {MAX_POINTS}")));
    }
    if description.is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN) {
        errors.push(FieldError::new(
            "description",
            format!("must be at most {MAX_DESCRIPTION_LEN} characters"),
        ));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(LoyaltyError::Validation(errors))
    }
}
