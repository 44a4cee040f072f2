//! Read-only views the dashboard renders: headline KPIs and the wallet
//! overview with customer names resolved.

use crate::{
    customer::Customer,
    error::{LoyaltyError, LoyaltyResult},
    types::{Points, RecordId},
    wallet::{Wallet, WalletStatus, WalletStore},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_revenue: f64,
    pub active_members: i64,
    pub loyalty_visits: i64,
    pub rewards_redeemed: i64,
}

/// Resolves a customer id for display. The ledger never writes through this.
pub trait CustomerDirectory {
    fn customer(&self, id: RecordId) -> LoyaltyResult<Option<Customer>>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WalletLine {
    #[serde(flatten)]
    pub wallet: Wallet,
    /// None when the customer row is gone.
    pub customer_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WalletOverview {
    pub total_points: Points,
    pub active_wallets: usize,
    pub wallets: Vec<WalletLine>,
}

/// Every wallet, newest first, with its owner's name and the portfolio totals.
pub fn wallet_overview<W, C>(wallets: &W, customers: &C) -> LoyaltyResult<WalletOverview>
where
    W: WalletStore + ?Sized,
    C: CustomerDirectory + ?Sized,
{
    let all = wallets.wallets()?;
    let mut names: HashMap<RecordId, Option<String>> = HashMap::new();
    let mut lines = Vec::with_capacity(all.len());

    for wallet in all {
        let customer_name = match names.get(&wallet.customer_id) {
            Some(name) => name.clone(),
            None => {
                let name = customers.customer(wallet.customer_id)?.map(|c| c.name);
                names.insert(wallet.customer_id, name.clone());
                name
            }
        };
        lines.push(WalletLine {
            wallet,
            customer_name,
        });
    }

    Ok(WalletOverview {
        total_points: total_points(&lines)?,
        active_wallets: lines
            .iter()
            .filter(|l| l.wallet.status == WalletStatus::Active)
            .count(),
        wallets: lines,
    })
}

/// Portfolio total. Errors instead of wrapping if the sum leaves `i64`.
fn total_points(lines: &[WalletLine]) -> LoyaltyResult<Points> {
    lines
        .iter()
        .try_fold(0 as Points, |acc, l| acc.checked_add(l.wallet.balance))
        .ok_or_else(|| LoyaltyError::Other(anyhow::anyhow!("total points overflow")))
}
