use super::LoyaltyStore;
use crate::{
    customer::{ActivityKind, Customer},
    error::LoyaltyResult,
    reporting::{CustomerDirectory, DashboardStats},
    types::RecordId,
};
use rusqlite::params;

impl LoyaltyStore {
    // ── Dashboard ─────────────────────────────────────────────────

    pub fn dashboard_stats(&self) -> LoyaltyResult<DashboardStats> {
        let conn = self.conn();
        let (total_revenue, active_members, loyalty_visits): (f64, i64, i64) = conn.query_row(
            "SELECT COALESCE(SUM(spend), 0.0), COUNT(*), COALESCE(SUM(visits), 0)
             FROM customers",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        let rewards_redeemed: i64 = conn.query_row(
            "SELECT COUNT(*) FROM activity WHERE type = ?1",
            params![ActivityKind::Reward],
            |row| row.get(0),
        )?;
        Ok(DashboardStats {
            total_revenue,
            active_members,
            loyalty_visits,
            rewards_redeemed,
        })
    }
}

impl CustomerDirectory for LoyaltyStore {
    fn customer(&self, id: RecordId) -> LoyaltyResult<Option<Customer>> {
        LoyaltyStore::customer(self, id)
    }
}
