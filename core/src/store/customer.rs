use super::{begin, require_customer, row_exists, LoyaltyStore};
use crate::{
    customer::{
        avatar_initials, Activity, ActivityKind, Customer, CustomerUpdate, NewCustomer, NewTier,
        Tier, TierUpdate, DEFAULT_SEGMENT, DEFAULT_TIER,
    },
    error::{is_unique_violation, LoyaltyError, LoyaltyResult},
    types::{RecordId, Timestamp},
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const CUSTOMER_COLUMNS: &str =
    "id, name, email, phone, tier, segment, visits, spend, last_visit, avatar";
const ACTIVITY_COLUMNS: &str = "id, customer_id, type, amount, reward_used, created_at";
const TIER_COLUMNS: &str = "id, name, requirement, threshold, benefits";

fn customer_from_row(row: &Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        tier: row.get(4)?,
        segment: row.get(5)?,
        visits: row.get(6)?,
        spend: row.get(7)?,
        last_visit: row.get(8)?,
        avatar: row.get(9)?,
    })
}

fn activity_from_row(row: &Row<'_>) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        kind: row.get(2)?,
        amount: row.get(3)?,
        reward_used: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Benefits live in a TEXT column as a JSON array.
fn tier_from_row(row: &Row<'_>) -> rusqlite::Result<Tier> {
    let benefits: String = row.get(4)?;
    let benefits = serde_json::from_str(&benefits).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Tier {
        id: row.get(0)?,
        name: row.get(1)?,
        requirement: row.get(2)?,
        threshold: row.get(3)?,
        benefits,
    })
}

fn select_customer(conn: &Connection, id: RecordId) -> LoyaltyResult<Option<Customer>> {
    let customer = conn
        .query_row(
            &format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"),
            params![id],
            customer_from_row,
        )
        .optional()?;
    Ok(customer)
}

fn select_tier(conn: &Connection, id: RecordId) -> LoyaltyResult<Option<Tier>> {
    let tier = conn
        .query_row(
            &format!("SELECT {TIER_COLUMNS} FROM tiers WHERE id = ?1"),
            params![id],
            tier_from_row,
        )
        .optional()?;
    Ok(tier)
}

fn email_conflict(e: rusqlite::Error, email: &str) -> LoyaltyError {
    if is_unique_violation(&e) {
        LoyaltyError::Conflict(format!("email {email} is already registered"))
    } else {
        e.into()
    }
}

impl LoyaltyStore {
    // ── Customer ──────────────────────────────────────────────────

    /// Newest first.
    pub fn customers(&self) -> LoyaltyResult<Vec<Customer>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare(&format!("SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY id DESC"))?;
        let rows = stmt.query_map([], customer_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn customer(&self, id: RecordId) -> LoyaltyResult<Option<Customer>> {
        select_customer(&self.conn(), id)
    }

    pub fn customer_count(&self) -> LoyaltyResult<i64> {
        let count = self
            .conn()
            .query_row("SELECT COUNT(*) FROM customers", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn insert_customer(&self, c: &NewCustomer) -> LoyaltyResult<Customer> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO customers (name, email, phone, tier, segment, visits, spend, avatar)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                c.name.trim(),
                c.email.trim(),
                &c.phone,
                c.tier.as_deref().unwrap_or(DEFAULT_TIER),
                c.segment.as_deref().unwrap_or(DEFAULT_SEGMENT),
                c.visits.unwrap_or(0),
                c.spend.unwrap_or(0.0),
                avatar_initials(&c.name),
            ],
        )
        .map_err(|e| email_conflict(e, &c.email))?;
        let id = conn.last_insert_rowid();
        select_customer(&conn, id)?.ok_or_else(|| LoyaltyError::not_found("Customer", id))
    }

    /// Partial update. Returns None if the customer does not exist.
    pub fn update_customer(
        &self,
        id: RecordId,
        u: &CustomerUpdate,
    ) -> LoyaltyResult<Option<Customer>> {
        let conn = self.conn();
        let updated = conn
            .execute(
                "UPDATE customers SET
                    name    = COALESCE(?1, name),
                    email   = COALESCE(?2, email),
                    phone   = COALESCE(?3, phone),
                    tier    = COALESCE(?4, tier),
                    segment = COALESCE(?5, segment),
                    visits  = COALESCE(?6, visits),
                    spend   = COALESCE(?7, spend)
                 WHERE id = ?8",
                params![
                    u.name.as_deref().map(str::trim),
                    u.email.as_deref().map(str::trim),
                    &u.phone,
                    &u.tier,
                    &u.segment,
                    u.visits,
                    u.spend,
                    id,
                ],
            )
            .map_err(|e| email_conflict(e, u.email.as_deref().unwrap_or_default()))?;
        if updated == 0 {
            return Ok(None);
        }
        select_customer(&conn, id)
    }

    /// Returns false if there was no such customer.
    /// Refuses while the customer still owns a wallet: wallets are never deleted.
    pub fn delete_customer(&self, id: RecordId) -> LoyaltyResult<bool> {
        let mut conn = self.conn();
        let tx = begin(&mut conn)?;
        if row_exists(&tx, "SELECT 1 FROM wallets WHERE customer_id = ?1", id)? {
            return Err(LoyaltyError::Conflict(format!(
                "customer {id} owns a wallet and cannot be deleted"
            )));
        }
        let deleted = tx.execute("DELETE FROM customers WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    // ── Activity ──────────────────────────────────────────────────

    /// Most recent activities across all customers.
    pub fn activities(&self, limit: u32) -> LoyaltyResult<Vec<Activity>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activity
             ORDER BY created_at DESC, id DESC LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit], activity_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn customer_activities(&self, customer_id: RecordId) -> LoyaltyResult<Vec<Activity>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activity
             WHERE customer_id = ?1
             ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![customer_id], activity_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Record an activity. A visit also bumps the customer's visit count,
    /// spend and last-visit time, in the same transaction.
    pub fn insert_activity(
        &self,
        customer_id: RecordId,
        kind: ActivityKind,
        amount: f64,
        reward_used: Option<&str>,
        now: Timestamp,
    ) -> LoyaltyResult<Activity> {
        let mut conn = self.conn();
        let tx = begin(&mut conn)?;
        require_customer(&tx, customer_id)?;

        tx.execute(
            "INSERT INTO activity (customer_id, type, amount, reward_used, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![customer_id, kind, amount, reward_used, now],
        )?;
        let id = tx.last_insert_rowid();

        if kind == ActivityKind::Visit {
            tx.execute(
                "UPDATE customers
                 SET visits = visits + 1, spend = spend + ?1, last_visit = ?2
                 WHERE id = ?3",
                params![amount, now, customer_id],
            )?;
        }

        let activity = tx.query_row(
            &format!("SELECT {ACTIVITY_COLUMNS} FROM activity WHERE id = ?1"),
            params![id],
            activity_from_row,
        )?;
        tx.commit()?;
        Ok(activity)
    }

    // ── Tier ──────────────────────────────────────────────────────

    /// Ordered by spend threshold, lowest first.
    pub fn tiers(&self) -> LoyaltyResult<Vec<Tier>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TIER_COLUMNS} FROM tiers ORDER BY threshold ASC, id ASC"
        ))?;
        let rows = stmt.query_map([], tier_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn insert_tier(&self, t: &NewTier) -> LoyaltyResult<Tier> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO tiers (name, requirement, threshold, benefits) VALUES (?1, ?2, ?3, ?4)",
            params![
                t.name.trim(),
                &t.requirement,
                t.threshold,
                serde_json::to_string(&t.benefits)?,
            ],
        )?;
        let id = conn.last_insert_rowid();
        select_tier(&conn, id)?.ok_or_else(|| LoyaltyError::not_found("Tier", id))
    }

    pub fn update_tier(&self, id: RecordId, u: &TierUpdate) -> LoyaltyResult<Option<Tier>> {
        let benefits = u.benefits.as_ref().map(serde_json::to_string).transpose()?;
        let conn = self.conn();
        let updated = conn.execute(
            "UPDATE tiers SET
                name        = COALESCE(?1, name),
                requirement = COALESCE(?2, requirement),
                threshold   = COALESCE(?3, threshold),
                benefits    = COALESCE(?4, benefits)
             WHERE id = ?5",
            params![
                u.name.as_deref().map(str::trim),
                &u.requirement,
                u.threshold,
                benefits,
                id
            ],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        select_tier(&conn, id)
    }
}
