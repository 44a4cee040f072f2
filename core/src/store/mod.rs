//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Services and handlers call store methods; they never execute SQL directly.
//!
//! One connection sits behind a mutex. Every multi-statement write runs in
//! an IMMEDIATE transaction that rolls back when dropped uncommitted.

use crate::{
    customer::ActivityKind,
    error::{LoyaltyError, LoyaltyResult},
    seating::{SessionStatus, TableStatus},
    types::RecordId,
    wallet::{TransactionType, WalletStatus},
};
use rusqlite::{
    params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
    Connection, OptionalExtension, ToSql, Transaction, TransactionBehavior,
};
use std::sync::{Mutex, MutexGuard, PoisonError};

mod customer;
mod feedback;
mod reporting;
mod seating;
mod wallet;

pub struct LoyaltyStore {
    conn: Mutex<Connection>,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl LoyaltyStore {
    pub fn open(path: &str) -> LoyaltyResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        if let Err(e) = conn.execute_batch("PRAGMA journal_mode=WAL;") {
            log::warn!("could not enable WAL on {path}: {e}");
        }
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> LoyaltyResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Open and migrate in one step. ":memory:" gives a private database.
    pub fn open_migrated(path: &str) -> LoyaltyResult<Self> {
        let store = if path == ":memory:" {
            Self::in_memory()?
        } else {
            Self::open(path)?
        };
        store.migrate()?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Apply all schema migrations in order. Safe to re-run.
    pub fn migrate(&self) -> LoyaltyResult<()> {
        let conn = self.conn();
        conn.execute_batch(include_str!("../../../migrations/001_customers.sql"))?;
        conn.execute_batch(include_str!("../../../migrations/002_wallets.sql"))?;
        conn.execute_batch(include_str!("../../../migrations/003_seating.sql"))?;
        conn.execute_batch(include_str!("../../../migrations/004_feedback.sql"))?;
        Ok(())
    }

    /// A poisoned lock still guards a usable connection: any transaction
    /// open at the time of the panic was rolled back when it dropped.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Start a write transaction. IMMEDIATE takes the write lock up front so a
/// concurrent writer on another connection waits instead of failing mid-way.
fn begin(conn: &mut Connection) -> LoyaltyResult<Transaction<'_>> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

fn row_exists(conn: &Connection, sql: &str, id: RecordId) -> LoyaltyResult<bool> {
    let found = conn
        .query_row(sql, params![id], |_| Ok(()))
        .optional()?
        .is_some();
    Ok(found)
}

fn require_customer(conn: &Connection, customer_id: RecordId) -> LoyaltyResult<()> {
    if row_exists(conn, "SELECT 1 FROM customers WHERE id = ?1", customer_id)? {
        Ok(())
    } else {
        Err(LoyaltyError::not_found("Customer", customer_id))
    }
}

// ── Text-backed enums ─────────────────────────────────────────

macro_rules! text_column {
    ($($ty:ty),* $(,)?) => {$(
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: LoyaltyError| FromSqlError::Other(Box::new(e)))
            }
        }
    )*};
}

text_column!(
    WalletStatus,
    TransactionType,
    ActivityKind,
    TableStatus,
    SessionStatus,
);
