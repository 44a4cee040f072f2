use super::{begin, require_customer, row_exists, LoyaltyStore};
use crate::{
    error::{is_check_violation, is_unique_violation, LoyaltyError, LoyaltyResult},
    types::{Points, RecordId, Timestamp, MAX_POINTS, MIN_POINTS},
    wallet::{TransactionType, Wallet, WalletStatus, WalletStore, WalletTransaction},
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const WALLET_COLUMNS: &str = "id, customer_id, balance, status, created_at, updated_at";
const TXN_COLUMNS: &str = "id, wallet_id, type, amount, description, created_at";

fn wallet_from_row(row: &Row<'_>) -> rusqlite::Result<Wallet> {
    Ok(Wallet {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        balance: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn txn_from_row(row: &Row<'_>) -> rusqlite::Result<WalletTransaction> {
    Ok(WalletTransaction {
        id: row.get(0)?,
        wallet_id: row.get(1)?,
        kind: row.get(2)?,
        amount: row.get(3)?,
        description: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn select_wallet(conn: &Connection, id: RecordId) -> LoyaltyResult<Option<Wallet>> {
    let wallet = conn
        .query_row(
            &format!("SELECT {WALLET_COLUMNS} FROM wallets WHERE id = ?1"),
            params![id],
            wallet_from_row,
        )
        .optional()?;
    Ok(wallet)
}

/// Map the wallets balance CHECK onto a field error; anything else passes through.
fn out_of_range(err: rusqlite::Error, field: &str) -> LoyaltyError {
    if is_check_violation(&err) {
        LoyaltyError::invalid(
            field,
            format!("would put the balance outside {MIN_POINTS}..={MAX_POINTS}"),
        )
    } else {
        err.into()
    }
}

impl LoyaltyStore {
    // ── Wallet diagnostics ────────────────────────────────────────

    pub fn wallet_count(&self) -> LoyaltyResult<i64> {
        let count = self
            .conn()
            .query_row("SELECT COUNT(*) FROM wallets", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn wallet_transaction_count(&self, wallet_id: RecordId) -> LoyaltyResult<i64> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM wallet_transactions WHERE wallet_id = ?1",
            params![wallet_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Signed sum of a wallet's ledger, computed by the database.
    pub fn wallet_ledger_sum(&self, wallet_id: RecordId) -> LoyaltyResult<Points> {
        let sum = self.conn().query_row(
            "SELECT COALESCE(SUM(CASE type WHEN 'credit' THEN amount ELSE -amount END), 0)
             FROM wallet_transactions WHERE wallet_id = ?1",
            params![wallet_id],
            |row| row.get(0),
        )?;
        Ok(sum)
    }
}

impl WalletStore for LoyaltyStore {
    fn create_wallet(
        &self,
        customer_id: RecordId,
        initial_balance: Points,
        status: WalletStatus,
        now: Timestamp,
    ) -> LoyaltyResult<Wallet> {
        let mut conn = self.conn();
        let tx = begin(&mut conn)?;
        require_customer(&tx, customer_id)?;

        let inserted = tx.execute(
            "INSERT INTO wallets (customer_id, balance, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![customer_id, initial_balance, status, now],
        );
        match inserted {
            Err(e) if is_unique_violation(&e) => {
                return Err(LoyaltyError::Conflict(format!(
                    "customer {customer_id} already has a wallet"
                )));
            }
            Err(e) => return Err(out_of_range(e, "balance")),
            Ok(_) => {}
        };

        let id = tx.last_insert_rowid();
        let wallet =
            select_wallet(&tx, id)?.ok_or_else(|| LoyaltyError::not_found("Wallet", id))?;
        tx.commit()?;
        Ok(wallet)
    }

    fn wallet(&self, id: RecordId) -> LoyaltyResult<Option<Wallet>> {
        select_wallet(&self.conn(), id)
    }

    fn wallet_by_customer(&self, customer_id: RecordId) -> LoyaltyResult<Option<Wallet>> {
        let wallet = self
            .conn()
            .query_row(
                &format!("SELECT {WALLET_COLUMNS} FROM wallets WHERE customer_id = ?1"),
                params![customer_id],
                wallet_from_row,
            )
            .optional()?;
        Ok(wallet)
    }

    fn wallets(&self) -> LoyaltyResult<Vec<Wallet>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare(&format!("SELECT {WALLET_COLUMNS} FROM wallets ORDER BY id DESC"))?;
        let rows = stmt.query_map([], wallet_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn transactions(&self, wallet_id: RecordId) -> LoyaltyResult<Vec<WalletTransaction>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TXN_COLUMNS} FROM wallet_transactions
             WHERE wallet_id = ?1
             ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![wallet_id], txn_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn append_transaction(
        &self,
        wallet_id: RecordId,
        kind: TransactionType,
        amount: Points,
        description: Option<&str>,
        now: Timestamp,
    ) -> LoyaltyResult<WalletTransaction> {
        let mut conn = self.conn();
        let tx = begin(&mut conn)?;
        if !row_exists(&tx, "SELECT 1 FROM wallets WHERE id = ?1", wallet_id)? {
            return Err(LoyaltyError::not_found("Wallet", wallet_id));
        }

        tx.execute(
            "INSERT INTO wallet_transactions (wallet_id, type, amount, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![wallet_id, kind, amount, description, now],
        )?;
        let txn_id = tx.last_insert_rowid();

        // The delta is applied by SQLite, never computed from a balance read here.
        // An overflow trips the balance CHECK and the ledger insert rolls back.
        let updated = tx
            .execute(
                "UPDATE wallets SET balance = balance + ?1, updated_at = ?2 WHERE id = ?3",
                params![kind.signed(amount), now, wallet_id],
            )
            .map_err(|e| out_of_range(e, "amount"))?;
        if updated != 1 {
            return Err(LoyaltyError::not_found("Wallet", wallet_id));
        }

        let txn = tx.query_row(
            &format!("SELECT {TXN_COLUMNS} FROM wallet_transactions WHERE id = ?1"),
            params![txn_id],
            txn_from_row,
        )?;
        tx.commit()?;
        Ok(txn)
    }

    fn set_wallet_status(
        &self,
        id: RecordId,
        status: WalletStatus,
        now: Timestamp,
    ) -> LoyaltyResult<Option<Wallet>> {
        let conn = self.conn();
        let updated = conn.execute(
            "UPDATE wallets SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status, now, id],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        select_wallet(&conn, id)
    }
}
