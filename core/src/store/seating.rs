use super::{begin, require_customer, LoyaltyStore};
use crate::{
    error::{LoyaltyError, LoyaltyResult},
    seating::{
        NewSession, NewTable, RestaurantTable, SessionStatus, SessionUpdate, TableSession,
        TableStatus, TableUpdate, DEFAULT_LOCATION,
    },
    types::{RecordId, Timestamp},
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const TABLE_COLUMNS: &str = "id, name, capacity, location, status, notes, current_customer_id";
const SESSION_COLUMNS: &str =
    "id, table_id, customer_id, party_size, status, started_at, ended_at";

fn table_from_row(row: &Row<'_>) -> rusqlite::Result<RestaurantTable> {
    Ok(RestaurantTable {
        id: row.get(0)?,
        name: row.get(1)?,
        capacity: row.get(2)?,
        location: row.get(3)?,
        status: row.get(4)?,
        notes: row.get(5)?,
        current_customer_id: row.get(6)?,
    })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<TableSession> {
    Ok(TableSession {
        id: row.get(0)?,
        table_id: row.get(1)?,
        customer_id: row.get(2)?,
        party_size: row.get(3)?,
        status: row.get(4)?,
        started_at: row.get(5)?,
        ended_at: row.get(6)?,
    })
}

fn select_table(conn: &Connection, id: RecordId) -> LoyaltyResult<Option<RestaurantTable>> {
    let table = conn
        .query_row(
            &format!("SELECT {TABLE_COLUMNS} FROM restaurant_tables WHERE id = ?1"),
            params![id],
            table_from_row,
        )
        .optional()?;
    Ok(table)
}

fn select_session(conn: &Connection, id: RecordId) -> LoyaltyResult<Option<TableSession>> {
    let session = conn
        .query_row(
            &format!("SELECT {SESSION_COLUMNS} FROM table_sessions WHERE id = ?1"),
            params![id],
            session_from_row,
        )
        .optional()?;
    Ok(session)
}

impl LoyaltyStore {
    // ── Tables ────────────────────────────────────────────────────

    pub fn tables(&self) -> LoyaltyResult<Vec<RestaurantTable>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TABLE_COLUMNS} FROM restaurant_tables ORDER BY name ASC, id ASC"
        ))?;
        let rows = stmt.query_map([], table_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn table(&self, id: RecordId) -> LoyaltyResult<Option<RestaurantTable>> {
        select_table(&self.conn(), id)
    }

    pub fn insert_table(&self, t: &NewTable) -> LoyaltyResult<RestaurantTable> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO restaurant_tables (name, capacity, location, status, notes)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                t.name.trim(),
                t.capacity,
                t.location.as_deref().unwrap_or(DEFAULT_LOCATION),
                t.status.unwrap_or(TableStatus::Available),
                &t.notes,
            ],
        )?;
        let id = conn.last_insert_rowid();
        select_table(&conn, id)?.ok_or_else(|| LoyaltyError::not_found("Table", id))
    }

    pub fn update_table(
        &self,
        id: RecordId,
        u: &TableUpdate,
    ) -> LoyaltyResult<Option<RestaurantTable>> {
        let conn = self.conn();
        let updated = conn.execute(
            "UPDATE restaurant_tables SET
                name     = COALESCE(?1, name),
                capacity = COALESCE(?2, capacity),
                location = COALESCE(?3, location),
                status   = COALESCE(?4, status),
                notes    = COALESCE(?5, notes)
             WHERE id = ?6",
            params![
                u.name.as_deref().map(str::trim),
                u.capacity,
                &u.location,
                u.status,
                &u.notes,
                id
            ],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        select_table(&conn, id)
    }

    pub fn delete_table(&self, id: RecordId) -> LoyaltyResult<bool> {
        let deleted = self
            .conn()
            .execute("DELETE FROM restaurant_tables WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    // ── Sessions ──────────────────────────────────────────────────

    /// Newest first. `active_only` keeps parties that are still seated.
    pub fn sessions(&self, active_only: bool) -> LoyaltyResult<Vec<TableSession>> {
        let conn = self.conn();
        let filter = if active_only {
            "WHERE status = 'seated'"
        } else {
            ""
        };
        let mut stmt = conn.prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM table_sessions {filter}
             ORDER BY started_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map([], session_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Seat a party. The table turns occupied in the same transaction.
    pub fn insert_session(&self, s: &NewSession, now: Timestamp) -> LoyaltyResult<TableSession> {
        let mut conn = self.conn();
        let tx = begin(&mut conn)?;
        let table =
            select_table(&tx, s.table_id)?.ok_or_else(|| LoyaltyError::not_found("Table", s.table_id))?;
        if table.status == TableStatus::Occupied {
            return Err(LoyaltyError::Conflict(format!(
                "table {} is already occupied",
                table.name
            )));
        }
        if let Some(customer_id) = s.customer_id {
            require_customer(&tx, customer_id)?;
        }

        tx.execute(
            "INSERT INTO table_sessions (table_id, customer_id, party_size, status, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![s.table_id, s.customer_id, s.party_size, SessionStatus::Seated, now],
        )?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "UPDATE restaurant_tables SET status = ?1, current_customer_id = ?2 WHERE id = ?3",
            params![TableStatus::Occupied, s.customer_id, s.table_id],
        )?;

        let session =
            select_session(&tx, id)?.ok_or_else(|| LoyaltyError::not_found("Session", id))?;
        tx.commit()?;
        Ok(session)
    }

    /// Returns None if the session does not exist. Clearing a seated session
    /// stamps `ended_at` (default `now`) and frees its table.
    pub fn update_session(
        &self,
        id: RecordId,
        u: &SessionUpdate,
        now: Timestamp,
    ) -> LoyaltyResult<Option<TableSession>> {
        let mut conn = self.conn();
        let tx = begin(&mut conn)?;
        let Some(existing) = select_session(&tx, id)? else {
            return Ok(None);
        };

        let clearing = u.status == Some(SessionStatus::Cleared)
            && existing.status == SessionStatus::Seated;
        let ended_at = if clearing {
            Some(u.ended_at.unwrap_or(now))
        } else {
            u.ended_at
        };

        tx.execute(
            "UPDATE table_sessions SET
                status     = COALESCE(?1, status),
                party_size = COALESCE(?2, party_size),
                ended_at   = COALESCE(?3, ended_at)
             WHERE id = ?4",
            params![u.status, u.party_size, ended_at, id],
        )?;
        if clearing {
            tx.execute(
                "UPDATE restaurant_tables SET status = ?1, current_customer_id = NULL WHERE id = ?2",
                params![TableStatus::Available, existing.table_id],
            )?;
        }

        let session = select_session(&tx, id)?;
        tx.commit()?;
        Ok(session)
    }
}
