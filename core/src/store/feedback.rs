use super::{require_customer, LoyaltyStore};
use crate::{
    error::{LoyaltyError, LoyaltyResult},
    feedback::{
        positive_percent, ChannelCount, Feedback, FeedbackStats, NewFeedback, RatingCount,
        POSITIVE_RATING,
    },
    types::Timestamp,
};
use rusqlite::{params, Row};

const FEEDBACK_COLUMNS: &str = "id, customer_id, rating, channel, comment, created_at";

fn feedback_from_row(row: &Row<'_>) -> rusqlite::Result<Feedback> {
    Ok(Feedback {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        rating: row.get(2)?,
        channel: row.get(3)?,
        comment: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl LoyaltyStore {
    // ── Feedback ──────────────────────────────────────────────────

    /// Newest first.
    pub fn feedback(&self) -> LoyaltyResult<Vec<Feedback>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map([], feedback_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn insert_feedback(&self, f: &NewFeedback, now: Timestamp) -> LoyaltyResult<Feedback> {
        let conn = self.conn();
        if let Some(customer_id) = f.customer_id {
            require_customer(&conn, customer_id)?;
        }
        conn.execute(
            "INSERT INTO feedback (customer_id, rating, channel, comment, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![f.customer_id, f.rating, f.channel.trim(), &f.comment, now],
        )?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            &format!("SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE id = ?1"),
            params![id],
            feedback_from_row,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => LoyaltyError::not_found("Feedback", id),
            other => other.into(),
        })
    }

    pub fn feedback_stats(&self) -> LoyaltyResult<FeedbackStats> {
        let conn = self.conn();
        let (avg_rating, total_reviews, positive): (f64, i64, i64) = conn.query_row(
            "SELECT COALESCE(AVG(rating), 0.0), COUNT(*),
                    COALESCE(SUM(CASE WHEN rating >= ?1 THEN 1 ELSE 0 END), 0)
             FROM feedback",
            params![POSITIVE_RATING],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let mut stmt = conn.prepare(
            "SELECT channel, COUNT(*) FROM feedback GROUP BY channel ORDER BY channel ASC",
        )?;
        let by_channel = stmt
            .query_map([], |row| {
                Ok(ChannelCount {
                    channel: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt =
            conn.prepare("SELECT rating, COUNT(*) FROM feedback GROUP BY rating ORDER BY rating ASC")?;
        let by_rating = stmt
            .query_map([], |row| {
                Ok(RatingCount {
                    rating: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FeedbackStats {
            avg_rating,
            total_reviews,
            positive_percent: positive_percent(positive, total_reviews),
            by_channel,
            by_rating,
        })
    }
}
