//! Guest feedback and the aggregate view the dashboard charts.

use crate::{
    customer::finish,
    error::{FieldError, LoyaltyResult},
    types::{RecordId, Timestamp},
};
use serde::{Deserialize, Serialize};

/// Ratings at or above this count as positive.
pub const POSITIVE_RATING: i64 = 4;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: RecordId,
    pub customer_id: Option<RecordId>,
    pub rating: i64,
    pub channel: String,
    pub comment: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedback {
    #[serde(default)]
    pub customer_id: Option<RecordId>,
    pub rating: i64,
    pub channel: String,
    #[serde(default)]
    pub comment: Option<String>,
}

impl NewFeedback {
    pub fn validate(&self) -> LoyaltyResult<()> {
        let mut errors = Vec::new();
        if !(1..=5).contains(&self.rating) {
            errors.push(FieldError::new("rating", "must be between 1 and 5"));
        }
        if self.channel.trim().is_empty() {
            errors.push(FieldError::new("channel", "must not be empty"));
        }
        if self.customer_id.is_some_and(|c| c <= 0) {
            errors.push(FieldError::new("customerId", "must be a positive integer"));
        }
        finish(errors)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelCount {
    pub channel: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RatingCount {
    pub rating: i64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackStats {
    pub avg_rating: f64,
    pub total_reviews: i64,
    pub positive_percent: i64,
    pub by_channel: Vec<ChannelCount>,
    pub by_rating: Vec<RatingCount>,
}

/// Share of positive reviews as a whole percentage, 0 when there are none.
pub fn positive_percent(positive: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    ((positive as f64 / total as f64) * 100.0).round() as i64
}
