//! Customers, their activity history, and loyalty tiers.
//!
//! These are collaborators of the wallet ledger: a wallet points at a
//! customer by id and nothing here writes to the ledger.

use crate::{
    error::{FieldError, LoyaltyError, LoyaltyResult},
    types::{RecordId, Timestamp},
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

pub const DEFAULT_TIER: &str = "Silver";
pub const DEFAULT_SEGMENT: &str = "Occasional";
pub const DEFAULT_ACTIVITY_LIMIT: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub tier: String,
    pub segment: String,
    pub visits: i64,
    pub spend: f64,
    pub last_visit: Option<Timestamp>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub segment: Option<String>,
    #[serde(default)]
    pub visits: Option<i64>,
    #[serde(default)]
    pub spend: Option<f64>,
}

impl NewCustomer {
    pub fn validate(&self) -> LoyaltyResult<()> {
        let mut errors = Vec::new();
        check_name(&self.name, &mut errors);
        check_email(&self.email, &mut errors);
        check_counters(self.visits, self.spend, &mut errors);
        finish(errors)
    }
}

/// Partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tier: Option<String>,
    pub segment: Option<String>,
    pub visits: Option<i64>,
    pub spend: Option<f64>,
}

impl CustomerUpdate {
    pub fn validate(&self) -> LoyaltyResult<()> {
        let mut errors = Vec::new();
        if let Some(name) = &self.name {
            check_name(name, &mut errors);
        }
        if let Some(email) = &self.email {
            check_email(email, &mut errors);
        }
        check_counters(self.visits, self.spend, &mut errors);
        finish(errors)
    }
}

/// Upper-cased initials of the first two words of a name: "Sofia Rodriguez" -> "SR".
pub fn avatar_initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

fn check_name(name: &str, errors: &mut Vec<FieldError>) {
    if name.trim().is_empty() {
        errors.push(FieldError::new("name", "must not be empty"));
    }
}

fn check_email(email: &str, errors: &mut Vec<FieldError>) {
    let trimmed = email.trim();
    let well_formed = trimmed
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
        .unwrap_or(false);
    if !well_formed {
        errors.push(FieldError::new("email", "must be a valid email address"));
    }
}

fn check_counters(visits: Option<i64>, spend: Option<f64>, errors: &mut Vec<FieldError>) {
    if visits.is_some_and(|v| v < 0) {
        errors.push(FieldError::new("visits", "must not be negative"));
    }
    if spend.is_some_and(|s| !s.is_finite() || s < 0.0) {
        errors.push(FieldError::new("spend", "must be a non-negative number"));
    }
}

pub(crate) fn finish(errors: Vec<FieldError>) -> LoyaltyResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(LoyaltyError::Validation(errors))
    }
}

// ── Activity ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Visit,
    Reward,
    Signup,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visit => "visit",
            Self::Reward => "reward",
            Self::Signup => "signup",
        }
    }
}

impl FromStr for ActivityKind {
    type Err = LoyaltyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "visit" => Ok(Self::Visit),
            "reward" => Ok(Self::Reward),
            "signup" => Ok(Self::Signup),
            other => Err(LoyaltyError::invalid(
                "type",
                format!("expected 'visit', 'reward' or 'signup', got '{other}'"),
            )),
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: RecordId,
    pub customer_id: RecordId,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub amount: f64,
    pub reward_used: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    pub customer_id: RecordId,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub reward_used: Option<String>,
}

impl NewActivity {
    /// Validate and resolve the activity kind.
    pub fn validate(&self) -> LoyaltyResult<ActivityKind> {
        let mut errors = Vec::new();
        if self.customer_id <= 0 {
            errors.push(FieldError::new("customerId", "must be a positive integer"));
        }
        if self.amount.is_some_and(|a| !a.is_finite() || a < 0.0) {
            errors.push(FieldError::new("amount", "must be a non-negative number"));
        }
        let kind = match self.kind.parse::<ActivityKind>() {
            Ok(kind) => Some(kind),
            Err(LoyaltyError::Validation(mut e)) => {
                errors.append(&mut e);
                None
            }
            Err(other) => return Err(other),
        };
        finish(errors)?;
        kind.ok_or_else(|| LoyaltyError::invalid("type", "missing"))
    }
}

// ── Tier ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tier {
    pub id: RecordId,
    pub name: String,
    pub requirement: String,
    pub threshold: f64,
    pub benefits: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTier {
    pub name: String,
    pub requirement: String,
    pub threshold: f64,
    #[serde(default)]
    pub benefits: Vec<String>,
}

impl NewTier {
    pub fn validate(&self) -> LoyaltyResult<()> {
        let mut errors = Vec::new();
        check_name(&self.name, &mut errors);
        check_threshold(Some(self.threshold), &mut errors);
        finish(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierUpdate {
    pub name: Option<String>,
    pub requirement: Option<String>,
    pub threshold: Option<f64>,
    pub benefits: Option<Vec<String>>,
}

impl TierUpdate {
    pub fn validate(&self) -> LoyaltyResult<()> {
        let mut errors = Vec::new();
        if let Some(name) = &self.name {
            check_name(name, &mut errors);
        }
        check_threshold(self.threshold, &mut errors);
        finish(errors)
    }
}

fn check_threshold(threshold: Option<f64>, errors: &mut Vec<FieldError>) {
    if threshold.is_some_and(|t| !t.is_finite() || t < 0.0) {
        errors.push(FieldError::new("threshold", "must be a non-negative number"));
    }
}
