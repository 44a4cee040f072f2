//! Restaurant tables and the parties seated at them.

use crate::{
    customer::finish,
    error::{FieldError, LoyaltyError, LoyaltyResult},
    types::{RecordId, Timestamp},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const MAX_PARTY_SIZE: i64 = 20;
pub const DEFAULT_LOCATION: &str = "Main";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Available,
    Occupied,
    Reserved,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
            Self::Reserved => "reserved",
        }
    }
}

impl FromStr for TableStatus {
    type Err = LoyaltyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "occupied" => Ok(Self::Occupied),
            "reserved" => Ok(Self::Reserved),
            other => Err(LoyaltyError::invalid(
                "status",
                format!("unknown table status '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Seated,
    Cleared,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seated => "seated",
            Self::Cleared => "cleared",
        }
    }
}

impl FromStr for SessionStatus {
    type Err = LoyaltyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seated" => Ok(Self::Seated),
            "cleared" => Ok(Self::Cleared),
            other => Err(LoyaltyError::invalid(
                "status",
                format!("unknown session status '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantTable {
    pub id: RecordId,
    pub name: String,
    pub capacity: i64,
    pub location: String,
    pub status: TableStatus,
    pub notes: Option<String>,
    pub current_customer_id: Option<RecordId>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTable {
    pub name: String,
    pub capacity: i64,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: Option<TableStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewTable {
    pub fn validate(&self) -> LoyaltyResult<()> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "must not be empty"));
        }
        check_size("capacity", Some(self.capacity), &mut errors);
        finish(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableUpdate {
    pub name: Option<String>,
    pub capacity: Option<i64>,
    pub location: Option<String>,
    pub status: Option<TableStatus>,
    pub notes: Option<String>,
}

impl TableUpdate {
    pub fn validate(&self) -> LoyaltyResult<()> {
        let mut errors = Vec::new();
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            errors.push(FieldError::new("name", "must not be empty"));
        }
        check_size("capacity", self.capacity, &mut errors);
        finish(errors)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TableSession {
    pub id: RecordId,
    pub table_id: RecordId,
    pub customer_id: Option<RecordId>,
    pub party_size: i64,
    pub status: SessionStatus,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub table_id: RecordId,
    #[serde(default)]
    pub customer_id: Option<RecordId>,
    pub party_size: i64,
}

impl NewSession {
    pub fn validate(&self) -> LoyaltyResult<()> {
        let mut errors = Vec::new();
        if self.table_id <= 0 {
            errors.push(FieldError::new("tableId", "must be a positive integer"));
        }
        if self.customer_id.is_some_and(|c| c <= 0) {
            errors.push(FieldError::new("customerId", "must be a positive integer"));
        }
        check_size("partySize", Some(self.party_size), &mut errors);
        finish(errors)
    }
}

/// Clearing a session frees its table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdate {
    pub status: Option<SessionStatus>,
    pub party_size: Option<i64>,
    pub ended_at: Option<Timestamp>,
}

impl SessionUpdate {
    pub fn validate(&self) -> LoyaltyResult<()> {
        let mut errors = Vec::new();
        check_size("partySize", self.party_size, &mut errors);
        finish(errors)
    }
}

fn check_size(field: &str, value: Option<i64>, errors: &mut Vec<FieldError>) {
    if value.is_some_and(|v| !(1..=MAX_PARTY_SIZE).contains(&v)) {
        errors.push(FieldError::new(
            field,
            format!("must be between 1 and {MAX_PARTY_SIZE}"),
        ));
    }
}
