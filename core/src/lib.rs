//! loyalty-core: wallet ledger and back-office records for a restaurant
//! loyalty program, plus the HTTP router that exposes them.

pub mod api;
pub mod clock;
pub mod config;
pub mod customer;
pub mod error;
pub mod feedback;
pub mod ledger;
pub mod reporting;
pub mod seating;
pub mod seed;
pub mod store;
pub mod types;
pub mod wallet;
