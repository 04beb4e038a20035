//! Core types and the phase-resolution model for Tally.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement [`ledger::Ledger`]; everything else (phase resolution,
//! statements, status aggregation, membership, reminders) is written against
//! that trait.

pub mod circle;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod membership;
pub mod moment;
pub mod phase;
pub mod reminder;
pub mod statement;
pub mod status;
pub mod user;

pub use error::{DomainError, Error, Result};
pub use ledger::{Ledger, Upserted};
