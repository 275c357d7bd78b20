//! Konnect Settlement Engine
//!
//! The settlement engine owns the two records with money on the line — deals and payments — and the rules for
//! moving them. It is split into:
//!
//! 1. Database management and control ([`mod@sqlite`] behind the `sqlite` feature). You should never need to
//!    access the database directly; use the public APIs instead. The exception is the record types themselves,
//!    which live in [`db_types`] and are public.
//! 2. The public API surface: [`DealFlowApi`] for the deal lifecycle (creation, lookup, the general status
//!    transitions available to businesses and creators) and [`EscrowApi`] for the escrow payment flow
//!    (initiation, callback verification, the atomic settlement commit). Backends implement the traits in
//!    [`traits`] to plug in underneath.
//!
//! The deliberate asymmetry between the two APIs is the core design rule: `DealFlowApi` can never move a deal
//! into `InProgress`. That edge belongs to the settlement commit alone, so "payment received" is always the
//! gateway's word, never a client's.
pub mod db_types;
pub mod traits;

mod api;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use api::{DealFlowApi, EscrowApi};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
