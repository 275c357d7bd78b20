//! Behaviour contracts for settlement backends and the payment gateway.
//!
//! Backends (currently SQLite) implement [`DealManagement`] and [`SettlementDatabase`]; anything that can answer
//! "did this transaction clear?" implements [`GatewayVerifier`]. The orchestrator is generic over both, which is
//! what lets the test suites drive the full settlement flow against a real database with a scripted gateway.
mod deal_management;
mod gateway;
mod settlement_database;

pub use deal_management::DealManagement;
pub use gateway::GatewayVerifier;
pub use settlement_database::{SettlementDatabase, SettlementError};
