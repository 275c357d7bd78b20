//! eSewa ePay-v2 gateway integration.
//!
//! Everything that is shaped by the eSewa protocol lives in this crate: the gateway configuration (test and
//! production endpoints, merchant product code, shared signing secret), the request-signing scheme, the typed
//! decoder for the redirect callback payload, and the outbound transaction-status client.
//!
//! The crate knows nothing about deals, payments or storage. Callers hand it amounts and transaction references;
//! it hands back signed form parameters and confirmation verdicts.
mod api;
mod config;
pub mod data_objects;
mod error;
pub mod signature;

pub use api::EsewaApi;
pub use config::EsewaConfig;
pub use data_objects::{CallbackPayload, PaymentInitiation, ESEWA_COMPLETE_STATUS};
pub use error::{CallbackDecodeError, EsewaApiError};
