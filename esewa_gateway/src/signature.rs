//! # ePay-v2 request signatures
//!
//! eSewa authenticates merchant form submissions with a keyed hash over a canonical message. The message is the
//! signed field *values* in a fixed, declared order, each rendered as `key=value` and joined by commas with no
//! whitespace:
//!
//! ```text
//!     total_amount={amount},transaction_uuid={uuid},product_code={code}
//! ```
//!
//! The signature is HMAC-SHA256 over the UTF-8 bytes of that message, base64-encoded. The list of signed field
//! names travels with every payload (the `signed_field_names` field) so the gateway, and any independent
//! verifier, can reconstruct the identical byte sequence. [`SIGNED_FIELD_NAMES`] is the single source of that
//! list; the field order in [`canonical_message`] must never drift from it.

use hmac::{Hmac, Mac};
use konnect_common::Secret;
use sha2::Sha256;

use crate::error::EsewaApiError;

type HmacSha256 = Hmac<Sha256>;

/// The signed fields, in signing order, exactly as echoed to the gateway.
pub const SIGNED_FIELD_NAMES: &str = "total_amount,transaction_uuid,product_code";

/// Builds the canonical message for the given field values. Pure string assembly; the caller is responsible for
/// rendering the amount canonically (see `Rupees::to_amount_string`).
pub fn canonical_message(total_amount: &str, transaction_uuid: &str, product_code: &str) -> String {
    format!("total_amount={total_amount},transaction_uuid={transaction_uuid},product_code={product_code}")
}

/// Signs the canonical message with the shared secret. Deterministic and free of side effects; the only failure
/// mode is an absent secret, which callers are expected to have ruled out via `EsewaConfig::validate`.
pub fn sign(message: &str, secret: &Secret<String>) -> Result<String, EsewaApiError> {
    if secret.is_empty() {
        return Err(EsewaApiError::Configuration("Cannot sign a payment request without a signing secret".into()));
    }
    let mut mac = HmacSha256::new_from_slice(secret.reveal().as_bytes())
        .map_err(|e| EsewaApiError::Configuration(format!("The signing secret is not a usable HMAC key. {e}")))?;
    mac.update(message.as_bytes());
    Ok(base64::encode(mac.finalize().into_bytes()))
}
