use konnect_common::Rupees;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    config::EsewaConfig,
    error::{CallbackDecodeError, EsewaApiError},
    signature::{canonical_message, sign, SIGNED_FIELD_NAMES},
};

/// The status marker eSewa reports for a completed transaction.
pub const ESEWA_COMPLETE_STATUS: &str = "COMPLETE";

//--------------------------------------   PaymentInitiation   --------------------------------------------------------
/// The signed form-field set for one payment attempt, plus the form endpoint to POST it to.
///
/// The client submits these fields verbatim as a form POST to `esewa_url`; the user then completes payment on the
/// gateway's pages. Tax, service and delivery charges are fixed at zero for marketplace deals, so `total_amount`
/// always equals `amount`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInitiation {
    pub esewa_url: String,
    pub amount: String,
    pub tax_amount: String,
    pub product_service_charge: String,
    pub product_delivery_charge: String,
    pub total_amount: String,
    pub transaction_uuid: String,
    pub product_code: String,
    pub signed_field_names: String,
    pub signature: String,
}

impl PaymentInitiation {
    /// Assembles and signs the form-field set for `amount` against the transaction reference `transaction_uuid`.
    /// Fails only on configuration defects (missing secret or merchant code).
    pub fn build(config: &EsewaConfig, amount: Rupees, transaction_uuid: &str) -> Result<Self, EsewaApiError> {
        config.validate()?;
        let total_amount = amount.to_amount_string();
        let message = canonical_message(&total_amount, transaction_uuid, &config.merchant_code);
        let signature = sign(&message, &config.secret_key)?;
        Ok(Self {
            esewa_url: config.form_url(),
            amount: total_amount.clone(),
            tax_amount: "0".to_string(),
            product_service_charge: "0".to_string(),
            product_delivery_charge: "0".to_string(),
            total_amount,
            transaction_uuid: transaction_uuid.to_string(),
            product_code: config.merchant_code.clone(),
            signed_field_names: SIGNED_FIELD_NAMES.to_string(),
            signature,
        })
    }
}

//--------------------------------------   CallbackPayload   ----------------------------------------------------------
/// The decoded redirect payload eSewa appends to the callback URL as `?data=<base64(json)>`.
///
/// Every field is required; a payload missing any of them is rejected rather than defaulted, since the callback
/// endpoint is reachable by anyone. `total_amount` is kept as the raw string the gateway sent (it arrives with
/// inconsistent grouping, e.g. `1,000.0`) and is used for logging only — verification always uses the amount on
/// our own payment record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackPayload {
    pub transaction_code: String,
    pub status: String,
    #[serde(deserialize_with = "de_number_or_string")]
    pub total_amount: String,
    pub transaction_uuid: String,
    pub product_code: String,
    pub signed_field_names: String,
    pub signature: String,
}

impl CallbackPayload {
    /// Decodes the raw `data` query parameter: base64, then UTF-8, then strict JSON.
    pub fn decode(data: &str) -> Result<Self, CallbackDecodeError> {
        // `+` in the base64 alphabet arrives as a space once the query string has been URL-decoded.
        let data = data.trim().replace(' ', "+");
        let bytes = base64::decode(&data).map_err(|e| CallbackDecodeError::InvalidBase64(e.to_string()))?;
        let json = String::from_utf8(bytes).map_err(|e| CallbackDecodeError::InvalidUtf8(e.to_string()))?;
        serde_json::from_str(&json).map_err(|e| CallbackDecodeError::InvalidPayload(e.to_string()))
    }

    pub fn is_complete(&self) -> bool {
        self.status == ESEWA_COMPLETE_STATUS
    }
}

/// eSewa renders `total_amount` sometimes as a JSON number and sometimes as a grouped string. Accept both,
/// normalise to the raw string form.
fn de_number_or_string<'de, D>(d: D) -> Result<String, D::Error>
where D: Deserializer<'de> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }
    match NumberOrString::deserialize(d)? {
        NumberOrString::Number(n) => Ok(n.to_string()),
        NumberOrString::String(s) => Ok(s),
    }
}
