use konnect_common::Rupees;
use konnect_engine::db_types::{DealId, DealStatus};
use serde::{Deserialize, Serialize};

/// The business id comes from the verified subject, never the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDealRequest {
    pub campaign_id: String,
    pub creator_id: String,
    /// The agreed price in paisa.
    pub agreed_price: Rupees,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDealStatusRequest {
    pub status: DealStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiatePaymentRequest {
    pub deal_id: DealId,
    /// The amount in paisa. Must equal the deal's agreed price.
    pub amount: Rupees,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyParams {
    /// The amount in paisa to verify against.
    pub amount: Rupees,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub confirmed: bool,
}

/// The single query parameter eSewa appends to its redirect.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackParams {
    pub data: String,
}
