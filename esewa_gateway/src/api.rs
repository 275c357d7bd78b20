use std::sync::Arc;

use konnect_common::Rupees;
use log::*;
use reqwest::Client;
use serde::Deserialize;

use crate::{config::EsewaConfig, data_objects::ESEWA_COMPLETE_STATUS, error::EsewaApiError};

/// Client for eSewa's read-only transaction-status endpoint.
///
/// The client applies a bounded timeout to every request. Verification is deliberately conservative: only a 2xx
/// response whose body carries the `COMPLETE` status marker counts as confirmation; everything else — declines,
/// timeouts, transport faults, malformed bodies — is "not confirmed".
#[derive(Clone)]
pub struct EsewaApi {
    config: EsewaConfig,
    client: Arc<Client>,
}

impl EsewaApi {
    pub fn new(config: EsewaConfig) -> Result<Self, EsewaApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EsewaApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &EsewaConfig {
        &self.config
    }

    /// Queries the gateway for the status of `transaction_ref` and reports whether the payment is confirmed.
    ///
    /// A decline is an expected outcome and logged at `info`; transport faults and malformed responses are logged
    /// at `warn` so operators can distinguish "the user did not pay" from "we could not ask", and follow up with a
    /// manual re-check. Both yield `false` — a deal is never advanced on ambiguous evidence.
    pub async fn verify(&self, transaction_ref: &str, amount: Rupees) -> bool {
        match self.try_verify(transaction_ref, amount).await {
            Ok(true) => {
                debug!("📡 eSewa confirmed transaction [{transaction_ref}] for {amount}");
                true
            },
            Ok(false) => {
                info!("📡 eSewa did not confirm transaction [{transaction_ref}] for {amount}");
                false
            },
            Err(e) => {
                warn!("📡 Could not verify transaction [{transaction_ref}]: {e}. Treating as not confirmed.");
                false
            },
        }
    }

    /// The fallible inner query, kept separate so transport faults stay distinguishable from declines.
    pub async fn try_verify(&self, transaction_ref: &str, amount: Rupees) -> Result<bool, EsewaApiError> {
        let url = self.config.status_url();
        let total_amount = amount.to_amount_string();
        let params = [
            ("product_code", self.config.merchant_code.as_str()),
            ("total_amount", total_amount.as_str()),
            ("transaction_uuid", transaction_ref),
        ];
        trace!("📡 Status query for transaction [{transaction_ref}]");
        let response = self
            .client
            .get(url)
            .query(&params)
            .send()
            .await
            .map_err(|e| EsewaApiError::TransportError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(EsewaApiError::QueryError { status, message });
        }
        let body: TransactionStatus =
            response.json().await.map_err(|e| EsewaApiError::JsonError(e.to_string()))?;
        Ok(body.status == ESEWA_COMPLETE_STATUS)
    }
}

#[derive(Debug, Deserialize)]
struct TransactionStatus {
    status: String,
    #[serde(default)]
    #[allow(dead_code)]
    ref_id: Option<String>,
}
