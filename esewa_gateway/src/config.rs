use std::{env, time::Duration};

use konnect_common::{helpers::parse_boolean_flag, Secret};
use log::*;

use crate::error::EsewaApiError;

const DEFAULT_TEST_BASE_URL: &str = "https://rc-epay.esewa.com.np";
const DEFAULT_PRODUCTION_URL: &str = "https://epay.esewa.com.np";
/// eSewa's published UAT merchant code and signing key. Production deployments must override both.
const DEFAULT_TEST_MERCHANT_CODE: &str = "EPAYTEST";
const DEFAULT_TEST_SECRET_KEY: &str = "8gBm/:&EnhH.1/q";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

const FORM_PATH: &str = "/api/epay/main/v2/form";
const STATUS_PATH: &str = "/api/epay/transaction/status/";

/// Immutable gateway configuration, built once at process startup.
#[derive(Clone, Debug)]
pub struct EsewaConfig {
    /// Base URL of the sandbox (UAT) gateway.
    pub base_url: String,
    /// Base URL of the production gateway.
    pub production_url: String,
    /// The merchant product code; doubles as the `product_code` signed field.
    pub merchant_code: String,
    /// Shared HMAC signing secret issued by eSewa.
    pub secret_key: Secret<String>,
    /// When true, requests are directed at the sandbox gateway.
    pub test_mode: bool,
    /// Bounded timeout applied to every outbound status query.
    pub timeout: Duration,
}

impl Default for EsewaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_TEST_BASE_URL.to_string(),
            production_url: DEFAULT_PRODUCTION_URL.to_string(),
            merchant_code: DEFAULT_TEST_MERCHANT_CODE.to_string(),
            secret_key: Secret::new(DEFAULT_TEST_SECRET_KEY.to_string()),
            test_mode: true,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl EsewaConfig {
    pub fn from_env_or_default() -> Self {
        let base_url = env::var("ESEWA_BASE_URL").ok().unwrap_or_else(|| DEFAULT_TEST_BASE_URL.into());
        let production_url = env::var("ESEWA_PRODUCTION_URL").ok().unwrap_or_else(|| DEFAULT_PRODUCTION_URL.into());
        let test_mode = parse_boolean_flag(env::var("ESEWA_TEST_MODE").ok(), true);
        let merchant_code = env::var("ESEWA_MERCHANT_CODE").ok().unwrap_or_else(|| {
            if test_mode {
                info!("🔏 ESEWA_MERCHANT_CODE is not set. Using the UAT merchant code, {DEFAULT_TEST_MERCHANT_CODE}.");
            } else {
                error!("🔏 ESEWA_MERCHANT_CODE is not set. Payment initiation will be rejected until it is.");
            }
            DEFAULT_TEST_MERCHANT_CODE.into()
        });
        let secret_key = match env::var("ESEWA_SECRET_KEY") {
            Ok(key) => Secret::new(key),
            Err(_) if test_mode => {
                info!("🔏 ESEWA_SECRET_KEY is not set. Using the published UAT signing key.");
                Secret::new(DEFAULT_TEST_SECRET_KEY.into())
            },
            Err(_) => {
                error!("🔏 ESEWA_SECRET_KEY is not set. Payment initiation will be rejected until it is.");
                Secret::new(String::new())
            },
        };
        let timeout = env::var("ESEWA_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🔏 Invalid value for ESEWA_TIMEOUT_SECS ({s}). {e}. Using the default."))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        Self { base_url, production_url, merchant_code, secret_key, test_mode, timeout }
    }

    /// The gateway base URL for the configured mode.
    pub fn effective_base_url(&self) -> &str {
        if self.test_mode {
            &self.base_url
        } else {
            &self.production_url
        }
    }

    /// The form endpoint the client browser POSTs the signed fields to.
    pub fn form_url(&self) -> String {
        format!("{}{FORM_PATH}", self.effective_base_url())
    }

    /// The read-only transaction-status endpoint used for verification.
    pub fn status_url(&self) -> String {
        format!("{}{STATUS_PATH}", self.effective_base_url())
    }

    /// A missing signing secret or merchant code is a deployment defect. This is checked before any signing is
    /// attempted so the initiate path fails fast instead of producing unsigned requests.
    pub fn validate(&self) -> Result<(), EsewaApiError> {
        if self.merchant_code.trim().is_empty() {
            return Err(EsewaApiError::Configuration("The merchant product code is not set".into()));
        }
        if self.secret_key.is_empty() {
            return Err(EsewaApiError::Configuration("The signing secret is not set".into()));
        }
        Ok(())
    }
}
