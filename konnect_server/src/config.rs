use std::env;

use esewa_gateway::EsewaConfig;
use log::*;

const DEFAULT_KONNECT_HOST: &str = "127.0.0.1";
const DEFAULT_KONNECT_PORT: u16 = 8480;
const DEFAULT_SUCCESS_REDIRECT: &str = "/payment/success";
const DEFAULT_FAILURE_REDIRECT: &str = "/payment/failed";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Gateway configuration (endpoints, merchant code, signing secret, mode flag).
    pub esewa: EsewaConfig,
    /// Where the callback boundary sends the user's browser after settlement.
    pub redirects: RedirectTargets,
}

/// The subset of the configuration the callback handler needs. Deliberately tiny so no secrets travel with it
/// into the request path.
#[derive(Clone, Debug)]
pub struct RedirectTargets {
    pub success: String,
    pub failure: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_KONNECT_HOST.to_string(),
            port: DEFAULT_KONNECT_PORT,
            database_url: String::default(),
            esewa: EsewaConfig::default(),
            redirects: RedirectTargets {
                success: DEFAULT_SUCCESS_REDIRECT.to_string(),
                failure: DEFAULT_FAILURE_REDIRECT.to_string(),
            },
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("KONNECT_HOST").ok().unwrap_or_else(|| DEFAULT_KONNECT_HOST.into());
        let port = env::var("KONNECT_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "💻 {s} is not a valid port for KONNECT_PORT. {e} Using the default, \
                         {DEFAULT_KONNECT_PORT}, instead."
                    );
                    DEFAULT_KONNECT_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_KONNECT_PORT);
        let database_url = env::var("KONNECT_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("💻 KONNECT_DATABASE_URL is not set. Please set it to the URL for the settlement database.");
            String::default()
        });
        let success = env::var("KONNECT_SUCCESS_REDIRECT").ok().unwrap_or_else(|| {
            info!("💻 KONNECT_SUCCESS_REDIRECT is not set. Using {DEFAULT_SUCCESS_REDIRECT}.");
            DEFAULT_SUCCESS_REDIRECT.into()
        });
        let failure = env::var("KONNECT_FAILURE_REDIRECT").ok().unwrap_or_else(|| {
            info!("💻 KONNECT_FAILURE_REDIRECT is not set. Using {DEFAULT_FAILURE_REDIRECT}.");
            DEFAULT_FAILURE_REDIRECT.into()
        });
        let esewa = EsewaConfig::from_env_or_default();
        Self { host, port, database_url, esewa, redirects: RedirectTargets { success, failure } }
    }
}
