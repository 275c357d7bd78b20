//! Subject extraction for authenticated routes.
//!
//! Token issuance and validation are delegated to an external identity provider; by the time a request reaches
//! this server, the fronting proxy has already verified the caller and injected their subject identifier in the
//! [`SUBJECT_HEADER`] header. Routes that require a caller identity take [`AuthenticatedSubject`] as an
//! extractor argument; requests without the header are rejected with 401 before the handler runs.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use log::trace;

use crate::errors::ServerError;

pub const SUBJECT_HEADER: &str = "x-konnect-subject";

/// The verified subject identifier of the caller.
#[derive(Debug, Clone)]
pub struct AuthenticatedSubject(pub String);

impl AuthenticatedSubject {
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl FromRequest for AuthenticatedSubject {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let subject = req
            .headers()
            .get(SUBJECT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| AuthenticatedSubject(s.to_string()));
        if subject.is_none() {
            trace!("💻 Rejecting a request with no verified subject");
        }
        ready(subject.ok_or(ServerError::Unauthenticated))
    }
}
