use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use esewa_gateway::EsewaApiError;
use konnect_engine::traits::SettlementError;
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The requested status change is not allowed. {0}")]
    InvalidStatusChange(String),
    #[error("No verified subject accompanied the request.")]
    Unauthenticated,
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidStatusChange(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<SettlementError> for ServerError {
    fn from(e: SettlementError) -> Self {
        match &e {
            SettlementError::DealNotFound(_) | SettlementError::PaymentNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            SettlementError::InvalidTransition { .. } | SettlementError::TransitionNoOp => {
                Self::InvalidStatusChange(e.to_string())
            },
            SettlementError::AmountMismatch { .. } | SettlementError::InvalidPrice(_) => {
                Self::InvalidRequestBody(e.to_string())
            },
            SettlementError::Gateway(EsewaApiError::Configuration(msg)) => Self::ConfigurationError(msg.clone()),
            SettlementError::Gateway(inner) => Self::BackendError(inner.to_string()),
            SettlementError::DatabaseError(_)
            | SettlementError::DealNotConfirmable { .. }
            | SettlementError::PaymentStatusUpdateError(_) => {
                error!("💻 Unexpected backend failure. {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}
