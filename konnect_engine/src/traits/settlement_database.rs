use esewa_gateway::EsewaApiError;
use konnect_common::Rupees;
use thiserror::Error;

use crate::{
    db_types::{DealId, DealStatus, NewPayment, Payment, PaymentId},
    traits::DealManagement,
};

/// The storage contract for the escrow settlement flow.
///
/// Payment rows are owned exclusively by implementations of this trait. The settlement edges are expressed as
/// compare-and-set operations so that duplicate gateway callbacks, retried redirects and concurrent deliveries
/// all collapse to a single effective transition: only a `Pending` payment is live, and the `(record, bool)`
/// return shape reports whether this call was the one that moved it.
#[allow(async_fn_in_trait)]
pub trait SettlementDatabase: Clone + DealManagement {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Creates a payment attempt in `Pending` status with a freshly minted id. The referenced deal must exist.
    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, SettlementError>;

    /// Fetches a payment by id.
    async fn fetch_payment(&self, id: &PaymentId) -> Result<Option<Payment>, SettlementError>;

    /// All payment attempts recorded against a deal, oldest first.
    async fn fetch_payments_for_deal(&self, deal_id: &DealId) -> Result<Vec<Payment>, SettlementError>;

    /// Commits a confirmed payment: in a single atomic unit, moves the payment `Pending → Escrow` (recording the
    /// gateway reference and stamping `paid_at`) and drives its deal into `InProgress` through the
    /// confirmation-only edge. Either both writes commit or neither does.
    ///
    /// If the payment is no longer `Pending`, nothing is written and the existing record is returned with
    /// `false`. If the payment is live but its deal is not awaiting payment, the whole unit rolls back and
    /// `DealNotConfirmable` is returned.
    async fn settle_payment(&self, id: &PaymentId, gateway_ref: &str) -> Result<(Payment, bool), SettlementError>;

    /// Moves a live payment `Pending → Failed`. The deal is never touched. A payment already finalised is left
    /// unchanged and returned with `false`.
    async fn fail_payment(&self, id: &PaymentId) -> Result<(Payment, bool), SettlementError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), SettlementError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("We have an internal database engine error: {0}")]
    DatabaseError(String),
    #[error("The requested deal {0} does not exist")]
    DealNotFound(DealId),
    #[error("The requested payment {0} does not exist")]
    PaymentNotFound(PaymentId),
    #[error("A deal cannot move from {from} to {to}")]
    InvalidTransition { from: DealStatus, to: DealStatus },
    #[error("The requested deal change would result in a no-op")]
    TransitionNoOp,
    #[error("The agreed price must be positive, got {0}")]
    InvalidPrice(Rupees),
    #[error("Payment amount {requested} does not match the agreed price {expected}")]
    AmountMismatch { expected: Rupees, requested: Rupees },
    #[error("Deal {deal_id} is not awaiting payment (status is {status})")]
    DealNotConfirmable { deal_id: DealId, status: DealStatus },
    #[error("Illegal payment status change. {0}")]
    PaymentStatusUpdateError(String),
    #[error("{0}")]
    Gateway(#[from] EsewaApiError),
}

impl From<sqlx::Error> for SettlementError {
    fn from(e: sqlx::Error) -> Self {
        SettlementError::DatabaseError(e.to_string())
    }
}
