use crate::{
    db_types::{Deal, DealId, DealStatus, NewDeal},
    traits::SettlementError,
};

/// Deal ownership: every write to a deal row flows through an implementation of this trait, and the general
/// status-update path enforces the lifecycle legality table. The one transition this trait cannot perform is
/// the payment-confirmation edge into `InProgress` — that lives on [`super::SettlementDatabase`] and is reachable
/// only from the escrow orchestrator.
#[allow(async_fn_in_trait)]
pub trait DealManagement {
    /// Creates a new deal in `Pending` status. The agreed price must be positive.
    async fn create_deal(&self, deal: NewDeal) -> Result<Deal, SettlementError>;

    /// Fetches a deal by id.
    async fn fetch_deal(&self, id: &DealId) -> Result<Option<Deal>, SettlementError>;

    /// All deals in which the given subject participates, as creator or business, newest first.
    async fn fetch_deals_for_user(&self, subject: &str) -> Result<Vec<Deal>, SettlementError>;

    /// Applies a general (non-payment-gated) status transition.
    ///
    /// The target must be legal per `DealStatus::can_transition_to`; a same-status write is rejected as a no-op.
    /// When a note is supplied it replaces the deal's notes. Reaching `Completed` stamps `completed_at`; since
    /// `Completed` has no outgoing edges, the stamp can happen at most once. Every transition touches
    /// `updated_at`.
    async fn update_deal_status(
        &self,
        id: &DealId,
        new_status: DealStatus,
        notes: Option<String>,
    ) -> Result<Deal, SettlementError>;
}
