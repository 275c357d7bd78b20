use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Deal, DealId, DealStatus, NewDeal},
    traits::{DealManagement, SettlementError},
};

/// `DealFlowApi` is the public API for the deal lifecycle: creation, lookup, and the general (non-payment-gated)
/// status transitions driven by the business and creator.
pub struct DealFlowApi<B> {
    db: B,
}

impl<B> Debug for DealFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DealFlowApi")
    }
}

impl<B> DealFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> DealFlowApi<B>
where B: DealManagement
{
    /// Creates a new deal in `Pending` status. The agreed price is fixed here for the life of the deal, and every
    /// payment attempt must match it exactly.
    pub async fn create_deal(&self, deal: NewDeal) -> Result<Deal, SettlementError> {
        let deal = self.db.create_deal(deal).await?;
        info!("🤝 Deal [{}] created under campaign {} for {}", deal.id, deal.campaign_id, deal.agreed_price);
        Ok(deal)
    }

    pub async fn fetch_deal(&self, id: &DealId) -> Result<Deal, SettlementError> {
        self.db.fetch_deal(id).await?.ok_or_else(|| SettlementError::DealNotFound(id.clone()))
    }

    /// All deals the subject participates in, as creator or business, newest first.
    pub async fn deals_for_user(&self, subject: &str) -> Result<Vec<Deal>, SettlementError> {
        self.db.fetch_deals_for_user(subject).await
    }

    /// Changes the status of a deal along the general lifecycle edges.
    ///
    /// The legal moves are, per current status:
    ///
    /// | From              | To                                      |
    /// |-------------------|-----------------------------------------|
    /// | Pending           | Accepted, Cancelled, Disputed           |
    /// | Accepted          | Cancelled, Disputed                     |
    /// | InProgress        | ContentSubmitted, Cancelled, Disputed   |
    /// | ContentSubmitted  | RevisionRequested, Approved, Disputed   |
    /// | RevisionRequested | ContentSubmitted, Cancelled, Disputed   |
    /// | Approved          | PaymentPending, Completed, Disputed     |
    /// | PaymentPending    | Completed, Disputed                     |
    /// | Completed         | —                                       |
    /// | Cancelled         | —                                       |
    /// | Disputed          | —                                       |
    ///
    /// `InProgress` is absent from every row: funding a deal is only ever the consequence of a confirmed escrow
    /// payment, committed by the settlement flow. Requesting it here returns `InvalidTransition`, as does any
    /// other move outside the table; requesting the current status returns `TransitionNoOp`.
    ///
    /// A supplied note replaces the deal's notes. Reaching `Completed` stamps `completed_at`.
    pub async fn update_deal_status(
        &self,
        id: &DealId,
        new_status: DealStatus,
        notes: Option<String>,
    ) -> Result<Deal, SettlementError> {
        let deal = self.db.update_deal_status(id, new_status, notes).await?;
        info!("🤝 Deal [{id}] is now {new_status}");
        Ok(deal)
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
