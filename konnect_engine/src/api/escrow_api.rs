use std::fmt::Debug;

use esewa_gateway::{CallbackPayload, EsewaConfig, PaymentInitiation};
use konnect_common::Rupees;
use log::*;

use crate::{
    db_types::{DealId, NewPayment, Payment, PaymentId, PaymentStatus},
    traits::{GatewayVerifier, SettlementDatabase, SettlementError},
};

/// `EscrowApi` orchestrates the escrow payment flow: it initiates payment attempts against deals, decodes and
/// re-verifies gateway callbacks, and commits the resulting payment/deal transition as one atomic unit.
///
/// It is the only component that can move a deal into `InProgress`. Generic over the storage backend and the
/// gateway verifier so the whole flow is drivable in tests with a scripted gateway.
pub struct EscrowApi<B, G> {
    db: B,
    verifier: G,
    config: EsewaConfig,
}

impl<B, G> Debug for EscrowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EscrowApi")
    }
}

impl<B, G> EscrowApi<B, G> {
    pub fn new(db: B, verifier: G, config: EsewaConfig) -> Self {
        Self { db, verifier, config }
    }
}

impl<B, G> EscrowApi<B, G>
where
    B: SettlementDatabase,
    G: GatewayVerifier,
{
    /// Creates a `Pending` payment attempt for the deal and returns the signed gateway form parameters the client
    /// submits to eSewa.
    ///
    /// Initiation never implies confirmation: the deal is not touched here. The caller is a trusted first-party
    /// client, so failures propagate loudly — a missing deal is `DealNotFound`, an unconfigured signing secret is
    /// a `Gateway` configuration error (checked before anything is written), and an amount that differs from the
    /// agreed price is `AmountMismatch`.
    pub async fn initiate_payment(
        &self,
        deal_id: &DealId,
        amount: Rupees,
    ) -> Result<PaymentInitiation, SettlementError> {
        self.config.validate()?;
        let deal =
            self.db.fetch_deal(deal_id).await?.ok_or_else(|| SettlementError::DealNotFound(deal_id.clone()))?;
        if amount != deal.agreed_price {
            return Err(SettlementError::AmountMismatch { expected: deal.agreed_price, requested: amount });
        }
        let payment = self.db.insert_payment(NewPayment::new(deal.id, amount)).await?;
        let init = PaymentInitiation::build(&self.config, amount, payment.id.as_str())?;
        info!("💸 Payment [{}] initiated for deal [{deal_id}] ({amount})", payment.id);
        Ok(init)
    }

    /// Handles the gateway's redirect callback.
    ///
    /// The payload arrives from an untrusted party, so this path absorbs every failure: undecodable data, a
    /// transaction reference that is not a payment id, an unknown payment — all yield `None` with nothing
    /// written. A payment that is no longer `Pending` is returned as-is without consulting the gateway, which is
    /// what makes duplicate delivery harmless.
    ///
    /// Confirmation requires both the gateway's independent say-so (queried with the amount from *our* record,
    /// never the amount claimed in the payload) and the payload's own `COMPLETE` marker. On confirmation the
    /// settlement commit moves payment and deal together; on anything else the payment is marked `Failed` and the
    /// deal stays untouched.
    pub async fn process_callback(&self, data: &str) -> Option<Payment> {
        let payload = match CallbackPayload::decode(data) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("💸 Discarding an undecodable gateway callback. {e}");
                return None;
            },
        };
        let payment_id = match payload.transaction_uuid.parse::<PaymentId>() {
            Ok(id) => id,
            Err(e) => {
                warn!("💸 Callback transaction reference does not name a payment. {e}");
                return None;
            },
        };
        let payment = match self.db.fetch_payment(&payment_id).await {
            Ok(Some(payment)) => payment,
            Ok(None) => {
                info!("💸 Received a callback for unknown payment [{payment_id}]");
                return None;
            },
            Err(e) => {
                error!("💸 Could not load payment [{payment_id}] while handling a callback. {e}");
                return None;
            },
        };
        if payment.status != PaymentStatus::Pending {
            debug!(
                "💸 Duplicate callback for payment [{payment_id}] (already {}); returning the existing record",
                payment.status
            );
            return Some(payment);
        }
        let confirmed = self.verifier.verify(&payload.transaction_code, payment.amount).await;
        if confirmed && payload.is_complete() {
            match self.db.settle_payment(&payment.id, &payload.transaction_code).await {
                Ok((payment, true)) => {
                    info!("💸 Payment [{}] escrowed; deal [{}] is now in progress", payment.id, payment.deal_id);
                    Some(payment)
                },
                Ok((payment, false)) => Some(payment),
                Err(SettlementError::DealNotConfirmable { deal_id, status }) => {
                    error!(
                        "💸 Gateway confirmed payment [{}] but deal [{deal_id}] is {status}. Marking the attempt \
                         failed; manual reconciliation required.",
                        payment.id
                    );
                    self.mark_failed(&payment.id).await
                },
                Err(e) => {
                    error!("💸 Could not settle payment [{}]. {e}", payment.id);
                    None
                },
            }
        } else {
            if payload.is_complete() {
                info!("💸 Gateway did not confirm payment [{}]; marking it failed", payment.id);
            } else {
                info!("💸 Callback reported status '{}' for payment [{}]; marking it failed", payload.status, payment.id);
            }
            self.mark_failed(&payment.id).await
        }
    }

    /// Re-checks a transaction's status directly with the gateway. Used defensively when a callback was lost; no
    /// state changes here.
    pub async fn verify_payment(&self, transaction_ref: &str, amount: Rupees) -> bool {
        self.verifier.verify(transaction_ref, amount).await
    }

    /// All payment attempts recorded against a deal, oldest first.
    pub async fn payments_for_deal(&self, deal_id: &DealId) -> Result<Vec<Payment>, SettlementError> {
        self.db.fetch_deal(deal_id).await?.ok_or_else(|| SettlementError::DealNotFound(deal_id.clone()))?;
        self.db.fetch_payments_for_deal(deal_id).await
    }

    async fn mark_failed(&self, id: &PaymentId) -> Option<Payment> {
        match self.db.fail_payment(id).await {
            Ok((payment, _)) => Some(payment),
            Err(e) => {
                error!("💸 Could not mark payment [{id}] as failed. {e}");
                None
            },
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
