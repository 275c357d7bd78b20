//! `SqliteDatabase` is a concrete settlement backend over SQLite.
//!
//! It implements the traits in the [`crate::traits`] module, composing the low-level query functions in
//! [`super::db`] into pool-owned transactions wherever a flow touches more than one row.
use std::fmt::Debug;

use log::*;
use sqlx::{
    migrate,
    migrate::MigrateDatabase,
    Sqlite,
    SqlitePool,
};

use super::db::{deals, new_pool, payments};
use crate::{
    db_types::{Deal, DealId, DealStatus, NewDeal, NewPayment, Payment, PaymentId},
    traits::{DealManagement, SettlementDatabase, SettlementError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SettlementError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Creates the database file if it does not exist yet. A no-op for databases that are already in place.
    pub async fn create_database(url: &str) -> Result<(), SettlementError> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await.map_err(|e| SettlementError::DatabaseError(e.to_string()))?;
            info!("🗃️ Created Sqlite database {url}");
        }
        Ok(())
    }

    /// Brings the schema up to date. Run at startup, before the first request is served.
    pub async fn migrate(&self) -> Result<(), SettlementError> {
        migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| SettlementError::DatabaseError(e.to_string()))?;
        info!("🗃️ Migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl DealManagement for SqliteDatabase {
    async fn create_deal(&self, deal: NewDeal) -> Result<Deal, SettlementError> {
        if !deal.agreed_price.is_positive() {
            return Err(SettlementError::InvalidPrice(deal.agreed_price));
        }
        let mut tx = self.pool.begin().await?;
        let deal = deals::insert_deal(deal, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Deal [{}] created between {} and {}", deal.id, deal.business_id, deal.creator_id);
        Ok(deal)
    }

    async fn fetch_deal(&self, id: &DealId) -> Result<Option<Deal>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        deals::fetch_deal_by_id(id, &mut conn).await
    }

    async fn fetch_deals_for_user(&self, subject: &str) -> Result<Vec<Deal>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        deals::fetch_deals_for_user(subject, &mut conn).await
    }

    async fn update_deal_status(
        &self,
        id: &DealId,
        new_status: DealStatus,
        notes: Option<String>,
    ) -> Result<Deal, SettlementError> {
        let mut tx = self.pool.begin().await?;
        let deal =
            deals::fetch_deal_by_id(id, &mut tx).await?.ok_or_else(|| SettlementError::DealNotFound(id.clone()))?;
        if deal.status == new_status {
            return Err(SettlementError::TransitionNoOp);
        }
        if !deal.status.can_transition_to(new_status) {
            return Err(SettlementError::InvalidTransition { from: deal.status, to: new_status });
        }
        let updated = deals::update_status(id, new_status, notes.as_deref(), &mut tx)
            .await?
            .ok_or_else(|| SettlementError::DealNotFound(id.clone()))?;
        tx.commit().await?;
        debug!("🗃️ Deal [{id}] moved from {} to {new_status}", deal.status);
        Ok(updated)
    }
}

impl SettlementDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, SettlementError> {
        let mut tx = self.pool.begin().await?;
        // SQLite only enforces the FK with a pragma, so the existence check lives here.
        deals::fetch_deal_by_id(&payment.deal_id, &mut tx)
            .await?
            .ok_or_else(|| SettlementError::DealNotFound(payment.deal_id.clone()))?;
        let payment = payments::insert_payment(payment, &mut tx).await?;
        tx.commit().await?;
        Ok(payment)
    }

    async fn fetch_payment(&self, id: &PaymentId) -> Result<Option<Payment>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        payments::fetch_payment(id, &mut conn).await
    }

    async fn fetch_payments_for_deal(&self, deal_id: &DealId) -> Result<Vec<Payment>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        payments::fetch_payments_for_deal(deal_id, &mut conn).await
    }

    /// The hazardous region: the payment CAS and the deal's confirmation edge execute inside one transaction, so
    /// no reader ever observes a payment in `Escrow` whose deal has not advanced, or the reverse.
    async fn settle_payment(&self, id: &PaymentId, gateway_ref: &str) -> Result<(Payment, bool), SettlementError> {
        let mut tx = self.pool.begin().await?;
        match payments::settle_if_pending(id, gateway_ref, &mut tx).await? {
            Some(payment) => match deals::mark_in_progress(&payment.deal_id, &mut tx).await? {
                Some(deal) => {
                    tx.commit().await?;
                    debug!("🗃️ Payment [{id}] escrowed; deal [{}] is now {}", deal.id, deal.status);
                    Ok((payment, true))
                },
                None => {
                    // The deal left its payment-awaiting state between initiation and callback. Roll the payment
                    // update back and report the conflict; nothing is committed.
                    tx.rollback().await?;
                    let mut conn = self.pool.acquire().await?;
                    let deal = deals::fetch_deal_by_id(&payment.deal_id, &mut conn)
                        .await?
                        .ok_or_else(|| SettlementError::DealNotFound(payment.deal_id.clone()))?;
                    warn!("🗃️ Payment [{id}] was confirmed but deal [{}] is {}", deal.id, deal.status);
                    Err(SettlementError::DealNotConfirmable { deal_id: deal.id, status: deal.status })
                },
            },
            None => {
                let mut conn = self.pool.acquire().await?;
                let existing = payments::fetch_payment(id, &mut conn)
                    .await?
                    .ok_or_else(|| SettlementError::PaymentNotFound(id.clone()))?;
                debug!("🗃️ Payment [{id}] is already {}; settlement is a no-op", existing.status);
                Ok((existing, false))
            },
        }
    }

    async fn fail_payment(&self, id: &PaymentId) -> Result<(Payment, bool), SettlementError> {
        let mut conn = self.pool.acquire().await?;
        match payments::fail_if_pending(id, &mut conn).await? {
            Some(payment) => {
                debug!("🗃️ Payment [{id}] marked as failed");
                Ok((payment, true))
            },
            None => {
                let existing = payments::fetch_payment(id, &mut conn)
                    .await?
                    .ok_or_else(|| SettlementError::PaymentNotFound(id.clone()))?;
                Ok((existing, false))
            },
        }
    }

    async fn close(&mut self) -> Result<(), SettlementError> {
        self.pool.close().await;
        Ok(())
    }
}
