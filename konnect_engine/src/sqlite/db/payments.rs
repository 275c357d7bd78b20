use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{DealId, NewPayment, Payment, PaymentId},
    traits::SettlementError,
};

/// Inserts a payment attempt in `Pending` status with a freshly minted id (which is also the gateway transaction
/// reference for this attempt).
pub async fn insert_payment(payment: NewPayment, conn: &mut SqliteConnection) -> Result<Payment, SettlementError> {
    let id = PaymentId::fresh();
    let payment: Payment = sqlx::query_as(
        r#"
            INSERT INTO payments (id, deal_id, amount) VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(id.0)
    .bind(payment.deal_id.0)
    .bind(payment.amount)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Payment [{}] created against deal [{}] for {}", payment.id, payment.deal_id, payment.amount);
    Ok(payment)
}

pub async fn fetch_payment(id: &PaymentId, conn: &mut SqliteConnection) -> Result<Option<Payment>, SettlementError> {
    let payment =
        sqlx::query_as("SELECT * FROM payments WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await?;
    Ok(payment)
}

pub async fn fetch_payments_for_deal(
    deal_id: &DealId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, SettlementError> {
    let payments = sqlx::query_as("SELECT * FROM payments WHERE deal_id = $1 ORDER BY created_at ASC")
        .bind(deal_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(payments)
}

/// Compare-and-set edge `Pending → Escrow`. The status guard in the WHERE clause is what makes duplicate
/// callback delivery safe: a second settlement attempt finds no live row and returns `None`.
pub(crate) async fn settle_if_pending(
    id: &PaymentId,
    gateway_ref: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, SettlementError> {
    let payment = sqlx::query_as(
        r#"
            UPDATE payments SET
                status = 'Escrow',
                esewa_ref_id = $2,
                paid_at = CURRENT_TIMESTAMP,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(id.as_str())
    .bind(gateway_ref)
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}

/// Compare-and-set edge `Pending → Failed`. `paid_at` and the gateway reference are never written on this edge.
pub(crate) async fn fail_if_pending(
    id: &PaymentId,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, SettlementError> {
    let payment = sqlx::query_as(
        r#"
            UPDATE payments SET status = 'Failed', updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}
