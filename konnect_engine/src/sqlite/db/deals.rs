use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Deal, DealId, DealStatus, NewDeal},
    traits::SettlementError,
};

/// Inserts a new deal with a freshly minted id. Status, `created_at` and `updated_at` come from the schema
/// defaults.
pub async fn insert_deal(deal: NewDeal, conn: &mut SqliteConnection) -> Result<Deal, SettlementError> {
    let id = DealId::fresh();
    let deal: Deal = sqlx::query_as(
        r#"
            INSERT INTO deals (id, campaign_id, creator_id, business_id, agreed_price, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(id.0)
    .bind(deal.campaign_id)
    .bind(deal.creator_id)
    .bind(deal.business_id)
    .bind(deal.agreed_price)
    .bind(deal.notes)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Deal [{}] inserted for campaign {}", deal.id, deal.campaign_id);
    Ok(deal)
}

pub async fn fetch_deal_by_id(id: &DealId, conn: &mut SqliteConnection) -> Result<Option<Deal>, SettlementError> {
    let deal = sqlx::query_as("SELECT * FROM deals WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await?;
    Ok(deal)
}

/// Deals in which the subject participates on either side, newest first.
pub async fn fetch_deals_for_user(subject: &str, conn: &mut SqliteConnection) -> Result<Vec<Deal>, SettlementError> {
    let deals = sqlx::query_as(
        "SELECT * FROM deals WHERE creator_id = $1 OR business_id = $1 ORDER BY created_at DESC",
    )
    .bind(subject)
    .fetch_all(conn)
    .await?;
    Ok(deals)
}

/// Writes the new status unconditionally. Legality is the caller's responsibility — the backend checks the
/// transition table inside the same transaction before calling this.
///
/// A supplied note replaces the stored notes; `completed_at` is stamped when (and only when) the new status is
/// `Completed`.
pub(crate) async fn update_status(
    id: &DealId,
    status: DealStatus,
    notes: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<Deal>, SettlementError> {
    let deal = sqlx::query_as(
        r#"
            UPDATE deals SET
                status = $1,
                notes = COALESCE($2, notes),
                completed_at = CASE WHEN $1 = 'Completed' THEN CURRENT_TIMESTAMP ELSE completed_at END,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $3
            RETURNING *;
        "#,
    )
    .bind(status.to_string())
    .bind(notes)
    .bind(id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(deal)
}

/// The confirmation-only edge. Guarded so it only fires while the deal is still awaiting payment; a deal that was
/// cancelled, disputed or already funded is left untouched and `None` is returned.
pub(crate) async fn mark_in_progress(
    id: &DealId,
    conn: &mut SqliteConnection,
) -> Result<Option<Deal>, SettlementError> {
    let deal = sqlx::query_as(
        r#"
            UPDATE deals SET status = 'InProgress', updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status IN ('Pending', 'Accepted')
            RETURNING *;
        "#,
    )
    .bind(id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(deal)
}
