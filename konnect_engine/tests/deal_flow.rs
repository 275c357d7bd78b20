mod support;

use konnect_common::Rupees;
use konnect_engine::{
    db_types::{DealStatus, NewDeal},
    traits::SettlementError,
    DealFlowApi,
};
use support::prepare_test_db;

fn new_deal() -> NewDeal {
    NewDeal::new("campaign-1", "creator-1", "business-1", Rupees::from_rupees(500))
}

#[tokio::test]
async fn created_deals_start_pending() {
    let api = DealFlowApi::new(prepare_test_db().await);
    let deal = api.create_deal(new_deal().with_notes("two reels, one story")).await.unwrap();
    assert_eq!(deal.status, DealStatus::Pending);
    assert_eq!(deal.agreed_price, Rupees::from_rupees(500));
    assert_eq!(deal.notes.as_deref(), Some("two reels, one story"));
    assert_eq!(deal.campaign_id, "campaign-1");
    assert!(deal.completed_at.is_none());

    let fetched = api.fetch_deal(&deal.id).await.unwrap();
    assert_eq!(fetched.id, deal.id);
    assert_eq!(fetched.status, DealStatus::Pending);
}

#[tokio::test]
async fn deals_require_a_positive_price() {
    let api = DealFlowApi::new(prepare_test_db().await);
    let deal = NewDeal::new("campaign-1", "creator-1", "business-1", Rupees::from_rupees(0));
    assert!(matches!(api.create_deal(deal).await, Err(SettlementError::InvalidPrice(_))));
}

#[tokio::test]
async fn fetching_an_unknown_deal_fails() {
    let api = DealFlowApi::new(prepare_test_db().await);
    let id = "3b3f9dc3-56a1-4f4c-9be5-6a2e3a1c0d4f".parse().unwrap();
    assert!(matches!(api.fetch_deal(&id).await, Err(SettlementError::DealNotFound(_))));
}

#[tokio::test]
async fn acceptance_and_cancellation_follow_the_table() {
    let api = DealFlowApi::new(prepare_test_db().await);
    let deal = api.create_deal(new_deal()).await.unwrap();

    let deal = api.update_deal_status(&deal.id, DealStatus::Accepted, None).await.unwrap();
    assert_eq!(deal.status, DealStatus::Accepted);

    let deal = api.update_deal_status(&deal.id, DealStatus::Cancelled, Some("budget pulled".into())).await.unwrap();
    assert_eq!(deal.status, DealStatus::Cancelled);
    assert_eq!(deal.notes.as_deref(), Some("budget pulled"));

    // Terminal: nothing leaves Cancelled.
    let err = api.update_deal_status(&deal.id, DealStatus::Pending, None).await.unwrap_err();
    assert!(matches!(err, SettlementError::InvalidTransition { .. }));
}

#[tokio::test]
async fn clients_cannot_declare_a_deal_in_progress() {
    let api = DealFlowApi::new(prepare_test_db().await);
    let deal = api.create_deal(new_deal()).await.unwrap();

    let err = api.update_deal_status(&deal.id, DealStatus::InProgress, None).await.unwrap_err();
    assert!(matches!(
        err,
        SettlementError::InvalidTransition { from: DealStatus::Pending, to: DealStatus::InProgress }
    ));
    let deal = api.fetch_deal(&deal.id).await.unwrap();
    assert_eq!(deal.status, DealStatus::Pending);
}

#[tokio::test]
async fn same_status_writes_are_rejected_as_noops() {
    let api = DealFlowApi::new(prepare_test_db().await);
    let deal = api.create_deal(new_deal()).await.unwrap();
    let err = api.update_deal_status(&deal.id, DealStatus::Pending, None).await.unwrap_err();
    assert!(matches!(err, SettlementError::TransitionNoOp));
}

#[tokio::test]
async fn disputes_are_reachable_until_a_deal_terminates() {
    let api = DealFlowApi::new(prepare_test_db().await);
    let deal = api.create_deal(new_deal()).await.unwrap();
    let deal = api.update_deal_status(&deal.id, DealStatus::Disputed, Some("deliverables contested".into())).await.unwrap();
    assert_eq!(deal.status, DealStatus::Disputed);

    // Disputes resolve outside this system; no exits here.
    let err = api.update_deal_status(&deal.id, DealStatus::Cancelled, None).await.unwrap_err();
    assert!(matches!(err, SettlementError::InvalidTransition { .. }));
}

#[tokio::test]
async fn notes_persist_until_replaced() {
    let api = DealFlowApi::new(prepare_test_db().await);
    let deal = api.create_deal(new_deal().with_notes("original brief")).await.unwrap();
    let deal = api.update_deal_status(&deal.id, DealStatus::Accepted, None).await.unwrap();
    assert_eq!(deal.notes.as_deref(), Some("original brief"));
    let deal = api.update_deal_status(&deal.id, DealStatus::Disputed, Some("new terms".into())).await.unwrap();
    assert_eq!(deal.notes.as_deref(), Some("new terms"));
}

#[tokio::test]
async fn users_see_their_deals_from_both_sides() {
    let api = DealFlowApi::new(prepare_test_db().await);
    let as_business = api.create_deal(NewDeal::new("c1", "creator-a", "acme", Rupees::from_rupees(100))).await.unwrap();
    let as_creator = api.create_deal(NewDeal::new("c2", "acme", "creator-b", Rupees::from_rupees(200))).await.unwrap();
    api.create_deal(NewDeal::new("c3", "creator-x", "business-y", Rupees::from_rupees(300))).await.unwrap();

    let deals = api.deals_for_user("acme").await.unwrap();
    assert_eq!(deals.len(), 2);
    assert!(deals.iter().any(|d| d.id == as_business.id));
    assert!(deals.iter().any(|d| d.id == as_creator.id));
    assert!(api.deals_for_user("nobody").await.unwrap().is_empty());
}
