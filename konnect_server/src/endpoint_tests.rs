//! Endpoint tests: the full HTTP surface wired to a real SQLite backend and a mocked gateway.
use actix_web::{
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    http::StatusCode,
    test,
    web,
    App,
    Error,
};
use anyhow::Result;
use esewa_gateway::{EsewaConfig, PaymentInitiation};
use konnect_common::Rupees;
use konnect_engine::{
    db_types::{Deal, DealStatus, Payment, PaymentStatus},
    traits::GatewayVerifier,
    DealFlowApi,
    EscrowApi,
    SqliteDatabase,
};
use mockall::mock;

use crate::{
    auth::SUBJECT_HEADER,
    config::RedirectTargets,
    data_objects::{CreateDealRequest, InitiatePaymentRequest, UpdateDealStatusRequest, VerifyResponse},
    routes,
};

mock! {
    pub Verifier {}
    impl GatewayVerifier for Verifier {
        async fn verify(&self, transaction_ref: &str, amount: Rupees) -> bool;
    }
}

async fn test_db() -> SqliteDatabase {
    let url = format!("sqlite://{}/konnect_server_test_{}.db", std::env::temp_dir().display(), rand::random::<u64>());
    SqliteDatabase::create_database(&url).await.expect("Error creating the test database");
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error connecting to the test database");
    db.migrate().await.expect("Error running DB migrations");
    db
}

fn confirming_verifier(confirm: bool) -> MockVerifier {
    let mut verifier = MockVerifier::new();
    verifier.expect_verify().returning(move |_, _| confirm);
    verifier
}

fn test_app(
    db: SqliteDatabase,
    verifier: MockVerifier,
) -> App<
    impl ServiceFactory<ServiceRequest, Config = (), Response = ServiceResponse, Error = Error, InitError = ()>,
> {
    let redirects = RedirectTargets { success: "/payment/success".into(), failure: "/payment/failed".into() };
    App::new()
        .app_data(web::Data::new(DealFlowApi::new(db.clone())))
        .app_data(web::Data::new(EscrowApi::new(db, verifier, EsewaConfig::default())))
        .app_data(web::Data::new(redirects))
        .service(routes::health)
        .service(
            web::scope("/api")
                .route("/deals", web::post().to(routes::create_deal::<SqliteDatabase>))
                .route("/deals/mine", web::get().to(routes::my_deals::<SqliteDatabase>))
                .route("/deals/{id}", web::get().to(routes::deal_by_id::<SqliteDatabase>))
                .route("/deals/{id}/status", web::put().to(routes::update_deal_status::<SqliteDatabase>))
                .route("/deals/{id}/payments", web::get().to(routes::deal_payments::<SqliteDatabase, MockVerifier>))
                .route("/payments/initiate", web::post().to(routes::initiate_payment::<SqliteDatabase, MockVerifier>))
                .route(
                    "/payments/verify/{transaction_ref}",
                    web::get().to(routes::verify_payment::<SqliteDatabase, MockVerifier>),
                ),
        )
        .route("/payments/esewa/callback", web::get().to(routes::esewa_callback::<SqliteDatabase, MockVerifier>))
}

fn deal_request() -> CreateDealRequest {
    CreateDealRequest {
        campaign_id: "campaign-1".into(),
        creator_id: "creator-1".into(),
        agreed_price: Rupees::from_rupees(500),
        notes: Some("two reels".into()),
    }
}

fn callback_uri(transaction_uuid: &str, status: &str, transaction_code: &str) -> String {
    let payload = serde_json::json!({
        "transaction_code": transaction_code,
        "status": status,
        "total_amount": "500.0",
        "transaction_uuid": transaction_uuid,
        "product_code": "EPAYTEST",
        "signed_field_names":
            "transaction_code,status,total_amount,transaction_uuid,product_code,signed_field_names",
        "signature": "unchecked-on-this-path"
    });
    let data = base64::encode(payload.to_string());
    // Percent-encode the base64 alphabet's URL-hostile characters, as a browser would.
    let data = data.replace('+', "%2B").replace('/', "%2F").replace('=', "%3D");
    format!("/payments/esewa/callback?data={data}")
}

#[actix_web::test]
async fn health_is_public() {
    let app = test::init_service(test_app(test_db().await, MockVerifier::new())).await;
    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn deal_routes_require_a_verified_subject() {
    let app = test::init_service(test_app(test_db().await, MockVerifier::new())).await;

    let req = test::TestRequest::post().uri("/api/deals").set_json(deal_request()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/deals")
        .insert_header((SUBJECT_HEADER, "acme"))
        .set_json(deal_request())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let deal: Deal = test::read_body_json(resp).await;
    assert_eq!(deal.business_id, "acme");
    assert_eq!(deal.creator_id, "creator-1");
    assert_eq!(deal.status, DealStatus::Pending);
}

#[actix_web::test]
async fn unknown_and_malformed_deal_ids_are_not_found() {
    let app = test::init_service(test_app(test_db().await, MockVerifier::new())).await;

    let req = test::TestRequest::get()
        .uri("/api/deals/9f8d7c6b-5a49-4838-9c2d-1e0f1a2b3c4d")
        .insert_header((SUBJECT_HEADER, "acme"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req =
        test::TestRequest::get().uri("/api/deals/not-a-uuid").insert_header((SUBJECT_HEADER, "acme")).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn clients_cannot_put_a_deal_in_progress() -> Result<()> {
    let app = test::init_service(test_app(test_db().await, MockVerifier::new())).await;
    let req = test::TestRequest::post()
        .uri("/api/deals")
        .insert_header((SUBJECT_HEADER, "acme"))
        .set_json(deal_request())
        .to_request();
    let deal: Deal = test::read_body_json(test::call_service(&app, req).await).await;

    let req = test::TestRequest::put()
        .uri(&format!("/api/deals/{}/status", deal.id))
        .insert_header((SUBJECT_HEADER, "acme"))
        .set_json(UpdateDealStatusRequest { status: DealStatus::InProgress, notes: None })
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[actix_web::test]
async fn a_confirmed_callback_redirects_with_the_deal_id() -> Result<()> {
    let db = test_db().await;
    let app = test::init_service(test_app(db, confirming_verifier(true))).await;

    let req = test::TestRequest::post()
        .uri("/api/deals")
        .insert_header((SUBJECT_HEADER, "acme"))
        .set_json(deal_request())
        .to_request();
    let deal: Deal = test::read_body_json(test::call_service(&app, req).await).await;

    let req = test::TestRequest::post()
        .uri("/api/payments/initiate")
        .insert_header((SUBJECT_HEADER, "acme"))
        .set_json(InitiatePaymentRequest { deal_id: deal.id.clone(), amount: Rupees::from_rupees(500) })
        .to_request();
    let init: PaymentInitiation = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(init.signed_field_names, "total_amount,transaction_uuid,product_code");

    let req = test::TestRequest::get()
        .uri(&callback_uri(&init.transaction_uuid, "COMPLETE", "000AWEO"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = resp.headers().get("location").unwrap().to_str()?;
    assert_eq!(location, format!("/payment/success?deal_id={}", deal.id));

    let req = test::TestRequest::get()
        .uri(&format!("/api/deals/{}", deal.id))
        .insert_header((SUBJECT_HEADER, "acme"))
        .to_request();
    let funded: Deal = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(funded.status, DealStatus::InProgress);

    let req = test::TestRequest::get()
        .uri(&format!("/api/deals/{}/payments", deal.id))
        .insert_header((SUBJECT_HEADER, "acme"))
        .to_request();
    let payments: Vec<Payment> = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status, PaymentStatus::Escrow);
    Ok(())
}

#[actix_web::test]
async fn failed_verification_redirects_to_the_failure_page() -> Result<()> {
    let db = test_db().await;
    let app = test::init_service(test_app(db, confirming_verifier(false))).await;

    let req = test::TestRequest::post()
        .uri("/api/deals")
        .insert_header((SUBJECT_HEADER, "acme"))
        .set_json(deal_request())
        .to_request();
    let deal: Deal = test::read_body_json(test::call_service(&app, req).await).await;
    let req = test::TestRequest::post()
        .uri("/api/payments/initiate")
        .insert_header((SUBJECT_HEADER, "acme"))
        .set_json(InitiatePaymentRequest { deal_id: deal.id.clone(), amount: Rupees::from_rupees(500) })
        .to_request();
    let init: PaymentInitiation = test::read_body_json(test::call_service(&app, req).await).await;

    let req = test::TestRequest::get()
        .uri(&callback_uri(&init.transaction_uuid, "COMPLETE", "FORGED"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers().get("location").unwrap(), "/payment/failed");

    let req = test::TestRequest::get()
        .uri(&format!("/api/deals/{}", deal.id))
        .insert_header((SUBJECT_HEADER, "acme"))
        .to_request();
    let deal: Deal = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(deal.status, DealStatus::Pending);
    Ok(())
}

#[actix_web::test]
async fn garbage_callbacks_never_error_outward() {
    let app = test::init_service(test_app(test_db().await, MockVerifier::new())).await;
    let req = test::TestRequest::get().uri("/payments/esewa/callback?data=%21%21garbage%21%21").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers().get("location").unwrap(), "/payment/failed");
}

#[actix_web::test]
async fn manual_verification_reports_the_gateway_verdict() {
    let app = test::init_service(test_app(test_db().await, confirming_verifier(true))).await;
    let req = test::TestRequest::get()
        .uri("/api/payments/verify/000AWEO?amount=50000")
        .insert_header((SUBJECT_HEADER, "acme"))
        .to_request();
    let verdict: VerifyResponse = test::read_body_json(test::call_service(&app, req).await).await;
    assert!(verdict.confirmed);
}

#[actix_web::test]
async fn initiation_rejects_amounts_that_differ_from_the_agreed_price() {
    let app = test::init_service(test_app(test_db().await, MockVerifier::new())).await;
    let req = test::TestRequest::post()
        .uri("/api/deals")
        .insert_header((SUBJECT_HEADER, "acme"))
        .set_json(deal_request())
        .to_request();
    let deal: Deal = test::read_body_json(test::call_service(&app, req).await).await;

    let req = test::TestRequest::post()
        .uri("/api/payments/initiate")
        .insert_header((SUBJECT_HEADER, "acme"))
        .set_json(InitiatePaymentRequest { deal_id: deal.id, amount: Rupees::from_rupees(400) })
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}
