//! Request handler definitions
//!
//! Handlers are generic over the storage backend and gateway verifier traits; the server wires them to the
//! concrete SQLite backend and eSewa client in [`crate::server`], and the endpoint tests wire them to a mocked
//! gateway. Anything longer than a line or two of glue belongs in the engine APIs, not here.
//!
//! The one handler with unusual rules is [`esewa_callback`]: it is invoked unauthenticated by an external
//! redirect, so it must never error outward — every outcome, including adversarial garbage, collapses to a
//! redirect to the success or failure destination.
use actix_web::{get, http::header, web, HttpResponse, Responder};
use konnect_engine::{
    db_types::{DealId, NewDeal},
    traits::{DealManagement, GatewayVerifier, SettlementDatabase},
    DealFlowApi,
    EscrowApi,
};
use log::*;

use crate::{
    auth::AuthenticatedSubject,
    config::RedirectTargets,
    data_objects::{
        CallbackParams,
        CreateDealRequest,
        InitiatePaymentRequest,
        UpdateDealStatusRequest,
        VerifyParams,
        VerifyResponse,
    },
    errors::ServerError,
};

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻 Received health check request");
    HttpResponse::Ok().body("👍\n")
}

// ----------------------------------------------   Deals  -----------------------------------------------------
/// POST `/api/deals`. The authenticated subject becomes the business side of the new deal.
pub async fn create_deal<B: DealManagement>(
    subject: AuthenticatedSubject,
    body: web::Json<CreateDealRequest>,
    api: web::Data<DealFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻 POST new deal under campaign {} by {}", req.campaign_id, subject.id());
    let mut deal = NewDeal::new(req.campaign_id, req.creator_id, subject.0, req.agreed_price);
    if let Some(notes) = req.notes {
        deal = deal.with_notes(notes);
    }
    let deal = api.create_deal(deal).await?;
    Ok(HttpResponse::Ok().json(deal))
}

/// GET `/api/deals/{id}`.
pub async fn deal_by_id<B: DealManagement>(
    _subject: AuthenticatedSubject,
    path: web::Path<String>,
    api: web::Data<DealFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = parse_deal_id(&path)?;
    let deal = api.fetch_deal(&id).await?;
    Ok(HttpResponse::Ok().json(deal))
}

/// GET `/api/deals/mine`. Deals where the caller is either the creator or the business.
pub async fn my_deals<B: DealManagement>(
    subject: AuthenticatedSubject,
    api: web::Data<DealFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let deals = api.deals_for_user(subject.id()).await?;
    Ok(HttpResponse::Ok().json(deals))
}

/// PUT `/api/deals/{id}/status`. General lifecycle transitions only; the payment-gated edge is not reachable
/// from here and is rejected with 400.
pub async fn update_deal_status<B: DealManagement>(
    subject: AuthenticatedSubject,
    path: web::Path<String>,
    body: web::Json<UpdateDealStatusRequest>,
    api: web::Data<DealFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = parse_deal_id(&path)?;
    let req = body.into_inner();
    debug!("💻 PUT deal [{id}] status to {} by {}", req.status, subject.id());
    let deal = api.update_deal_status(&id, req.status, req.notes).await?;
    Ok(HttpResponse::Ok().json(deal))
}

// ---------------------------------------------   Payments  ---------------------------------------------------
/// POST `/api/payments/initiate`. Returns the signed gateway form parameters for a new payment attempt.
pub async fn initiate_payment<B, G>(
    subject: AuthenticatedSubject,
    body: web::Json<InitiatePaymentRequest>,
    api: web::Data<EscrowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    G: GatewayVerifier,
{
    let req = body.into_inner();
    debug!("💻 POST initiate payment for deal [{}] by {}", req.deal_id, subject.id());
    let init = api.initiate_payment(&req.deal_id, req.amount).await?;
    Ok(HttpResponse::Ok().json(init))
}

/// GET `/api/deals/{id}/payments`. All attempts recorded against a deal, oldest first.
pub async fn deal_payments<B, G>(
    _subject: AuthenticatedSubject,
    path: web::Path<String>,
    api: web::Data<EscrowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    G: GatewayVerifier,
{
    let id = parse_deal_id(&path)?;
    let payments = api.payments_for_deal(&id).await?;
    Ok(HttpResponse::Ok().json(payments))
}

/// GET `/api/payments/verify/{transaction_ref}?amount=..`. Defensive re-check against the gateway for when a
/// callback went missing; reads gateway state only, writes nothing.
pub async fn verify_payment<B, G>(
    _subject: AuthenticatedSubject,
    path: web::Path<String>,
    query: web::Query<VerifyParams>,
    api: web::Data<EscrowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    G: GatewayVerifier,
{
    let transaction_ref = path.into_inner();
    let confirmed = api.verify_payment(&transaction_ref, query.amount).await;
    Ok(HttpResponse::Ok().json(VerifyResponse { confirmed }))
}

/// GET `/payments/esewa/callback?data=<base64(json)>`. The gateway redirects the user's browser here after a
/// payment attempt.
///
/// The response is always a redirect: to the success destination (carrying only the deal id) when the payment is
/// in escrow, and to the generic failure destination for everything else. Decode failures, unknown payments and
/// verification failures are indistinguishable from out here.
pub async fn esewa_callback<B, G>(
    query: web::Query<CallbackParams>,
    api: web::Data<EscrowApi<B, G>>,
    redirects: web::Data<RedirectTargets>,
) -> HttpResponse
where
    B: SettlementDatabase,
    G: GatewayVerifier,
{
    trace!("💻 Received gateway callback");
    match api.process_callback(&query.data).await {
        Some(payment) if payment.status.has_cleared_escrow() => {
            info!("💻 Callback settled payment [{}]; redirecting to the success page", payment.id);
            see_other(&format!("{}?deal_id={}", redirects.success, payment.deal_id))
        },
        _ => see_other(&redirects.failure),
    }
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther().insert_header((header::LOCATION, location)).finish()
}

fn parse_deal_id(s: &str) -> Result<DealId, ServerError> {
    // An id that is not even a UUID can never name a deal; report it the same way as an unknown one.
    s.parse::<DealId>().map_err(|e| ServerError::NoRecordFound(e.to_string()))
}
