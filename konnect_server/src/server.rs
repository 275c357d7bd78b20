use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use esewa_gateway::EsewaApi;
use konnect_engine::{DealFlowApi, EscrowApi, SqliteDatabase};
use log::warn;

use crate::{config::ServerConfig, errors::ServerError, routes};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    SqliteDatabase::create_database(&config.database_url)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    // Fail fast on a client that cannot be built; every worker clones this one instance.
    let esewa = EsewaApi::new(config.esewa.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if let Err(e) = config.esewa.validate() {
        warn!("🚨 Gateway configuration is incomplete ({e}). Payment initiation will be rejected until it is fixed.");
    }
    let bind_addr = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let deals_api = DealFlowApi::new(db.clone());
        let escrow_api = EscrowApi::new(db.clone(), esewa.clone(), config.esewa.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("konnect::access_log"))
            .app_data(web::Data::new(deals_api))
            .app_data(web::Data::new(escrow_api))
            .app_data(web::Data::new(config.redirects.clone()))
            .service(routes::health)
            .service(
                web::scope("/api")
                    .route("/deals", web::post().to(routes::create_deal::<SqliteDatabase>))
                    .route("/deals/mine", web::get().to(routes::my_deals::<SqliteDatabase>))
                    .route("/deals/{id}", web::get().to(routes::deal_by_id::<SqliteDatabase>))
                    .route("/deals/{id}/status", web::put().to(routes::update_deal_status::<SqliteDatabase>))
                    .route(
                        "/deals/{id}/payments",
                        web::get().to(routes::deal_payments::<SqliteDatabase, EsewaApi>),
                    )
                    .route(
                        "/payments/initiate",
                        web::post().to(routes::initiate_payment::<SqliteDatabase, EsewaApi>),
                    )
                    .route(
                        "/payments/verify/{transaction_ref}",
                        web::get().to(routes::verify_payment::<SqliteDatabase, EsewaApi>),
                    ),
            )
            .route("/payments/esewa/callback", web::get().to(routes::esewa_callback::<SqliteDatabase, EsewaApi>))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind(bind_addr)?
    .run();
    Ok(srv)
}
