use konnect_engine::{traits::GatewayVerifier, SqliteDatabase};
use konnect_common::Rupees;
use log::debug;
use sqlx::{migrate::MigrateDatabase, Sqlite};

/// Creates a fresh, migrated SQLite database under the system temp directory. Each test gets its own file so
/// tests can run concurrently.
pub async fn prepare_test_db() -> SqliteDatabase {
    let _ = env_logger::try_init();
    let url = random_db_path();
    create_database(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error connecting to the test database");
    db.migrate().await.expect("Error running DB migrations");
    db
}

pub fn random_db_path() -> String {
    format!("sqlite://{}/konnect_test_{}.db", std::env::temp_dir().display(), rand::random::<u64>())
}

async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        debug!("Could not drop test database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating the test database");
}

/// A scripted gateway: confirms or declines every verification according to `confirm`.
#[derive(Clone, Copy)]
pub struct StubGateway {
    pub confirm: bool,
}

impl GatewayVerifier for StubGateway {
    async fn verify(&self, _transaction_ref: &str, _amount: Rupees) -> bool {
        self.confirm
    }
}

/// Builds the base64(JSON) `data` parameter the gateway appends to its redirect.
pub fn callback_data(transaction_uuid: &str, status: &str, transaction_code: &str) -> String {
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
    base64::encode(payload.to_string())
}
