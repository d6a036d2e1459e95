// SPDX-License-Identifier: MIT

use std::sync::Arc;
use trainlink::config::Config;
use trainlink::db::FirestoreDb;
use trainlink::routes::create_router;
use trainlink::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock database.
/// Returns the router and the JWT signing key.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Vec<u8>) {
    let config = Config::test_default();
    let signing_key = config.jwt_signing_key.clone();

    let state = Arc::new(AppState {
        config,
        db: test_db_offline(),
    });

    (create_router(state), signing_key)
}

/// Create a session JWT for tests.
#[allow(dead_code)]
pub fn make_jwt(user_id: &str, signing_key: &[u8]) -> String {
    trainlink::middleware::auth::create_jwt(user_id, signing_key).expect("JWT creation failed")
}
