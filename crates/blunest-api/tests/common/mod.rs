//! Shared helpers for the API integration tests
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use blunest_api::{ApiServer, ApiServerConfig, Services};
use blunest_auth::{JwtClaims, JwtValidator};
use blunest_db::entities::{
    property, property_group, property_group::GroupStatus, user, user::UserRole,
};
use blunest_integrations::{MockIdentityProvider, MockLanguageModel, MockPaymentGateway};
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot` method
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const WEBHOOK_SECRET: &str = "test-webhook-secret";

/// Helper to create an in-memory database with migrations applied
pub async fn setup_test_db() -> DatabaseConnection {
    let db = blunest_db::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    blunest_db::migrate(&db)
        .await
        .expect("Failed to run migrations");

    db
}

/// Database in a temporary file, so the pool hands out several connections
///
/// The directory is removed when the returned guard is dropped.
pub async fn setup_file_db() -> (tempfile::TempDir, DatabaseConnection) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("blunest.db").display());

    let mut options = ConnectOptions::new(url);
    options.max_connections(4);
    let db = Database::connect(options)
        .await
        .expect("Failed to create file database");
    blunest_db::migrate(&db)
        .await
        .expect("Failed to run migrations");

    (dir, db)
}

pub fn test_config() -> ApiServerConfig {
    ApiServerConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        jwt_secret: JWT_SECRET.to_string(),
        razorpay_key_id: "rzp_test_key".to_string(),
        razorpay_webhook_secret: WEBHOOK_SECRET.to_string(),
        ..Default::default()
    }
}

/// Mocks without expectations; any unexpected call fails the test
pub fn mock_services() -> Services {
    Services {
        identity: Arc::new(MockIdentityProvider::new()),
        payments: Arc::new(MockPaymentGateway::new()),
        llm: Arc::new(MockLanguageModel::new()),
    }
}

pub fn create_test_app(db: DatabaseConnection) -> Router {
    ApiServer::new(test_config(), db, mock_services()).build_router()
}

pub fn token_for(user_id: Uuid, email: &str) -> String {
    let claims = JwtClaims::new(user_id, email, Duration::hours(1)).with_full_name("Asha Rao");
    JwtValidator::encode(JWT_SECRET.as_bytes(), &claims).unwrap()
}

pub async fn insert_user(db: &DatabaseConnection, email: &str, role: UserRole) -> user::Model {
    let now = Utc::now();
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        full_name: Set(Some("Test User".to_string())),
        phone: Set(Some("9876543210".to_string())),
        role: Set(role),
        avatar_url: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to insert user")
}

pub async fn insert_property(db: &DatabaseConnection, slug: &str) -> property::Model {
    let now = Utc::now();
    property::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(None),
        category_id: Set(None),
        title: Set("Sea facing villa in Alibaug".to_string()),
        slug: Set(slug.to_string()),
        description: Set(
            "A four bedroom villa with a private garden, ten minutes from the beach.".to_string(),
        ),
        location: Set("Alibaug, Maharashtra".to_string()),
        city: Set(Some("Alibaug".to_string())),
        state: Set(Some("Maharashtra".to_string())),
        latitude: Set(None),
        longitude: Set(None),
        price: Set(32_500_000.0),
        bedrooms: Set(4),
        bathrooms: Set(3),
        area_sqft: Set(2800.0),
        property_type: Set("villa".to_string()),
        featured_image: Set(None),
        amenities: Set(json!(["garden", "pool"])),
        status: Set(property::PropertyStatus::Available),
        is_featured: Set(true),
        views: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to insert property")
}

pub async fn insert_group(
    db: &DatabaseConnection,
    property_id: Uuid,
    total_slots: i32,
    filled_slots: i32,
    is_locked: bool,
) -> property_group::Model {
    let now = Utc::now();
    property_group::ActiveModel {
        id: Set(Uuid::new_v4()),
        property_id: Set(property_id),
        total_slots: Set(total_slots),
        filled_slots: Set(filled_slots),
        is_locked: Set(is_locked),
        status: Set(GroupStatus::derive(GroupStatus::Open, filled_slots, total_slots)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to insert group")
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Send a request and decode the JSON body
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| {
            panic!("Non-JSON body: {}", String::from_utf8_lossy(&body))
        })
    };
    (status, value)
}
