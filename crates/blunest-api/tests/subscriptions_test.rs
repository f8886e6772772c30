//! Integration tests for plans, subscriptions, gateway webhooks and analysis

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use blunest_api::{ApiServer, Services};
use blunest_auth::sign_payload;
use blunest_db::entities::{
    ai_property_analysis, notification, subscription_plan, subscription_usage_log,
    subscription_usage_log::UsageType, user_subscription,
    user_subscription::SubscriptionStatus,
};
use blunest_integrations::{
    GatewaySubscription, Generation, MockIdentityProvider, MockLanguageModel, MockPaymentGateway,
};
use chrono::Utc;
use common::*;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

async fn plan_id(db: &DatabaseConnection, slug: &str) -> Uuid {
    subscription_plan::Entity::find()
        .filter(subscription_plan::Column::Slug.eq(slug))
        .one(db)
        .await
        .unwrap()
        .expect("seeded plan")
        .id
}

async fn insert_subscription(
    db: &DatabaseConnection,
    user_id: Uuid,
    plan_id: Uuid,
    gateway_id: &str,
    status: SubscriptionStatus,
) -> user_subscription::Model {
    let now = Utc::now();
    user_subscription::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        plan_id: Set(plan_id),
        status: Set(status),
        gateway_subscription_id: Set(Some(gateway_id.to_string())),
        gateway_plan_id: Set(Some("plan_basic".to_string())),
        current_period_start: Set(None),
        current_period_end: Set(None),
        cancel_at_period_end: Set(false),
        cancelled_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to insert subscription")
}

fn webhook_request(body: &str, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/webhooks/razorpay")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("x-razorpay-signature", signature);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

const ACTIVATED_EVENT: &str = r#"{
    "event": "subscription.activated",
    "payload": {
        "subscription": {
            "entity": {
                "id": "sub_test_123",
                "plan_id": "plan_basic",
                "status": "active",
                "start_at": 1735689600,
                "end_at": 1767225600
            }
        }
    }
}"#;

#[tokio::test]
async fn test_webhook_invalid_signature_changes_nothing() {
    let db = setup_test_db().await;
    let user_id = Uuid::new_v4();
    let basic = plan_id(&db, "ai_basic").await;
    let row = insert_subscription(&db, user_id, basic, "sub_test_123", SubscriptionStatus::Created)
        .await;
    let app = create_test_app(db.clone());

    let forged = sign_payload(b"some-other-secret", ACTIVATED_EVENT.as_bytes()).unwrap();
    let (status, body) = send(&app, webhook_request(ACTIVATED_EVENT, Some(&forged))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_SIGNATURE");

    let (status, _) = send(&app, webhook_request(ACTIVATED_EVENT, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let unchanged = user_subscription::Entity::find_by_id(row.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.status, SubscriptionStatus::Created);
    assert!(unchanged.current_period_start.is_none());
}

#[tokio::test]
async fn test_webhook_activation_updates_subscription() {
    let db = setup_test_db().await;
    let user_id = Uuid::new_v4();
    let basic = plan_id(&db, "ai_basic").await;
    let row = insert_subscription(&db, user_id, basic, "sub_test_123", SubscriptionStatus::Created)
        .await;
    let app = create_test_app(db.clone());

    let signature = sign_payload(WEBHOOK_SECRET.as_bytes(), ACTIVATED_EVENT.as_bytes()).unwrap();
    let (status, body) = send(&app, webhook_request(ACTIVATED_EVENT, Some(&signature))).await;
    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["data"]["received"], true);

    let updated = user_subscription::Entity::find_by_id(row.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, SubscriptionStatus::Active);
    assert_eq!(
        updated.current_period_start.map(|t| t.timestamp()),
        Some(1_735_689_600)
    );

    let notes = notification::Entity::find()
        .filter(notification::Column::UserId.eq(user_id))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, "subscription");
}

#[tokio::test]
async fn test_webhook_malformed_json() {
    let db = setup_test_db().await;
    let app = create_test_app(db);

    let body = "{not json";
    let signature = sign_payload(WEBHOOK_SECRET.as_bytes(), body.as_bytes()).unwrap();
    let (status, response) = send(&app, webhook_request(body, Some(&signature))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["code"], "INVALID_PAYLOAD");
}

#[tokio::test]
async fn test_plans_are_public_and_cacheable() {
    let db = setup_test_db().await;
    let app = create_test_app(db);

    let response = tower::ServiceExt::oneshot(app, get_request("/api/subscriptions/plans", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["cache-control"],
        "public, s-maxage=300, stale-while-revalidate=600"
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let slugs: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, vec!["free", "ai_basic", "ai_pro", "ai_enterprise"]);
}

#[tokio::test]
async fn test_create_subscription_stores_created_row() {
    let db = setup_test_db().await;

    let mut payments = MockPaymentGateway::new();
    payments
        .expect_create_subscription()
        .withf(|req| req.plan_id == "plan_basic" && req.notes.get("plan_slug").map(String::as_str) == Some("ai_basic"))
        .times(1)
        .returning(|_| {
            Ok(GatewaySubscription {
                id: "sub_new_1".to_string(),
                plan_id: Some("plan_basic".to_string()),
                status: Some("created".to_string()),
                start_at: None,
                end_at: None,
                current_start: None,
                current_end: None,
                short_url: Some("https://rzp.io/i/abc".to_string()),
            })
        });

    let mut config = test_config();
    config
        .gateway_plan_ids
        .insert("ai_basic".to_string(), "plan_basic".to_string());

    let app = ApiServer::new(
        config,
        db.clone(),
        Services {
            identity: Arc::new(MockIdentityProvider::new()),
            payments: Arc::new(payments),
            llm: Arc::new(MockLanguageModel::new()),
        },
    )
    .build_router();

    let user_id = Uuid::new_v4();
    let token = token_for(user_id, "asha@example.com");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/subscriptions",
            Some(&token),
            json!({ "plan_slug": "ai_basic" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    assert_eq!(body["data"]["razorpay"]["key"], "rzp_test_key");
    assert_eq!(body["data"]["razorpay"]["subscriptionId"], "sub_new_1");

    let row = user_subscription::Entity::find()
        .filter(user_subscription::Column::UserId.eq(user_id))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, SubscriptionStatus::Created);
    assert_eq!(row.gateway_subscription_id.as_deref(), Some("sub_new_1"));

    // The free plan is never sold through the gateway
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/subscriptions",
            Some(&token),
            json!({ "plan_slug": "free" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "FREE_PLAN");
}

#[tokio::test]
async fn test_analysis_usage_limit() {
    let db = setup_test_db().await;
    let user_id = Uuid::new_v4();

    for _ in 0..3 {
        subscription_usage_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            subscription_id: Set(None),
            usage_type: Set(UsageType::AiAnalysis),
            property_id: Set(None),
            metadata: Set(json!({})),
            created_at: Set(Utc::now()),
        }
        .insert(&db)
        .await
        .unwrap();
    }

    let app = create_test_app(db);
    let token = token_for(user_id, "asha@example.com");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/ai/analyze-property",
            Some(&token),
            json!({ "property_id": Uuid::new_v4(), "agent_slugs": ["market_pulse"] }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "USAGE_LIMIT_EXCEEDED");
}

#[tokio::test]
async fn test_analysis_agent_outside_plan() {
    let db = setup_test_db().await;
    let property = insert_property(&db, "sea-view-villa").await;
    let app = create_test_app(db);

    let token = token_for(Uuid::new_v4(), "asha@example.com");
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/ai/analyze-property",
            Some(&token),
            json!({ "property_id": property.id, "agent_slugs": ["market_pulse", "deal_underwriter"] }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "AGENT_NOT_IN_PLAN");
}

#[tokio::test]
async fn test_analysis_runs_agents_and_meters_usage() {
    let db = setup_test_db().await;
    let property = insert_property(&db, "sea-view-villa").await;

    let mut llm = MockLanguageModel::new();
    llm.expect_generate().times(1).returning(|req| {
        assert!(req.user_prompt.contains("Sea facing villa in Alibaug"));
        Ok(Generation {
            text: "Excellent location with strong growth potential.".to_string(),
            model: "gemini-1.5-flash".to_string(),
            tokens_used: 120,
        })
    });

    let app = ApiServer::new(
        test_config(),
        db.clone(),
        Services {
            identity: Arc::new(MockIdentityProvider::new()),
            payments: Arc::new(MockPaymentGateway::new()),
            llm: Arc::new(llm),
        },
    )
    .build_router();

    let user_id = Uuid::new_v4();
    let token = token_for(user_id, "asha@example.com");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/ai/analyze-property",
            Some(&token),
            json!({ "property_id": property.id, "agent_slugs": ["market_pulse"] }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["data"]["analysis"]["overall_score"], 70);
    assert_eq!(body["data"]["analysis"]["recommendation"], "BUY");
    assert_eq!(body["data"]["analysis"]["confidence_level"], 1.0);
    assert_eq!(body["data"]["metadata"]["tokens_used"], 120);
    assert_eq!(body["data"]["metadata"]["agents_used"], json!(["market_pulse"]));

    let logs = subscription_usage_log::Entity::find()
        .filter(subscription_usage_log::Column::UserId.eq(user_id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(logs, 1);
    assert_eq!(ai_property_analysis::Entity::find().count(&db).await.unwrap(), 1);
}
