//! Client tests against a local fake of each upstream API

use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use blunest_integrations::{
    AdminCreateUser, CreateSubscription, GeminiClient, GenerationRequest, GoTrueClient,
    IdentityProvider, IntegrationError, LanguageModel, PaymentGateway, RazorpayClient,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::net::TcpListener;
use uuid::Uuid;

const USER_ID: &str = "6f1c1c5e-8d44-4d8e-9d55-0a7b9d1f2e3a";

/// Start `router` on an ephemeral port and return its base URL
async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn fake_gotrue() -> Router {
    Router::new()
        .route(
            "/token",
            post(
                |Query(q): Query<HashMap<String, String>>, Json(body): Json<Value>| async move {
                    assert_eq!(q.get("grant_type").map(String::as_str), Some("password"));
                    if body["password"] == "correct-horse" {
                        (
                            StatusCode::OK,
                            Json(json!({
                                "access_token": "session-token",
                                "refresh_token": "refresh",
                                "expires_in": 3600,
                                "user": { "id": USER_ID, "email": body["email"] }
                            })),
                        )
                    } else {
                        (
                            StatusCode::BAD_REQUEST,
                            Json(json!({
                                "error": "invalid_grant",
                                "error_description": "Invalid login credentials"
                            })),
                        )
                    }
                },
            ),
        )
        .route(
            "/admin/users",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(
                    headers.get("authorization").and_then(|v| v.to_str().ok()),
                    Some("Bearer service-key")
                );
                if body["email"] == "taken@example.com" {
                    return (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        Json(json!({
                            "msg": "A user with this email address has already been registered"
                        })),
                    );
                }
                (
                    StatusCode::OK,
                    Json(json!({
                        "id": USER_ID,
                        "email": body["email"],
                        "user_metadata": body["user_metadata"]
                    })),
                )
            }),
        )
        .route(
            "/admin/users/{id}",
            delete(|Path(_id): Path<String>| async { StatusCode::NOT_FOUND }),
        )
}

#[tokio::test]
async fn test_gotrue_sign_in() {
    let base = spawn(fake_gotrue()).await;
    let client = GoTrueClient::new(base, "service-key");

    let session = client
        .sign_in("asha@example.com", "correct-horse")
        .await
        .unwrap();
    assert_eq!(session.access_token, "session-token");
    assert_eq!(session.user.id.to_string(), USER_ID);

    let err = client
        .sign_in("asha@example.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, IntegrationError::InvalidCredentials));
}

#[tokio::test]
async fn test_gotrue_admin_users() {
    let base = spawn(fake_gotrue()).await;
    let client = GoTrueClient::new(base, "service-key");

    let user = client
        .admin_create_user(&AdminCreateUser {
            email: "new-admin@example.com".to_string(),
            password: "long-password".to_string(),
            full_name: "New Admin".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(user.user_metadata["full_name"], "New Admin");

    let err = client
        .admin_create_user(&AdminCreateUser {
            email: "taken@example.com".to_string(),
            password: "long-password".to_string(),
            full_name: "Dup".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, IntegrationError::AlreadyExists));

    // Deleting a user that no longer exists is not an error
    client.admin_delete_user(Uuid::new_v4()).await.unwrap();
}

#[tokio::test]
async fn test_razorpay_create_subscription() {
    let router = Router::new().route(
        "/subscriptions",
        post(|headers: HeaderMap, Json(body): Json<Value>| async move {
            // rzp_test:secret
            assert_eq!(
                headers.get("authorization").and_then(|v| v.to_str().ok()),
                Some("Basic cnpwX3Rlc3Q6c2VjcmV0")
            );
            Json(json!({
                "id": "sub_abc",
                "plan_id": body["plan_id"],
                "status": "created",
                "short_url": "https://rzp.io/i/abc",
                "notes": body["notes"]
            }))
        }),
    );
    let base = spawn(router).await;
    let client = RazorpayClient::new("rzp_test", "secret").with_base_url(base);

    let subscription = client
        .create_subscription(&CreateSubscription::new("plan_pro").with_note("plan_slug", "ai_pro"))
        .await
        .unwrap();

    assert_eq!(subscription.id, "sub_abc");
    assert_eq!(subscription.plan_id.as_deref(), Some("plan_pro"));
    assert_eq!(subscription.status.as_deref(), Some("created"));
}

#[tokio::test]
async fn test_razorpay_upstream_error() {
    let router = Router::new().route(
        "/subscriptions",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": { "code": "BAD_REQUEST_ERROR", "description": "The id provided does not exist" }
                })),
            )
        }),
    );
    let base = spawn(router).await;
    let client = RazorpayClient::new("rzp_test", "secret").with_base_url(base);

    let err = client
        .create_subscription(&CreateSubscription::new("plan_missing"))
        .await
        .unwrap_err();

    match err {
        IntegrationError::Upstream {
            status, message, ..
        } => {
            assert_eq!(status, 400);
            assert_eq!(message, "The id provided does not exist");
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn fake_gemini() -> Router {
    Router::new()
        .route(
            "/models",
            get(|| async {
                Json(json!({
                    "models": [
                        { "name": "models/gemini-1.5-pro", "supportedGenerationMethods": ["generateContent"] },
                        { "name": "models/embedding-001", "supportedGenerationMethods": ["embedContent"] }
                    ]
                }))
            }),
        )
        .route(
            "/models/{call}",
            post(|Path(call): Path<String>, Json(body): Json<Value>| async move {
                let prompt = body["contents"][0]["parts"][0]["text"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                match call.as_str() {
                    "gemini-1.5-pro:generateContent" | "gemini-pro:generateContent" => (
                        StatusCode::OK,
                        Json(json!({
                            "candidates": [{ "content": { "parts": [{ "text": format!("{call}|{prompt}") }] } }],
                            "usageMetadata": { "totalTokenCount": 17 }
                        })),
                    ),
                    _ => (
                        StatusCode::NOT_FOUND,
                        Json(json!({ "error": { "message": "model not found" } })),
                    ),
                }
            }),
        )
}

fn request(model: &str) -> GenerationRequest {
    GenerationRequest {
        model: model.to_string(),
        system_prompt: "Analyse".to_string(),
        user_prompt: "Flat in Pune".to_string(),
        temperature: 0.2,
        max_tokens: 256,
    }
}

#[tokio::test]
async fn test_gemini_auto_model() {
    let base = spawn(fake_gemini()).await;
    let client = GeminiClient::new("key").with_base_url(base);

    let generation = client.generate(&request("default")).await.unwrap();

    assert_eq!(generation.model, "gemini-1.5-pro");
    assert_eq!(generation.tokens_used, 17);
    assert!(generation
        .text
        .ends_with("System: Analyse\n\nUser: Flat in Pune"));
}

#[tokio::test]
async fn test_gemini_retries_legacy_model_on_404() {
    let base = spawn(fake_gemini()).await;
    let client = GeminiClient::new("key").with_base_url(base);

    let generation = client.generate(&request("gemini-9-ultra")).await.unwrap();

    assert_eq!(generation.model, "gemini-pro");
    assert!(generation.text.starts_with("gemini-pro:generateContent|"));
}

#[tokio::test]
async fn test_gemini_without_key() {
    let client = GeminiClient::new("");
    let err = client.generate(&request("default")).await.unwrap_err();
    assert!(matches!(err, IntegrationError::NotConfigured(_)));
}
