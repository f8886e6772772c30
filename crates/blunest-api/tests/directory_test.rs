//! Integration tests for specifications, the developer directory, search
//! lookups, phone checks and the advisor chat

mod common;

use axum::http::StatusCode;
use blunest_api::{ApiServer, Services};
use blunest_db::entities::user::UserRole;
use blunest_integrations::{
    Generation, MockIdentityProvider, MockLanguageModel, MockPaymentGateway,
};
use common::*;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test]
async fn test_specifications_appear_in_property_detail() {
    let db = setup_test_db().await;
    let admin = insert_user(&db, "admin@blunest.in", UserRole::Admin).await;
    let property = insert_property(&db, "alibaug-villa").await;
    let app = create_test_app(db);
    let token = token_for(admin.id, &admin.email);
    let base = format!("/api/admin/properties/{}/specifications", property.id);

    for (category, label, value, order) in [
        ("Structure", "Frame", "RCC", 0),
        ("Flooring", "Bedrooms", "Wooden laminate", 1),
        ("Flooring", "Living room", "Italian marble", 0),
    ] {
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                &base,
                Some(&token),
                json!({ "category": category, "label": label, "value": value, "display_order": order }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["data"]["property_id"], property.id.to_string());
    }

    let (status, body) = send(&app, get_request("/api/properties/alibaug-villa", None)).await;
    assert_eq!(status, StatusCode::OK);
    let labels: Vec<&str> = body["data"]["specifications"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, ["Living room", "Bedrooms", "Frame"]);

    // Update and delete through the admin endpoints
    let spec_id = body["data"]["specifications"][2]["id"].as_str().unwrap().to_string();
    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("{base}/{spec_id}"),
            Some(&token),
            json!({ "value": "RCC with shear walls" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["value"], "RCC with shear walls");
    assert_eq!(body["data"]["label"], "Frame");

    let (status, _) = send(
        &app,
        json_request("DELETE", &format!("{base}/{spec_id}"), Some(&token), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, get_request(&base, Some(&token))).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, body) = send(
        &app,
        json_request("DELETE", &format!("{base}/{spec_id}"), Some(&token), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "SPECIFICATION_NOT_FOUND");
}

#[tokio::test]
async fn test_specification_requests_are_checked() {
    let db = setup_test_db().await;
    let admin = insert_user(&db, "admin@blunest.in", UserRole::Admin).await;
    let buyer = insert_user(&db, "buyer@example.com", UserRole::User).await;
    let property = insert_property(&db, "checked-villa").await;
    let other = insert_property(&db, "other-villa").await;
    let app = create_test_app(db);
    let token = token_for(admin.id, &admin.email);

    let body = json!({ "category": "Flooring", "label": "Kitchen", "value": "Granite" });

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/admin/properties/{}/specifications", property.id),
            Some(&token_for(buyer.id, &buyer.email)),
            body.clone(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body_out) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/admin/properties/{}/specifications", Uuid::new_v4()),
            Some(&token),
            body.clone(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body_out["code"], "PROPERTY_NOT_FOUND");

    let (status, body_out) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/admin/properties/{}/specifications", property.id),
            Some(&token),
            json!({ "category": "", "label": "Kitchen", "value": "Granite" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body_out["errors"]["category"].is_array());

    // A specification is only reachable through its own property
    let (_, created) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/admin/properties/{}/specifications", property.id),
            Some(&token),
            body,
        ),
    )
    .await;
    let spec_id = created["data"]["id"].as_str().unwrap();
    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/admin/properties/{}/specifications/{}", other.id, spec_id),
            Some(&token),
            json!({ "value": "Quartz" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleted_developer_leaves_directory() {
    let db = setup_test_db().await;
    let admin = insert_user(&db, "admin@blunest.in", UserRole::Admin).await;
    let app = create_test_app(db);
    let token = token_for(admin.id, &admin.email);

    let mut ids = Vec::new();
    for name in ["Sunrise Builders", "Lodha Group"] {
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/admin/developers",
                Some(&token),
                json!({
                    "name": name,
                    "website_url": "https://builder.example.com",
                    "years_of_experience": 12,
                    "description": "   "
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["data"]["is_active"], true);
        assert!(body["data"]["description"].is_null());
        ids.push(body["data"]["id"].as_str().unwrap().to_string());
    }

    let (status, body) = send(&app, get_request("/api/developers", None)).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Lodha Group", "Sunrise Builders"]);

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/admin/developers/{}", ids[0]),
            Some(&token),
            json!({ "total_projects": 40 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_projects"], 40);
    assert_eq!(body["data"]["years_of_experience"], 12);

    let (status, _) = send(
        &app,
        json_request(
            "DELETE",
            &format!("/api/admin/developers/{}", ids[0]),
            Some(&token),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, get_request("/api/developers", None)).await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Lodha Group"]);

    // The row survives and can be reactivated
    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/admin/developers/{}", ids[0]),
            Some(&token),
            json!({ "is_active": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_projects"], 40);

    let (status, body) = send(
        &app,
        json_request(
            "DELETE",
            &format!("/api/admin/developers/{}", Uuid::new_v4()),
            Some(&token),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "DEVELOPER_NOT_FOUND");
}

#[tokio::test]
async fn test_search_lookups_are_seeded() {
    let db = setup_test_db().await;
    let app = create_test_app(db);

    let (status, body) = send(&app, get_request("/api/search/cities", None)).await;
    assert_eq!(status, StatusCode::OK);
    let cities = body["data"].as_array().unwrap();
    assert_eq!(cities[0]["name"], "Mumbai");
    let pune = cities
        .iter()
        .find(|c| c["name"] == "Pune")
        .expect("Pune should be listed");

    let (status, body) = send(
        &app,
        get_request(
            &format!("/api/search/locations/{}", pune["id"].as_str().unwrap()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let localities: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["name"].as_str().unwrap())
        .collect();
    assert!(localities.contains(&"Hinjewadi"));
    assert!(!localities.contains(&"Powai"));

    let (status, body) = send(
        &app,
        get_request(&format!("/api/search/locations/{}", Uuid::new_v4()), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "CITY_NOT_FOUND");

    let (status, body) = send(&app, get_request("/api/search/configurations", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["name"], "1 RK");
}

#[tokio::test]
async fn test_check_phone_reports_owner() {
    let db = setup_test_db().await;
    let owner = insert_user(&db, "owner@example.com", UserRole::User).await;
    let app = create_test_app(db);

    let (status, body) = send(
        &app,
        json_request("POST", "/api/auth/check-phone", None, json!({ "phone": " 9876543210 " })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["exists"], true);
    assert_eq!(body["data"]["user"]["id"], owner.id.to_string());
    assert_eq!(body["data"]["user"]["email"], "owner@example.com");
    assert!(body["data"]["user"].get("role").is_none());

    let (_, body) = send(
        &app,
        json_request("POST", "/api/auth/check-phone", None, json!({ "phone": "9000000000" })),
    )
    .await;
    assert_eq!(body["data"]["exists"], false);
    assert!(body["data"]["user"].is_null());

    let (status, _) = send(
        &app,
        json_request("POST", "/api/auth/check-phone", None, json!({ "phone": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_check_phone_is_rate_limited() {
    let db = setup_test_db().await;
    let app = create_test_app(db);

    let mut statuses = Vec::new();
    for _ in 0..11 {
        let (status, _) = send(
            &app,
            json_request("POST", "/api/auth/check-phone", None, json!({ "phone": "9000000000" })),
        )
        .await;
        statuses.push(status);
    }

    assert!(statuses[..10].iter().all(|s| *s == StatusCode::OK));
    assert_eq!(statuses[10], StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_chat_answers_with_property_context() {
    let db = setup_test_db().await;
    let buyer = insert_user(&db, "buyer@example.com", UserRole::User).await;
    insert_property(&db, "chat-villa").await;

    let mut llm = MockLanguageModel::new();
    llm.expect_generate()
        .withf(|request| {
            request.system_prompt.contains("Title: Sea facing villa in Alibaug")
                && request.user_prompt.contains("Advisor: Happy to help.")
                && request.user_prompt.ends_with("Question: Is the price fair?")
        })
        .times(1)
        .returning(|_| {
            Ok(Generation {
                text: "The asking price is in line with nearby villas.".to_string(),
                model: "gemini-1.5-pro".to_string(),
                tokens_used: 64,
            })
        });

    let app = ApiServer::new(
        test_config(),
        db,
        Services {
            identity: Arc::new(MockIdentityProvider::new()),
            payments: Arc::new(MockPaymentGateway::new()),
            llm: Arc::new(llm),
        },
    )
    .build_router();
    let token = token_for(buyer.id, &buyer.email);

    let request = json!({
        "property": "chat-villa",
        "messages": [
            { "role": "user", "content": "I am looking at this villa." },
            { "role": "assistant", "content": "Happy to help." },
            { "role": "user", "content": "Is the price fair?" }
        ]
    });

    let (status, _) = send(&app, json_request("POST", "/api/ai/chat", None, request.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, json_request("POST", "/api/ai/chat", Some(&token), request)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["message"]["role"], "assistant");
    assert_eq!(
        body["data"]["message"]["content"],
        "The asking price is in line with nearby villas."
    );
    assert_eq!(body["data"]["tokens_used"], 64);
}

#[tokio::test]
async fn test_chat_rejects_bad_conversations() {
    let db = setup_test_db().await;
    let buyer = insert_user(&db, "buyer@example.com", UserRole::User).await;
    let app = create_test_app(db);
    let token = token_for(buyer.id, &buyer.email);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/ai/chat",
            Some(&token),
            json!({ "messages": [{ "role": "assistant", "content": "Hi" }] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_CONVERSATION");

    let (status, _) = send(
        &app,
        json_request("POST", "/api/ai/chat", Some(&token), json!({ "messages": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/ai/chat",
            Some(&token),
            json!({
                "property": "no-such-villa",
                "messages": [{ "role": "user", "content": "Thoughts?" }]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PROPERTY_NOT_FOUND");
}

#[tokio::test]
async fn test_huge_page_number_returns_empty_page() {
    let db = setup_test_db().await;
    insert_property(&db, "only-villa").await;
    let app = create_test_app(db);

    let (status, body) = send(
        &app,
        get_request("/api/properties?page=18446744073709551615&limit=100", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["pagination"]["total"], 1);
}
