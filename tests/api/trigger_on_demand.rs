use chrono::{Duration, Utc};
use uuid::Uuid;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, ResponseTemplate};

use horoscope_delivery::domain::message_kind::MessageKind;

use crate::helpers::{new_subscriber, TestApp, CRON_SECRET};

#[tokio::test]
async fn on_demand_sends_even_when_no_message_is_due() {
    let test_app = TestApp::spawn_app().await;
    let luna = new_subscriber("Luna Stern");
    test_app.store.add_subscriber(luna.clone());
    test_app
        .store
        .add_message(luna.id, MessageKind::DailyHoroscope, Utc::now() - Duration::hours(1));
    test_app.mock_completion("An extra reading for you.").await;
    test_app.mock_email_delivery(1).await;

    let response = test_app.trigger_for(luna.id).await;

    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "success": true, "processed": 1 }));
    assert_eq!(test_app.store.messages_for(luna.id).len(), 2);
}

#[tokio::test]
async fn on_demand_within_the_dedup_window_is_skipped_without_delivery() {
    let test_app = TestApp::spawn_app().await;
    let luna = new_subscriber("Luna Stern");
    test_app.store.add_subscriber(luna.clone());
    test_app
        .store
        .add_message(luna.id, MessageKind::DailyHoroscope, Utc::now() - Duration::minutes(5));
    test_app.mock_completion("A duplicate reading.").await;
    test_app.mock_email_delivery(0).await;

    let response = test_app.trigger_for(luna.id).await;

    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "success": true, "processed": 0 }));
    assert_eq!(test_app.store.messages_for(luna.id).len(), 1);
}

#[tokio::test]
async fn on_demand_for_unknown_subscriber_returns_404() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.completion_server)
        .await;

    let response = test_app.trigger_for(Uuid::new_v4()).await;

    assert_eq!(response.status().as_u16(), 404);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        serde_json::json!({ "success": false, "error": "User not found" })
    );
}

#[tokio::test]
async fn on_demand_with_malformed_id_returns_400() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app
        .get_trigger(&[("key", CRON_SECRET), ("userId", "not-a-uuid")])
        .await;

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn on_demand_fails_when_content_generation_fails() {
    let test_app = TestApp::spawn_app().await;
    let luna = new_subscriber("Luna Stern");
    test_app.store.add_subscriber(luna.clone());

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&test_app.completion_server)
        .await;
    test_app.mock_email_delivery(0).await;

    let response = test_app.trigger_for(luna.id).await;

    assert_eq!(response.status().as_u16(), 500);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(test_app.store.messages_for(luna.id).is_empty());
}

#[tokio::test]
async fn on_demand_accepts_the_user_id_in_a_json_body() {
    let test_app = TestApp::spawn_app().await;
    let luna = new_subscriber("Luna Stern");
    test_app.store.add_subscriber(luna.clone());
    test_app.mock_completion("Posted reading.").await;
    test_app.mock_email_delivery(1).await;

    let response = test_app
        .post_trigger(serde_json::json!({
            "key": CRON_SECRET,
            "userId": luna.id.to_string(),
        }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(test_app.store.messages_for(luna.id).len(), 1);
}

#[tokio::test]
async fn delivery_failure_after_persistence_still_reports_success() {
    let test_app = TestApp::spawn_app().await;
    let luna = new_subscriber("Luna Stern");
    test_app.store.add_subscriber(luna.clone());
    test_app.mock_completion("Undelivered reading.").await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&test_app.email_server)
        .await;

    let response = test_app.trigger_for(luna.id).await;

    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["processed"], 1);
    assert_eq!(test_app.store.messages_for(luna.id).len(), 1);
}

#[tokio::test]
async fn post_with_a_malformed_body_returns_400_without_running_the_batch() {
    let test_app = TestApp::spawn_app().await;
    for name in ["Luna Stern", "Sol Rivera"] {
        test_app.store.add_subscriber(new_subscriber(name));
    }

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.completion_server)
        .await;

    let test_cases = vec![
        (r#"{"userId": 12345}"#, "numeric user id"),
        (r#"{"userId": "#, "truncated json"),
        ("userId=abc", "form encoded body"),
    ];

    for (body, description) in test_cases {
        let response = test_app
            .post_trigger_raw(&[("key", CRON_SECRET)], body)
            .await;

        assert_eq!(
            response.status().as_u16(),
            400,
            "The API did not reject a {}.",
            description
        );

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);
    }

    assert_eq!(test_app.store.message_count(), 0);
}

#[tokio::test]
async fn post_without_a_body_runs_the_batch() {
    let test_app = TestApp::spawn_app().await;
    test_app.store.add_subscriber(new_subscriber("Luna Stern"));
    test_app.mock_completion("The batch still runs.").await;
    test_app.mock_email_delivery(1).await;

    let response = test_app.post_trigger_raw(&[("key", CRON_SECRET)], "").await;

    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "success": true, "processed": 1 }));
}
