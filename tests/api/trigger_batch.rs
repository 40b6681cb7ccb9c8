use chrono::{Duration, Utc};
use wiremock::matchers::{any, body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

use horoscope_delivery::domain::cadence::Cadence;
use horoscope_delivery::domain::delivery_channel::DeliveryChannel;
use horoscope_delivery::domain::message_kind::MessageKind;
use horoscope_delivery::domain::subscription_status::SubscriptionStatus;

use crate::helpers::{completion_response, new_subscriber, TestApp};

async fn processed(response: reqwest::Response) -> u64 {
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);

    body["processed"].as_u64().unwrap()
}

#[tokio::test]
async fn batch_sends_to_every_active_subscriber_that_never_received_a_message() {
    let test_app = TestApp::spawn_app().await;
    let luna = new_subscriber("Luna Stern");
    let mut sol = new_subscriber("Sol Weber");
    sol.status = SubscriptionStatus::Premium;
    sol.cadence = Cadence::Monthly;

    test_app.store.add_subscriber(luna.clone());
    test_app.store.add_subscriber(sol.clone());
    test_app.mock_completion("The stars are kind today.").await;
    test_app.mock_email_delivery(2).await;

    let processed = processed(test_app.trigger_batch().await).await;

    assert_eq!(processed, 2);

    let luna_messages = test_app.store.messages_for(luna.id);
    assert_eq!(luna_messages.len(), 1);
    assert_eq!(luna_messages[0].kind, MessageKind::DailyHoroscope);
    assert_eq!(luna_messages[0].content, "The stars are kind today.");
    assert!(!luna_messages[0].read);

    let sol_messages = test_app.store.messages_for(sol.id);
    assert_eq!(sol_messages.len(), 1);
    assert_eq!(sol_messages[0].kind, MessageKind::MonthlyReading);
}

#[tokio::test]
async fn batch_skips_inactive_subscribers() {
    let test_app = TestApp::spawn_app().await;
    let mut lapsed = new_subscriber("Lapsed Reader");
    lapsed.status = SubscriptionStatus::Inactive;
    test_app.store.add_subscriber(lapsed.clone());

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.completion_server)
        .await;

    assert_eq!(processed(test_app.trigger_batch().await).await, 0);
    assert!(test_app.store.messages_for(lapsed.id).is_empty());
}

#[tokio::test]
async fn batch_only_sends_once_the_cadence_window_has_elapsed() {
    let test_app = TestApp::spawn_app().await;
    let now = Utc::now();

    let mut recent_weekly = new_subscriber("Recent Weekly");
    recent_weekly.cadence = Cadence::Weekly;
    let mut due_weekly = new_subscriber("Due Weekly");
    due_weekly.cadence = Cadence::Weekly;
    let due_daily = new_subscriber("Due Daily");

    test_app.store.add_subscriber(recent_weekly.clone());
    test_app.store.add_subscriber(due_weekly.clone());
    test_app.store.add_subscriber(due_daily.clone());
    test_app
        .store
        .add_message(recent_weekly.id, MessageKind::WeeklyForecast, now - Duration::days(6));
    test_app
        .store
        .add_message(due_weekly.id, MessageKind::WeeklyForecast, now - Duration::days(7));
    test_app
        .store
        .add_message(due_daily.id, MessageKind::DailyHoroscope, now - Duration::hours(23) - Duration::minutes(1));

    test_app.mock_completion("Mercury turns direct.").await;
    test_app.mock_email_delivery(2).await;

    assert_eq!(processed(test_app.trigger_batch().await).await, 2);
    assert_eq!(test_app.store.messages_for(recent_weekly.id).len(), 1);
    assert_eq!(test_app.store.messages_for(due_weekly.id).len(), 2);
    assert_eq!(test_app.store.messages_for(due_daily.id).len(), 2);
}

#[tokio::test]
async fn batch_continues_when_content_generation_fails_for_one_subscriber() {
    let test_app = TestApp::spawn_app().await;
    let ares = new_subscriber("Ares Broken");
    let bea = new_subscriber("Bea Fine");
    let cas = new_subscriber("Cas Fine");

    test_app.store.add_subscriber(ares.clone());
    test_app.store.add_subscriber(bea.clone());
    test_app.store.add_subscriber(cas.clone());

    // Mounted first so it takes precedence over the catch-all below
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("Name: Ares"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&test_app.completion_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion_response("Jupiter opens a door."))
        .expect(2)
        .mount(&test_app.completion_server)
        .await;
    test_app.mock_email_delivery(2).await;

    assert_eq!(processed(test_app.trigger_batch().await).await, 2);
    assert!(test_app.store.messages_for(ares.id).is_empty());
    assert_eq!(test_app.store.messages_for(bea.id).len(), 1);
    assert_eq!(test_app.store.messages_for(cas.id).len(), 1);
}

#[tokio::test]
async fn batch_continues_when_the_store_fails_for_one_subscriber() {
    let test_app = TestApp::spawn_app().await;
    let broken = new_subscriber("Broken History");
    let fine = new_subscriber("Fine History");

    test_app.store.add_subscriber(broken.clone());
    test_app.store.add_subscriber(fine.clone());
    test_app.store.break_history_of(broken.id);
    test_app.mock_completion("Saturn asks for patience.").await;
    test_app.mock_email_delivery(1).await;

    assert_eq!(processed(test_app.trigger_batch().await).await, 1);
    assert_eq!(test_app.store.messages_for(fine.id).len(), 1);
}

#[tokio::test]
async fn undeliverable_message_is_kept_and_still_counted() {
    let test_app = TestApp::spawn_app().await;
    let mut bad_email = new_subscriber("Bad Email");
    bad_email.send_to = Some(String::from("not-an-email"));
    let mut bad_phone = new_subscriber("Bad Phone");
    bad_phone.channel = DeliveryChannel::Sms;
    bad_phone.send_to = Some(String::from("12345"));
    let mut pigeon = new_subscriber("Pigeon Post");
    pigeon.channel = DeliveryChannel::Unsupported(String::from("pigeon"));

    test_app.store.add_subscriber(bad_email.clone());
    test_app.store.add_subscriber(bad_phone.clone());
    test_app.store.add_subscriber(pigeon.clone());
    test_app.mock_completion("Venus brings warmth.").await;
    test_app.mock_email_delivery(0).await;
    test_app.mock_text_delivery(0).await;

    assert_eq!(processed(test_app.trigger_batch().await).await, 3);
    assert_eq!(test_app.store.message_count(), 3);
}

#[tokio::test]
async fn batch_routes_each_subscriber_to_its_channel() {
    let test_app = TestApp::spawn_app().await;
    let by_email = new_subscriber("Email Reader");
    let mut by_sms = new_subscriber("Sms Reader");
    by_sms.channel = DeliveryChannel::Sms;
    by_sms.send_to = Some(String::from("+41791234567"));
    let mut by_whatsapp = new_subscriber("Whatsapp Reader");
    by_whatsapp.channel = DeliveryChannel::Whatsapp;
    by_whatsapp.send_to = Some(String::from("+41797654321"));

    test_app.store.add_subscriber(by_email);
    test_app.store.add_subscriber(by_sms);
    test_app.store.add_subscriber(by_whatsapp);
    test_app.mock_completion("Mars gives you drive.").await;
    test_app.mock_email_delivery(1).await;

    Mock::given(body_string_contains("To=%2B41791234567"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&test_app.messaging_server)
        .await;
    Mock::given(body_string_contains("To=whatsapp%3A%2B41797654321"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&test_app.messaging_server)
        .await;

    assert_eq!(processed(test_app.trigger_batch().await).await, 3);
}

#[tokio::test]
async fn kill_switch_stores_messages_without_contacting_transports() {
    let test_app = TestApp::spawn_app_with(|config| config.delivery.disabled = true).await;
    let mut by_sms = new_subscriber("Sms Reader");
    by_sms.channel = DeliveryChannel::Sms;
    by_sms.send_to = Some(String::from("+41791234567"));

    test_app.store.add_subscriber(new_subscriber("Email Reader"));
    test_app.store.add_subscriber(by_sms);
    test_app.mock_completion("Neptune whispers.").await;
    test_app.mock_email_delivery(0).await;
    test_app.mock_text_delivery(0).await;

    assert_eq!(processed(test_app.trigger_batch().await).await, 2);
    assert_eq!(test_app.store.message_count(), 2);
}

#[tokio::test]
async fn second_batch_right_after_the_first_sends_nothing() {
    let test_app = TestApp::spawn_app().await;
    test_app.store.add_subscriber(new_subscriber("Luna Stern"));
    test_app.mock_completion("The moon is bright.").await;
    test_app.mock_email_delivery(1).await;

    assert_eq!(processed(test_app.trigger_batch().await).await, 1);
    assert_eq!(processed(test_app.trigger_batch().await).await, 0);
    assert_eq!(test_app.store.message_count(), 1);
}
