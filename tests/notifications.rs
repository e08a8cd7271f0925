use booking_system::services::notify::{deliver, ConfirmationEvent, EventItem, NotificationService};
use rust_decimal_macros::dec;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn event() -> ConfirmationEvent {
    ConfirmationEvent {
        booking_id: 42,
        contact_email: "guest@example.com".to_string(),
        slot_id: 7,
        items: vec![
            EventItem { category_id: 1, quantity: 2, unit_price: dec!(1000.00) },
            EventItem { category_id: 2, quantity: 1, unit_price: dec!(600.00) },
        ],
        total_price: dec!(2600.00),
    }
}

#[tokio::test]
async fn posts_confirmation_payload_to_webhook() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hooks/booking"))
        .and(body_partial_json(serde_json::json!({
            "bookingId": 42,
            "contactEmail": "guest@example.com",
            "slotId": 7,
            "totalPrice": "2600.00",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    deliver(&client, &format!("{}/hooks/booking", server.uri()), &event())
        .await
        .unwrap();
}

#[tokio::test]
async fn non_2xx_response_is_a_delivery_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let result = deliver(&client, &server.uri(), &event()).await;
    assert!(result.is_err());
}

// Фоновая отправка глотает сбой доставки: бронь уже закоммичена.
#[tokio::test]
async fn background_delivery_failure_does_not_propagate() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let service = NotificationService::new(Some(server.uri()), Duration::from_secs(1));
    service.send_background(event());

    // даем фоновой задаче отработать
    tokio::time::sleep(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn missing_webhook_url_disables_delivery() {
    let service = NotificationService::new(None, Duration::from_secs(1));
    service.send_background(event());
}
