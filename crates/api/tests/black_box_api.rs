use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{Value, json};

use stockwatch_alerts::{ChannelKind, DispatcherConfig, InMemoryChannel};
use stockwatch_api::app::{self, services};

struct TestServer {
    base_url: String,
    alerts: Arc<InMemoryChannel>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(InMemoryChannel::new("email", ChannelKind::Email)).await
    }

    async fn spawn_with(channel: InMemoryChannel) -> Self {
        let alerts = Arc::new(channel);
        let services = services::in_memory_services(
            DispatcherConfig::default()
                .with_channel(alerts.clone())
                .with_timeout(Duration::from_millis(200)),
        );

        // Same router as prod, bound to an ephemeral port.
        let app = app::build_app(Arc::new(services));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            alerts,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn create(&self, client: &reqwest::Client, name: &str, quantity: i64, threshold: i64) -> Value {
        let res = client
            .post(self.url("/api/items"))
            .json(&json!({ "name": name, "quantity": quantity, "threshold": threshold }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        res.json().await.unwrap()
    }

    /// Alerts are delivered after the response; poll until `n` attempts are seen.
    async fn wait_for_alerts(&self, n: usize) {
        for _ in 0..100 {
            if self.alerts.attempts() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {n} alert attempts, saw {}",
            self.alerts.attempts()
        );
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_is_ok() {
    let server = TestServer::spawn().await;
    let res = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn item_lifecycle() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = server.create(&client, "Amoxicillin", 20, 5).await;
    assert_eq!(created["name"], "Amoxicillin");
    assert_eq!(created["quantity"], 20);
    assert_eq!(created["initialQuantity"], 20);
    assert_eq!(created["history"], json!([]));
    let id = created["id"].as_str().unwrap().to_string();

    let res = client
        .put(server.url(&format!("/api/items/{id}")))
        .json(&json!({ "amountConsumed": 5, "amountRestocked": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["quantity"], 18);
    assert_eq!(updated["crossedBelowThreshold"], false);
    let history = updated["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["amountConsumed"], 5);
    assert_eq!(history[0]["amountRestocked"], 0);
    assert_eq!(history[1]["amountRestocked"], 3);
    assert!(history[1]["timestamp"].is_string());

    let listed: Value = client
        .get(server.url("/api/items"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], id.as_str());

    let fetched: Value = client
        .get(server.url(&format!("/api/items/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["quantity"], 18);

    let res = client
        .delete(server.url(&format!("/api/items/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert!(body["message"].is_string());

    let res = client
        .get(server.url(&format!("/api/items/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");

    assert_eq!(server.alerts.attempts(), 0);
}

#[tokio::test]
async fn crossing_below_threshold_sends_alert_in_background() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = server.create(&client, "Insulin", 10, 5).await;
    let id = created["id"].as_str().unwrap();

    let res = client
        .put(server.url(&format!("/api/items/{id}")))
        .json(&json!({ "amountConsumed": 7 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["quantity"], 3);
    assert_eq!(updated["crossedBelowThreshold"], true);
    assert_eq!(updated["isLow"], true);

    server.wait_for_alerts(1).await;
    let delivered = server.alerts.delivered();
    assert_eq!(delivered[0].subject, "Low Stock Alert: Insulin");
    assert_eq!(delivered[0].body, "The stock for Insulin is low. Only 3 left.");
}

#[tokio::test]
async fn hanging_channel_does_not_delay_the_response() {
    let server = TestServer::spawn_with(InMemoryChannel::hanging("email", ChannelKind::Email)).await;
    let client = reqwest::Client::new();

    let created = server.create(&client, "Heparin", 2, 5).await;
    let id = created["id"].as_str().unwrap();

    let res = tokio::time::timeout(
        Duration::from_millis(150),
        client
            .put(server.url(&format!("/api/items/{id}")))
            .json(&json!({ "amountConsumed": 1 }))
            .send(),
    )
    .await
    .expect("response must not wait for alert delivery")
    .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn string_amounts_and_amount_taken_are_accepted() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = server.create(&client, "Paracetamol", 10, 2).await;
    let id = created["id"].as_str().unwrap();

    let res = client
        .put(server.url(&format!("/api/items/{id}")))
        .json(&json!({ "amountTaken": "4", "amountRestocked": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["quantity"], 6);
    assert_eq!(updated["history"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_amounts_are_rejected_without_changes() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = server.create(&client, "Ibuprofen", 10, 2).await;
    let id = created["id"].as_str().unwrap();

    for body in [
        json!({ "amountConsumed": -1 }),
        json!({ "amountConsumed": 2.5 }),
        json!({ "amountRestocked": "lots" }),
        json!({ "amountConsumed": 1, "amountRestocked": -3 }),
    ] {
        let res = client
            .put(server.url(&format!("/api/items/{id}")))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{body}");
        let err: Value = res.json().await.unwrap();
        assert!(err["error"].is_string());
        assert!(err["message"].is_string());
    }

    let fetched: Value = client
        .get(server.url(&format!("/api/items/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["quantity"], 10);
    assert_eq!(fetched["history"], json!([]));
}

#[tokio::test]
async fn blank_name_is_rejected() {
    let server = TestServer::spawn().await;
    let res = reqwest::Client::new()
        .post(server.url("/api/items"))
        .json(&json!({ "name": "  ", "quantity": 1, "threshold": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_and_malformed_ids() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let unknown = "0190f0a0-0000-7000-8000-000000000000";

    let res = client
        .get(server.url(&format!("/api/items/{unknown}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .put(server.url(&format!("/api/items/{unknown}")))
        .json(&json!({ "amountConsumed": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .delete(server.url(&format!("/api/items/{unknown}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .get(server.url("/api/items/not-a-uuid"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn cross_origin_preflight_is_allowed() {
    let server = TestServer::spawn().await;
    let res = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, server.url("/api/items"))
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "PUT")
        .header("access-control-request-headers", "content-type")
        .send()
        .await
        .unwrap();

    assert!(res.status().is_success());
    assert_eq!(
        res.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    let methods = res
        .headers()
        .get("access-control-allow-methods")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(methods.contains("PUT"), "{methods}");
}

#[tokio::test]
async fn cross_origin_responses_carry_allow_origin() {
    let server = TestServer::spawn().await;
    let res = reqwest::Client::new()
        .get(server.url("/api/items"))
        .header("origin", "http://localhost:3000")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
