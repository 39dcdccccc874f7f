//! Integration tests for the onboarding backend.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::auth::Credential;
use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_psk(Some("test-api-key".to_string())).await
    }

    async fn with_psk(psk: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");

        // Create config
        let config = Config {
            api_psk: psk.clone(),
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            credentials: vec![Credential {
                username: "depot".to_string(),
                password: "lead-2025".to_string(),
            }],
            allowed_origins: Vec::new(),
        };

        let app = create_router(AppState::new(Repository::new(pool), config));

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let mut client_builder = Client::builder();
        if let Some(key) = psk {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert("x-api-key", key.parse().unwrap());
            client_builder = client_builder.default_headers(headers);
        }

        TestFixture {
            client: client_builder.build().unwrap(),
            base_url,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }

    async fn send_json(&self, method: reqwest::Method, path: &str, body: Value) -> (StatusCode, Value) {
        let resp = self
            .client
            .request(method, self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }

    async fn post_json(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send_json(reqwest::Method::POST, path, body).await
    }

    async fn put_json(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send_json(reqwest::Method::PUT, path, body).await
    }

    async fn book(&self, name: &str, depot: &str, vehicle: &str, start: &str) -> Value {
        let (status, body) = self
            .post_json(
                "/api/periods",
                json!({"traineeName": name, "depot": depot, "vehicle": vehicle, "start": start}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "booking failed: {}", body);
        body["data"].clone()
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_auth_missing_psk() {
    let fixture = TestFixture::new().await;

    // Request without API key
    let resp = Client::new()
        .get(fixture.url("/api/periods"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_auth_invalid_psk_and_bearer() {
    let fixture = TestFixture::new().await;
    let client = Client::new();

    let resp = client
        .get(fixture.url("/api/periods"))
        .header("x-api-key", "wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = client
        .get(fixture.url("/api/periods"))
        .header("Authorization", "Bearer test-api-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_no_psk_disables_auth() {
    let fixture = TestFixture::with_psk(None).await;

    let (status, body) = fixture.get_json("/api/periods").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_login() {
    let fixture = TestFixture::new().await;

    // Login needs no API key
    let client = Client::new();
    let resp = client
        .post(fixture.url("/api/login"))
        .json(&json!({"username": "depot", "password": "lead-2025"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["username"], "depot");

    let resp = client
        .post(fixture.url("/api/login"))
        .json(&json!({"username": "depot", "password": "guess"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_catalog() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/api/catalog").await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["depots"].as_array().unwrap().len(), 9);
    assert!(data["depots"].as_array().unwrap().contains(&json!("Viby J")));
    assert_eq!(data["vehicles"].as_array().unwrap().len(), 5);
    assert_eq!(data["checklistItems"].as_array().unwrap().len(), 17);
    assert_eq!(data["trainingDays"], 14);
}

#[tokio::test]
async fn test_create_period_and_duplicate() {
    let fixture = TestFixture::new().await;

    let period = fixture.book("Anna", "Horsens", "bike", "2025-07-01").await;
    assert_eq!(period["traineeName"], "Anna");
    assert_eq!(period["depot"], "Horsens");
    assert_eq!(period["vehicle"], "bike");
    assert_eq!(period["start"], "2025-07-01");
    assert_eq!(period["end"], "2025-07-14");

    // Same name in a different case is still a duplicate
    let (status, body) = fixture
        .post_json(
            "/api/periods",
            json!({"traineeName": "anna", "depot": "Randers", "vehicle": "car", "start": "2025-08-01"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_TRAINEE");

    let (_, body) = fixture.get_json("/api/periods").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_period_rejects_unknown_depot() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/periods"))
        .json(&json!({"traineeName": "Anna", "depot": "Copenhagen", "vehicle": "bike", "start": "2025-07-01"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (_, body) = fixture.get_json("/api/periods").await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_selection_workflow() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post_json("/api/selections", json!({"slot": "2025-07-01"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "awaitingName");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // Depot before name is refused and leaves the state alone
    let (status, body) = fixture
        .put_json(&format!("/api/selections/{}/depot", id), json!({"depot": "Riskov"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_STATE");

    let (status, body) = fixture
        .put_json(&format!("/api/selections/{}/name", id), json!({"name": "  Bo  "}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "awaitingDepot");
    assert_eq!(body["data"]["name"], "Bo");

    let (status, body) = fixture
        .put_json(&format!("/api/selections/{}/depot", id), json!({"depot": "Riskov"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "awaitingVehicle");

    let (status, body) = fixture
        .put_json(&format!("/api/selections/{}/vehicle", id), json!({"vehicle": "kyburz"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["traineeName"], "Bo");
    assert_eq!(body["data"]["depot"], "Riskov");
    assert_eq!(body["data"]["vehicle"], "kyburz");
    assert_eq!(body["data"]["end"], "2025-07-14");

    // The session is gone once committed
    let (status, _) = fixture
        .put_json(&format!("/api/selections/{}/name", id), json!({"name": "Bo"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_selection_duplicate_name_resets() {
    let fixture = TestFixture::new().await;
    fixture.book("Carl", "Folle", "car", "2025-07-01").await;

    let (_, body) = fixture
        .post_json("/api/selections", json!({"slot": "2025-07-10"}))
        .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = fixture
        .put_json(&format!("/api/selections/{}/name", id), json!({"name": "CARL"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_TRAINEE");

    // Still exactly one period
    let (_, body) = fixture.get_json("/api/periods").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_cancel_selection() {
    let fixture = TestFixture::new().await;

    let (_, body) = fixture
        .post_json("/api/selections", json!({"slot": "2025-07-01"}))
        .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/selections/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let (status, _) = fixture
        .put_json(&format!("/api/selections/{}/name", id), json!({"name": "Dina"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_legacy_events_round_trip() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post_json(
            "/api/events",
            json!({"title": "Eva (Viby J) [scooter45]", "start": "2025-07-01T00:00:00.000Z"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Eva (Viby J) [scooter45]");
    assert_eq!(body["data"]["end"], "2025-07-14");

    // Legacy title without a vehicle
    let (status, _) = fixture
        .post_json("/api/events", json!({"title": "Jane (Aarhus C)", "start": "2025-07-03"}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = fixture.get_json("/api/periods").await;
    let periods = body["data"].as_array().unwrap();
    let jane = periods
        .iter()
        .find(|p| p["traineeName"] == "Jane")
        .expect("Jane stored");
    assert_eq!(jane["depot"], "Aarhus C");
    assert!(jane["vehicle"].is_null());

    let (_, body) = fixture.get_json("/api/events").await;
    let titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap())
        .collect();
    assert!(titles.contains(&"Eva (Viby J) [scooter45]"));
    assert!(titles.contains(&"Jane (Aarhus C)"));
}

#[tokio::test]
async fn test_legacy_progress() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post_json(
            "/api/progress",
            json!({"user_id": "Finn", "stage": "Finn (Ebeltoft) [scooter30]"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user_id"], "Finn");
    assert_eq!(body["data"]["stage"], "Finn (Ebeltoft) [scooter30]");

    let (_, body) = fixture.get_json("/api/progress").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_legacy_titles_with_extra_text() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post_json(
            "/api/events",
            json!({"title": "Anna (Horsens) - late start", "start": "2025-07-01"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "import failed: {}", body);
    assert_eq!(body["data"]["title"], "Anna (Horsens)");

    let (status, body) = fixture
        .post_json(
            "/api/events",
            json!({"title": "Jane (Aarhus C) (moved)", "start": "2025-07-02"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "import failed: {}", body);

    // Unclosed parenthesis keeps the text before it as the name
    let (status, body) = fixture
        .post_json("/api/events", json!({"title": "Ole (Riskov", "start": "2025-07-03"}))
        .await;
    assert_eq!(status, StatusCode::OK, "import failed: {}", body);
    assert_eq!(body["data"]["title"], "Ole");

    // Nothing before the parenthesis is a clear validation error
    let (status, body) = fixture
        .post_json("/api/events", json!({"title": "(Folle)", "start": "2025-07-04"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (_, body) = fixture.get_json("/api/periods").await;
    let periods = body["data"].as_array().unwrap();
    assert_eq!(periods.len(), 3);
    let depot_of = |name: &str| {
        periods
            .iter()
            .find(|p| p["traineeName"] == name)
            .map(|p| p["depot"].clone())
            .unwrap()
    };
    assert_eq!(depot_of("Anna"), json!("Horsens"));
    assert_eq!(depot_of("Jane"), json!("Aarhus C"));
}

#[tokio::test]
async fn test_malformed_bodies_use_error_envelope() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/periods"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, body) = fixture.get_json("/api/calendar?asOf=yesterday").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_checklist_and_details() {
    let fixture = TestFixture::new().await;
    fixture.book("Gry", "Grena", "bike", "2025-07-01").await;

    let (status, body) = fixture.get_json("/api/trainees/gry/checklist").await;
    assert_eq!(status, StatusCode::OK);
    let checklist = body["data"].as_object().unwrap();
    assert_eq!(checklist.len(), 17);
    assert!(checklist.values().all(|v| v == &json!(false)));

    let (status, body) = fixture
        .put_json(
            "/api/trainees/Gry/checklist",
            json!({"item": "How to scan packages", "completed": true}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["How to scan packages"], true);

    let (status, body) = fixture
        .put_json(
            "/api/trainees/Gry/checklist",
            json!({"item": "Juggling", "completed": true}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = fixture
        .put_json(
            "/api/trainees/Gry/details",
            json!({"dayKey": "day3", "field": "topic", "value": "Route planning"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["day3"]["topic"], "Route planning");

    let (status, _) = fixture
        .put_json(
            "/api/trainees/Gry/details",
            json!({"dayKey": "day15", "field": "topic", "value": "Too late"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = fixture.get_json("/api/trainees/Gry").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["checklistCompleted"], 1);
    assert_eq!(body["data"]["checklistTotal"], 17);
    assert_eq!(body["data"]["period"]["depot"], "Grena");
}

#[tokio::test]
async fn test_unknown_trainee() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/api/trainees/Nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = fixture
        .put_json(
            "/api/trainees/Nobody/checklist",
            json!({"item": "How to scan packages", "completed": true}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_trainee_cascades() {
    let fixture = TestFixture::new().await;
    fixture.book("Hans", "Randers", "car", "2025-07-01").await;
    fixture
        .put_json(
            "/api/trainees/Hans/details",
            json!({"dayKey": "day1", "field": "notes", "value": "Arrived early"}),
        )
        .await;

    for _ in 0..2 {
        let resp = fixture
            .client
            .delete(fixture.url("/api/trainees/Hans"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 204);
    }

    let (_, body) = fixture.get_json("/api/periods").await;
    assert_eq!(body["data"], json!([]));

    // The name is free again
    fixture.book("Hans", "Horsens", "bike", "2025-08-01").await;
    let (_, body) = fixture.get_json("/api/trainees/Hans/details").await;
    assert_eq!(body["data"], json!({}));
}

#[tokio::test]
async fn test_calendar_status() {
    let fixture = TestFixture::new().await;
    fixture.book("Ida", "Horsens", "bike", "2025-06-01").await;
    fixture.book("Jon", "Horsens", "car", "2025-07-01").await;
    fixture.book("Kim", "Folle", "bike", "2025-08-01").await;

    let (status, body) = fixture.get_json("/api/calendar?asOf=2025-07-14").await;
    assert_eq!(status, StatusCode::OK);

    let events = body["data"].as_array().unwrap();
    let status_of = |name: &str| {
        events
            .iter()
            .find(|e| e["traineeName"] == name)
            .map(|e| (e["status"].clone(), e["color"].clone()))
            .unwrap()
    };
    assert_eq!(status_of("Ida"), (json!("past"), json!("red")));
    assert_eq!(status_of("Jon"), (json!("active"), json!("yellow")));
    assert_eq!(status_of("Kim"), (json!("upcoming"), json!("green")));

    let (_, body) = fixture.get_json("/api/periods/grouped").await;
    let groups = body["data"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
}

#[tokio::test]
async fn test_report_json() {
    let fixture = TestFixture::new().await;
    fixture.book("Lars", "Horsens", "bike", "2025-07-05").await;
    fixture
        .put_json(
            "/api/trainees/Lars/details",
            json!({"dayKey": "day1", "field": "topic", "value": "Safety"}),
        )
        .await;

    let (status, body) = fixture
        .get_json("/api/report?from=2025-07-01&to=2025-07-14")
        .await;
    assert_eq!(status, StatusCode::OK);

    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[0]["trainee"], "Lars");
    assert_eq!(rows[0]["topic"], "Safety");
    assert_eq!(rows[1]["topic"], "");
}

#[tokio::test]
async fn test_report_csv() {
    let fixture = TestFixture::new().await;
    fixture.book("Mia", "Riskov", "scooter30", "2025-07-01").await;

    let resp = fixture
        .client
        .get(fixture.url("/api/report?from=2025-07-01&to=2025-07-02&format=csv"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/csv"));
    let disposition = resp.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("training_report_"));
    assert!(disposition.contains(".csv"));

    let text = resp.text().await.unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        r#""Trainee","Depot","Vehicle","Training Date","Topic","Notes""#
    );
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with(r#""Mia","Riskov","scooter30","01/07/2025""#));
}

#[tokio::test]
async fn test_report_errors() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .get_json("/api/report?from=2025-07-01&to=2025-07-14")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NO_DATA");

    let (status, body) = fixture
        .get_json("/api/report?from=2025-07-14&to=2025-07-01")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}
