//! Contact form relay and client submission tests

mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kabaddiguru::api::ApiClient;
use kabaddiguru::contact::relay::DELIVERY_FAILED;
use kabaddiguru::contact::{
    contact_router, ContactForm, ContactMailer, EmailMessage, EmailService, INVALID_EMAIL,
    MISSING_FIELDS,
};
use kabaddiguru::error::{GuruError, Result};

#[derive(Default)]
struct RecordingService {
    sent: Mutex<Vec<EmailMessage>>,
    fail: bool,
}

#[async_trait]
impl EmailService for RecordingService {
    async fn send_email(&self, message: &EmailMessage) -> Result<String> {
        if self.fail {
            return Err(GuruError::Email("provider down".to_string()).into());
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(message.clone());
        Ok(format!("msg-{}", sent.len()))
    }
}

fn router(service: Arc<RecordingService>) -> axum::Router {
    let mailer = ContactMailer::new(service, "noreply@kabaddiai.com", "support@kabaddiai.com");
    contact_router(Arc::new(mailer))
}

fn form_json() -> Value {
    json!({
        "name": "Ajay Thakur",
        "email": "ajay@kabaddi.test",
        "subject": "Data question",
        "message": "Where do the season 5 stats come from?",
        "category": "support"
    })
}

async fn post(router: axum::Router, body: Value) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::post("/api/contact")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_valid_submission_sends_two_emails() {
    let service = Arc::new(RecordingService::default());
    let (status, body) = post(router(service.clone()), form_json()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Message sent successfully");
    assert_eq!(body["supportEmailId"], "msg-1");
    assert_eq!(body["confirmationEmailId"], "msg-2");

    let sent = service.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, "support@kabaddiai.com");
    assert_eq!(sent[0].subject, "New Contact Form: Data question");
    assert!(sent[0].text.contains("Ajay Thakur"));
    assert_eq!(sent[1].to, "ajay@kabaddi.test");
    assert_eq!(sent[1].subject, "Thank you for contacting KabaddiGuru");
}

#[tokio::test]
async fn test_missing_field_is_rejected_without_email() {
    let service = Arc::new(RecordingService::default());
    let mut form = form_json();
    form["subject"] = json!("   ");

    let (status, body) = post(router(service.clone()), form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], MISSING_FIELDS);
    assert!(service.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_bad_email_is_rejected_without_email() {
    let service = Arc::new(RecordingService::default());
    let mut form = form_json();
    form["email"] = json!("not-an-email");

    let (status, body) = post(router(service.clone()), form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], INVALID_EMAIL);
    assert!(service.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_delivery_failure_is_server_error() {
    let service = Arc::new(RecordingService {
        fail: true,
        ..RecordingService::default()
    });
    let (status, body) = post(router(service), form_json()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], DELIVERY_FAILED);
}

#[tokio::test]
async fn test_client_rejects_invalid_email_before_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/contact"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = common::test_config(&server.uri());
    let api = ApiClient::from_config(&config).unwrap();
    let form = ContactForm {
        name: "Ajay".to_string(),
        email: "not-an-email".to_string(),
        subject: "Hi".to_string(),
        message: "Hello".to_string(),
        category: "general".to_string(),
    };

    let err = api.submit_contact(&form).await.unwrap_err();
    match err.downcast_ref::<GuruError>() {
        Some(GuruError::Validation(msg)) => assert_eq!(msg, INVALID_EMAIL),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_client_surfaces_relay_error_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/contact"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": DELIVERY_FAILED})))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::from_config(&common::test_config(&server.uri())).unwrap();
    let form: ContactForm = serde_json::from_value(form_json()).unwrap();
    let err = api.submit_contact(&form).await.unwrap_err();
    assert_eq!(kabaddiguru::error::user_message(&err), DELIVERY_FAILED);
}
