//! Local HTTP relay for the contact form
//!
//! `POST /api/contact` validates a submission, emails the support inbox
//! and sends the sender a confirmation. `GET /api/contact` answers with a
//! liveness message.

use super::{ContactForm, ContactMailer};
use crate::error::{GuruError, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;

/// Error text returned when delivery fails
pub const DELIVERY_FAILED: &str = "Failed to send message. Please try again later.";

/// Build the contact routes
pub fn contact_router(mailer: Arc<ContactMailer>) -> Router {
    Router::new()
        .route("/api/contact", get(contact_status).post(submit_contact))
        .with_state(mailer)
}

/// Serve the contact relay on `bind` until the process exits
pub async fn serve(bind: &str, mailer: Arc<ContactMailer>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| GuruError::Config(format!("Failed to bind contact relay to {}: {}", bind, e)))?;
    tracing::info!(address = %bind, "Contact relay listening");
    axum::serve(listener, contact_router(mailer))
        .await
        .map_err(GuruError::from)?;
    Ok(())
}

fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

async fn contact_status() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Contact API endpoint is working",
        "timestamp": now_iso(),
    }))
}

async fn submit_contact(State(mailer): State<Arc<ContactMailer>>, body: Bytes) -> Response {
    let form: ContactForm = match serde_json::from_slice(&body) {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable contact form body");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid request body" })),
            )
                .into_response();
        }
    };

    if let Err(e) = form.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": crate::error::user_message(&e) })),
        )
            .into_response();
    }

    let delivered = async {
        let support_id = mailer.send_contact_form(&form).await?;
        let confirmation_id = mailer.send_confirmation(&form.email, &form.name).await?;
        Ok::<_, anyhow::Error>((support_id, confirmation_id))
    }
    .await;

    match delivered {
        Ok((support_id, confirmation_id)) => {
            let preview: String = form.message.chars().take(100).collect();
            tracing::info!(
                category = %form.category,
                subject = %form.subject,
                preview = %preview,
                support_email_id = %support_id,
                confirmation_email_id = %confirmation_id,
                "Contact form submission"
            );
            Json(json!({
                "success": true,
                "message": "Message sent successfully",
                "timestamp": now_iso(),
                "supportEmailId": support_id,
                "confirmationEmailId": confirmation_id,
            }))
            .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Contact form error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": DELIVERY_FAILED })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::ConsoleEmailService;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn router() -> Router {
        let mailer = ContactMailer::new(
            Arc::new(ConsoleEmailService),
            "noreply@kabaddiai.com",
            "support@kabaddiai.com",
        );
        contact_router(Arc::new(mailer))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_status_route() {
        let response = router()
            .oneshot(Request::get("/api/contact").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Contact API endpoint is working");
    }

    #[tokio::test]
    async fn test_garbage_body_is_bad_request() {
        let response = router()
            .oneshot(
                Request::post("/api/contact")
                    .header("content-type", "application/json")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
