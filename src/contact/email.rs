//! Outbound email for the contact relay

use super::ContactForm;
use crate::config::EmailConfig;
use crate::error::{GuruError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// A plain-text email
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Something that can deliver email
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Deliver `email` and return the provider's message id
    async fn send_email(&self, email: &EmailMessage) -> Result<String>;
}

/// Writes emails to the log instead of sending them
#[derive(Debug, Default, Clone)]
pub struct ConsoleEmailService;

#[async_trait]
impl EmailService for ConsoleEmailService {
    async fn send_email(&self, email: &EmailMessage) -> Result<String> {
        tracing::info!(
            from = %email.from,
            to = %email.to,
            subject = %email.subject,
            "Email sent (console mode)"
        );
        tracing::debug!(text = %email.text, "Email body");
        Ok(format!("console-{}", chrono::Utc::now().timestamp_millis()))
    }
}

/// Build the configured email service
///
/// Only the console provider ships with the client; other providers are
/// rejected by configuration validation.
pub fn service_from_config(config: &EmailConfig) -> Result<Arc<dyn EmailService>> {
    match config.provider.as_str() {
        "console" => Ok(Arc::new(ConsoleEmailService)),
        other => Err(GuruError::Email(format!("Unsupported email provider: {}", other)).into()),
    }
}

/// Composes and sends the two contact-form emails
pub struct ContactMailer {
    service: Arc<dyn EmailService>,
    from: String,
    support_inbox: String,
}

impl ContactMailer {
    /// Create a mailer sending from `from`, with submissions going to `support_inbox`
    pub fn new(
        service: Arc<dyn EmailService>,
        from: impl Into<String>,
        support_inbox: impl Into<String>,
    ) -> Self {
        Self {
            service,
            from: from.into(),
            support_inbox: support_inbox.into(),
        }
    }

    /// Create a mailer from configuration
    pub fn from_config(config: &EmailConfig) -> Result<Self> {
        Ok(Self::new(
            service_from_config(config)?,
            config.from.clone(),
            config.to.clone(),
        ))
    }

    /// Forward a submission to the support inbox
    pub async fn send_contact_form(&self, form: &ContactForm) -> Result<String> {
        let text = format!(
            "New Contact Form Submission\n\n\
             Name: {}\n\
             Email: {}\n\
             Category: {}\n\
             Subject: {}\n\n\
             Message:\n{}\n\n\
             ---\n\
             This message was sent from the KabaddiGuru contact form.\n\
             Timestamp: {}",
            form.name,
            form.email,
            form.category,
            form.subject,
            form.message,
            chrono::Utc::now().to_rfc3339()
        );
        self.service
            .send_email(&EmailMessage {
                from: self.from.clone(),
                to: self.support_inbox.clone(),
                subject: format!("New Contact Form: {}", form.subject),
                text,
            })
            .await
    }

    /// Thank the sender
    pub async fn send_confirmation(&self, email: &str, name: &str) -> Result<String> {
        let text = format!(
            "Dear {},\n\n\
             Thank you for reaching out to KabaddiGuru! We have received your message \
             and our team will get back to you as soon as possible.\n\n\
             In the meantime, if you have any urgent questions, you can:\n\
             - Check our FAQ section\n\
             - Visit our documentation\n\
             - Contact us through our support channels\n\n\
             Best regards,\n\
             The KabaddiGuru Team",
            name
        );
        self.service
            .send_email(&EmailMessage {
                from: self.from.clone(),
                to: email.to_string(),
                subject: "Thank you for contacting KabaddiGuru".to_string(),
                text,
            })
            .await
    }
}
