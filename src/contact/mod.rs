//! Contact form handling
//!
//! The form is validated on both sides: [`ApiClient::submit_contact`]
//! checks it before any request, and the local relay
//! ([`relay::contact_router`]) checks it again before handing it to an
//! [`EmailService`].
//!
//! [`ApiClient::submit_contact`]: crate::api::ApiClient::submit_contact

pub mod email;
pub mod relay;

pub use email::{ConsoleEmailService, ContactMailer, EmailMessage, EmailService};
pub use relay::{contact_router, serve};

use crate::error::{GuruError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Message shown when any field is blank
pub const MISSING_FIELDS: &str = "All fields are required";

/// Message shown when the address does not look like an email
pub const INVALID_EMAIL: &str = "Invalid email format";

fn email_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex pattern"))
}

/// Whether `email` has the `local@domain.tld` shape
pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

/// A message for the KabaddiGuru team
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    /// `general`, `support`, `billing`, ...
    #[serde(default)]
    pub category: String,
}

impl ContactForm {
    /// Check that every field is filled and the email is well formed
    ///
    /// # Errors
    ///
    /// Returns [`GuruError::Validation`] with [`MISSING_FIELDS`] or
    /// [`INVALID_EMAIL`].
    pub fn validate(&self) -> Result<()> {
        let fields = [
            &self.name,
            &self.email,
            &self.subject,
            &self.message,
            &self.category,
        ];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(GuruError::Validation(MISSING_FIELDS.to_string()).into());
        }
        if !is_valid_email(&self.email) {
            return Err(GuruError::Validation(INVALID_EMAIL.to_string()).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ContactForm {
        ContactForm {
            name: "Rahul Chaudhari".into(),
            email: "rahul@kabaddi.test".into(),
            subject: "Data question".into(),
            message: "Where do the raid stats come from?".into(),
            category: "general".into(),
        }
    }

    #[test]
    fn test_valid_form() {
        assert!(form().validate().is_ok());
    }

    #[test]
    fn test_missing_field() {
        let mut f = form();
        f.category = "  ".into();
        let err = f.validate().unwrap_err();
        assert_eq!(crate::error::user_message(&err), MISSING_FIELDS);
    }

    #[test]
    fn test_bad_email() {
        let mut f = form();
        f.email = "not-an-email".into();
        let err = f.validate().unwrap_err();
        assert_eq!(crate::error::user_message(&err), INVALID_EMAIL);
    }

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.de"));
        assert!(!is_valid_email("@c.de"));
    }
}
