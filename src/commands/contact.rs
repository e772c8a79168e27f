//! Contact form commands

use crate::api::ApiClient;
use crate::config::Config;
use crate::contact::{self, ContactForm, ContactMailer};
use crate::error::{user_message, Result};
use colored::Colorize;
use std::sync::Arc;

/// Submit the contact form to the configured contact endpoint
pub async fn send_contact(config: Config, form: ContactForm) -> Result<()> {
    let api = ApiClient::from_config(&config)?;
    match api.submit_contact(&form).await {
        Ok(_) => println!(
            "{}",
            "Thanks for reaching out! We'll get back to you soon.".green()
        ),
        Err(e) => eprintln!("{}", user_message(&e).red()),
    }
    Ok(())
}

/// Run the contact relay until interrupted
pub async fn serve_contact(config: Config, bind: Option<String>) -> Result<()> {
    let mailer = Arc::new(ContactMailer::from_config(&config.email)?);
    let bind = bind.unwrap_or_else(|| config.contact.bind.clone());
    println!("Contact relay listening on {}", bind.cyan());
    contact::serve(&bind, mailer).await
}
