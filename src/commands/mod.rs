/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint:

- `chat`: interactive chat with the assistant
- `auth`: sign in, sign up, password reset and session status
- `history`: stored conversations
- `analytics`: teams, matches, players and suggestions
- `contact`: contact form submission and the local relay

Handlers stay small; the work happens in [`AppState`](crate::state::AppState),
the API client and the contact relay.
*/

use crate::chat::{Message, Role};
use crate::gate::LimitBanner;
use crate::quota::QuotaInfo;
use colored::Colorize;

// Slash commands available inside `chat`
pub mod special_commands;

pub mod analytics;
pub mod auth;
pub mod chat;
pub mod contact;
pub mod history;

/// Print one chat message
pub(crate) fn print_message(message: &Message) {
    let time = message.timestamp.format("%H:%M");
    match message.role {
        Role::User => {
            println!("{} {}", format!("[{}] you:", time).cyan().bold(), message.content);
        }
        Role::Assistant if message.is_error => {
            println!("{} {}", format!("[{}] guru:", time).red().bold(), message.content.red());
        }
        Role::Assistant if message.is_loading => {
            println!("{}", message.content.dimmed());
        }
        Role::Assistant => {
            println!("{} {}", format!("[{}] guru:", time).green().bold(), message.content);
            if let Some(sql) = &message.sql_query {
                println!("{}", format!("  SQL: {}", sql).dimmed());
            }
            if let Some(secs) = message.response_time {
                println!("{}", format!("  answered in {:.1}s", secs).dimmed());
            }
        }
    }
}

/// Print the "limit reached" banner
pub(crate) fn print_banner(banner: &LimitBanner) {
    println!(
        "{}",
        format!(
            "Free trial limit reached: {}/{} chats used ({:.0}%), {} remaining on the {} plan",
            banner.used,
            banner.max,
            banner.progress_percent,
            banner.remaining,
            banner.subscription_type
        )
        .yellow()
        .bold()
    );
}

/// Print the upgrade call-to-action
pub(crate) fn print_upgrade_notice() {
    println!();
    println!("{}", "Upgrade to KabaddiGuru Premium".bold().yellow());
    println!("  You've used all the chats included in your free trial.");
    println!("  Premium unlocks unlimited questions, summaries and analytics.");
    println!();
}

/// Print quota details
pub(crate) fn print_quota(info: Option<&QuotaInfo>) {
    match info {
        None => println!("{}", "Sign in to see your chat allowance.".yellow()),
        Some(info) if info.is_admin => {
            println!("{}", "Admin account: no chat limit.".green());
        }
        Some(info) => {
            let remaining = info
                .remaining_chats
                .map(|r| r.to_string())
                .unwrap_or_else(|| "unlimited".to_string());
            let max = info
                .max_chats
                .map(|m| m.to_string())
                .unwrap_or_else(|| "unlimited".to_string());
            println!(
                "Plan: {}  Remaining chats: {}/{}",
                info.subscription_type.cyan(),
                remaining,
                max
            );
        }
    }
}

/// Read a secret from the terminal when it was not passed as an argument
pub(crate) fn prompt_secret(value: Option<String>, prompt: &str) -> crate::error::Result<String> {
    if let Some(value) = value {
        return Ok(value);
    }
    let mut rl = rustyline::DefaultEditor::new()?;
    Ok(rl.readline(prompt)?)
}
