//! Interactive chat command
//!
//! A readline loop over [`AppState`]: plain input is sent to the
//! assistant, `/`-prefixed input is handled by
//! [`special_commands`](super::special_commands).

use super::special_commands::{parse_special_command, print_help, SpecialCommand};
use super::{print_banner, print_message, print_quota, print_upgrade_notice};
use crate::chat::message::LOADING_TEXT;
use crate::chat::{FeedbackOutcome, SendFailure, SendOutcome, SummaryOutcome};
use crate::config::Config;
use crate::error::Result;
use crate::state::AppState;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Start the interactive chat
///
/// # Arguments
///
/// * `config` - Loaded configuration
/// * `resume` - Optional id of a stored thread to reopen
pub async fn run_chat(config: Config, resume: Option<String>) -> Result<()> {
    let state = AppState::open(config)?;
    let session = state.start().await;

    print_welcome(&state, session.user.as_ref().map(|u| u.display_name()));

    let resumed = resume.and_then(|id| {
        tracing::debug!(thread_id = %id, "Resuming thread");
        let messages = state.threads.load_thread(&id);
        if messages.is_none() {
            println!("{}", format!("No conversation with id {}.", id).yellow());
        }
        messages
    });
    for message in resumed.unwrap_or_else(|| state.threads.messages()) {
        print_message(&message);
    }
    if let Some(banner) = state.limit_banner() {
        print_banner(&banner);
    }

    let mut rl = DefaultEditor::new()?;

    loop {
        let prompt = format!("{} ", "kabaddi>".green().bold());
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(trimmed)?;

                let command = match parse_special_command(trimmed) {
                    Ok(command) => command,
                    Err(e) => {
                        eprintln!("{}\n", e.to_string().red());
                        continue;
                    }
                };

                match command {
                    SpecialCommand::None => send(&state, trimmed).await,
                    SpecialCommand::Exit => break,
                    other => handle_special(&state, other).await,
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                tracing::error!("Readline error: {:?}", err);
                break;
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn print_welcome(state: &AppState, name: Option<&str>) {
    println!();
    println!("{}", "KabaddiGuru".bold().green());
    match name {
        Some(name) => println!("Signed in as {}", name.cyan()),
        None => println!(
            "{}",
            "Not signed in. Use `kabaddiguru auth signin` to track your chats.".yellow()
        ),
    }
    print_quota(state.quota_info().as_ref());
    println!("Type {} for commands.\n", "/help".cyan());
}

async fn send(state: &AppState, text: &str) {
    if state.overlay_active() {
        state.gate.click_overlay(state.quota_info().as_ref());
        print_upgrade_notice();
        state.gate.close_modal();
        return;
    }

    println!("{}", LOADING_TEXT.dimmed());
    match state.threads.send_user_message(text).await {
        SendOutcome::Ignored => {}
        SendOutcome::Busy => println!("{}", "Still waiting for the previous answer.".yellow()),
        SendOutcome::Gated => {}
        SendOutcome::Answered {
            reply,
            started_new_thread,
            thread_id,
        } => {
            if started_new_thread {
                if let Some(id) = thread_id {
                    println!("{}", format!("New conversation {}", id).dimmed());
                }
            }
            print_message(&reply);
        }
        SendOutcome::Failed { reply, reason, .. } => {
            print_message(&reply);
            if let SendFailure::Network(notice) = reason {
                eprintln!("{}", notice.red());
            }
        }
    }

    if state.gate.is_modal_visible() {
        print_upgrade_notice();
        state.gate.close_modal();
    }
    if let Some(banner) = state.limit_banner() {
        print_banner(&banner);
    }
    println!();
}

async fn handle_special(state: &AppState, command: SpecialCommand) {
    match command {
        SpecialCommand::NewChat => {
            state.threads.start_new_chat();
            for message in state.threads.messages() {
                print_message(&message);
            }
        }
        SpecialCommand::ListThreads => super::history::print_threads(&state.threads.threads()),
        SpecialCommand::OpenThread(id) => match state.threads.load_thread(&id) {
            Some(messages) => {
                for message in messages {
                    print_message(&message);
                }
            }
            None => println!("{}", format!("No conversation with id {}.", id).yellow()),
        },
        SpecialCommand::Summary => match state.threads.generate_summary().await {
            SummaryOutcome::NoThread => {
                println!("{}", "Ask a question first, then summarise.".yellow())
            }
            SummaryOutcome::Busy => println!("{}", "A summary is already on its way.".yellow()),
            SummaryOutcome::LimitReached => {
                print_upgrade_notice();
                state.gate.close_modal();
            }
            SummaryOutcome::Generated(summary) => {
                println!("\n{}", "Conversation summary".bold());
                println!("{}", summary.summary);
                let stats = &summary.session_stats;
                println!(
                    "{}",
                    format!(
                        "{} questions, {} tokens",
                        stats.total_questions, stats.total_tokens
                    )
                    .dimmed()
                );
                println!();
            }
            SummaryOutcome::Failed(reason) => eprintln!("{}", reason.red()),
        },
        SpecialCommand::Feedback { kind, text } => {
            let Some(answer) = state.threads.last_answer() else {
                println!("{}", "There is no answer to rate yet.".yellow());
                return;
            };
            match state.threads.submit_feedback(&answer.id, kind, &text).await {
                FeedbackOutcome::Submitted => println!("{}", "Thanks for the feedback!".green()),
                FeedbackOutcome::AlreadySubmitted(previous) => println!(
                    "{}",
                    format!("You already rated this answer ({}).", previous).yellow()
                ),
                FeedbackOutcome::UnknownMessage => {
                    println!("{}", "That answer can't be rated.".yellow())
                }
                FeedbackOutcome::Failed(reason) => eprintln!("{}", reason.red()),
            }
        }
        SpecialCommand::Suggest(team) => {
            match state.api.suggestions(team.as_deref()).await {
                Ok(suggestions) => super::analytics::print_list("Try asking", &suggestions),
                Err(e) => eprintln!("{}", crate::error::user_message(&e).red()),
            }
        }
        SpecialCommand::Upgrade => print_upgrade_notice(),
        SpecialCommand::Quota => {
            state.refresh_quota().await;
            print_quota(state.quota_info().as_ref());
            if let Some(banner) = state.limit_banner() {
                print_banner(&banner);
            }
            state.gate.close_modal();
        }
        SpecialCommand::Help => print_help(),
        SpecialCommand::Exit | SpecialCommand::None => {}
    }
}
