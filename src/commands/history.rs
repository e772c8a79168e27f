use super::print_message;
use crate::chat::ChatThread;
use crate::cli::HistoryCommand;
use crate::config::Config;
use crate::error::Result;
use crate::state::AppState;
use colored::Colorize;
use prettytable::{format, Table};

/// Handle history commands
pub fn handle_history(config: Config, command: HistoryCommand) -> Result<()> {
    let state = AppState::open(config)?;
    // Offline: only the persisted session is needed to scope the thread list
    state.session.restore_on_startup();
    state.threads.reload_for_user();

    match command {
        HistoryCommand::List => {
            let threads = state.threads.threads();
            if threads.is_empty() {
                println!("{}", "No conversation history found.".yellow());
                return Ok(());
            }

            print_threads(&threads);
            println!(
                "Use {} to resume a conversation.",
                "kabaddiguru chat --resume <ID>".cyan()
            );
            println!();
        }
        HistoryCommand::Show { id, limit } => {
            let Some(messages) = state.threads.stored_messages(&id) else {
                println!("{}", format!("No stored messages for {}", id).yellow());
                return Ok(());
            };
            let skip = limit
                .map(|n| messages.len().saturating_sub(n))
                .unwrap_or(0);
            for message in &messages[skip..] {
                print_message(message);
            }
        }
    }

    Ok(())
}

/// Print threads as a table, most recent first
pub(crate) fn print_threads(threads: &[ChatThread]) {
    if threads.is_empty() {
        println!("{}", "No conversation history found.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "ID".bold(),
        "Title".bold(),
        "Last Message".bold()
    ]);

    for thread in threads {
        let title = if thread.title.chars().count() > 40 {
            format!("{}...", thread.title.chars().take(37).collect::<String>())
        } else {
            thread.title.clone()
        };
        let last = thread
            .last_message_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();

        table.add_row(prettytable::row![thread.id.cyan(), title, last]);
    }

    println!("\nConversation History:");
    table.printstd();
    println!();
}
