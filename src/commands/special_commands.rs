//! Special commands parser for interactive chat
//!
//! Special commands manage the session instead of being sent to the
//! assistant:
//! - start a new thread, list and reopen stored threads
//! - summarise the current thread, rate the last answer
//! - show suggestions, the chat quota and the upgrade notice
//! - display help and exit
//!
//! Commands are prefixed with `/` and are case-insensitive.

use crate::api::FeedbackType;
use colored::Colorize;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq)]
pub enum SpecialCommand {
    /// Show a fresh greeting without an active thread
    NewChat,

    /// List stored threads
    ListThreads,

    /// Switch to a stored thread
    OpenThread(String),

    /// Summarise the active thread
    Summary,

    /// Rate the last answer
    Feedback {
        kind: FeedbackType,
        text: String,
    },

    /// Show suggested questions, optionally for one team
    Suggest(Option<String>),

    /// Show the upgrade notice
    Upgrade,

    /// Show the chat quota
    Quota,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent to the assistant.
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns [`CommandError`] when the input starts with `/` but is not a
/// valid command invocation.
///
/// # Examples
///
/// ```
/// use kabaddiguru::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/new").unwrap(), SpecialCommand::NewChat);
/// assert_eq!(parse_special_command("who won?").unwrap(), SpecialCommand::None);
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return Ok(SpecialCommand::None);
    }

    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };
    let command = command.to_lowercase();

    match command.as_str() {
        "/new" | "/reset" => Ok(SpecialCommand::NewChat),
        "/threads" | "/history" => Ok(SpecialCommand::ListThreads),
        "/open" | "/resume" => {
            if rest.is_empty() {
                Err(CommandError::MissingArgument {
                    command,
                    usage: "/open <thread-id>".to_string(),
                })
            } else {
                Ok(SpecialCommand::OpenThread(rest.to_string()))
            }
        }
        "/summary" => Ok(SpecialCommand::Summary),
        "/feedback" => {
            let (kind, text) = match rest.split_once(char::is_whitespace) {
                Some((kind, text)) => (kind, text.trim()),
                None => (rest, ""),
            };
            if kind.is_empty() {
                return Err(CommandError::MissingArgument {
                    command,
                    usage: "/feedback <up|down|suggestion> [text]".to_string(),
                });
            }
            let kind = FeedbackType::parse_str(kind).ok_or_else(|| {
                CommandError::UnsupportedArgument {
                    command: command.clone(),
                    arg: kind.to_string(),
                }
            })?;
            Ok(SpecialCommand::Feedback {
                kind,
                text: text.to_string(),
            })
        }
        "/suggest" | "/suggestions" => Ok(SpecialCommand::Suggest(
            Some(rest.to_string()).filter(|t| !t.is_empty()),
        )),
        "/upgrade" => Ok(SpecialCommand::Upgrade),
        "/quota" | "/status" => Ok(SpecialCommand::Quota),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/quit" | "/exit" => Ok(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(command)),
    }
}

/// Print the list of special commands
pub fn print_help() {
    println!("\n{}", "Chat commands:".bold());
    let rows = [
        ("/new", "Start a new conversation"),
        ("/threads", "List stored conversations"),
        ("/open <id>", "Reopen a stored conversation"),
        ("/summary", "Summarise the current conversation"),
        ("/feedback <up|down|suggestion> [text]", "Rate the last answer"),
        ("/suggest [team]", "Show suggested questions"),
        ("/quota", "Show your remaining chats"),
        ("/upgrade", "Show upgrade options"),
        ("/help", "Show this help"),
        ("/quit", "Leave the chat"),
    ];
    for (command, description) in rows {
        println!("  {:<40} {}", command.cyan(), description);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(
            parse_special_command("Top raiders of 2019").unwrap(),
            SpecialCommand::None
        );
    }

    #[test]
    fn test_commands_are_case_insensitive() {
        assert_eq!(parse_special_command("/NEW").unwrap(), SpecialCommand::NewChat);
        assert_eq!(parse_special_command("/Quit").unwrap(), SpecialCommand::Exit);
    }

    #[test]
    fn test_open_requires_id() {
        assert!(matches!(
            parse_special_command("/open"),
            Err(CommandError::MissingArgument { .. })
        ));
        assert_eq!(
            parse_special_command("/open 01HXYZ").unwrap(),
            SpecialCommand::OpenThread("01HXYZ".to_string())
        );
    }

    #[test]
    fn test_feedback_with_text() {
        assert_eq!(
            parse_special_command("/feedback down wrong season").unwrap(),
            SpecialCommand::Feedback {
                kind: FeedbackType::ThumbsDown,
                text: "wrong season".to_string()
            }
        );
        assert_eq!(
            parse_special_command("/feedback up").unwrap(),
            SpecialCommand::Feedback {
                kind: FeedbackType::ThumbsUp,
                text: String::new()
            }
        );
    }

    #[test]
    fn test_feedback_rejects_unknown_kind() {
        assert!(matches!(
            parse_special_command("/feedback meh"),
            Err(CommandError::UnsupportedArgument { .. })
        ));
        assert!(matches!(
            parse_special_command("/feedback"),
            Err(CommandError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_suggest_with_team() {
        assert_eq!(
            parse_special_command("/suggest Bengal Warriors").unwrap(),
            SpecialCommand::Suggest(Some("Bengal Warriors".to_string()))
        );
        assert_eq!(
            parse_special_command("/suggest").unwrap(),
            SpecialCommand::Suggest(None)
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            parse_special_command("/dance"),
            Err(CommandError::UnknownCommand("/dance".to_string()))
        );
    }
}
