//! Analytics and suggestion commands

use crate::api::ApiClient;
use crate::cli::AnalyticsCommand;
use crate::config::Config;
use crate::error::Result;
use colored::Colorize;
use prettytable::{format, Table};
use serde_json::Value;

/// Handle `analytics` subcommands
pub async fn handle_analytics(config: Config, command: AnalyticsCommand) -> Result<()> {
    let api = ApiClient::from_config(&config)?;

    match command {
        AnalyticsCommand::Teams => {
            let teams = api.teams().await?;
            print_list("Teams", &teams);
        }
        AnalyticsCommand::Matches { team1, team2 } => {
            let matches = api.matches(&team1, &team2).await?;
            if matches.is_empty() {
                println!(
                    "{}",
                    format!("No matches found between {} and {}.", team1, team2).yellow()
                );
                return Ok(());
            }

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
            table.add_row(prettytable::row![
                "Match".bold(),
                "Season".bold(),
                "Venue".bold()
            ]);
            for m in matches {
                table.add_row(prettytable::row![m.match_number, m.season, m.venue]);
            }
            println!("\n{} vs {}:", team1.cyan(), team2.cyan());
            table.printstd();
            println!();
        }
        AnalyticsCommand::Players { term } => {
            let players = api.search_players(&term).await?;
            if players.is_empty() {
                println!("{}", "No players found.".yellow());
            } else {
                print_list("Players", &players);
            }
        }
        AnalyticsCommand::MatchSummary {
            team1,
            team2,
            match_number,
        } => {
            let summary = api.match_summary(&team1, &team2, match_number).await?;
            print_summary(&summary)?;
        }
        AnalyticsCommand::PlayerSummary { player, filter } => {
            let summary = api.player_summary(&player, &filter).await?;
            print_summary(&summary)?;
        }
    }

    Ok(())
}

/// Handle `suggestions`
pub async fn show_suggestions(config: Config, team: Option<String>) -> Result<()> {
    let api = ApiClient::from_config(&config)?;
    let suggestions = api.suggestions(team.as_deref()).await?;
    print_list("Try asking", &suggestions);
    Ok(())
}

/// Print a titled bullet list
pub(crate) fn print_list(title: &str, items: &[String]) {
    println!("\n{}:", title.bold());
    for item in items {
        println!("  • {}", item);
    }
    println!();
}

fn print_summary(summary: &Value) -> Result<()> {
    match summary {
        Value::String(text) => println!("\n{}\n", text),
        other => println!("\n{}\n", serde_json::to_string_pretty(other)?),
    }
    Ok(())
}
