//! Authentication commands

use super::{print_banner, print_quota, prompt_secret};
use crate::cli::AuthCommand;
use crate::config::Config;
use crate::error::{user_message, Result};
use crate::session::User;
use crate::state::AppState;
use colored::Colorize;

/// Handle `auth` subcommands
pub async fn handle_auth(config: Config, command: AuthCommand) -> Result<()> {
    let state = AppState::open(config)?;

    match command {
        AuthCommand::Signin { email, password } => {
            let password = prompt_secret(password, "Password: ")?;
            match state.signin(&email, &password).await {
                Ok(user) => signed_in(&state, &user),
                Err(e) => eprintln!("{}", user_message(&e).red()),
            }
        }
        AuthCommand::Signup {
            name,
            email,
            password,
        } => {
            let password = prompt_secret(password, "Choose a password: ")?;
            match state.signup(&name, &email, &password).await {
                Ok(user) => signed_in(&state, &user),
                Err(e) => eprintln!("{}", user_message(&e).red()),
            }
        }
        AuthCommand::Logout => {
            state.logout()?;
            println!("{}", "Signed out.".green());
        }
        AuthCommand::Status => {
            let session = state.start().await;
            match &session.user {
                Some(user) => {
                    println!("Signed in as {} <{}>", user.display_name().cyan(), user.email);
                    if let Some(plan) = &user.subscription_type {
                        println!("Subscription: {}", plan);
                    }
                }
                None => println!("{}", "Not signed in.".yellow()),
            }
            if session.is_authenticated() {
                print_quota(state.quota_info().as_ref());
                if let Some(banner) = state.limit_banner() {
                    print_banner(&banner);
                }
            }
        }
        AuthCommand::Forgot { email } => match state.forgot_password(&email).await {
            Ok(token) => {
                println!(
                    "{}",
                    "If that account exists, a reset link is on its way.".green()
                );
                if let Some(token) = token {
                    println!("Reset token: {}", token.cyan());
                    println!(
                        "Use {} to choose a new password.",
                        "kabaddiguru auth reset --email <EMAIL> --token <TOKEN>".cyan()
                    );
                }
            }
            Err(e) => eprintln!("{}", user_message(&e).red()),
        },
        AuthCommand::Reset {
            email,
            token,
            password,
        } => {
            let password = prompt_secret(password, "New password: ")?;
            match state.reset_password(&email, &token, &password).await {
                Ok(()) => println!(
                    "{}",
                    "Password updated. Sign in with your new password.".green()
                ),
                Err(e) => eprintln!("{}", user_message(&e).red()),
            }
        }
    }

    Ok(())
}

fn signed_in(state: &AppState, user: &User) {
    tracing::info!(user_id = ?user.user_id, "Signed in");
    println!("{}", format!("Welcome, {}!", user.display_name()).green());
    print_quota(state.quota_info().as_ref());
    if let Some(banner) = state.limit_banner() {
        print_banner(&banner);
    }
}
