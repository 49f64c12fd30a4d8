use clap::Subcommand;
use serde_json::json;

use crate::auth::AuthService;
use crate::cli::config as cli_config;
use crate::cli::utils::{output_error, output_success, prompt};
use crate::cli::{AdminContext, OutputFormat};
use crate::store::with_timeout;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Sign in with email and password")]
    Login {
        #[arg(help = "Admin email")]
        email: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Sign out and forget the saved session")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let context = AdminContext::connect()?;

    match cmd {
        AuthCommands::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt("Password: ")?,
            };

            let session = with_timeout(context.timeout, context.auth.sign_in_with_password(&email, &password)).await?;
            cli_config::save_session(&session)?;

            output_success(
                &output_format,
                &format!("Signed in as {}", session.email().unwrap_or(&email)),
                Some(json!({ "email": session.email(), "expires_at": session.expires_at })),
            )
        }
        AuthCommands::Logout => {
            // Forget the local session even when the remote sign-out fails
            let remote = with_timeout(context.timeout, context.auth.sign_out()).await;
            cli_config::clear_session()?;
            if let Err(e) = remote {
                tracing::warn!("remote sign-out failed: {}", e);
            }
            output_success(&output_format, "Signed out", None)
        }
        AuthCommands::Status => match context.require_session().await {
            Ok(session) => output_success(
                &output_format,
                &format!("Signed in as {}", session.email().unwrap_or("(unknown user)")),
                Some(json!({
                    "authenticated": true,
                    "email": session.email(),
                    "expires_at": session.expires_at
                })),
            ),
            Err(_) => output_error(&output_format, "Not signed in", Some("AUTH_REQUIRED")),
        },
    }
}
