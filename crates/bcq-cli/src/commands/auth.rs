//! Authentication status. Tokens are obtained outside bcq; these commands
//! only report what is configured.

use clap::Subcommand;
use secrecy::ExposeSecret;
use serde_json::json;

use bcq_core::{BcqError, Result};

use crate::app::App;
use crate::config::mask_token;
use crate::output::Envelope;

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Show whether a token is configured and who it belongs to
    Status,

    /// Print the configured access token
    Token,
}

pub async fn handle_auth_command(app: &App, cmd: AuthCommands) -> Result<Envelope> {
    match cmd {
        AuthCommands::Status => status(app).await,
        AuthCommands::Token => token(app),
    }
}

async fn status(app: &App) -> Result<Envelope> {
    let Some(token) = &app.config.token else {
        return Ok(Envelope::new(
            json!({ "authenticated": false }),
            "Not authenticated",
        )
        .breadcrumb(
            "login",
            "export BASECAMP_TOKEN=<token>",
            "Provide an access token",
        ));
    };

    // Identity is a nicety; a failed lookup still reports the token
    let identity = match app.names.me().await {
        Ok(me) => Some(me.clone()),
        Err(e) => {
            tracing::debug!(error = %e, "identity lookup failed");
            None
        }
    };

    let source = app
        .config
        .token_source
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();
    let summary = match &identity {
        Some(me) => format!("Authenticated as {} (token from {})", me.name, source),
        None => format!("Token configured (from {})", source),
    };

    Ok(Envelope::new(
        json!({
            "authenticated": true,
            "token_source": source,
            "token": mask_token(token.expose_secret()),
            "account_id": app.config.account_id,
            "person": identity,
        }),
        summary,
    )
    .breadcrumb("profile", "bcq profile show", "Show your profile"))
}

fn token(app: &App) -> Result<Envelope> {
    let token = app.config.token.as_ref().ok_or_else(|| BcqError::auth("Not authenticated"))?;
    Ok(Envelope::new(
        json!({ "token": token.expose_secret() }),
        "Access token",
    ))
}
