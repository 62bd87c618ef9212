//! Inspecting the effective configuration.

use clap::Subcommand;
use secrecy::ExposeSecret;
use serde_json::json;

use bcq_core::{BcqError, Result};

use crate::app::App;
use crate::config::{config_path, mask_token};
use crate::output::Envelope;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration (token masked)
    Show,

    /// Print the config file path
    Path,
}

pub fn handle_config_command(app: &App, cmd: ConfigCommands) -> Result<Envelope> {
    match cmd {
        ConfigCommands::Show => {
            let config = &app.config;
            Ok(Envelope::new(
                json!({
                    "profile": config.profile,
                    "base_url": config.base_url,
                    "account_id": config.account_id,
                    "project_id": app.project.as_ref().or(config.project_id.as_ref()),
                    "todolist_id": config.todolist_id,
                    "token": config.token.as_ref().map(|t| mask_token(t.expose_secret())),
                    "token_source": config.token_source.as_ref().map(ToString::to_string),
                }),
                match &config.profile {
                    Some(name) => format!("Configuration (profile '{}')", name),
                    None => "Configuration".to_string(),
                },
            )
            .breadcrumb("path", "bcq config path", "Show config file location"))
        }
        ConfigCommands::Path => {
            let path = config_path().map_err(|e| BcqError::Configuration(e.to_string()))?;
            let exists = path.exists();
            Ok(Envelope::new(
                json!({ "path": path.display().to_string(), "exists": exists }),
                path.display().to_string(),
            ))
        }
    }
}
