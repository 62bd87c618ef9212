//! The authenticated person and the configured CLI profiles.

use clap::Subcommand;
use serde_json::json;

use bcq_core::Result;

use super::text;
use crate::app::App;
use crate::output::Envelope;

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Show your Basecamp profile
    Show,

    /// List profiles defined in the config file
    #[command(visible_alias = "profiles")]
    List,
}

pub async fn handle_profile_command(app: &App, cmd: ProfileCommands) -> Result<Envelope> {
    match cmd {
        ProfileCommands::Show => {
            let profile = app.api.get("/my/profile.json").await?;
            let summary = match text(&profile, "name") {
                "" => "Your profile".to_string(),
                name => name.to_string(),
            };
            Ok(Envelope::new(profile, summary)
                .breadcrumb("timeline", "bcq timeline me", "View your activity"))
        }
        ProfileCommands::List => {
            let active = app.config.profile.clone();
            let profiles: Vec<_> = app
                .config
                .profiles
                .iter()
                .map(|name| json!({ "name": name, "active": Some(name) == active.as_ref() }))
                .collect();
            let summary = format!("{} profile(s)", profiles.len());
            Ok(Envelope::new(json!(profiles), summary).breadcrumb(
                "use",
                "bcq --profile <name> ...",
                "Run a command with another profile",
            ))
        }
    }
}
