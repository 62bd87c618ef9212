//! Argument tree and dispatch.

use clap::{Parser, Subcommand};

use bcq_core::Result;

use crate::app::App;
use crate::commands::{
    auth::{handle_auth_command, AuthCommands},
    campfire::{handle_campfire_command, CampfireArgs},
    cards::{handle_cards_command, CardsCommands},
    config::{handle_config_command, ConfigCommands},
    events::{handle_events_command, EventsArgs},
    files::{handle_files_command, FilesCommands},
    lineup::{handle_lineup_command, LineupCommands},
    messagetypes::{handle_messagetypes_command, MessagetypesCommands},
    profile::{handle_profile_command, ProfileCommands},
    projects::{handle_projects_command, ProjectsCommands},
    timeline::{handle_timeline_command, TimelineArgs},
    todos::{self, handle_todos_command, CreateArgs, TodosCommands},
};
use crate::output::Envelope;

#[derive(Parser, Debug)]
#[command(name = "bcq")]
#[command(version, about = "Command-line client for Basecamp", long_about = None)]
pub struct Cli {
    /// Configuration profile to use
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Basecamp account ID (overrides profile and env)
    #[arg(long, global = true)]
    pub account: Option<String>,

    /// Project ID, name or URL
    #[arg(long, short = 'p', visible_alias = "in", global = true)]
    pub project: Option<String>,

    /// API base URL
    #[arg(long, global = true, hide = true)]
    pub base_url: Option<String>,

    /// Print the JSON envelope
    #[arg(long, global = true)]
    pub json: bool,

    /// JSON output for agents and scripts
    #[arg(long, global = true)]
    pub agent: bool,

    /// Debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn wants_json(&self) -> bool {
        self.json || self.agent
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Campfire chat
    #[command(visible_alias = "chat", args_conflicts_with_subcommands = true)]
    Campfire(CampfireArgs),

    /// Card tables
    #[command(subcommand)]
    Cards(CardsCommands),

    /// Todos
    #[command(subcommand)]
    Todos(TodosCommands),

    /// Create a todo
    Todo(CreateArgs),

    /// Complete todos
    Done {
        /// Todo IDs or URLs
        ids: Vec<String>,
    },

    /// Reopen completed todos
    Reopen {
        /// Todo IDs or URLs
        ids: Vec<String>,
    },

    /// Docs & Files
    #[command(subcommand, visible_aliases = ["vaults", "docs", "uploads"])]
    Files(FilesCommands),

    /// Audit trail of a recording
    Events(EventsArgs),

    /// Lineup markers
    #[command(subcommand)]
    Lineup(LineupCommands),

    /// Message types
    #[command(subcommand)]
    Messagetypes(MessagetypesCommands),

    /// Projects
    #[command(subcommand)]
    Projects(ProjectsCommands),

    /// Activity timeline
    Timeline(TimelineArgs),

    /// Authentication status
    #[command(subcommand)]
    Auth(AuthCommands),

    /// Your profile and the configured CLI profiles
    #[command(subcommand)]
    Profile(ProfileCommands),

    /// Effective CLI configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Run one command against an application context.
pub async fn run(app: &App, command: Commands) -> Result<Envelope> {
    match command {
        Commands::Campfire(args) => handle_campfire_command(app, args).await,
        Commands::Cards(cmd) => handle_cards_command(app, cmd).await,
        Commands::Todos(cmd) => handle_todos_command(app, cmd).await,
        Commands::Todo(args) => todos::create_todo(app, &args).await,
        Commands::Done { ids } => todos::complete_todos(app, &ids).await,
        Commands::Reopen { ids } => todos::reopen_todos(app, &ids).await,
        Commands::Files(cmd) => handle_files_command(app, cmd).await,
        Commands::Events(args) => handle_events_command(app, args).await,
        Commands::Lineup(cmd) => handle_lineup_command(app, cmd).await,
        Commands::Messagetypes(cmd) => handle_messagetypes_command(app, cmd).await,
        Commands::Projects(cmd) => handle_projects_command(app, cmd).await,
        Commands::Timeline(args) => handle_timeline_command(app, args).await,
        Commands::Auth(cmd) => handle_auth_command(app, cmd).await,
        Commands::Profile(cmd) => handle_profile_command(app, cmd).await,
        Commands::Config(cmd) => handle_config_command(app, cmd),
    }
}
