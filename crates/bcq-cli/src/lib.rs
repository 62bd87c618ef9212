//! Basecamp command-line client.
//!
//! Every command resolves to an [`output::Envelope`]; `main` renders it as
//! JSON for agents and pipes or as styled text on a terminal.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod output;
