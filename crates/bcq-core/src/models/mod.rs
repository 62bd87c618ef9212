//! Basecamp resources, decoded from API JSON.
//!
//! Only the fields bcq reads are modeled; everything else stays in the
//! raw `serde_json::Value` that commands pass through to output.

pub mod card;
pub mod person;
pub mod project;
pub mod todo;

pub use card::*;
pub use person::*;
pub use project::*;
pub use todo::*;
