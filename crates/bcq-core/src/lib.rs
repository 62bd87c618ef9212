//! bcq core library
//!
//! Error taxonomy, identifier resolution and Basecamp API access shared by
//! the `bcq` command-line client.

pub mod api;
pub mod completion;
pub mod dateparse;
pub mod dock;
pub mod error;
pub mod ids;
pub mod models;
pub mod names;
pub mod pagination;
pub mod probe;
pub mod urlarg;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use error::{BcqError, ErrorCode, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
