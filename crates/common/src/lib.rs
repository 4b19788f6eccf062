//! Shared types for the gradebook workspace
//!
//! Holds the redacting `Secret` wrapper used for passwords and the
//! configuration error type shared by the library crates and the CLI.

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
