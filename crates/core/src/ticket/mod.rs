//! Ticketing system abstraction.
//!
//! This module provides a `TicketClient` trait for reading tickets, posting
//! notes and uploading artifacts, with a Redmine REST implementation.

mod client;
mod redmine;
mod types;

pub use client::TicketClient;
pub use redmine::RedmineClient;
pub use types::*;
