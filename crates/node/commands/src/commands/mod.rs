//! The two run modes.

pub mod client;
pub mod server;
