//! CLI command implementations.

pub mod auth;
pub mod config;
pub mod image;
pub mod search;
pub mod theme;
