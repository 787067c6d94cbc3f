//! Tools module for the Jira tools server
//!
//! Issue and project operations behind the MCP tool surface.

pub mod issues;
pub mod projects;

pub use issues::*;
pub use projects::*;
