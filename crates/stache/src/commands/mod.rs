//! Command implementations for the stache CLI
//!
//! Each command module handles the CLI interface and delegates to
//! stache-env for the actual work.

pub mod resolve;
