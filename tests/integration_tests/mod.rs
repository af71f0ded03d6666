//! Integration tests module
//!
//! End-to-end tests that wire real clients, a real store and the scheduler
//! against one mock server standing in for YouTube, Twitch and Discord.

pub mod error_scenarios;
pub mod fixtures;
pub mod relay_test;
