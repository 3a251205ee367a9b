//! Demo Copilot — walkthrough orchestration.
//!
//! Drives a scripted product walkthrough: narration is spoken while the
//! matching browser actions run, and the session can be paused, resumed,
//! redirected or interrupted by customer questions at any time.

pub mod application;
pub mod config;
pub mod domain;
