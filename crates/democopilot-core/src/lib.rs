//! Demo Copilot Core — shared abstractions.
//!
//! This crate defines the data types and collaborator ports that the
//! orchestration engine and its hosts depend on. It contains no
//! infrastructure code: browser automation, speech synthesis and the
//! language model are only described here as traits.

pub mod action;
pub mod browser;
pub mod clock;
pub mod error;
pub mod language_model;
pub mod observer;
pub mod progress;
pub mod provider;
pub mod speech;
pub mod state;
