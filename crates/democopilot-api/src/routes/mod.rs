//! HTTP routes.

pub mod demo;
pub mod events;
pub mod health;
