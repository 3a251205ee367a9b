//! Domain layer: scripts, the session aggregate and the value types a
//! walkthrough produces.

pub mod commands;
pub mod narration;
pub mod question;
pub mod script;
pub mod session;
