//! Application layer: the components that drive a walkthrough.

pub mod coordinator;
pub mod gate;
pub mod interrupt;
pub mod narration_cache;
pub mod observers;
pub mod pacer;
pub mod progress;
pub mod sequencer;
pub mod session_machine;
pub mod synchronizer;
