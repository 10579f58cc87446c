//! Tracing setup and timing helpers.

mod subscriber;
mod timer;

pub use subscriber::init_tracing;
pub use timer::{RunTimer, RunTiming};
