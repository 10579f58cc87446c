//! Core domain enums shared by every stage.

mod status;

pub use status::{HookPhase, StageRole, StageState};
