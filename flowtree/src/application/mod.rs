//! Application layer: session controller and event scripts
//!
//! This layer owns the mutable state and drives the pure domain functions.

pub mod error;
pub mod error_ext;
pub mod script;
pub mod session;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use script::{parse_script, replay, replay_strict, ReplayStep, ScriptEvent};
pub use session::{EditSession, IgnoreReason, Outcome, Session, DEFAULT_MAX_DEPTH};
