//! The Elm Architecture (TEA) implementation of the commit workflow.
//!
//! - `Session`: pure workflow state
//! - `Message`: inputs to the update function
//! - `Command`: outputs (side effects) from the update function
//! - `update`: pure function that transforms state

pub mod command;
pub mod message;
pub mod model;
pub mod update;

pub use command::{Call, CallKind, Command};
pub use message::{CallResult, Message};
pub use model::{CommitType, Completion, Phase, Session};
pub use update::{init, update};
