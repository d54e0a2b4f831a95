//! Data models for the NFO editor
//!
//! - Record: one parsed sidecar document
//! - BatchTask: one batch operation's configuration and progress

pub mod batch_task;
pub mod record;

pub use batch_task::{
    BatchField, BatchMode, BatchTask, PreviewEntry, TaskSnapshot, TaskSpec, TaskStatus,
    TaskStatusReport, UnknownLiteral,
};
pub use record::{Actor, ExtraValue, Kind, Record};
