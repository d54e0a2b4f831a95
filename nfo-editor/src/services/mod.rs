//! Service modules: scanning, task registry, batch engine, search, lookup mapping

pub mod batch_engine;
pub mod file_scanner;
pub mod lookup_mapper;
pub mod search;
pub mod task_store;

pub use batch_engine::{BatchEngine, EngineLimits};
pub use file_scanner::{FileScanner, ScanError};
pub use search::{MatchType, SearchHit, SearchOutcome};
pub use task_store::{CapacityError, TaskStore, TaskStoreLimits};
