//! nfo-editor library interface
//!
//! Exposes the codec, validator, batch engine and HTTP router for the binary
//! and for integration tests.

pub mod api;
pub mod codec;
pub mod error;
pub mod models;
pub mod services;
pub mod validation;

pub use crate::error::{ApiError, ApiResult, BatchError};

use axum::Router;
use chrono::{DateTime, Utc};
use nfo_common::config::TomlConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::services::{BatchEngine, EngineLimits, TaskStore, TaskStoreLimits};

/// Default number of recent errors in status reports
pub const DEFAULT_ERROR_TAIL: usize = 10;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Batch engine (owns the worker pool)
    pub engine: Arc<BatchEngine>,
    /// Task registry, shared with the engine
    pub tasks: Arc<TaskStore>,
    /// Every requested path must resolve inside this directory, when set
    pub browse_root: Option<PathBuf>,
    /// Recent errors included in status reports
    pub error_tail: usize,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last background error for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(engine: Arc<BatchEngine>) -> Self {
        Self {
            tasks: Arc::clone(engine.store()),
            engine,
            browse_root: None,
            error_tail: DEFAULT_ERROR_TAIL,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Build store, engine and state from bootstrap configuration
    pub fn from_config(config: &TomlConfig) -> Result<Self, BatchError> {
        let store = Arc::new(TaskStore::with_limits(TaskStoreLimits::from(&config.batch)));
        let engine = Arc::new(BatchEngine::with_limits(
            store,
            EngineLimits::from(&config.batch),
        )?);

        let mut state = Self::new(engine);
        state.browse_root = config.browse_root.clone();
        state.error_tail = config.batch.error_tail;
        Ok(state)
    }

    pub fn with_browse_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.browse_root = Some(root.into());
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::nfo_routes())
        .merge(api::batch_routes())
        .merge(api::search_routes())
        .merge(api::lookup_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
