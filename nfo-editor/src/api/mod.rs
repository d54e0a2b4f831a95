//! HTTP API handlers
//!
//! Thin JSON layer over the core. Blocking work (file I/O, the batch fan-out)
//! runs on tokio's blocking pool.

pub mod batch;
pub mod health;
pub mod lookup;
pub mod nfo;
pub mod search;

pub use batch::batch_routes;
pub use health::health_routes;
pub use lookup::lookup_routes;
pub use nfo::nfo_routes;
pub use search::search_routes;

use std::path::Path;

use crate::error::{ApiError, ApiResult};
use crate::services::file_scanner::ensure_within;
use crate::AppState;

/// Reject paths outside the configured browse root
pub(crate) fn guard_path(state: &AppState, path: &Path) -> ApiResult<()> {
    if let Some(root) = &state.browse_root {
        ensure_within(path, root)?;
    }
    Ok(())
}

/// Run blocking work off the async runtime
pub(crate) async fn blocking<T, F>(work: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(format!("Blocking task failed: {}", e)))?
}
