//! Shared utility functions.

use tokio::task::spawn_blocking;

use crate::{Error, Result};

/// Run synchronous git or `gh` work off the async workers.
///
/// A panic inside `f` surfaces as `Error::TaskJoin` instead of tearing down
/// the logic thread.
pub async fn blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    spawn_blocking(f)
        .await
        .map_err(|e| Error::TaskJoin(e.to_string()))?
}
