use anyhow::{Context, Result};
use tokio::runtime::RuntimeFlavor;

/// Runs an async HTTP call to completion from synchronous code.
///
/// Reuses the ambient tokio runtime when one exists, otherwise spins up a
/// current-thread runtime for the call. Worker threads of the TUI loader and
/// the CLI commands both come through here. Must not be called from inside a
/// current-thread runtime.
pub fn block_on<F, T>(fut: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| handle.block_on(fut))
        }
        _ => {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("Failed to create tokio runtime")?;
            rt.block_on(fut)
        }
    }
}
