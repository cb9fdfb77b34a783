//! Command handlers, one module per command group.

pub mod completions;
pub mod dataset;
pub mod init;
pub mod layer;
pub mod open;
pub mod page;
pub mod project;
pub mod view;

use std::path::Path;
use std::time::Duration;

use anyhow::bail;
use rusqlite::Connection;

use crate::output::{CliError, OutputMode, render_error};
use mapform_core::error::{ErrorCode, StoreError};
use mapform_core::lock::{SessionLock, StoreReadLock};
use mapform_core::{db, paths};

/// How long commands wait for another session to release the lock.
pub(crate) const LOCK_TIMEOUT: Duration = Duration::from_secs(3);

fn not_initialized(output: OutputMode) -> anyhow::Error {
    let code = ErrorCode::NotInitialized;
    let error = CliError {
        message: code.message().to_string(),
        hint: code.hint().map(str::to_string),
        code: Some(code.code().to_string()),
    };
    let _ = render_error(output, &error);
    anyhow::anyhow!("{}", code.message())
}

/// Open the store for a read-only command under a shared lock.
pub(crate) fn open_for_read(
    root: &Path,
    output: OutputMode,
) -> anyhow::Result<(Connection, StoreReadLock)> {
    if !paths::is_initialized(root) {
        return Err(not_initialized(output));
    }
    let lock = match StoreReadLock::acquire(&paths::session_lock_path(root), LOCK_TIMEOUT) {
        Ok(lock) => lock,
        Err(err) => {
            let error = CliError {
                message: err.to_string(),
                hint: err.hint().map(str::to_string),
                code: Some(err.code().code().to_string()),
            };
            let _ = render_error(output, &error);
            bail!("{err}");
        }
    };
    let conn = db::open_store(&paths::store_path(root))?;
    Ok((conn, lock))
}

/// Open the store for a mutating command under the exclusive session lock.
pub(crate) fn open_for_write(
    root: &Path,
    output: OutputMode,
) -> anyhow::Result<(Connection, SessionLock)> {
    if !paths::is_initialized(root) {
        return Err(not_initialized(output));
    }
    let lock = match SessionLock::acquire(&paths::session_lock_path(root), LOCK_TIMEOUT) {
        Ok(lock) => lock,
        Err(err) => {
            let error = CliError {
                message: err.to_string(),
                hint: err.hint().map(str::to_string),
                code: Some(err.code().code().to_string()),
            };
            let _ = render_error(output, &error);
            bail!("{err}");
        }
    };
    let conn = db::open_store(&paths::store_path(root))?;
    Ok((conn, lock))
}

/// Render a store rejection and convert it into a command failure.
pub(crate) fn fail_store(output: OutputMode, err: &StoreError) -> anyhow::Error {
    let _ = render_error(output, &CliError::from_store(err));
    anyhow::anyhow!("{err}")
}
