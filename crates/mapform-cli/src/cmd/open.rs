//! `mf open` — open the interactive board for one project.

use clap::Args;
use std::path::Path;

use crate::output::{CliError, OutputMode, render_error};
use mapform_core::error::StoreError;
use mapform_core::lock::SessionLock;
use mapform_core::model::ProjectId;
use mapform_core::{db, paths};

#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Project id to open.
    #[arg(long)]
    pub project: i64,
}

pub fn run_open(args: &OpenArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    if !paths::is_initialized(root) {
        let code = mapform_core::error::ErrorCode::NotInitialized;
        let error = CliError {
            message: code.message().to_string(),
            hint: code.hint().map(str::to_string),
            code: Some(code.code().to_string()),
        };
        render_error(output, &error)?;
        anyhow::bail!("{}", code.message());
    }

    // the board is an editing session: exclusive for its whole lifetime
    let _session = match SessionLock::acquire(&paths::session_lock_path(root), super::LOCK_TIMEOUT)
    {
        Ok(lock) => lock,
        Err(err) => {
            let error = CliError {
                message: err.to_string(),
                hint: err.hint().map(str::to_string),
                code: Some(err.code().code().to_string()),
            };
            render_error(output, &error)?;
            anyhow::bail!("{err}");
        }
    };

    // fail fast on a bad project id before touching the terminal
    let conn = db::open_store(&paths::store_path(root))?;
    let project_id = ProjectId(args.project);
    if mapform_core::db::query::get_project(&conn, project_id)?.is_none() {
        return Err(super::fail_store(
            output,
            &StoreError::ProjectNotFound(args.project),
        ));
    }
    drop(conn);

    crate::tui::board::run_board(root, project_id)
}
