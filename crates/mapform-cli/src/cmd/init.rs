//! `mf init` — initialize a workspace in the current directory.

use clap::Args;
use serde_json::json;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::output::{CliError, OutputMode, pretty_kv, render, render_error};
use mapform_core::{config, db, paths};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Workspace name. Defaults to the directory name.
    #[arg(long)]
    pub name: Option<String>,
}

pub fn run_init(args: &InitArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    if paths::is_initialized(root) {
        let error = CliError::new("workspace already initialized");
        render_error(output, &error)?;
        anyhow::bail!("workspace already initialized");
    }

    let name = args.name.clone().unwrap_or_else(|| {
        root.file_name()
            .map_or_else(|| "workspace".to_string(), |n| n.to_string_lossy().into_owned())
    });

    let conn = db::open_store(&paths::store_path(root))?;
    let workspace = match mapform_core::db::store::init_workspace(&conn, &name) {
        Ok(workspace) => workspace,
        Err(err) => return Err(super::fail_store(output, &err)),
    };
    config::write_default_project_config(root)?;

    info!(workspace = %workspace.id, "initialized workspace '{name}'");

    let payload = json!({
        "workspace_id": workspace.id,
        "name": workspace.name,
        "root": root.display().to_string(),
    });
    render(output, &payload, |value, w| {
        writeln!(w, "Initialized mapform workspace")?;
        pretty_kv(w, "name", value["name"].as_str().unwrap_or_default())?;
        pretty_kv(w, "store", paths::store_path(root).display().to_string())
    })
}
