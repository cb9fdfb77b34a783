//! `mf project` — create, list, rename, and delete projects.

use clap::{Args, Subcommand};
use serde_json::json;
use std::io::Write;
use std::path::Path;

use crate::output::{OutputMode, Renderable, pretty_kv, pretty_rule, render, render_item,
    render_list, render_success};
use mapform_core::config;
use mapform_core::db::{query, store};
use mapform_core::model::{Project, ProjectId};

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Create a project and seed its first page.
    Create(CreateArgs),
    /// List projects.
    List,
    /// Rename a project.
    Rename(RenameArgs),
    /// Delete a project and everything in it.
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Project name.
    #[arg(long)]
    pub name: String,

    /// Title of the seeded first page.
    #[arg(long, default_value = "Untitled")]
    pub first_page_title: String,
}

#[derive(Args, Debug)]
pub struct RenameArgs {
    /// Project id.
    pub id: i64,

    /// New name.
    #[arg(long)]
    pub name: String,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Project id.
    pub id: i64,
}

struct ProjectRow(Project);

impl Renderable for ProjectRow {
    fn render_human(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "project {}", self.0.id)?;
        pretty_kv(w, "name", &self.0.name)?;
        pretty_rule(w)
    }

    fn render_json(&self, w: &mut dyn Write) -> std::io::Result<()> {
        serde_json::to_writer(w, &self.0).map_err(std::io::Error::other)
    }

    fn render_table(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "{}  {}", self.0.id, self.0.name)
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "NAME"]
    }
}

pub fn run(command: &ProjectCommand, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    match command {
        ProjectCommand::Create(args) => run_create(args, output, root),
        ProjectCommand::List => run_list(output, root),
        ProjectCommand::Rename(args) => run_rename(args, output, root),
        ProjectCommand::Delete(args) => run_delete(args, output, root),
    }
}

fn run_create(args: &CreateArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (conn, _lock) = super::open_for_write(root, output)?;
    let map = config::load_project_config(root)?.map;

    let project = match store::create_project(&conn, &args.name) {
        Ok(project) => project,
        Err(err) => return Err(super::fail_store(output, &err)),
    };
    // every project starts with one page so the last-page guard always holds
    let first_page = match store::create_page(
        &conn,
        project.id,
        &args.first_page_title,
        map.default_center_lng,
        map.default_center_lat,
        map.default_zoom,
    ) {
        Ok(page) => page,
        Err(err) => return Err(super::fail_store(output, &err)),
    };

    let payload = json!({
        "id": project.id,
        "name": project.name,
        "first_page_id": first_page.id,
    });
    render(output, &payload, |value, w| {
        writeln!(
            w,
            "Created project {} '{}' (first page {})",
            value["id"], args.name, value["first_page_id"]
        )
    })
}

fn run_list(output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (conn, _lock) = super::open_for_read(root, output)?;
    let rows: Vec<ProjectRow> = query::list_projects(&conn)?
        .into_iter()
        .map(ProjectRow)
        .collect();
    render_list(&rows, output)?;
    Ok(())
}

fn run_rename(args: &RenameArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (conn, _lock) = super::open_for_write(root, output)?;
    match store::rename_project(&conn, ProjectId(args.id), &args.name) {
        Ok(project) => {
            render_item(&ProjectRow(project), output)?;
            Ok(())
        }
        Err(err) => Err(super::fail_store(output, &err)),
    }
}

fn run_delete(args: &DeleteArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (conn, _lock) = super::open_for_write(root, output)?;
    match store::delete_project(&conn, ProjectId(args.id)) {
        Ok(()) => render_success(output, &format!("Deleted project {}", args.id)),
        Err(err) => Err(super::fail_store(output, &err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_args_seed_page_default() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: CreateArgs,
        }
        let w = Wrapper::parse_from(["test", "--name", "Demo"]);
        assert_eq!(w.args.name, "Demo");
        assert_eq!(w.args.first_page_title, "Untitled");
    }
}
