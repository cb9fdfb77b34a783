//! `mf view` — manage a project's ordered views.

use clap::{Args, Subcommand};
use std::io::Write;
use std::path::Path;

use crate::output::{OutputMode, Renderable, pretty_kv, pretty_rule, render_item, render_list,
    render_success};
use mapform_core::db::{query, store};
use mapform_core::error::StoreError;
use mapform_core::model::{DatasetId, ProjectId, View, ViewEdit, ViewId, ViewKind};
use mapform_core::order;

#[derive(Subcommand, Debug)]
pub enum ViewCommand {
    /// Append a view to a project.
    Add(AddArgs),
    /// List a project's views in collection order.
    List(ListArgs),
    /// Rename a view.
    Rename(RenameArgs),
    /// Move a view to a new index in its project.
    Move(MoveArgs),
    /// Delete a view.
    Remove(RemoveArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Project id.
    #[arg(long)]
    pub project: i64,

    /// View name.
    #[arg(long)]
    pub name: String,

    /// View kind: map or table.
    #[arg(long, default_value = "map")]
    pub kind: ViewKind,

    /// Dataset to bind, if any.
    #[arg(long)]
    pub dataset: Option<i64>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Project id.
    #[arg(long)]
    pub project: i64,
}

#[derive(Args, Debug)]
pub struct RenameArgs {
    /// View id.
    pub id: i64,

    /// New name.
    #[arg(long)]
    pub name: String,
}

#[derive(Args, Debug)]
pub struct MoveArgs {
    /// View id.
    pub id: i64,

    /// Target index (0-based) within the project's view order.
    #[arg(long)]
    pub to: usize,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// View id.
    pub id: i64,
}

struct ViewRow(View);

impl Renderable for ViewRow {
    fn render_human(&self, w: &mut dyn Write) -> std::io::Result<()> {
        let view = &self.0;
        writeln!(w, "view {} (position {})", view.id, view.position)?;
        pretty_kv(w, "name", &view.name)?;
        pretty_kv(w, "kind", view.kind.as_str())?;
        if let Some(dataset) = view.dataset_id {
            pretty_kv(w, "dataset", dataset.to_string())?;
        }
        pretty_rule(w)
    }

    fn render_json(&self, w: &mut dyn Write) -> std::io::Result<()> {
        serde_json::to_writer(w, &self.0).map_err(std::io::Error::other)
    }

    fn render_table(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(
            w,
            "{}  {}  {}  {}",
            self.0.position,
            self.0.id,
            self.0.kind.as_str(),
            self.0.name
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["POS", "ID", "KIND", "NAME"]
    }
}

pub fn run(command: &ViewCommand, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    match command {
        ViewCommand::Add(args) => run_add(args, output, root),
        ViewCommand::List(args) => run_list(args, output, root),
        ViewCommand::Rename(args) => run_rename(args, output, root),
        ViewCommand::Move(args) => run_move(args, output, root),
        ViewCommand::Remove(args) => run_remove(args, output, root),
    }
}

fn run_add(args: &AddArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (conn, _lock) = super::open_for_write(root, output)?;
    match store::create_view(
        &conn,
        ProjectId(args.project),
        &args.name,
        args.kind,
        args.dataset.map(DatasetId),
    ) {
        Ok(view) => {
            render_item(&ViewRow(view), output)?;
            Ok(())
        }
        Err(err) => Err(super::fail_store(output, &err)),
    }
}

fn run_list(args: &ListArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (conn, _lock) = super::open_for_read(root, output)?;
    let rows: Vec<ViewRow> = query::list_views(&conn, ProjectId(args.project))?
        .into_iter()
        .map(ViewRow)
        .collect();
    render_list(&rows, output)?;
    Ok(())
}

fn run_rename(args: &RenameArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (conn, _lock) = super::open_for_write(root, output)?;
    let edit = ViewEdit {
        name: Some(args.name.clone()),
        dataset_id: None,
    };
    match store::update_view(&conn, ViewId(args.id), &edit) {
        Ok(view) => {
            render_item(&ViewRow(view), output)?;
            Ok(())
        }
        Err(err) => Err(super::fail_store(output, &err)),
    }
}

fn run_move(args: &MoveArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (mut conn, _lock) = super::open_for_write(root, output)?;

    let view = match query::get_view(&conn, ViewId(args.id))? {
        Some(view) => view,
        None => {
            return Err(super::fail_store(
                output,
                &StoreError::ViewNotFound(args.id),
            ));
        }
    };
    let views = query::list_views(&conn, view.project_id)?;
    let from = views
        .iter()
        .position(|v| v.id == view.id)
        .unwrap_or_default();
    let to = args.to.min(views.len().saturating_sub(1));
    let new_order = order::array_move(&views, from, to);
    let ordered_ids = order::ordered_ids(&new_order);

    match store::reorder_views(&mut conn, view.project_id, &ordered_ids) {
        Ok(()) => render_success(output, &format!("Moved view {} to index {to}", args.id)),
        Err(err) => Err(super::fail_store(output, &err)),
    }
}

fn run_remove(args: &RemoveArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (conn, _lock) = super::open_for_write(root, output)?;
    match store::delete_view(&conn, ViewId(args.id)) {
        Ok(()) => render_success(output, &format!("Deleted view {}", args.id)),
        Err(err) => Err(super::fail_store(output, &err)),
    }
}
