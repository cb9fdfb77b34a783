//! `mf page` — manage a project's ordered pages.

use chrono::{TimeZone, Utc};
use clap::{Args, Subcommand};
use std::io::Write;
use std::path::Path;

use crate::output::{OutputMode, Renderable, pretty_kv, pretty_rule, render_item, render_list,
    render_success};
use mapform_core::config;
use mapform_core::db::{query, store};
use mapform_core::error::StoreError;
use mapform_core::model::{Page, PageId, ProjectId};
use mapform_core::order;

#[derive(Subcommand, Debug)]
pub enum PageCommand {
    /// Append a page to a project.
    Add(AddArgs),
    /// List a project's pages in collection order.
    List(ListArgs),
    /// Show one page in full.
    Show(ShowArgs),
    /// Rename a page.
    Rename(RenameArgs),
    /// Move a page to a new index in its project.
    Move(MoveArgs),
    /// Re-center a page's map viewport.
    Recenter(RecenterArgs),
    /// Delete a page (a project keeps at least one).
    Remove(RemoveArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Project id.
    #[arg(long)]
    pub project: i64,

    /// Page title.
    #[arg(long)]
    pub title: String,

    /// Viewport longitude. Defaults to the workspace map default.
    #[arg(long, allow_hyphen_values = true)]
    pub lng: Option<f64>,

    /// Viewport latitude. Defaults to the workspace map default.
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Viewport zoom. Defaults to the workspace map default.
    #[arg(long, allow_hyphen_values = true)]
    pub zoom: Option<f64>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Project id.
    #[arg(long)]
    pub project: i64,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Page id.
    pub id: i64,
}

#[derive(Args, Debug)]
pub struct RenameArgs {
    /// Page id.
    pub id: i64,

    /// New title.
    #[arg(long)]
    pub title: String,
}

#[derive(Args, Debug)]
pub struct MoveArgs {
    /// Page id.
    pub id: i64,

    /// Target index (0-based) within the project's page order.
    #[arg(long)]
    pub to: usize,
}

#[derive(Args, Debug)]
pub struct RecenterArgs {
    /// Page id.
    pub id: i64,

    #[arg(long, allow_hyphen_values = true)]
    pub lng: f64,

    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    #[arg(long, allow_hyphen_values = true)]
    pub zoom: f64,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Page id.
    pub id: i64,
}

struct PageRow(Page);

impl Renderable for PageRow {
    fn render_human(&self, w: &mut dyn Write) -> std::io::Result<()> {
        let page = &self.0;
        writeln!(w, "page {} (position {})", page.id, page.position)?;
        pretty_kv(w, "title", &page.title)?;
        pretty_kv(
            w,
            "viewport",
            format!(
                "lng {:.4}, lat {:.4}, zoom {:.1}",
                page.center_lng, page.center_lat, page.zoom
            ),
        )?;
        let created = Utc
            .timestamp_micros(page.created_at_us)
            .single()
            .map_or_else(|| page.created_at_us.to_string(), |t| t.to_rfc3339());
        pretty_kv(w, "created", created)?;
        pretty_rule(w)
    }

    fn render_json(&self, w: &mut dyn Write) -> std::io::Result<()> {
        serde_json::to_writer(w, &self.0).map_err(std::io::Error::other)
    }

    fn render_table(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(
            w,
            "{}  {}  {}",
            self.0.position, self.0.id, self.0.title
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["POS", "ID", "TITLE"]
    }
}

pub fn run(command: &PageCommand, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    match command {
        PageCommand::Add(args) => run_add(args, output, root),
        PageCommand::List(args) => run_list(args, output, root),
        PageCommand::Show(args) => run_show(args, output, root),
        PageCommand::Rename(args) => run_rename(args, output, root),
        PageCommand::Move(args) => run_move(args, output, root),
        PageCommand::Recenter(args) => run_recenter(args, output, root),
        PageCommand::Remove(args) => run_remove(args, output, root),
    }
}

fn run_add(args: &AddArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (conn, _lock) = super::open_for_write(root, output)?;
    let map = config::load_project_config(root)?.map;

    match store::create_page(
        &conn,
        ProjectId(args.project),
        &args.title,
        args.lng.unwrap_or(map.default_center_lng),
        args.lat.unwrap_or(map.default_center_lat),
        args.zoom.unwrap_or(map.default_zoom),
    ) {
        Ok(page) => {
            render_item(&PageRow(page), output)?;
            Ok(())
        }
        Err(err) => Err(super::fail_store(output, &err)),
    }
}

fn run_list(args: &ListArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (conn, _lock) = super::open_for_read(root, output)?;
    let rows: Vec<PageRow> = query::list_pages(&conn, ProjectId(args.project))?
        .into_iter()
        .map(PageRow)
        .collect();
    render_list(&rows, output)?;
    Ok(())
}

fn run_show(args: &ShowArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (conn, _lock) = super::open_for_read(root, output)?;
    match query::get_page(&conn, PageId(args.id))? {
        Some(page) => {
            render_item(&PageRow(page), output)?;
            Ok(())
        }
        None => Err(super::fail_store(
            output,
            &StoreError::PageNotFound(args.id),
        )),
    }
}

fn run_rename(args: &RenameArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (conn, _lock) = super::open_for_write(root, output)?;
    let edit = mapform_core::model::PageEdit {
        title: Some(args.title.clone()),
        ..mapform_core::model::PageEdit::default()
    };
    match store::update_page(&conn, PageId(args.id), &edit) {
        Ok(page) => {
            render_item(&PageRow(page), output)?;
            Ok(())
        }
        Err(err) => Err(super::fail_store(output, &err)),
    }
}

fn run_move(args: &MoveArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (mut conn, _lock) = super::open_for_write(root, output)?;

    let page = match query::get_page(&conn, PageId(args.id))? {
        Some(page) => page,
        None => {
            return Err(super::fail_store(
                output,
                &StoreError::PageNotFound(args.id),
            ));
        }
    };
    let pages = query::list_pages(&conn, page.project_id)?;
    let from = pages
        .iter()
        .position(|p| p.id == page.id)
        .unwrap_or_default();
    let to = args.to.min(pages.len().saturating_sub(1));
    let new_order = order::array_move(&pages, from, to);
    let ordered_ids = order::ordered_ids(&new_order);

    match store::reorder_pages(&mut conn, page.project_id, &ordered_ids) {
        Ok(()) => render_success(
            output,
            &format!("Moved page {} to index {to}", args.id),
        ),
        Err(err) => Err(super::fail_store(output, &err)),
    }
}

fn run_recenter(args: &RecenterArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (conn, _lock) = super::open_for_write(root, output)?;
    let edit = mapform_core::model::PageEdit {
        center_lng: Some(args.lng),
        center_lat: Some(args.lat),
        zoom: Some(args.zoom),
        ..mapform_core::model::PageEdit::default()
    };
    match store::update_page(&conn, PageId(args.id), &edit) {
        Ok(page) => {
            render_item(&PageRow(page), output)?;
            Ok(())
        }
        Err(err) => Err(super::fail_store(output, &err)),
    }
}

fn run_remove(args: &RemoveArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (conn, _lock) = super::open_for_write(root, output)?;
    match store::delete_page(&conn, PageId(args.id)) {
        Ok(()) => render_success(output, &format!("Deleted page {}", args.id)),
        Err(err) => Err(super::fail_store(output, &err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_args_viewport_defaults_to_none() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: AddArgs,
        }
        let w = Wrapper::parse_from(["test", "--project", "1", "--title", "Stop"]);
        assert_eq!(w.args.project, 1);
        assert!(w.args.lng.is_none());
        assert!(w.args.zoom.is_none());
    }

    #[test]
    fn move_args_parse_target_index() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: MoveArgs,
        }
        let w = Wrapper::parse_from(["test", "7", "--to", "0"]);
        assert_eq!(w.args.id, 7);
        assert_eq!(w.args.to, 0);
    }
}
