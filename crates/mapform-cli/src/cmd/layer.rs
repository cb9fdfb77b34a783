//! `mf layer` — workspace layers and per-page layer stacks.

use clap::{Args, Subcommand};
use std::io::Write;
use std::path::Path;

use crate::output::{OutputMode, Renderable, pretty_kv, pretty_rule, render_item, render_list,
    render_success};
use mapform_core::db::{query, store};
use mapform_core::model::{DatasetId, Layer, LayerId, LayerKind, PageId, PageLayer, PageLayerId};
use mapform_core::order;

#[derive(Subcommand, Debug)]
pub enum LayerCommand {
    /// Create a workspace layer over a dataset.
    Add(AddArgs),
    /// List workspace layers.
    List,
    /// Attach a layer to the end of a page's stack.
    Attach(AttachArgs),
    /// Show a page's layer stack in collection order.
    Stack(StackArgs),
    /// Move a stack entry to a new index within its page.
    Move(MoveArgs),
    /// Remove a stack entry from its page (the layer survives).
    Detach(DetachArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Dataset id the layer renders.
    #[arg(long)]
    pub dataset: i64,

    /// Layer name.
    #[arg(long)]
    pub name: String,

    /// Layer kind: point, marker, line, or polygon.
    #[arg(long, default_value = "marker")]
    pub kind: LayerKind,
}

#[derive(Args, Debug)]
pub struct AttachArgs {
    /// Page id.
    #[arg(long)]
    pub page: i64,

    /// Layer id.
    #[arg(long)]
    pub layer: i64,
}

#[derive(Args, Debug)]
pub struct StackArgs {
    /// Page id.
    #[arg(long)]
    pub page: i64,
}

#[derive(Args, Debug)]
pub struct MoveArgs {
    /// Stack entry id (from `mf layer stack`).
    pub id: i64,

    /// Target index (0-based) within the page's stack.
    #[arg(long)]
    pub to: usize,
}

#[derive(Args, Debug)]
pub struct DetachArgs {
    /// Stack entry id (from `mf layer stack`).
    pub id: i64,
}

struct LayerRow(Layer);

impl Renderable for LayerRow {
    fn render_human(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "layer {}", self.0.id)?;
        pretty_kv(w, "name", &self.0.name)?;
        pretty_kv(w, "kind", self.0.kind.as_str())?;
        pretty_kv(w, "dataset", self.0.dataset_id.to_string())?;
        pretty_rule(w)
    }

    fn render_json(&self, w: &mut dyn Write) -> std::io::Result<()> {
        serde_json::to_writer(w, &self.0).map_err(std::io::Error::other)
    }

    fn render_table(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(
            w,
            "{}  {}  {}  {}",
            self.0.id,
            self.0.kind.as_str(),
            self.0.dataset_id,
            self.0.name
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "KIND", "DATASET", "NAME"]
    }
}

struct StackRow(PageLayer);

impl Renderable for StackRow {
    fn render_human(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(
            w,
            "stack entry {} (position {}): layer {}",
            self.0.id, self.0.position, self.0.layer_id
        )
    }

    fn render_json(&self, w: &mut dyn Write) -> std::io::Result<()> {
        serde_json::to_writer(w, &self.0).map_err(std::io::Error::other)
    }

    fn render_table(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(
            w,
            "{}  {}  {}",
            self.0.position, self.0.id, self.0.layer_id
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["POS", "ID", "LAYER"]
    }
}

pub fn run(command: &LayerCommand, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    match command {
        LayerCommand::Add(args) => run_add(args, output, root),
        LayerCommand::List => run_list(output, root),
        LayerCommand::Attach(args) => run_attach(args, output, root),
        LayerCommand::Stack(args) => run_stack(args, output, root),
        LayerCommand::Move(args) => run_move(args, output, root),
        LayerCommand::Detach(args) => run_detach(args, output, root),
    }
}

fn run_add(args: &AddArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (conn, _lock) = super::open_for_write(root, output)?;
    match store::create_layer(&conn, DatasetId(args.dataset), &args.name, args.kind) {
        Ok(layer) => {
            render_item(&LayerRow(layer), output)?;
            Ok(())
        }
        Err(err) => Err(super::fail_store(output, &err)),
    }
}

fn run_list(output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (conn, _lock) = super::open_for_read(root, output)?;
    let rows: Vec<LayerRow> = query::list_layers(&conn)?.into_iter().map(LayerRow).collect();
    render_list(&rows, output)?;
    Ok(())
}

fn run_attach(args: &AttachArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (conn, _lock) = super::open_for_write(root, output)?;
    match store::attach_layer(&conn, PageId(args.page), LayerId(args.layer)) {
        Ok(link) => {
            render_item(&StackRow(link), output)?;
            Ok(())
        }
        Err(err) => Err(super::fail_store(output, &err)),
    }
}

fn run_stack(args: &StackArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (conn, _lock) = super::open_for_read(root, output)?;
    let rows: Vec<StackRow> = query::page_layer_stack(&conn, PageId(args.page))?
        .into_iter()
        .map(StackRow)
        .collect();
    render_list(&rows, output)?;
    Ok(())
}

fn run_move(args: &MoveArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (mut conn, _lock) = super::open_for_write(root, output)?;

    // resolve the entry's page, then recompute the full stack ordering
    let stack_entry: Option<(i64,)> = {
        let mut stmt =
            conn.prepare("SELECT page_id FROM page_layers WHERE page_layer_id = ?1")?;
        let mut rows = stmt.query([args.id])?;
        match rows.next()? {
            Some(row) => Some((row.get(0)?,)),
            None => None,
        }
    };
    let Some((page_raw,)) = stack_entry else {
        return Err(super::fail_store(
            output,
            &mapform_core::error::StoreError::LayerNotFound(args.id),
        ));
    };
    let page_id = PageId(page_raw);

    let stack = query::page_layer_stack(&conn, page_id)?;
    let from = stack
        .iter()
        .position(|l| l.id == PageLayerId(args.id))
        .unwrap_or_default();
    let to = args.to.min(stack.len().saturating_sub(1));
    let new_order = order::array_move(&stack, from, to);
    let ordered_ids = order::ordered_ids(&new_order);

    match store::reorder_layers(&mut conn, page_id, &ordered_ids) {
        Ok(()) => render_success(
            output,
            &format!("Moved stack entry {} to index {to}", args.id),
        ),
        Err(err) => Err(super::fail_store(output, &err)),
    }
}

fn run_detach(args: &DetachArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (conn, _lock) = super::open_for_write(root, output)?;
    match store::detach_layer(&conn, PageLayerId(args.id)) {
        Ok(()) => render_success(output, &format!("Detached stack entry {}", args.id)),
        Err(err) => Err(super::fail_store(output, &err)),
    }
}
