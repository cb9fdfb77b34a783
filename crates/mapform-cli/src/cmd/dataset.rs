//! `mf dataset` — datasets, typed columns, and rows.

use clap::{Args, Subcommand};
use std::io::Write;
use std::path::Path;

use crate::output::{CliError, OutputMode, Renderable, pretty_kv, pretty_rule, render_error,
    render_item, render_list, render_success};
use mapform_core::db::{query, store};
use mapform_core::model::{CellValue, ColumnKind, Dataset, DatasetId};

#[derive(Subcommand, Debug)]
pub enum DatasetCommand {
    /// Create a dataset in the workspace.
    Create(CreateArgs),
    /// List datasets.
    List,
    /// Append a typed column to a dataset.
    AddColumn(AddColumnArgs),
    /// Append a row of cell values to a dataset.
    AddRow(AddRowArgs),
    /// List a dataset's columns in order.
    Columns(ColumnsArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Dataset name.
    #[arg(long)]
    pub name: String,
}

#[derive(Args, Debug)]
pub struct AddColumnArgs {
    /// Dataset id.
    #[arg(long)]
    pub dataset: i64,

    /// Column name.
    #[arg(long)]
    pub name: String,

    /// Column kind: string, number, bool, or point.
    #[arg(long, default_value = "string")]
    pub kind: ColumnKind,
}

#[derive(Args, Debug)]
pub struct AddRowArgs {
    /// Dataset id.
    #[arg(long)]
    pub dataset: i64,

    /// Cell values as `column=value`. Points use `column=lng,lat`.
    #[arg(long = "cell")]
    pub cells: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ColumnsArgs {
    /// Dataset id.
    #[arg(long)]
    pub dataset: i64,
}

struct DatasetRowView(Dataset);

impl Renderable for DatasetRowView {
    fn render_human(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "dataset {}", self.0.id)?;
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

pub fn run(command: &DatasetCommand, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    match command {
        DatasetCommand::Create(args) => run_create(args, output, root),
        DatasetCommand::List => run_list(output, root),
        DatasetCommand::AddColumn(args) => run_add_column(args, output, root),
        DatasetCommand::AddRow(args) => run_add_row(args, output, root),
        DatasetCommand::Columns(args) => run_columns(args, output, root),
    }
}

fn run_create(args: &CreateArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (conn, _lock) = super::open_for_write(root, output)?;
    match store::create_dataset(&conn, &args.name) {
        Ok(dataset) => {
            render_item(&DatasetRowView(dataset), output)?;
            Ok(())
        }
        Err(err) => Err(super::fail_store(output, &err)),
    }
}

fn run_list(output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (conn, _lock) = super::open_for_read(root, output)?;
    let rows: Vec<DatasetRowView> = query::list_datasets(&conn)?
        .into_iter()
        .map(DatasetRowView)
        .collect();
    render_list(&rows, output)?;
    Ok(())
}

fn run_add_column(args: &AddColumnArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (conn, _lock) = super::open_for_write(root, output)?;
    match store::add_column(&conn, DatasetId(args.dataset), &args.name, args.kind) {
        Ok(column) => render_success(
            output,
            &format!(
                "Added {} column '{}' ({}) to dataset {}",
                column.kind, column.name, column.id, args.dataset
            ),
        ),
        Err(err) => Err(super::fail_store(output, &err)),
    }
}

fn run_add_row(args: &AddRowArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (mut conn, _lock) = super::open_for_write(root, output)?;
    let columns = query::list_columns(&conn, DatasetId(args.dataset))?;

    let mut cells = Vec::with_capacity(args.cells.len());
    for raw in &args.cells {
        let Some((name, value)) = raw.split_once('=') else {
            let error = CliError::new(format!("cell '{raw}' is not column=value"));
            render_error(output, &error)?;
            anyhow::bail!("invalid cell '{raw}'");
        };
        let Some(column) = columns.iter().find(|c| c.name == name) else {
            let error = CliError::new(format!("dataset has no column '{name}'"));
            render_error(output, &error)?;
            anyhow::bail!("unknown column '{name}'");
        };
        match parse_cell(column.kind, value) {
            Ok(cell) => cells.push((column.id, cell)),
            Err(message) => {
                let error = CliError::new(format!("column '{name}': {message}"));
                render_error(output, &error)?;
                anyhow::bail!("invalid value for column '{name}'");
            }
        }
    }

    match store::add_row(&mut conn, DatasetId(args.dataset), &cells) {
        Ok(row) => render_success(output, &format!("Added row {}", row.id)),
        Err(err) => Err(super::fail_store(output, &err)),
    }
}

fn run_columns(args: &ColumnsArgs, output: OutputMode, root: &Path) -> anyhow::Result<()> {
    let (conn, _lock) = super::open_for_read(root, output)?;
    let columns = query::list_columns(&conn, DatasetId(args.dataset))?;
    let payload: Vec<serde_json::Value> = columns
        .iter()
        .map(|c| {
            serde_json::json!({
                "id": c.id,
                "name": c.name,
                "kind": c.kind.as_str(),
                "position": c.position,
            })
        })
        .collect();
    crate::output::render(output, &payload, |_, w| {
        for column in &columns {
            writeln!(w, "{}  {}  {}", column.position, column.kind, column.name)?;
        }
        Ok(())
    })
}

/// Parse one CLI cell literal into a typed value for its column.
fn parse_cell(kind: ColumnKind, raw: &str) -> Result<CellValue, String> {
    match kind {
        ColumnKind::String => Ok(CellValue::String {
            value: raw.to_string(),
        }),
        ColumnKind::Number => raw
            .parse::<f64>()
            .map(|value| CellValue::Number { value })
            .map_err(|_| format!("'{raw}' is not a number")),
        ColumnKind::Bool => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(CellValue::Bool { value: true }),
            "false" | "no" | "0" => Ok(CellValue::Bool { value: false }),
            _ => Err(format!("'{raw}' is not a bool")),
        },
        ColumnKind::Point => {
            let Some((lng, lat)) = raw.split_once(',') else {
                return Err(format!("'{raw}' is not lng,lat"));
            };
            let lng = lng
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("'{lng}' is not a longitude"))?;
            let lat = lat
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("'{lat}' is not a latitude"))?;
            Ok(CellValue::Point { lng, lat })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse_cell;
    use mapform_core::model::{CellValue, ColumnKind};

    #[test]
    fn parse_point_cells() {
        assert_eq!(
            parse_cell(ColumnKind::Point, "2.35, 48.85"),
            Ok(CellValue::Point {
                lng: 2.35,
                lat: 48.85
            })
        );
        assert!(parse_cell(ColumnKind::Point, "nope").is_err());
    }

    #[test]
    fn parse_bool_cells() {
        assert_eq!(
            parse_cell(ColumnKind::Bool, "yes"),
            Ok(CellValue::Bool { value: true })
        );
        assert!(parse_cell(ColumnKind::Bool, "maybe").is_err());
    }
}
