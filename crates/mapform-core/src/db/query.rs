//! Typed query helpers for the store database.
//!
//! All functions take a shared `&Connection` and return typed structs,
//! never raw rows. Ordered collections always come back sorted by
//! `(position, id)` so a stale or sparse position column still yields a
//! deterministic sequence.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::model::{
    ColumnKind, Dataset, DatasetColumn, DatasetColumnId, DatasetId, DatasetRow, DatasetRowId,
    Layer, LayerId, LayerKind, Page, PageId, PageLayer, PageLayerId, Project, ProjectId,
    ProjectSnapshot, View, ViewId, ViewKind, Workspace, WorkspaceId,
};

// ---------------------------------------------------------------------------
// Row mappers (shared with the mutation layer)
// ---------------------------------------------------------------------------

pub(crate) fn workspace_from_row(row: &Row<'_>) -> rusqlite::Result<Workspace> {
    Ok(Workspace {
        id: WorkspaceId(row.get("workspace_id")?),
        name: row.get("name")?,
        created_at_us: row.get("created_at_us")?,
        updated_at_us: row.get("updated_at_us")?,
    })
}

pub(crate) fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: ProjectId(row.get("project_id")?),
        workspace_id: WorkspaceId(row.get("workspace_id")?),
        name: row.get("name")?,
        created_at_us: row.get("created_at_us")?,
        updated_at_us: row.get("updated_at_us")?,
    })
}

pub(crate) fn page_from_row(row: &Row<'_>) -> rusqlite::Result<Page> {
    let content_json: Option<String> = row.get("content_json")?;
    let content = match content_json {
        Some(raw) => Some(serde_json::from_str(&raw).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(error),
            )
        })?),
        None => None,
    };
    Ok(Page {
        id: PageId(row.get("page_id")?),
        project_id: ProjectId(row.get("project_id")?),
        position: row.get("position")?,
        title: row.get("title")?,
        center_lng: row.get("center_lng")?,
        center_lat: row.get("center_lat")?,
        zoom: row.get("zoom")?,
        content,
        created_at_us: row.get("created_at_us")?,
        updated_at_us: row.get("updated_at_us")?,
    })
}

pub(crate) fn view_from_row(row: &Row<'_>) -> rusqlite::Result<View> {
    let kind: String = row.get("kind")?;
    let kind = kind.parse::<ViewKind>().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            error.into(),
        )
    })?;
    let dataset_id: Option<i64> = row.get("dataset_id")?;
    Ok(View {
        id: ViewId(row.get("view_id")?),
        project_id: ProjectId(row.get("project_id")?),
        position: row.get("position")?,
        name: row.get("name")?,
        kind,
        dataset_id: dataset_id.map(DatasetId),
        created_at_us: row.get("created_at_us")?,
        updated_at_us: row.get("updated_at_us")?,
    })
}

pub(crate) fn layer_from_row(row: &Row<'_>) -> rusqlite::Result<Layer> {
    let kind: String = row.get("kind")?;
    let kind = kind.parse::<LayerKind>().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            error.into(),
        )
    })?;
    Ok(Layer {
        id: LayerId(row.get("layer_id")?),
        workspace_id: WorkspaceId(row.get("workspace_id")?),
        dataset_id: DatasetId(row.get("dataset_id")?),
        name: row.get("name")?,
        kind,
        created_at_us: row.get("created_at_us")?,
        updated_at_us: row.get("updated_at_us")?,
    })
}

pub(crate) fn page_layer_from_row(row: &Row<'_>) -> rusqlite::Result<PageLayer> {
    Ok(PageLayer {
        id: PageLayerId(row.get("page_layer_id")?),
        page_id: PageId(row.get("page_id")?),
        layer_id: LayerId(row.get("layer_id")?),
        position: row.get("position")?,
    })
}

pub(crate) fn dataset_from_row(row: &Row<'_>) -> rusqlite::Result<Dataset> {
    Ok(Dataset {
        id: DatasetId(row.get("dataset_id")?),
        workspace_id: WorkspaceId(row.get("workspace_id")?),
        name: row.get("name")?,
        created_at_us: row.get("created_at_us")?,
        updated_at_us: row.get("updated_at_us")?,
    })
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// The store's single workspace, if initialized.
pub fn workspace(conn: &Connection) -> rusqlite::Result<Option<Workspace>> {
    conn.query_row(
        "SELECT workspace_id, name, created_at_us, updated_at_us
         FROM workspaces ORDER BY workspace_id LIMIT 1",
        [],
        |row| workspace_from_row(row),
    )
    .optional()
}

pub fn get_project(conn: &Connection, id: ProjectId) -> rusqlite::Result<Option<Project>> {
    conn.query_row(
        "SELECT project_id, workspace_id, name, created_at_us, updated_at_us
         FROM projects WHERE project_id = ?1",
        params![id.as_i64()],
        |row| project_from_row(row),
    )
    .optional()
}

pub fn get_page(conn: &Connection, id: PageId) -> rusqlite::Result<Option<Page>> {
    conn.query_row(
        "SELECT page_id, project_id, position, title, center_lng, center_lat, zoom,
                content_json, created_at_us, updated_at_us
         FROM pages WHERE page_id = ?1",
        params![id.as_i64()],
        |row| page_from_row(row),
    )
    .optional()
}

pub fn get_view(conn: &Connection, id: ViewId) -> rusqlite::Result<Option<View>> {
    conn.query_row(
        "SELECT view_id, project_id, position, name, kind, dataset_id,
                created_at_us, updated_at_us
         FROM views WHERE view_id = ?1",
        params![id.as_i64()],
        |row| view_from_row(row),
    )
    .optional()
}

pub fn get_dataset(conn: &Connection, id: DatasetId) -> rusqlite::Result<Option<Dataset>> {
    conn.query_row(
        "SELECT dataset_id, workspace_id, name, created_at_us, updated_at_us
         FROM datasets WHERE dataset_id = ?1",
        params![id.as_i64()],
        |row| dataset_from_row(row),
    )
    .optional()
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// Projects of the workspace, oldest first.
pub fn list_projects(conn: &Connection) -> Result<Vec<Project>> {
    let mut stmt = conn
        .prepare(
            "SELECT project_id, workspace_id, name, created_at_us, updated_at_us
             FROM projects ORDER BY project_id",
        )
        .context("prepare project listing")?;
    let rows = stmt
        .query_map([], |row| project_from_row(row))
        .context("query projects")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("read project rows")
}

/// Pages of one project in collection order.
pub fn list_pages(conn: &Connection, project_id: ProjectId) -> Result<Vec<Page>> {
    let mut stmt = conn
        .prepare(
            "SELECT page_id, project_id, position, title, center_lng, center_lat, zoom,
                    content_json, created_at_us, updated_at_us
             FROM pages WHERE project_id = ?1 ORDER BY position, page_id",
        )
        .context("prepare page listing")?;
    let rows = stmt
        .query_map(params![project_id.as_i64()], |row| page_from_row(row))
        .context("query pages")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("read page rows")
}

/// Views of one project in collection order.
pub fn list_views(conn: &Connection, project_id: ProjectId) -> Result<Vec<View>> {
    let mut stmt = conn
        .prepare(
            "SELECT view_id, project_id, position, name, kind, dataset_id,
                    created_at_us, updated_at_us
             FROM views WHERE project_id = ?1 ORDER BY position, view_id",
        )
        .context("prepare view listing")?;
    let rows = stmt
        .query_map(params![project_id.as_i64()], |row| view_from_row(row))
        .context("query views")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("read view rows")
}

/// Workspace layers, oldest first.
pub fn list_layers(conn: &Connection) -> Result<Vec<Layer>> {
    let mut stmt = conn
        .prepare(
            "SELECT layer_id, workspace_id, dataset_id, name, kind,
                    created_at_us, updated_at_us
             FROM layers ORDER BY layer_id",
        )
        .context("prepare layer listing")?;
    let rows = stmt
        .query_map([], |row| layer_from_row(row))
        .context("query layers")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("read layer rows")
}

/// Layer stack of one page in collection order.
pub fn page_layer_stack(conn: &Connection, page_id: PageId) -> Result<Vec<PageLayer>> {
    let mut stmt = conn
        .prepare(
            "SELECT page_layer_id, page_id, layer_id, position
             FROM page_layers WHERE page_id = ?1 ORDER BY position, page_layer_id",
        )
        .context("prepare layer stack listing")?;
    let rows = stmt
        .query_map(params![page_id.as_i64()], |row| page_layer_from_row(row))
        .context("query layer stack")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("read layer stack rows")
}

/// Datasets of the workspace, oldest first.
pub fn list_datasets(conn: &Connection) -> Result<Vec<Dataset>> {
    let mut stmt = conn
        .prepare(
            "SELECT dataset_id, workspace_id, name, created_at_us, updated_at_us
             FROM datasets ORDER BY dataset_id",
        )
        .context("prepare dataset listing")?;
    let rows = stmt
        .query_map([], |row| dataset_from_row(row))
        .context("query datasets")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("read dataset rows")
}

/// Columns of one dataset in column order.
pub fn list_columns(conn: &Connection, dataset_id: DatasetId) -> Result<Vec<DatasetColumn>> {
    let mut stmt = conn
        .prepare(
            "SELECT column_id, dataset_id, name, kind, position
             FROM dataset_columns WHERE dataset_id = ?1 ORDER BY position, column_id",
        )
        .context("prepare column listing")?;
    let rows = stmt
        .query_map(params![dataset_id.as_i64()], |row| {
            let kind: String = row.get("kind")?;
            let kind = kind.parse::<ColumnKind>().map_err(|error| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    error.into(),
                )
            })?;
            Ok(DatasetColumn {
                id: DatasetColumnId(row.get("column_id")?),
                dataset_id: DatasetId(row.get("dataset_id")?),
                name: row.get("name")?,
                kind,
                position: row.get("position")?,
            })
        })
        .context("query columns")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("read column rows")
}

/// Rows of one dataset, oldest first.
pub fn list_rows(conn: &Connection, dataset_id: DatasetId) -> Result<Vec<DatasetRow>> {
    let mut stmt = conn
        .prepare(
            "SELECT row_id, dataset_id, created_at_us
             FROM dataset_rows WHERE dataset_id = ?1 ORDER BY row_id",
        )
        .context("prepare row listing")?;
    let rows = stmt
        .query_map(params![dataset_id.as_i64()], |row| {
            Ok(DatasetRow {
                id: DatasetRowId(row.get("row_id")?),
                dataset_id: DatasetId(row.get("dataset_id")?),
                created_at_us: row.get("created_at_us")?,
            })
        })
        .context("query rows")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("read dataset rows")
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// One full snapshot of a project's editing surface.
///
/// `active_page` selects which layer stack is loaded; `None` loads the
/// stack of the first page, matching what a fresh session shows.
pub fn project_snapshot(
    conn: &Connection,
    project_id: ProjectId,
    active_page: Option<PageId>,
) -> Result<ProjectSnapshot> {
    let project = get_project(conn, project_id)
        .context("load project")?
        .with_context(|| format!("project {project_id} not found"))?;
    let pages = list_pages(conn, project_id)?;
    let views = list_views(conn, project_id)?;
    let layers = list_layers(conn)?;

    let stack_page = active_page.or_else(|| pages.first().map(|p| p.id));
    let active_page_layers = match stack_page {
        Some(page_id) => page_layer_stack(conn, page_id)?,
        None => Vec::new(),
    };

    Ok(ProjectSnapshot {
        project,
        pages,
        views,
        active_page_layers,
        layers,
    })
}
