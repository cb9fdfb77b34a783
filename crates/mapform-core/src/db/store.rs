//! Mutation layer: the executor behind the Server Sync Action boundary.
//!
//! Every mutation the client can dispatch lands here, whether it arrived
//! synchronously (CLI commands) or through a transport (TUI session,
//! simulator). Reorders rewrite the position of every child from its index
//! in the submitted ordering, inside one transaction.

use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use super::query;
use crate::action::{CreatedEntity, SyncRequest};
use crate::error::StoreError;
use crate::model::{
    CellValue, ColumnKind, Dataset, DatasetColumn, DatasetColumnId, DatasetId, DatasetRow,
    Layer, LayerId, LayerKind, Page, PageEdit, PageId, PageLayer, PageLayerId, Project,
    ProjectId, View, ViewEdit, ViewId, ViewKind, Workspace, now_us,
};

/// Create the workspace row. Fails when the store is already initialized.
///
/// # Errors
///
/// Returns [`StoreError::Validation`] when a workspace already exists.
pub fn init_workspace(conn: &Connection, name: &str) -> Result<Workspace, StoreError> {
    if query::workspace(conn)?.is_some() {
        return Err(StoreError::Validation(
            "workspace already initialized".to_string(),
        ));
    }
    let now = now_us();
    conn.execute(
        "INSERT INTO workspaces (name, created_at_us, updated_at_us) VALUES (?1, ?2, ?2)",
        params![name, now],
    )?;
    let workspace = query::workspace(conn)?.ok_or(StoreError::NotInitialized)?;
    debug!(workspace = %workspace.id, "workspace initialized");
    Ok(workspace)
}

/// The store's workspace.
///
/// # Errors
///
/// Returns [`StoreError::NotInitialized`] when `mf init` has not run.
pub fn workspace(conn: &Connection) -> Result<Workspace, StoreError> {
    query::workspace(conn)?.ok_or(StoreError::NotInitialized)
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

/// Create a project in the workspace.
pub fn create_project(conn: &Connection, name: &str) -> Result<Project, StoreError> {
    let workspace = workspace(conn)?;
    let now = now_us();
    conn.execute(
        "INSERT INTO projects (workspace_id, name, created_at_us, updated_at_us)
         VALUES (?1, ?2, ?3, ?3)",
        params![workspace.id.as_i64(), name, now],
    )?;
    let id = ProjectId(conn.last_insert_rowid());
    query::get_project(conn, id)?.ok_or(StoreError::ProjectNotFound(id.as_i64()))
}

/// Rename a project.
pub fn rename_project(conn: &Connection, id: ProjectId, name: &str) -> Result<Project, StoreError> {
    let changed = conn.execute(
        "UPDATE projects SET name = ?1, updated_at_us = ?2 WHERE project_id = ?3",
        params![name, now_us(), id.as_i64()],
    )?;
    if changed == 0 {
        return Err(StoreError::ProjectNotFound(id.as_i64()));
    }
    query::get_project(conn, id)?.ok_or(StoreError::ProjectNotFound(id.as_i64()))
}

/// Delete a project and, via foreign keys, its pages and views.
pub fn delete_project(conn: &Connection, id: ProjectId) -> Result<(), StoreError> {
    let changed = conn.execute(
        "DELETE FROM projects WHERE project_id = ?1",
        params![id.as_i64()],
    )?;
    if changed == 0 {
        return Err(StoreError::ProjectNotFound(id.as_i64()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// Create a page at the end of the project's page collection.
pub fn create_page(
    conn: &Connection,
    project_id: ProjectId,
    title: &str,
    center_lng: f64,
    center_lat: f64,
    zoom: f64,
) -> Result<Page, StoreError> {
    if query::get_project(conn, project_id)?.is_none() {
        return Err(StoreError::ProjectNotFound(project_id.as_i64()));
    }
    let position: i64 = conn.query_row(
        "SELECT COALESCE(MAX(position), -1) + 1 FROM pages WHERE project_id = ?1",
        params![project_id.as_i64()],
        |row| row.get(0),
    )?;
    let now = now_us();
    conn.execute(
        "INSERT INTO pages
             (project_id, position, title, center_lng, center_lat, zoom, created_at_us, updated_at_us)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![project_id.as_i64(), position, title, center_lng, center_lat, zoom, now],
    )?;
    let id = PageId(conn.last_insert_rowid());
    query::get_page(conn, id)?.ok_or(StoreError::PageNotFound(id.as_i64()))
}

/// Merge a partial edit into a page.
pub fn update_page(conn: &Connection, id: PageId, edit: &PageEdit) -> Result<Page, StoreError> {
    let mut page = query::get_page(conn, id)?.ok_or(StoreError::PageNotFound(id.as_i64()))?;
    edit.apply_to(&mut page);
    let content_json = page
        .content
        .as_ref()
        .map(|content| serde_json::to_string(content))
        .transpose()
        .map_err(|error| StoreError::Validation(format!("invalid page content: {error}")))?;
    conn.execute(
        "UPDATE pages
         SET title = ?1, center_lng = ?2, center_lat = ?3, zoom = ?4,
             content_json = ?5, updated_at_us = ?6
         WHERE page_id = ?7",
        params![
            page.title,
            page.center_lng,
            page.center_lat,
            page.zoom,
            content_json,
            now_us(),
            id.as_i64()
        ],
    )?;
    query::get_page(conn, id)?.ok_or(StoreError::PageNotFound(id.as_i64()))
}

/// Delete a page. Rejected when it is the project's last remaining page —
/// the client guards this too, so the store check is defense in depth.
pub fn delete_page(conn: &Connection, id: PageId) -> Result<(), StoreError> {
    let page = query::get_page(conn, id)?.ok_or(StoreError::PageNotFound(id.as_i64()))?;
    let siblings: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pages WHERE project_id = ?1",
        params![page.project_id.as_i64()],
        |row| row.get(0),
    )?;
    if siblings <= 1 {
        return Err(StoreError::LastPage(page.project_id.as_i64()));
    }
    conn.execute("DELETE FROM pages WHERE page_id = ?1", params![id.as_i64()])?;
    Ok(())
}

/// Rewrite every page position to match its index in `ordered_ids`.
pub fn reorder_pages(
    conn: &mut Connection,
    project_id: ProjectId,
    ordered_ids: &[PageId],
) -> Result<(), StoreError> {
    let current: Vec<i64> = {
        let mut stmt = conn.prepare(
            "SELECT page_id FROM pages WHERE project_id = ?1 ORDER BY position, page_id",
        )?;
        let rows = stmt.query_map(params![project_id.as_i64()], |row| row.get(0))?;
        rows.collect::<rusqlite::Result<_>>()?
    };
    let proposed: Vec<i64> = ordered_ids.iter().map(|id| id.as_i64()).collect();
    check_reorder(project_id.as_i64(), &proposed, &current)?;

    let tx = conn.transaction()?;
    let now = now_us();
    for (index, id) in proposed.iter().enumerate() {
        tx.execute(
            "UPDATE pages SET position = ?1, updated_at_us = ?2 WHERE page_id = ?3",
            params![index as i64, now, id],
        )?;
    }
    tx.commit()?;
    debug!(project = %project_id, count = proposed.len(), "pages reordered");
    Ok(())
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Create a view at the end of the project's view collection.
pub fn create_view(
    conn: &Connection,
    project_id: ProjectId,
    name: &str,
    kind: ViewKind,
    dataset_id: Option<DatasetId>,
) -> Result<View, StoreError> {
    if query::get_project(conn, project_id)?.is_none() {
        return Err(StoreError::ProjectNotFound(project_id.as_i64()));
    }
    if let Some(dataset_id) = dataset_id {
        if query::get_dataset(conn, dataset_id)?.is_none() {
            return Err(StoreError::DatasetNotFound(dataset_id.as_i64()));
        }
    }
    let position: i64 = conn.query_row(
        "SELECT COALESCE(MAX(position), -1) + 1 FROM views WHERE project_id = ?1",
        params![project_id.as_i64()],
        |row| row.get(0),
    )?;
    let now = now_us();
    conn.execute(
        "INSERT INTO views (project_id, position, name, kind, dataset_id, created_at_us, updated_at_us)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![
            project_id.as_i64(),
            position,
            name,
            kind.as_str(),
            dataset_id.map(DatasetId::as_i64),
            now
        ],
    )?;
    let id = ViewId(conn.last_insert_rowid());
    query::get_view(conn, id)?.ok_or(StoreError::ViewNotFound(id.as_i64()))
}

/// Merge a partial edit into a view.
pub fn update_view(conn: &Connection, id: ViewId, edit: &ViewEdit) -> Result<View, StoreError> {
    let mut view = query::get_view(conn, id)?.ok_or(StoreError::ViewNotFound(id.as_i64()))?;
    edit.apply_to(&mut view);
    if let Some(dataset_id) = view.dataset_id {
        if query::get_dataset(conn, dataset_id)?.is_none() {
            return Err(StoreError::DatasetNotFound(dataset_id.as_i64()));
        }
    }
    conn.execute(
        "UPDATE views SET name = ?1, dataset_id = ?2, updated_at_us = ?3 WHERE view_id = ?4",
        params![
            view.name,
            view.dataset_id.map(DatasetId::as_i64),
            now_us(),
            id.as_i64()
        ],
    )?;
    query::get_view(conn, id)?.ok_or(StoreError::ViewNotFound(id.as_i64()))
}

/// Delete a view.
pub fn delete_view(conn: &Connection, id: ViewId) -> Result<(), StoreError> {
    let changed = conn.execute("DELETE FROM views WHERE view_id = ?1", params![id.as_i64()])?;
    if changed == 0 {
        return Err(StoreError::ViewNotFound(id.as_i64()));
    }
    Ok(())
}

/// Rewrite every view position to match its index in `ordered_ids`.
pub fn reorder_views(
    conn: &mut Connection,
    project_id: ProjectId,
    ordered_ids: &[ViewId],
) -> Result<(), StoreError> {
    let current: Vec<i64> = {
        let mut stmt = conn.prepare(
            "SELECT view_id FROM views WHERE project_id = ?1 ORDER BY position, view_id",
        )?;
        let rows = stmt.query_map(params![project_id.as_i64()], |row| row.get(0))?;
        rows.collect::<rusqlite::Result<_>>()?
    };
    let proposed: Vec<i64> = ordered_ids.iter().map(|id| id.as_i64()).collect();
    check_reorder(project_id.as_i64(), &proposed, &current)?;

    let tx = conn.transaction()?;
    let now = now_us();
    for (index, id) in proposed.iter().enumerate() {
        tx.execute(
            "UPDATE views SET position = ?1, updated_at_us = ?2 WHERE view_id = ?3",
            params![index as i64, now, id],
        )?;
    }
    tx.commit()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

/// Create a workspace layer over a dataset.
pub fn create_layer(
    conn: &Connection,
    dataset_id: DatasetId,
    name: &str,
    kind: LayerKind,
) -> Result<Layer, StoreError> {
    let dataset = query::get_dataset(conn, dataset_id)?
        .ok_or(StoreError::DatasetNotFound(dataset_id.as_i64()))?;
    let now = now_us();
    conn.execute(
        "INSERT INTO layers (workspace_id, dataset_id, name, kind, created_at_us, updated_at_us)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![
            dataset.workspace_id.as_i64(),
            dataset_id.as_i64(),
            name,
            kind.as_str(),
            now
        ],
    )?;
    let id = LayerId(conn.last_insert_rowid());
    let mut stmt = conn.prepare(
        "SELECT layer_id, workspace_id, dataset_id, name, kind, created_at_us, updated_at_us
         FROM layers WHERE layer_id = ?1",
    )?;
    stmt.query_row(params![id.as_i64()], |row| query::layer_from_row(row))
        .optional()?
        .ok_or(StoreError::LayerNotFound(id.as_i64()))
}

/// Attach a layer to the end of a page's layer stack.
pub fn attach_layer(
    conn: &Connection,
    page_id: PageId,
    layer_id: LayerId,
) -> Result<PageLayer, StoreError> {
    if query::get_page(conn, page_id)?.is_none() {
        return Err(StoreError::PageNotFound(page_id.as_i64()));
    }
    let already: i64 = conn.query_row(
        "SELECT COUNT(*) FROM page_layers WHERE page_id = ?1 AND layer_id = ?2",
        params![page_id.as_i64(), layer_id.as_i64()],
        |row| row.get(0),
    )?;
    if already > 0 {
        return Err(StoreError::Validation(format!(
            "layer {layer_id} is already attached to page {page_id}"
        )));
    }
    let position: i64 = conn.query_row(
        "SELECT COALESCE(MAX(position), -1) + 1 FROM page_layers WHERE page_id = ?1",
        params![page_id.as_i64()],
        |row| row.get(0),
    )?;
    conn.execute(
        "INSERT INTO page_layers (page_id, layer_id, position) VALUES (?1, ?2, ?3)",
        params![page_id.as_i64(), layer_id.as_i64(), position],
    )?;
    let id = PageLayerId(conn.last_insert_rowid());
    let mut stmt = conn.prepare(
        "SELECT page_layer_id, page_id, layer_id, position FROM page_layers
         WHERE page_layer_id = ?1",
    )?;
    stmt.query_row(params![id.as_i64()], |row| query::page_layer_from_row(row))
        .optional()?
        .ok_or(StoreError::LayerNotFound(id.as_i64()))
}

/// Remove a layer from a page's stack. The layer itself survives.
pub fn detach_layer(conn: &Connection, id: PageLayerId) -> Result<(), StoreError> {
    let changed = conn.execute(
        "DELETE FROM page_layers WHERE page_layer_id = ?1",
        params![id.as_i64()],
    )?;
    if changed == 0 {
        return Err(StoreError::LayerNotFound(id.as_i64()));
    }
    Ok(())
}

/// Rewrite every layer-link position to match its index in `ordered_ids`.
pub fn reorder_layers(
    conn: &mut Connection,
    page_id: PageId,
    ordered_ids: &[PageLayerId],
) -> Result<(), StoreError> {
    let current: Vec<i64> = {
        let mut stmt = conn.prepare(
            "SELECT page_layer_id FROM page_layers WHERE page_id = ?1
             ORDER BY position, page_layer_id",
        )?;
        let rows = stmt.query_map(params![page_id.as_i64()], |row| row.get(0))?;
        rows.collect::<rusqlite::Result<_>>()?
    };
    let proposed: Vec<i64> = ordered_ids.iter().map(|id| id.as_i64()).collect();
    check_reorder(page_id.as_i64(), &proposed, &current)?;

    let tx = conn.transaction()?;
    for (index, id) in proposed.iter().enumerate() {
        tx.execute(
            "UPDATE page_layers SET position = ?1 WHERE page_layer_id = ?2",
            params![index as i64, id],
        )?;
    }
    tx.commit()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Datasets
// ---------------------------------------------------------------------------

/// Create a dataset in the workspace.
pub fn create_dataset(conn: &Connection, name: &str) -> Result<Dataset, StoreError> {
    let workspace = workspace(conn)?;
    let now = now_us();
    conn.execute(
        "INSERT INTO datasets (workspace_id, name, created_at_us, updated_at_us)
         VALUES (?1, ?2, ?3, ?3)",
        params![workspace.id.as_i64(), name, now],
    )?;
    let id = DatasetId(conn.last_insert_rowid());
    query::get_dataset(conn, id)?.ok_or(StoreError::DatasetNotFound(id.as_i64()))
}

/// Append a typed column to a dataset.
pub fn add_column(
    conn: &Connection,
    dataset_id: DatasetId,
    name: &str,
    kind: ColumnKind,
) -> Result<DatasetColumn, StoreError> {
    if query::get_dataset(conn, dataset_id)?.is_none() {
        return Err(StoreError::DatasetNotFound(dataset_id.as_i64()));
    }
    let position: i64 = conn.query_row(
        "SELECT COALESCE(MAX(position), -1) + 1 FROM dataset_columns WHERE dataset_id = ?1",
        params![dataset_id.as_i64()],
        |row| row.get(0),
    )?;
    conn.execute(
        "INSERT INTO dataset_columns (dataset_id, name, kind, position) VALUES (?1, ?2, ?3, ?4)",
        params![dataset_id.as_i64(), name, kind.as_str(), position],
    )?;
    Ok(DatasetColumn {
        id: DatasetColumnId(conn.last_insert_rowid()),
        dataset_id,
        name: name.to_string(),
        kind,
        position,
    })
}

/// Append a row with cell values. Every value must match its column's kind.
pub fn add_row(
    conn: &mut Connection,
    dataset_id: DatasetId,
    cells: &[(DatasetColumnId, CellValue)],
) -> Result<DatasetRow, StoreError> {
    let columns = query::list_columns(conn, dataset_id)
        .map_err(|_| StoreError::DatasetNotFound(dataset_id.as_i64()))?;
    if columns.is_empty() && query::get_dataset(conn, dataset_id)?.is_none() {
        return Err(StoreError::DatasetNotFound(dataset_id.as_i64()));
    }
    for (column_id, value) in cells {
        let Some(column) = columns.iter().find(|c| c.id == *column_id) else {
            return Err(StoreError::Validation(format!(
                "column {column_id} does not belong to dataset {dataset_id}"
            )));
        };
        if column.kind != value.kind() {
            return Err(StoreError::Validation(format!(
                "column '{}' expects {} values",
                column.name, column.kind
            )));
        }
    }

    let tx = conn.transaction()?;
    let now = now_us();
    tx.execute(
        "INSERT INTO dataset_rows (dataset_id, created_at_us) VALUES (?1, ?2)",
        params![dataset_id.as_i64(), now],
    )?;
    let row_id = tx.last_insert_rowid();
    for (column_id, value) in cells {
        let value_json = serde_json::to_string(value)
            .map_err(|error| StoreError::Validation(format!("invalid cell value: {error}")))?;
        tx.execute(
            "INSERT INTO dataset_cells (row_id, column_id, value_json) VALUES (?1, ?2, ?3)",
            params![row_id, column_id.as_i64(), value_json],
        )?;
    }
    tx.commit()?;

    Ok(DatasetRow {
        id: crate::model::DatasetRowId(row_id),
        dataset_id,
        created_at_us: now,
    })
}

// ---------------------------------------------------------------------------
// Request execution
// ---------------------------------------------------------------------------

/// Execute one sync request against the store. This is the single entry
/// point every transport funnels into, so the CLI, the TUI session, and the
/// simulator all exercise identical semantics.
pub fn execute_request(
    conn: &mut Connection,
    request: &SyncRequest,
) -> Result<Option<CreatedEntity>, StoreError> {
    match request {
        SyncRequest::ReorderPages {
            project_id,
            ordered_ids,
        } => {
            reorder_pages(conn, *project_id, ordered_ids)?;
            Ok(None)
        }
        SyncRequest::ReorderViews {
            project_id,
            ordered_ids,
        } => {
            reorder_views(conn, *project_id, ordered_ids)?;
            Ok(None)
        }
        SyncRequest::ReorderLayers {
            page_id,
            ordered_ids,
        } => {
            reorder_layers(conn, *page_id, ordered_ids)?;
            Ok(None)
        }
        SyncRequest::CreatePage {
            project_id,
            title,
            center_lng,
            center_lat,
            zoom,
        } => {
            let page = create_page(conn, *project_id, title, *center_lng, *center_lat, *zoom)?;
            Ok(Some(CreatedEntity::Page(page)))
        }
        SyncRequest::CreateView {
            project_id,
            name,
            kind,
            dataset_id,
        } => {
            let view = create_view(conn, *project_id, name, *kind, *dataset_id)?;
            Ok(Some(CreatedEntity::View(view)))
        }
        SyncRequest::AttachLayer { page_id, layer_id } => {
            let link = attach_layer(conn, *page_id, *layer_id)?;
            Ok(Some(CreatedEntity::PageLayer(link)))
        }
        SyncRequest::UpdatePage { id, edit } => {
            update_page(conn, *id, edit)?;
            Ok(None)
        }
        SyncRequest::UpdateView { id, edit } => {
            update_view(conn, *id, edit)?;
            Ok(None)
        }
        SyncRequest::DeletePage { id, .. } => {
            delete_page(conn, *id)?;
            Ok(None)
        }
        SyncRequest::DeleteView { id, .. } => {
            delete_view(conn, *id)?;
            Ok(None)
        }
        SyncRequest::DetachLayer { id, .. } => {
            detach_layer(conn, *id)?;
            Ok(None)
        }
    }
}

fn check_reorder(parent: i64, proposed: &[i64], current: &[i64]) -> Result<(), StoreError> {
    if crate::order::is_permutation(proposed, current) {
        Ok(())
    } else {
        Err(StoreError::InvalidOrdering {
            parent,
            expected: current.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        add_column, add_row, attach_layer, create_dataset, create_layer, create_page,
        create_project, create_view, delete_page, init_workspace, reorder_pages, update_page,
    };
    use crate::db::{open_in_memory, query};
    use crate::error::StoreError;
    use crate::model::{CellValue, ColumnKind, LayerKind, PageEdit, PageId, ViewKind};

    fn seeded() -> (rusqlite::Connection, crate::model::Project) {
        let conn = open_in_memory().expect("open store");
        init_workspace(&conn, "Acme Maps").expect("init workspace");
        let project = create_project(&conn, "Field Survey").expect("create project");
        (conn, project)
    }

    #[test]
    fn init_twice_is_rejected() {
        let conn = open_in_memory().expect("open store");
        init_workspace(&conn, "first").expect("init");
        assert!(matches!(
            init_workspace(&conn, "second"),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn pages_append_at_the_end() {
        let (conn, project) = seeded();
        let a = create_page(&conn, project.id, "A", 0.0, 0.0, 9.0).expect("page a");
        let b = create_page(&conn, project.id, "B", 0.0, 0.0, 9.0).expect("page b");
        assert_eq!(a.position, 0);
        assert_eq!(b.position, 1);
    }

    #[test]
    fn reorder_rewrites_positions_from_index() {
        let (mut conn, project) = seeded();
        let a = create_page(&conn, project.id, "A", 0.0, 0.0, 9.0).expect("page a");
        let b = create_page(&conn, project.id, "B", 0.0, 0.0, 9.0).expect("page b");
        let c = create_page(&conn, project.id, "C", 0.0, 0.0, 9.0).expect("page c");

        reorder_pages(&mut conn, project.id, &[c.id, a.id, b.id]).expect("reorder");

        let pages = query::list_pages(&conn, project.id).expect("list");
        let titles: Vec<&str> = pages.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "A", "B"]);
        let positions: Vec<i64> = pages.iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn reorder_rejects_non_permutations() {
        let (mut conn, project) = seeded();
        let a = create_page(&conn, project.id, "A", 0.0, 0.0, 9.0).expect("page a");
        let _b = create_page(&conn, project.id, "B", 0.0, 0.0, 9.0).expect("page b");

        let err = reorder_pages(&mut conn, project.id, &[a.id]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidOrdering { expected: 2, .. }));

        let err = reorder_pages(&mut conn, project.id, &[a.id, PageId(999)]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidOrdering { .. }));
    }

    #[test]
    fn deleting_the_last_page_is_rejected() {
        let (conn, project) = seeded();
        let only = create_page(&conn, project.id, "Only", 0.0, 0.0, 9.0).expect("page");
        assert!(matches!(
            delete_page(&conn, only.id),
            Err(StoreError::LastPage(_))
        ));

        let second = create_page(&conn, project.id, "Second", 0.0, 0.0, 9.0).expect("page");
        delete_page(&conn, second.id).expect("delete with sibling present");
    }

    #[test]
    fn update_page_merges_partial_fields() {
        let (conn, project) = seeded();
        let page = create_page(&conn, project.id, "Before", -73.9, 40.7, 11.0).expect("page");
        let updated = update_page(
            &conn,
            page.id,
            &PageEdit {
                title: Some("After".to_string()),
                ..PageEdit::default()
            },
        )
        .expect("update");
        assert_eq!(updated.title, "After");
        assert_eq!(updated.center_lng, -73.9);
        assert_eq!(updated.zoom, 11.0);
    }

    #[test]
    fn layer_attach_is_unique_per_page() {
        let (conn, project) = seeded();
        let page = create_page(&conn, project.id, "Map", 0.0, 0.0, 9.0).expect("page");
        let dataset = create_dataset(&conn, "Sightings").expect("dataset");
        let layer = create_layer(&conn, dataset.id, "Pins", LayerKind::Marker).expect("layer");

        let link = attach_layer(&conn, page.id, layer.id).expect("attach");
        assert_eq!(link.position, 0);
        assert!(matches!(
            attach_layer(&conn, page.id, layer.id),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn views_append_and_bind_datasets() {
        let (conn, project) = seeded();
        let dataset = create_dataset(&conn, "Sightings").expect("dataset");
        let map = create_view(&conn, project.id, "Map", ViewKind::Map, None).expect("map view");
        let table = create_view(&conn, project.id, "Data", ViewKind::Table, Some(dataset.id))
            .expect("table view");
        assert_eq!(map.position, 0);
        assert_eq!(table.position, 1);
        assert_eq!(table.dataset_id, Some(dataset.id));
    }

    #[test]
    fn rows_reject_mismatched_cell_kinds() {
        let (mut conn, _project) = seeded();
        let dataset = create_dataset(&conn, "Sightings").expect("dataset");
        let name_col =
            add_column(&conn, dataset.id, "name", ColumnKind::String).expect("column");

        let err = add_row(
            &mut conn,
            dataset.id,
            &[(name_col.id, CellValue::Number { value: 4.0 })],
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        add_row(
            &mut conn,
            dataset.id,
            &[(
                name_col.id,
                CellValue::String {
                    value: "heron".to_string(),
                },
            )],
        )
        .expect("valid row");
    }
}
