//! Canonical SQLite schema for the mapform store.
//!
//! The schema is normalized for queryability:
//! - `workspaces` holds the single root row created by `mf init`
//! - `projects`, `pages`, `views` model the editing surface; ordered
//!   collections carry an integer `position` rewritten on reorder
//! - `layers` are workspace-level; `page_layers` links them onto pages with
//!   a per-page position
//! - `datasets`, `dataset_columns`, `dataset_rows`, `dataset_cells` model
//!   tabular data rendered by layers and table views
//! - `store_meta` tracks the schema version for migrations

/// Migration v1: core normalized tables plus store metadata.
pub const MIGRATION_V1_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS workspaces (
    workspace_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS projects (
    project_id INTEGER PRIMARY KEY AUTOINCREMENT,
    workspace_id INTEGER NOT NULL REFERENCES workspaces(workspace_id) ON DELETE CASCADE,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS pages (
    page_id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(project_id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    title TEXT NOT NULL CHECK (length(trim(title)) > 0),
    center_lng REAL NOT NULL DEFAULT 0 CHECK (center_lng BETWEEN -180 AND 180),
    center_lat REAL NOT NULL DEFAULT 0 CHECK (center_lat BETWEEN -90 AND 90),
    zoom REAL NOT NULL DEFAULT 9 CHECK (zoom BETWEEN 0 AND 22),
    content_json TEXT,
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS datasets (
    dataset_id INTEGER PRIMARY KEY AUTOINCREMENT,
    workspace_id INTEGER NOT NULL REFERENCES workspaces(workspace_id) ON DELETE CASCADE,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS dataset_columns (
    column_id INTEGER PRIMARY KEY AUTOINCREMENT,
    dataset_id INTEGER NOT NULL REFERENCES datasets(dataset_id) ON DELETE CASCADE,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    kind TEXT NOT NULL CHECK (kind IN ('string', 'number', 'bool', 'point')),
    position INTEGER NOT NULL,
    UNIQUE (dataset_id, name)
);

CREATE TABLE IF NOT EXISTS dataset_rows (
    row_id INTEGER PRIMARY KEY AUTOINCREMENT,
    dataset_id INTEGER NOT NULL REFERENCES datasets(dataset_id) ON DELETE CASCADE,
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS dataset_cells (
    row_id INTEGER NOT NULL REFERENCES dataset_rows(row_id) ON DELETE CASCADE,
    column_id INTEGER NOT NULL REFERENCES dataset_columns(column_id) ON DELETE CASCADE,
    value_json TEXT NOT NULL,
    PRIMARY KEY (row_id, column_id)
);

CREATE TABLE IF NOT EXISTS layers (
    layer_id INTEGER PRIMARY KEY AUTOINCREMENT,
    workspace_id INTEGER NOT NULL REFERENCES workspaces(workspace_id) ON DELETE CASCADE,
    dataset_id INTEGER NOT NULL REFERENCES datasets(dataset_id) ON DELETE CASCADE,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    kind TEXT NOT NULL CHECK (kind IN ('point', 'marker', 'line', 'polygon')),
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS page_layers (
    page_layer_id INTEGER PRIMARY KEY AUTOINCREMENT,
    page_id INTEGER NOT NULL REFERENCES pages(page_id) ON DELETE CASCADE,
    layer_id INTEGER NOT NULL REFERENCES layers(layer_id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    UNIQUE (page_id, layer_id)
);

CREATE TABLE IF NOT EXISTS views (
    view_id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(project_id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    kind TEXT NOT NULL CHECK (kind IN ('map', 'table')),
    dataset_id INTEGER REFERENCES datasets(dataset_id) ON DELETE SET NULL,
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL,
    created_at_us INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO store_meta (id, schema_version, created_at_us)
VALUES (1, 1, 0);
"#;

/// Migration v2: read-path indexes for ordered listings.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_projects_workspace
    ON projects(workspace_id);

CREATE INDEX IF NOT EXISTS idx_pages_project_position
    ON pages(project_id, position, page_id);

CREATE INDEX IF NOT EXISTS idx_views_project_position
    ON views(project_id, position, view_id);

CREATE INDEX IF NOT EXISTS idx_page_layers_page_position
    ON page_layers(page_id, position, page_layer_id);

CREATE INDEX IF NOT EXISTS idx_layers_workspace
    ON layers(workspace_id);

CREATE INDEX IF NOT EXISTS idx_layers_dataset
    ON layers(dataset_id);

CREATE INDEX IF NOT EXISTS idx_dataset_columns_dataset_position
    ON dataset_columns(dataset_id, position, column_id);

CREATE INDEX IF NOT EXISTS idx_dataset_rows_dataset
    ON dataset_rows(dataset_id, row_id);
";
