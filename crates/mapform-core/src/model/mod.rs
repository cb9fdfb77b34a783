//! Domain model: typed ids and entity aggregates for the mapform store.

pub mod dataset;
pub mod id;
pub mod layer;
pub mod page;
pub mod project;
pub mod view;
pub mod workspace;

pub use dataset::{CellValue, ColumnKind, Dataset, DatasetColumn, DatasetRow};
pub use id::{
    DatasetColumnId, DatasetId, DatasetRowId, LayerId, PageId, PageLayerId, ProjectId, ViewId,
    WorkspaceId,
};
pub use layer::{Layer, LayerKind, PageLayer};
pub use page::{Page, PageEdit};
pub use project::{Project, ProjectSnapshot, SnapshotPatch};
pub use view::{View, ViewEdit, ViewKind};
pub use workspace::Workspace;

/// Current wall-clock time in microseconds since the Unix epoch.
///
/// All persisted timestamps use this resolution.
#[must_use]
pub fn now_us() -> i64 {
    chrono::Utc::now().timestamp_micros()
}
