use serde::{Deserialize, Serialize};

use super::id::WorkspaceId;

/// The root container of a store. Exactly one exists per `.mapform/`
/// directory, created by `mf init`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    pub created_at_us: i64,
    pub updated_at_us: i64,
}
