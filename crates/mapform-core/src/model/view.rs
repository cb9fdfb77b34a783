use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::id::{DatasetId, ProjectId, ViewId};

/// The two view surfaces a project can present over a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Map,
    Table,
}

impl ViewKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::Table => "table",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "map" => Ok(Self::Map),
            "table" => Ok(Self::Table),
            other => Err(format!("invalid view kind '{other}' (expected map or table)")),
        }
    }
}

/// A named view within a project. Participates in the project's ordered view
/// collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    pub id: ViewId,
    pub project_id: ProjectId,
    pub position: i64,
    pub name: String,
    pub kind: ViewKind,
    /// Dataset shown by this view, if any is bound yet.
    pub dataset_id: Option<DatasetId>,
    pub created_at_us: i64,
    pub updated_at_us: i64,
}

/// Partial field edit for a view (shallow-merge semantics).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewEdit {
    pub name: Option<String>,
    pub dataset_id: Option<Option<DatasetId>>,
}

impl ViewEdit {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.dataset_id.is_none()
    }

    /// Merge this edit into `view`, overwriting only the set fields.
    pub fn apply_to(&self, view: &mut View) {
        if let Some(name) = &self.name {
            view.name.clone_from(name);
        }
        if let Some(dataset_id) = self.dataset_id {
            view.dataset_id = dataset_id;
        }
    }
}
