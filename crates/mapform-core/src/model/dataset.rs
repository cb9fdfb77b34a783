use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::id::{DatasetColumnId, DatasetId, DatasetRowId, WorkspaceId};

/// Column value types supported by datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    String,
    Number,
    Bool,
    Point,
}

impl ColumnKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::Point => "point",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "bool" => Ok(Self::Bool),
            "point" => Ok(Self::Point),
            other => Err(format!(
                "invalid column kind '{other}' (expected string, number, bool, or point)"
            )),
        }
    }
}

/// A tabular collection of rows, owned by the workspace and rendered by
/// layers and table views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: DatasetId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub created_at_us: i64,
    pub updated_at_us: i64,
}

/// A named, typed column of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetColumn {
    pub id: DatasetColumnId,
    pub dataset_id: DatasetId,
    pub name: String,
    pub kind: ColumnKind,
    pub position: i64,
}

/// A row of a dataset. Cell values live in the cell table keyed by
/// (row, column).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub id: DatasetRowId,
    pub dataset_id: DatasetId,
    pub created_at_us: i64,
}

/// One cell value. Stored as JSON in the cell table; the variant must match
/// the column's [`ColumnKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CellValue {
    String { value: String },
    Number { value: f64 },
    Bool { value: bool },
    Point { lng: f64, lat: f64 },
}

impl CellValue {
    /// The column kind this value is valid for.
    #[must_use]
    pub const fn kind(&self) -> ColumnKind {
        match self {
            Self::String { .. } => ColumnKind::String,
            Self::Number { .. } => ColumnKind::Number,
            Self::Bool { .. } => ColumnKind::Bool,
            Self::Point { .. } => ColumnKind::Point,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CellValue, ColumnKind};

    #[test]
    fn cell_value_json_is_tagged() {
        let value = CellValue::Point {
            lng: 2.35,
            lat: 48.85,
        };
        let json = serde_json::to_string(&value).unwrap();
        assert!(json.contains("\"type\":\"point\""));
        let back: CellValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn cell_value_reports_matching_kind() {
        assert_eq!(
            CellValue::Bool { value: true }.kind(),
            ColumnKind::Bool
        );
    }
}
