use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::id::{DatasetId, LayerId, PageId, PageLayerId, WorkspaceId};

/// How a layer renders its dataset on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Point,
    Marker,
    Line,
    Polygon,
}

impl LayerKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Marker => "marker",
            Self::Line => "line",
            Self::Polygon => "polygon",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "point" => Ok(Self::Point),
            "marker" => Ok(Self::Marker),
            "line" => Ok(Self::Line),
            "polygon" => Ok(Self::Polygon),
            other => Err(format!(
                "invalid layer kind '{other}' (expected point, marker, line, or polygon)"
            )),
        }
    }
}

/// A visualization of one dataset, shared across pages. The order a layer
/// appears in on a given page lives on the [`PageLayer`] link row, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub workspace_id: WorkspaceId,
    pub dataset_id: DatasetId,
    pub name: String,
    pub kind: LayerKind,
    pub created_at_us: i64,
    pub updated_at_us: i64,
}

/// Link row attaching a layer onto a page with a position in that page's
/// layer stack. The same layer may appear on many pages at different
/// positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLayer {
    pub id: PageLayerId,
    pub page_id: PageId,
    pub layer_id: LayerId,
    pub position: i64,
}

#[cfg(test)]
mod tests {
    use super::LayerKind;
    use std::str::FromStr;

    #[test]
    fn kind_round_trips_through_strings() {
        for kind in [
            LayerKind::Point,
            LayerKind::Marker,
            LayerKind::Line,
            LayerKind::Polygon,
        ] {
            assert_eq!(LayerKind::from_str(kind.as_str()), Ok(kind));
        }
    }

    #[test]
    fn kind_parse_rejects_unknown() {
        assert!(LayerKind::from_str("heatmap").is_err());
    }
}
