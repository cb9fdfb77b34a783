use serde::{Deserialize, Serialize};

use super::id::{PageId, ProjectId};

/// A page within a project: one step of a map-based form, anchored to a map
/// viewport. Participates in the project's ordered page collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub project_id: ProjectId,
    /// Position within the project. Monotonically assigned, not required to
    /// be contiguous; relative order is what matters.
    pub position: i64,
    pub title: String,
    /// Map viewport longitude.
    pub center_lng: f64,
    /// Map viewport latitude.
    pub center_lat: f64,
    /// Map viewport zoom level.
    pub zoom: f64,
    /// Opaque block content rendered by the page editor.
    pub content: Option<serde_json::Value>,
    pub created_at_us: i64,
    pub updated_at_us: i64,
}

/// Partial field edit for a page. `None` fields retain their prior value
/// (shallow-merge semantics).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageEdit {
    pub title: Option<String>,
    pub center_lng: Option<f64>,
    pub center_lat: Option<f64>,
    pub zoom: Option<f64>,
    pub content: Option<serde_json::Value>,
}

impl PageEdit {
    /// True when no field is set; such edits are dropped before dispatch.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.center_lng.is_none()
            && self.center_lat.is_none()
            && self.zoom.is_none()
            && self.content.is_none()
    }

    /// Merge this edit into `page`, overwriting only the set fields.
    pub fn apply_to(&self, page: &mut Page) {
        if let Some(title) = &self.title {
            page.title.clone_from(title);
        }
        if let Some(lng) = self.center_lng {
            page.center_lng = lng;
        }
        if let Some(lat) = self.center_lat {
            page.center_lat = lat;
        }
        if let Some(zoom) = self.zoom {
            page.zoom = zoom;
        }
        if let Some(content) = &self.content {
            page.content = Some(content.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Page, PageEdit};
    use crate::model::id::{PageId, ProjectId};

    fn page() -> Page {
        Page {
            id: PageId(1),
            project_id: ProjectId(1),
            position: 0,
            title: "Intro".to_string(),
            center_lng: -73.98,
            center_lat: 40.75,
            zoom: 9.0,
            content: None,
            created_at_us: 0,
            updated_at_us: 0,
        }
    }

    #[test]
    fn edit_overwrites_only_set_fields() {
        let mut p = page();
        let edit = PageEdit {
            title: Some("Renamed".to_string()),
            zoom: Some(12.0),
            ..PageEdit::default()
        };
        edit.apply_to(&mut p);
        assert_eq!(p.title, "Renamed");
        assert_eq!(p.zoom, 12.0);
        // untouched fields retain prior values
        assert_eq!(p.center_lng, -73.98);
        assert_eq!(p.center_lat, 40.75);
    }

    #[test]
    fn applying_the_same_edit_twice_is_idempotent() {
        let mut once = page();
        let mut twice = page();
        let edit = PageEdit {
            title: Some("Renamed".to_string()),
            ..PageEdit::default()
        };
        edit.apply_to(&mut once);
        edit.apply_to(&mut twice);
        edit.apply_to(&mut twice);
        assert_eq!(once, twice);
    }
}
