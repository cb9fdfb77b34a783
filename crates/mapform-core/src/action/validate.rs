//! Boundary validation for sync-action payloads.
//!
//! Every payload is checked here before dispatch, on both paths: the CLI
//! validates before writing synchronously, and the editor validates before
//! queueing an optimistic patch. Reorder payloads that fail (stale intents)
//! are dropped silently by the editor; form-derived payloads surface the
//! field error.

use std::fmt;

use super::SyncRequest;
use crate::model::ProjectSnapshot;
use crate::order;

/// Longitude/latitude bounds for viewport payloads.
const LNG_RANGE: (f64, f64) = (-180.0, 180.0);
const LAT_RANGE: (f64, f64) = (-90.0, 90.0);
/// Zoom levels accepted by the map renderers we target.
const ZOOM_RANGE: (f64, f64) = (0.0, 22.0);

/// A payload rejected before it reached the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Offending field, when the error is field-specific.
    pub field: Option<&'static str>,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field: Some(field),
            message: message.into(),
        }
    }

    fn whole(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field {
            Some(field) => write!(f, "{field}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a request against the current client snapshot.
///
/// # Errors
///
/// Returns the first violated constraint; callers decide whether to surface
/// it (forms) or drop it (stale drag intents).
pub fn check(request: &SyncRequest, snapshot: &ProjectSnapshot) -> Result<(), ValidationError> {
    match request {
        SyncRequest::ReorderPages {
            project_id,
            ordered_ids,
        } => {
            if *project_id != snapshot.project.id {
                return Err(ValidationError::new("project_id", "unknown project"));
            }
            check_permutation(ordered_ids, &order::ordered_ids(&snapshot.pages), "pages")
        }
        SyncRequest::ReorderViews {
            project_id,
            ordered_ids,
        } => {
            if *project_id != snapshot.project.id {
                return Err(ValidationError::new("project_id", "unknown project"));
            }
            check_permutation(ordered_ids, &order::ordered_ids(&snapshot.views), "views")
        }
        SyncRequest::ReorderLayers { ordered_ids, .. } => check_permutation(
            ordered_ids,
            &order::ordered_ids(&snapshot.active_page_layers),
            "layers",
        ),
        SyncRequest::CreatePage {
            title,
            center_lng,
            center_lat,
            zoom,
            ..
        } => {
            check_title("title", title)?;
            check_viewport(*center_lng, *center_lat, *zoom)
        }
        SyncRequest::CreateView { name, .. } => check_title("name", name),
        SyncRequest::AttachLayer { .. } => Ok(()),
        SyncRequest::UpdatePage { id, edit } => {
            if snapshot.page(*id).is_none() {
                return Err(ValidationError::new("id", "unknown page"));
            }
            if edit.is_empty() {
                return Err(ValidationError::whole("empty edit"));
            }
            if let Some(title) = &edit.title {
                check_title("title", title)?;
            }
            match (edit.center_lng, edit.center_lat, edit.zoom) {
                (None, None, None) => Ok(()),
                (lng, lat, zoom) => check_viewport(
                    lng.unwrap_or(0.0),
                    lat.unwrap_or(0.0),
                    zoom.unwrap_or(ZOOM_RANGE.0),
                ),
            }
        }
        SyncRequest::UpdateView { id, edit } => {
            if snapshot.view(*id).is_none() {
                return Err(ValidationError::new("id", "unknown view"));
            }
            if edit.is_empty() {
                return Err(ValidationError::whole("empty edit"));
            }
            if let Some(name) = &edit.name {
                check_title("name", name)?;
            }
            Ok(())
        }
        SyncRequest::DeletePage { id, .. } => {
            if snapshot.page(*id).is_none() {
                return Err(ValidationError::new("id", "unknown page"));
            }
            Ok(())
        }
        SyncRequest::DeleteView { id, .. } => {
            if snapshot.view(*id).is_none() {
                return Err(ValidationError::new("id", "unknown view"));
            }
            Ok(())
        }
        SyncRequest::DetachLayer { id, .. } => {
            if !snapshot.active_page_layers.iter().any(|l| l.id == *id) {
                return Err(ValidationError::new("id", "unknown layer link"));
            }
            Ok(())
        }
    }
}

fn check_title(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    if value.len() > 512 {
        return Err(ValidationError::new(field, "must be 512 bytes or fewer"));
    }
    Ok(())
}

fn check_viewport(lng: f64, lat: f64, zoom: f64) -> Result<(), ValidationError> {
    if !(LNG_RANGE.0..=LNG_RANGE.1).contains(&lng) || !lng.is_finite() {
        return Err(ValidationError::new("center_lng", "out of range"));
    }
    if !(LAT_RANGE.0..=LAT_RANGE.1).contains(&lat) || !lat.is_finite() {
        return Err(ValidationError::new("center_lat", "out of range"));
    }
    if !(ZOOM_RANGE.0..=ZOOM_RANGE.1).contains(&zoom) || !zoom.is_finite() {
        return Err(ValidationError::new("zoom", "out of range"));
    }
    Ok(())
}

fn check_permutation<I: Copy + Eq + std::hash::Hash>(
    proposed: &[I],
    current: &[I],
    what: &str,
) -> Result<(), ValidationError> {
    if order::is_permutation(proposed, current) {
        Ok(())
    } else {
        Err(ValidationError::whole(format!(
            "ordering is not a permutation of the current {what}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::{ValidationError, check};
    use crate::action::SyncRequest;
    use crate::model::{
        Page, PageEdit, PageId, Project, ProjectId, ProjectSnapshot, WorkspaceId,
    };

    fn page(id: i64, position: i64) -> Page {
        Page {
            id: PageId(id),
            project_id: ProjectId(1),
            position,
            title: format!("P{id}"),
            center_lng: 0.0,
            center_lat: 0.0,
            zoom: 9.0,
            content: None,
            created_at_us: 0,
            updated_at_us: 0,
        }
    }

    fn snapshot() -> ProjectSnapshot {
        ProjectSnapshot {
            project: Project {
                id: ProjectId(1),
                workspace_id: WorkspaceId(1),
                name: "Demo".to_string(),
                created_at_us: 0,
                updated_at_us: 0,
            },
            pages: vec![page(1, 0), page(2, 1)],
            views: Vec::new(),
            active_page_layers: Vec::new(),
            layers: Vec::new(),
        }
    }

    #[test]
    fn reorder_requires_full_permutation() {
        let snap = snapshot();
        let ok = SyncRequest::ReorderPages {
            project_id: ProjectId(1),
            ordered_ids: vec![PageId(2), PageId(1)],
        };
        assert!(check(&ok, &snap).is_ok());

        let short = SyncRequest::ReorderPages {
            project_id: ProjectId(1),
            ordered_ids: vec![PageId(2)],
        };
        assert!(check(&short, &snap).is_err());

        let foreign = SyncRequest::ReorderPages {
            project_id: ProjectId(1),
            ordered_ids: vec![PageId(2), PageId(9)],
        };
        assert!(check(&foreign, &snap).is_err());
    }

    #[test]
    fn create_page_rejects_blank_title_with_field() {
        let snap = snapshot();
        let request = SyncRequest::CreatePage {
            project_id: ProjectId(1),
            title: "   ".to_string(),
            center_lng: 0.0,
            center_lat: 0.0,
            zoom: 9.0,
        };
        let err = check(&request, &snap).unwrap_err();
        assert_eq!(err.field, Some("title"));
    }

    #[test]
    fn create_page_rejects_out_of_range_viewport() {
        let snap = snapshot();
        let request = SyncRequest::CreatePage {
            project_id: ProjectId(1),
            title: "Somewhere".to_string(),
            center_lng: 212.0,
            center_lat: 0.0,
            zoom: 9.0,
        };
        assert_eq!(
            check(&request, &snap).unwrap_err(),
            ValidationError {
                field: Some("center_lng"),
                message: "out of range".to_string()
            }
        );
    }

    #[test]
    fn update_rejects_empty_edit_and_unknown_target() {
        let snap = snapshot();
        let empty = SyncRequest::UpdatePage {
            id: PageId(1),
            edit: PageEdit::default(),
        };
        assert!(check(&empty, &snap).is_err());

        let unknown = SyncRequest::UpdatePage {
            id: PageId(9),
            edit: PageEdit {
                title: Some("x".to_string()),
                ..PageEdit::default()
            },
        };
        assert!(check(&unknown, &snap).is_err());
    }
}
