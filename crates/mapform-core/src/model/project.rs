use serde::{Deserialize, Serialize};

use super::id::{PageId, PageLayerId, ProjectId, ViewId, WorkspaceId};
use super::layer::{Layer, PageLayer};
use super::page::{Page, PageEdit};
use super::view::{View, ViewEdit};
use crate::optimistic::Patch;
use crate::order;

/// A project within the workspace. Owns the ordered collections of pages
/// and views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub created_at_us: i64,
    pub updated_at_us: i64,
}

/// One full server snapshot of a project's editing surface.
///
/// `active_page_layers` is the layer stack of whichever page the session
/// has active; switching pages re-fetches the snapshot (a rebase), which is
/// also what discards any unresolved optimistic patches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub project: Project,
    /// Pages in collection order.
    pub pages: Vec<Page>,
    /// Views in collection order.
    pub views: Vec<View>,
    /// Layer stack of the active page, in collection order.
    pub active_page_layers: Vec<PageLayer>,
    /// Workspace layers referenced by the stack, for display lookup.
    pub layers: Vec<Layer>,
}

impl ProjectSnapshot {
    #[must_use]
    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    #[must_use]
    pub fn view(&self, id: ViewId) -> Option<&View> {
        self.views.iter().find(|v| v.id == id)
    }

    #[must_use]
    pub fn layer_name(&self, link: &PageLayer) -> Option<&str> {
        self.layers
            .iter()
            .find(|l| l.id == link.layer_id)
            .map(|l| l.name.as_str())
    }
}

/// Local mutation over a [`ProjectSnapshot`].
///
/// Replace variants swap an entire ordered sub-collection (the reorder
/// case); merge variants are shallow field merges; remove variants drop one
/// item. Creation is not optimistic — it waits for the server-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SnapshotPatch {
    ReplacePageOrder(Vec<PageId>),
    ReplaceViewOrder(Vec<ViewId>),
    ReplaceLayerOrder(Vec<PageLayerId>),
    MergePage { id: PageId, edit: PageEdit },
    MergeView { id: ViewId, edit: ViewEdit },
    RemovePage(PageId),
    RemoveView(ViewId),
    DetachLayer(PageLayerId),
}

impl Patch<ProjectSnapshot> for SnapshotPatch {
    fn apply(&self, target: &mut ProjectSnapshot) {
        match self {
            Self::ReplacePageOrder(ids) => {
                target.pages = order::arrange_by_ids(&target.pages, ids);
            }
            Self::ReplaceViewOrder(ids) => {
                target.views = order::arrange_by_ids(&target.views, ids);
            }
            Self::ReplaceLayerOrder(ids) => {
                target.active_page_layers = order::arrange_by_ids(&target.active_page_layers, ids);
            }
            Self::MergePage { id, edit } => {
                if let Some(page) = target.pages.iter_mut().find(|p| p.id == *id) {
                    edit.apply_to(page);
                }
            }
            Self::MergeView { id, edit } => {
                if let Some(view) = target.views.iter_mut().find(|v| v.id == *id) {
                    edit.apply_to(view);
                }
            }
            Self::RemovePage(id) => target.pages.retain(|p| p.id != *id),
            Self::RemoveView(id) => target.views.retain(|v| v.id != *id),
            Self::DetachLayer(id) => target.active_page_layers.retain(|l| l.id != *id),
        }
    }
}
