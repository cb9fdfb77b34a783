//! The Server Sync Action boundary.
//!
//! Mutations cross from the optimistic client side to the store through a
//! typed request/response contract: a validated [`SyncRequest`] is wrapped
//! in a [`SyncEnvelope`] and handed to a [`Transport`]; the matching
//! [`SyncSettlement`] arrives later via [`Transport::poll`], possibly out of
//! order with respect to dispatch order. Nothing serializes independent
//! requests against each other.

pub mod debounce;
pub mod dispatch;
pub mod validate;

pub use debounce::Debouncer;
pub use dispatch::{Dispatcher, Notification, Severity};
pub use validate::ValidationError;

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::model::{
    DatasetId, LayerId, Page, PageEdit, PageId, PageLayer, PageLayerId, ProjectId, View, ViewEdit,
    ViewId, ViewKind,
};
use crate::optimistic::MutationToken;

/// A mutation payload addressed to the store.
///
/// Reorder payloads always carry the complete child ordering; the store
/// rewrites every child's position from its index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SyncRequest {
    ReorderPages {
        project_id: ProjectId,
        ordered_ids: Vec<PageId>,
    },
    ReorderViews {
        project_id: ProjectId,
        ordered_ids: Vec<ViewId>,
    },
    ReorderLayers {
        page_id: PageId,
        ordered_ids: Vec<PageLayerId>,
    },
    CreatePage {
        project_id: ProjectId,
        title: String,
        center_lng: f64,
        center_lat: f64,
        zoom: f64,
    },
    CreateView {
        project_id: ProjectId,
        name: String,
        kind: ViewKind,
        dataset_id: Option<DatasetId>,
    },
    AttachLayer {
        page_id: PageId,
        layer_id: LayerId,
    },
    UpdatePage {
        id: PageId,
        edit: PageEdit,
    },
    UpdateView {
        id: ViewId,
        edit: ViewEdit,
    },
    DeletePage {
        id: PageId,
        project_id: ProjectId,
    },
    DeleteView {
        id: ViewId,
        project_id: ProjectId,
    },
    DetachLayer {
        id: PageLayerId,
        page_id: PageId,
    },
}

impl SyncRequest {
    /// Short label used in notifications and logs.
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::ReorderPages { .. } => "reorder pages",
            Self::ReorderViews { .. } => "reorder views",
            Self::ReorderLayers { .. } => "reorder layers",
            Self::CreatePage { .. } => "create page",
            Self::CreateView { .. } => "create view",
            Self::AttachLayer { .. } => "attach layer",
            Self::UpdatePage { .. } => "update page",
            Self::UpdateView { .. } => "update view",
            Self::DeletePage { .. } => "delete page",
            Self::DeleteView { .. } => "delete view",
            Self::DetachLayer { .. } => "detach layer",
        }
    }
}

/// A request paired with the mutation token that ties its settlement back
/// to the optimistic patch queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncEnvelope {
    #[serde(with = "token_serde")]
    pub token: MutationToken,
    pub request: SyncRequest,
}

mod token_serde {
    use crate::optimistic::MutationToken;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(token: &MutationToken, ser: S) -> Result<S::Ok, S::Error> {
        token.raw().serialize(ser)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<MutationToken, D::Error> {
        u64::deserialize(de).map(MutationToken::new)
    }
}

/// Entity returned by a successful create, used to seed follow-on client
/// state (a newly created page becomes the active selection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum CreatedEntity {
    Page(Page),
    View(View),
    PageLayer(PageLayer),
}

/// How one mutation settled.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// The store applied the mutation. Creates carry the created entity.
    Success(Option<CreatedEntity>),
    /// The store rejected the mutation or the request was lost.
    Failure { code: ErrorCode, message: String },
}

/// Settlement of one previously submitted envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettlement {
    pub token: MutationToken,
    pub outcome: SyncOutcome,
}

/// Asynchronous boundary between the client session and the store.
///
/// `submit` is fire-and-forget; settlements surface later through `poll`,
/// in whatever order the underlying executor produced them. A transport
/// never panics the session: executor failures come back as
/// [`SyncOutcome::Failure`] settlements.
pub trait Transport {
    fn submit(&mut self, envelope: SyncEnvelope);

    /// Drain every settlement that has arrived since the last poll.
    fn poll(&mut self) -> Vec<SyncSettlement>;
}
