//! Typed integer ids.
//!
//! Ids are server-assigned SQLite rowids. The newtypes exist so a `PageId`
//! can never be passed where a `LayerId` is expected; the wire format is the
//! bare integer.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Raw integer value for SQL parameters and JSON payloads.
            #[must_use]
            pub const fn as_i64(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Id of the single workspace in a store.
    WorkspaceId
);
entity_id!(
    /// Id of a project within the workspace.
    ProjectId
);
entity_id!(
    /// Id of a page within a project.
    PageId
);
entity_id!(
    /// Id of a layer within the workspace.
    LayerId
);
entity_id!(
    /// Id of a page-layer link row (a layer's slot on one page).
    PageLayerId
);
entity_id!(
    /// Id of a view within a project.
    ViewId
);
entity_id!(
    /// Id of a dataset within the workspace.
    DatasetId
);
entity_id!(
    /// Id of a dataset column.
    DatasetColumnId
);
entity_id!(
    /// Id of a dataset row.
    DatasetRowId
);
