use std::fmt;

/// Machine-readable error codes surfaced to the CLI, the TUI status line,
/// and JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    ProjectNotFound,
    PageNotFound,
    LayerNotFound,
    ViewNotFound,
    DatasetNotFound,
    LastPage,
    InvalidOrdering,
    ValidationFailed,
    CorruptStore,
    StoreWriteFailed,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::ProjectNotFound => "E2001",
            Self::PageNotFound => "E2002",
            Self::LayerNotFound => "E2003",
            Self::ViewNotFound => "E2004",
            Self::DatasetNotFound => "E2005",
            Self::LastPage => "E2006",
            Self::InvalidOrdering => "E2007",
            Self::ValidationFailed => "E2008",
            Self::CorruptStore => "E3001",
            Self::StoreWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Workspace not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::ProjectNotFound => "Project not found",
            Self::PageNotFound => "Page not found",
            Self::LayerNotFound => "Layer not found",
            Self::ViewNotFound => "View not found",
            Self::DatasetNotFound => "Dataset not found",
            Self::LastPage => "A project must keep at least one page",
            Self::InvalidOrdering => "Ordering is not a permutation of current children",
            Self::ValidationFailed => "Payload failed validation",
            Self::CorruptStore => "Corrupt SQLite store",
            Self::StoreWriteFailed => "Store write failed",
            Self::LockContention => "Lock contention",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `mf init` to initialize this directory."),
            Self::ConfigParseError => Some("Fix syntax in .mapform/config.toml and retry."),
            Self::ProjectNotFound => None,
            Self::PageNotFound => None,
            Self::LayerNotFound => None,
            Self::ViewNotFound => None,
            Self::DatasetNotFound => None,
            Self::LastPage => Some("Create another page first, then delete this one."),
            Self::InvalidOrdering => {
                Some("Re-fetch the collection and retry with a complete ordering.")
            }
            Self::ValidationFailed => None,
            Self::CorruptStore => Some("Delete .mapform/store.sqlite3 and re-run `mf init`."),
            Self::StoreWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other `mf` session releases its lock."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Typed failure from the store layer (the Server Sync Action executor).
///
/// Business rejections (`LastPage`, `InvalidOrdering`, missing entities) are
/// expected errors a caller can branch on; everything else wraps the
/// underlying cause.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("workspace not initialized")]
    NotInitialized,
    #[error("project {0} not found")]
    ProjectNotFound(i64),
    #[error("page {0} not found")]
    PageNotFound(i64),
    #[error("layer {0} not found")]
    LayerNotFound(i64),
    #[error("view {0} not found")]
    ViewNotFound(i64),
    #[error("dataset {0} not found")]
    DatasetNotFound(i64),
    #[error("cannot delete the last page of project {0}")]
    LastPage(i64),
    #[error("ordering for parent {parent} is not a permutation of its {expected} children")]
    InvalidOrdering { parent: i64, expected: usize },
    #[error("{0}")]
    Validation(String),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::ProjectNotFound(_) => ErrorCode::ProjectNotFound,
            Self::PageNotFound(_) => ErrorCode::PageNotFound,
            Self::LayerNotFound(_) => ErrorCode::LayerNotFound,
            Self::ViewNotFound(_) => ErrorCode::ViewNotFound,
            Self::DatasetNotFound(_) => ErrorCode::DatasetNotFound,
            Self::LastPage(_) => ErrorCode::LastPage,
            Self::InvalidOrdering { .. } => ErrorCode::InvalidOrdering,
            Self::Validation(_) => ErrorCode::ValidationFailed,
            Self::Sqlite(_) => ErrorCode::StoreWriteFailed,
        }
    }

    /// True when the failure is a business rejection rather than an I/O or
    /// corruption fault.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        !matches!(self, Self::Sqlite(_))
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, StoreError};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::NotInitialized,
            ErrorCode::ConfigParseError,
            ErrorCode::ProjectNotFound,
            ErrorCode::PageNotFound,
            ErrorCode::LayerNotFound,
            ErrorCode::ViewNotFound,
            ErrorCode::DatasetNotFound,
            ErrorCode::LastPage,
            ErrorCode::InvalidOrdering,
            ErrorCode::ValidationFailed,
            ErrorCode::CorruptStore,
            ErrorCode::StoreWriteFailed,
            ErrorCode::LockContention,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::LastPage.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn store_errors_map_to_codes() {
        assert_eq!(StoreError::LastPage(1).code(), ErrorCode::LastPage);
        assert_eq!(
            StoreError::InvalidOrdering {
                parent: 1,
                expected: 3
            }
            .code(),
            ErrorCode::InvalidOrdering
        );
        assert!(StoreError::LastPage(1).is_rejection());
    }
}
