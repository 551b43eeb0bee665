use thiserror::Error;

/// Reasons a tree operation can be rejected.
///
/// Every variant is raised before the tree is touched, so a failed operation
/// leaves the tree exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Layout {layout} has no children")]
    EmptyLayout { layout: String },
    #[error("Layout {layout} mixes tabs and layouts")]
    MixedKinds { layout: String },
    #[error("Layout {layout} has {count} child layout(s), at least 2 are required")]
    TooFewLayouts { layout: String, count: usize },
    #[error("Id {id:?} is already in use")]
    DuplicateId { id: String },
    #[error("Layout {layout} holds layouts, {operation} needs a tab layout")]
    NotTabLayout { layout: String, operation: &'static str },
    #[error("{id:?} not found in {scope}")]
    NotFound { id: String, scope: String },
    #[error("Incorrect UI path: {path:?}")]
    PathNotFound { path: String },
    #[error("Splitting layout {layout} would exceed the maximum depth of {max_depth}")]
    MaxDepthReached { layout: String, max_depth: usize },
}

/// Coarse grouping of [`TreeError`] for callers that only care about the
/// class of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Shape,
    Identity,
    Mode,
    Lookup,
    Limit,
}

impl TreeError {
    pub fn category(&self) -> ErrorCategory {
        use TreeError::*;
        match self {
            EmptyLayout { .. } | MixedKinds { .. } | TooFewLayouts { .. } => ErrorCategory::Shape,
            DuplicateId { .. } => ErrorCategory::Identity,
            NotTabLayout { .. } => ErrorCategory::Mode,
            NotFound { .. } | PathNotFound { .. } => ErrorCategory::Lookup,
            MaxDepthReached { .. } => ErrorCategory::Limit,
        }
    }

    pub(crate) fn not_found(id: &str, scope: impl Into<String>) -> Self {
        TreeError::NotFound { id: id.to_owned(), scope: scope.into() }
    }
}

pub type Result<T, E = TreeError> = std::result::Result<T, E>;
