pub mod rest;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::model::comment::{Comment, NewComment};
use crate::model::item::BoardItem;

/// Failure taxonomy for the persistence boundary. All variants trigger the
/// same rollback path on the board; the distinction is for messaging.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("not permitted: {0}")]
    Authorization(String),
    #[error("network error: {0}")]
    Network(String),
}

/// Which board-item collection the client works against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Failures,
    TestCases,
}

impl ResourceKind {
    pub fn path_segment(&self) -> &'static str {
        match self {
            ResourceKind::Failures => "failures",
            ResourceKind::TestCases => "test-cases",
        }
    }
}

/// The persistence boundary. Everything the client knows about the backend
/// goes through this seam so tests can swap in a mock.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn fetch_items(&self, kind: ResourceKind) -> Result<Vec<BoardItem>, StoreError>;

    /// Persist a board move: PATCH the item's status field.
    async fn update_status(
        &self,
        kind: ResourceKind,
        id: &str,
        status: &str,
    ) -> Result<(), StoreError>;

    async fn fetch_comments(&self, test_case_id: i64) -> Result<Vec<Comment>, StoreError>;

    async fn create_comment(&self, draft: &NewComment) -> Result<Comment, StoreError>;

    async fn update_comment(&self, id: i64, content: &str) -> Result<Comment, StoreError>;

    /// Deletes the comment and, server-side, all its direct replies.
    async fn delete_comment(&self, id: i64) -> Result<(), StoreError>;
}

#[cfg(test)]
pub mod tests;
