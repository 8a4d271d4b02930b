use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use super::{ResourceKind, ResourceStore, StoreError};
use crate::comments::CommentFeed;
use crate::model::comment::{Comment, NewComment};
use crate::model::item::BoardItem;

/// In-memory store that mimics the backend: comments persist, deletes
/// cascade to direct replies, and mutations check authorship. Counters and
/// toggles let tests observe calls and force failures.
pub struct MockStore {
    items: Mutex<Vec<BoardItem>>,
    comments: Mutex<Vec<Comment>>,
    next_id: Mutex<i64>,
    acting_user: i64,
    fail_with: Option<StoreError>,
    pub status_updates: Mutex<Vec<(String, String)>>,
    pub network_calls: Mutex<u32>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            comments: Mutex::new(Vec::new()),
            next_id: Mutex::new(1),
            acting_user: 7,
            fail_with: None,
            status_updates: Mutex::new(Vec::new()),
            network_calls: Mutex::new(0),
        }
    }

    pub fn with_items(self, items: Vec<BoardItem>) -> Self {
        *self.items.lock().unwrap() = items;
        self
    }

    pub fn with_comments(self, comments: Vec<Comment>) -> Self {
        let max = comments.iter().map(|c| c.id).max().unwrap_or(0);
        *self.next_id.lock().unwrap() = max + 1;
        *self.comments.lock().unwrap() = comments;
        self
    }

    pub fn acting_as(mut self, user_id: i64) -> Self {
        self.acting_user = user_id;
        self
    }

    /// Every subsequent call fails with the given error.
    pub fn failing_with(mut self, err: StoreError) -> Self {
        self.fail_with = Some(err);
        self
    }

    pub fn calls(&self) -> u32 {
        *self.network_calls.lock().unwrap()
    }

    fn tick(&self) -> Result<(), StoreError> {
        *self.network_calls.lock().unwrap() += 1;
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ResourceStore for MockStore {
    async fn fetch_items(&self, _kind: ResourceKind) -> Result<Vec<BoardItem>, StoreError> {
        self.tick()?;
        Ok(self.items.lock().unwrap().clone())
    }

    async fn update_status(
        &self,
        _kind: ResourceKind,
        id: &str,
        status: &str,
    ) -> Result<(), StoreError> {
        self.tick()?;
        self.status_updates
            .lock()
            .unwrap()
            .push((id.to_string(), status.to_string()));
        Ok(())
    }

    async fn fetch_comments(&self, test_case_id: i64) -> Result<Vec<Comment>, StoreError> {
        self.tick()?;
        Ok(self
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.test_case_id == test_case_id)
            .cloned()
            .collect())
    }

    async fn create_comment(&self, draft: &NewComment) -> Result<Comment, StoreError> {
        self.tick()?;
        let mut next_id = self.next_id.lock().unwrap();
        let id = *next_id;
        *next_id += 1;
        let now = Utc::now();
        let comment = Comment {
            id,
            content: draft.content.clone(),
            author_id: self.acting_user,
            author_name: None,
            parent_id: draft.parent_id,
            test_case_id: draft.test_case_id,
            created_at: now,
            updated_at: now,
        };
        self.comments.lock().unwrap().push(comment.clone());
        Ok(comment)
    }

    async fn update_comment(&self, id: i64, content: &str) -> Result<Comment, StoreError> {
        self.tick()?;
        let mut comments = self.comments.lock().unwrap();
        let comment = comments
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("comment {id}")))?;
        if comment.author_id != self.acting_user {
            return Err(StoreError::Authorization("not the author".into()));
        }
        comment.content = content.to_string();
        comment.updated_at = Utc::now();
        Ok(comment.clone())
    }

    async fn delete_comment(&self, id: i64) -> Result<(), StoreError> {
        self.tick()?;
        let mut comments = self.comments.lock().unwrap();
        let comment = comments
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("comment {id}")))?;
        if comment.author_id != self.acting_user {
            return Err(StoreError::Authorization("not the author".into()));
        }
        // Cascade: the comment and its direct replies.
        comments.retain(|c| c.id != id && c.parent_id != Some(id));
        Ok(())
    }
}

fn seeded(id: i64, parent_id: Option<i64>, author_id: i64, minute: u32) -> Comment {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap();
    Comment {
        id,
        content: format!("comment {id}"),
        author_id,
        author_name: None,
        parent_id,
        test_case_id: 5,
        created_at: at,
        updated_at: at,
    }
}

#[tokio::test]
async fn fetch_items_returns_the_seeded_board() {
    use crate::model::item::{ItemKind, Priority};
    let store = MockStore::new().with_items(vec![BoardItem {
        id: "F-1".into(),
        title: "Checkout times out".into(),
        description: None,
        status: "new".into(),
        priority: Priority::High,
        assignee: None,
        tags: vec![],
        test_case_id: Some(5),
        kind: ItemKind::Failure,
    }]);
    let items = store.fetch_items(ResourceKind::Failures).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "F-1");
}

#[tokio::test]
async fn posted_comment_appears_after_refetch() {
    let store = MockStore::new();
    let mut feed = CommentFeed::new(5);

    feed.post(&store, "first observation", None).await.unwrap();
    assert_eq!(feed.threads().len(), 1);
    let top_id = feed.threads()[0].comment.id;

    feed.post(&store, "agreed, reproduced it", Some(top_id))
        .await
        .unwrap();
    assert_eq!(feed.threads().len(), 1);
    assert_eq!(feed.threads()[0].replies.len(), 1);
    assert_eq!(feed.threads()[0].replies[0].parent_id, Some(top_id));
}

#[tokio::test]
async fn delete_cascades_to_replies() {
    let store = MockStore::new().with_comments(vec![
        seeded(1, None, 7, 0),
        seeded(2, Some(1), 8, 1),
        seeded(3, None, 7, 2),
    ]);
    let mut feed = CommentFeed::new(5);
    feed.refresh(&store).await.unwrap();
    assert_eq!(feed.threads().len(), 2);

    feed.remove(&store, 1).await.unwrap();
    let remaining: Vec<i64> = feed.threads().iter().map(|t| t.comment.id).collect();
    assert_eq!(remaining, [3]);
    assert!(feed.find(2).is_none());
}

#[tokio::test]
async fn empty_content_rejected_before_any_network_call() {
    let store = MockStore::new();
    let mut feed = CommentFeed::new(5);

    let err = feed.post(&store, "   \n", None).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(store.calls(), 0);

    let err = feed.edit(&store, 1, "").await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn content_is_trimmed_before_persisting() {
    let store = MockStore::new();
    let mut feed = CommentFeed::new(5);
    feed.post(&store, "  needs a retest  ", None).await.unwrap();
    assert_eq!(feed.threads()[0].comment.content, "needs a retest");
}

#[tokio::test]
async fn failed_mutation_leaves_feed_unchanged() {
    let store = MockStore::new().with_comments(vec![seeded(1, None, 7, 0)]);
    let mut feed = CommentFeed::new(5);
    feed.refresh(&store).await.unwrap();
    let before = feed.threads().to_vec();

    let failing = MockStore::new().failing_with(StoreError::Network("connection reset".into()));
    let err = feed.post(&failing, "lost in transit", None).await.unwrap_err();
    assert!(matches!(err, StoreError::Network(_)));
    assert_eq!(feed.threads(), before.as_slice());
}

#[tokio::test]
async fn editing_someone_elses_comment_is_refused() {
    let store = MockStore::new().with_comments(vec![seeded(1, None, 99, 0)]);
    let mut feed = CommentFeed::new(5);
    feed.refresh(&store).await.unwrap();

    // The UI-side gate already says no.
    assert!(!feed.can_modify(1, 7));
    // And the store refuses regardless.
    let err = feed.edit(&store, 1, "rewritten").await.unwrap_err();
    assert!(matches!(err, StoreError::Authorization(_)));
}

#[tokio::test]
async fn mutating_a_missing_comment_is_not_found() {
    let store = MockStore::new();
    let mut feed = CommentFeed::new(5);
    let err = feed.edit(&store, 42, "ghost").await.unwrap_err();
    assert_eq!(err, StoreError::NotFound("comment 42".into()));
}

#[tokio::test]
async fn status_updates_are_recorded() {
    let store = MockStore::new();
    store
        .update_status(ResourceKind::Failures, "A", "resolved")
        .await
        .unwrap();
    assert_eq!(
        store.status_updates.lock().unwrap().as_slice(),
        &[("A".to_string(), "resolved".to_string())]
    );
}
