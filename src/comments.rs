use std::collections::HashMap;

use crate::model::comment::{Comment, NewComment};
use crate::store::{ResourceStore, StoreError};

/// One rendered thread: a top-level comment and its direct replies.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentThread {
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

/// Build the two-level tree from the flat list the backend returns.
///
/// Top-level comments (no parent) come first-posted-first, each with its
/// direct replies in the same order. The schema permits deeper nesting, but
/// a reply whose parent is itself a reply is unreachable here and silently
/// dropped. That is a deliberate two-level design, not an error.
pub fn assemble(mut flat: Vec<Comment>) -> Vec<CommentThread> {
    flat.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let mut threads: Vec<CommentThread> = Vec::new();
    let mut index_of: HashMap<i64, usize> = HashMap::new();

    for comment in flat.iter().filter(|c| c.parent_id.is_none()) {
        index_of.insert(comment.id, threads.len());
        threads.push(CommentThread {
            comment: comment.clone(),
            replies: Vec::new(),
        });
    }

    for comment in flat {
        let Some(parent_id) = comment.parent_id else {
            continue;
        };
        if let Some(&idx) = index_of.get(&parent_id) {
            threads[idx].replies.push(comment);
        }
    }

    threads
}

/// Cached comment list for one test case, plus the mutation flow.
///
/// Mutations are never optimistic: validate, persist, then invalidate by
/// re-fetching and re-assembling from the server's copy. On failure nothing
/// local changes, so the caller can keep the form populated and retry.
#[derive(Debug)]
pub struct CommentFeed {
    test_case_id: i64,
    threads: Vec<CommentThread>,
}

impl CommentFeed {
    pub fn new(test_case_id: i64) -> Self {
        Self {
            test_case_id,
            threads: Vec::new(),
        }
    }

    pub fn test_case_id(&self) -> i64 {
        self.test_case_id
    }

    pub fn threads(&self) -> &[CommentThread] {
        &self.threads
    }

    /// Threads flattened for a linear cursor: `(comment, is_reply)`.
    pub fn flattened(&self) -> Vec<(&Comment, bool)> {
        let mut out = Vec::new();
        for thread in &self.threads {
            out.push((&thread.comment, false));
            for reply in &thread.replies {
                out.push((reply, true));
            }
        }
        out
    }

    pub fn find(&self, id: i64) -> Option<&Comment> {
        self.flattened()
            .into_iter()
            .map(|(c, _)| c)
            .find(|c| c.id == id)
    }

    /// Client-side authorship gate. Only used to disable edit/delete
    /// controls; the store enforces authorization for real.
    pub fn can_modify(&self, id: i64, user_id: i64) -> bool {
        self.find(id).is_some_and(|c| c.author_id == user_id)
    }

    /// Replace the cache with a freshly fetched flat list.
    pub fn apply(&mut self, flat: Vec<Comment>) {
        self.threads = assemble(flat);
    }

    pub async fn refresh(&mut self, store: &dyn ResourceStore) -> Result<(), StoreError> {
        let flat = store.fetch_comments(self.test_case_id).await?;
        self.apply(flat);
        Ok(())
    }

    /// Create a top-level comment, or a reply when `parent_id` is given.
    /// Empty content is rejected before any network call.
    pub async fn post(
        &mut self,
        store: &dyn ResourceStore,
        content: &str,
        parent_id: Option<i64>,
    ) -> Result<(), StoreError> {
        let content = validate_content(content)?;
        store
            .create_comment(&NewComment {
                content,
                test_case_id: self.test_case_id,
                parent_id,
            })
            .await?;
        self.refresh(store).await
    }

    pub async fn edit(
        &mut self,
        store: &dyn ResourceStore,
        id: i64,
        content: &str,
    ) -> Result<(), StoreError> {
        let content = validate_content(content)?;
        store.update_comment(id, &content).await?;
        self.refresh(store).await
    }

    /// Delete a comment; the server cascades to its direct replies. The
    /// caller must have obtained explicit user confirmation first.
    pub async fn remove(&mut self, store: &dyn ResourceStore, id: i64) -> Result<(), StoreError> {
        store.delete_comment(id).await?;
        self.refresh(store).await
    }
}

/// Trim and reject empty content. Runs before any network call.
pub fn validate_content(content: &str) -> Result<String, StoreError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation("comment content is empty".into()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    pub(crate) fn comment(id: i64, parent_id: Option<i64>, minute: u32) -> Comment {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap();
        Comment {
            id,
            content: format!("comment {id}"),
            author_id: 7,
            author_name: Some("dana".into()),
            parent_id,
            test_case_id: 5,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn assembles_two_level_tree() {
        let threads = assemble(vec![
            comment(1, None, 0),
            comment(2, Some(1), 1),
            comment(3, None, 2),
        ]);
        let top: Vec<i64> = threads.iter().map(|t| t.comment.id).collect();
        assert_eq!(top, [1, 3]);
        assert_eq!(threads[0].replies.iter().map(|r| r.id).collect::<Vec<_>>(), [2]);
        assert!(threads[1].replies.is_empty());
    }

    #[test]
    fn orders_by_created_at_ascending() {
        let threads = assemble(vec![
            comment(9, None, 30),
            comment(4, None, 10),
            comment(6, Some(4), 25),
            comment(5, Some(4), 15),
        ]);
        assert_eq!(threads.iter().map(|t| t.comment.id).collect::<Vec<_>>(), [4, 9]);
        assert_eq!(threads[0].replies.iter().map(|r| r.id).collect::<Vec<_>>(), [5, 6]);
    }

    #[test]
    fn reply_to_reply_is_dropped() {
        let threads = assemble(vec![
            comment(1, None, 0),
            comment(2, Some(1), 1),
            comment(3, Some(2), 2),
        ]);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].replies.iter().map(|r| r.id).collect::<Vec<_>>(), [2]);
    }

    #[test]
    fn every_reply_points_at_its_thread() {
        let threads = assemble(vec![
            comment(1, None, 0),
            comment(2, None, 1),
            comment(3, Some(1), 2),
            comment(4, Some(2), 3),
            comment(5, Some(1), 4),
        ]);
        let mut seen = Vec::new();
        for thread in &threads {
            for reply in &thread.replies {
                assert_eq!(reply.parent_id, Some(thread.comment.id));
                assert!(!seen.contains(&reply.id), "{} in two threads", reply.id);
                seen.push(reply.id);
            }
        }
    }

    #[test]
    fn flattened_interleaves_replies() {
        let mut feed = CommentFeed::new(5);
        feed.threads = assemble(vec![
            comment(1, None, 0),
            comment(2, Some(1), 1),
            comment(3, None, 2),
        ]);
        let order: Vec<(i64, bool)> = feed
            .flattened()
            .into_iter()
            .map(|(c, r)| (c.id, r))
            .collect();
        assert_eq!(order, [(1, false), (2, true), (3, false)]);
    }

    #[test]
    fn can_modify_requires_authorship() {
        let mut feed = CommentFeed::new(5);
        feed.threads = assemble(vec![comment(1, None, 0)]);
        assert!(feed.can_modify(1, 7));
        assert!(!feed.can_modify(1, 8));
        assert!(!feed.can_modify(99, 7));
    }
}
