use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wire record for a comment as the backend stores it. `parent_id` is set for
/// replies; the schema permits arbitrary nesting but only two levels render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub author_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    pub test_case_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }

    pub fn was_edited(&self) -> bool {
        self.updated_at > self.created_at
    }
}

/// Body for `POST /comments`. The server fills in the author from the session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub content: String,
    pub test_case_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn new_comment_omits_absent_parent() {
        let draft = NewComment {
            content: "looks broken on staging".into(),
            test_case_id: 5,
            parent_id: None,
        };
        let json = serde_json::to_string(&draft).unwrap();
        assert!(json.contains("testCaseId"));
        assert!(!json.contains("parentId"));

        let reply = NewComment {
            parent_id: Some(3),
            ..draft
        };
        assert!(serde_json::to_string(&reply).unwrap().contains("\"parentId\":3"));
    }

    #[test]
    fn edited_flag_tracks_updated_at() {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut comment = Comment {
            id: 1,
            content: "first".into(),
            author_id: 7,
            author_name: None,
            parent_id: None,
            test_case_id: 5,
            created_at: created,
            updated_at: created,
        };
        assert!(!comment.was_edited());
        comment.updated_at = created + chrono::Duration::minutes(2);
        assert!(comment.was_edited());
    }
}
