use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// One card on the board: a failure under triage or a test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardItem {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Column id the item currently occupies.
    pub status: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// For failures: the test case this failure was recorded against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_case_id: Option<i64>,
    #[serde(default)]
    pub kind: ItemKind,
}

impl BoardItem {
    /// The test case this card's comment thread is attached to.
    pub fn comment_target(&self) -> Option<i64> {
        match self.kind {
            ItemKind::Failure => self.test_case_id,
            ItemKind::ManualCase | ItemKind::AutomatedCase => self.id.parse().ok(),
        }
    }
}

/// The backend serves ids as numbers for some resources and strings for others.
fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(i64),
        Str(String),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Num(n) => n.to_string(),
        Raw::Str(s) => s,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    Failure,
    ManualCase,
    AutomatedCase,
}

impl ItemKind {
    pub fn badge(&self) -> &'static str {
        match self {
            ItemKind::Failure => "FAIL",
            ItemKind::ManualCase => "CASE",
            ItemKind::AutomatedCase => "AUTO",
        }
    }
}

impl Default for ItemKind {
    fn default() -> Self {
        ItemKind::Failure
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Failure => f.write_str("failure"),
            ItemKind::ManualCase => f.write_str("manual case"),
            ItemKind::AutomatedCase => f.write_str("automated case"),
        }
    }
}
