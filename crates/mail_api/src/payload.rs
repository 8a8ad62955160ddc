use serde::{Deserialize, Serialize};

use crate::error::MailApiError;

/// Default page size for `GET /emails`.
pub const DEFAULT_LIST_LIMIT: u32 = 50;

/// Largest page size the backend accepts for `GET /emails`.
pub const MAX_LIST_LIMIT: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One prior turn in a `/chat` request. Only role and content travel on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHistoryEntry {
    pub role: ChatRole,
    pub content: String,
}

impl ChatHistoryEntry {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub question: String,
    pub chat_history: Vec<ChatHistoryEntry>,
}

impl ChatRequest {
    pub fn new(question: impl Into<String>, chat_history: Vec<ChatHistoryEntry>) -> Self {
        Self {
            question: question.into(),
            chat_history,
        }
    }
}

/// Cited email inside a `/chat` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub email_id: i64,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// Body of a successful `/chat` response.
///
/// `sources` is authoritative; `source_ids` is kept only for wire fidelity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    #[serde(default)]
    pub source_ids: Vec<i64>,
    #[serde(default)]
    pub sources: Vec<SourceRecord>,
}

/// Body of `POST /emails`. Absent optional fields are omitted, not sent as null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailCreate {
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecord {
    pub id: i64,
    pub body: String,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    pub category: String,
    #[serde(default)]
    pub summary: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `POST /categories` and `PUT /categories/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CategoryCreate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Trimmed copy; blank names are rejected and blank descriptions dropped.
    pub(crate) fn validated(&self) -> Result<Self, MailApiError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(MailApiError::InvalidInput(
                "category name must not be blank".to_string(),
            ));
        }
        Ok(Self {
            name: name.to_string(),
            description: self
                .description
                .as_deref()
                .map(str::trim)
                .filter(|description| !description.is_empty())
                .map(str::to_string),
        })
    }
}

/// Body of a successful `PUT /emails/{id}/category` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryChange {
    pub id: i64,
    pub category: String,
}

/// Query string of `GET /emails`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailListQuery {
    pub category: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for EmailListQuery {
    fn default() -> Self {
        Self {
            category: None,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

impl EmailListQuery {
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(category) = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|category| !category.is_empty())
        {
            pairs.push(("category", category.to_string()));
        }
        pairs.push(("limit", self.limit.to_string()));
        pairs.push(("offset", self.offset.to_string()));
        pairs
    }
}
