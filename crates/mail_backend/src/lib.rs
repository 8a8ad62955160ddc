//! Backend-agnostic contract for the mail assistant client.
//!
//! This crate defines the records exchanged with a mail-assistant backend and the
//! blocking [`MailBackend`] interface the chat runtime calls from worker threads.
//! It excludes HTTP transport details and conversation state, which live in
//! `mail_api` and `mail_chat` respectively.

use std::fmt;

/// Identifier for one answer or lookup request issued by the client.
pub type RequestId = u64;

/// Stable key of a stored email.
pub type EmailId = i64;

/// Stable key of a category.
pub type CategoryId = i64;

/// Default page size for email listings.
pub const DEFAULT_EMAIL_LIMIT: u32 = 50;

/// Largest page size the backend accepts for email listings.
pub const MAX_EMAIL_LIMIT: u32 = 200;

/// Category assigned by the backend when nothing else fits.
pub const UNCATEGORIZED: &str = "미분류";

/// Rendered in place of a missing or blank sender.
pub const NO_SENDER_PLACEHOLDER: &str = "(발신자 없음)";

/// Rendered in place of a missing or blank subject.
pub const NO_SUBJECT_PLACEHOLDER: &str = "(제목 없음)";

/// Error returned while selecting/configuring a backend before any request starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendInitError {
    message: String,
}

impl BackendInitError {
    /// Creates a new backend initialization error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the underlying error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for BackendInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for BackendInitError {}

impl From<String> for BackendInitError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for BackendInitError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Author of a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Wire name used in `chat_history` payloads.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Prior-turn entry sent as chat history. Carries no evidence by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// One cited email backing an assistant answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evidence {
    pub email_id: EmailId,
    pub sender: Option<String>,
    pub subject: Option<String>,
    pub summary: String,
}

impl Evidence {
    /// Sender for display, falling back to [`NO_SENDER_PLACEHOLDER`].
    #[must_use]
    pub fn sender_label(&self) -> &str {
        display_or(self.sender.as_deref(), NO_SENDER_PLACEHOLDER)
    }

    /// Subject for display, falling back to [`NO_SUBJECT_PLACEHOLDER`].
    #[must_use]
    pub fn subject_label(&self) -> &str {
        display_or(self.subject.as_deref(), NO_SUBJECT_PLACEHOLDER)
    }
}

/// Input required to ask one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRequest {
    pub request_id: RequestId,
    pub question: String,
    pub chat_history: Vec<ChatTurn>,
}

/// Answer text plus the evidence the backend cited for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<Evidence>,
}

/// Lifecycle event for one answer request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerEvent {
    Started { request_id: RequestId },
    Answered { request_id: RequestId, answer: Answer },
    Failed { request_id: RequestId, error: String },
}

impl AnswerEvent {
    /// Returns the request identifier associated with this event.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        match self {
            Self::Started { request_id }
            | Self::Answered { request_id, .. }
            | Self::Failed { request_id, .. } => *request_id,
        }
    }

    /// Returns true when this event terminates the request lifecycle.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Answered { .. } | Self::Failed { .. })
    }
}

/// A stored, categorized email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailRecord {
    pub id: EmailId,
    pub body: String,
    pub sender: Option<String>,
    pub subject: Option<String>,
    pub category: String,
    pub summary: String,
    pub created_at: String,
}

impl EmailRecord {
    #[must_use]
    pub fn sender_label(&self) -> &str {
        display_or(self.sender.as_deref(), NO_SENDER_PLACEHOLDER)
    }

    #[must_use]
    pub fn subject_label(&self) -> &str {
        display_or(self.subject.as_deref(), NO_SUBJECT_PLACEHOLDER)
    }
}

/// Email text submitted for ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewEmail {
    pub body: String,
    pub sender: Option<String>,
    pub subject: Option<String>,
}

impl NewEmail {
    #[must_use]
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            sender: None,
            subject: None,
        }
    }

    /// Sets the sender. Blank values are dropped.
    #[must_use]
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = non_blank(sender.into());
        self
    }

    /// Sets the subject. Blank values are dropped.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = non_blank(subject.into());
        self
    }

    /// Returns true when the body has no visible content.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.body.trim().is_empty()
    }
}

/// Filter and page window for email listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailQuery {
    pub category: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for EmailQuery {
    fn default() -> Self {
        Self {
            category: None,
            limit: DEFAULT_EMAIL_LIMIT,
            offset: 0,
        }
    }
}

impl EmailQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the listing to one category. Blank values clear the filter.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = non_blank(category.into());
        self
    }

    /// Sets the page size, clamped to `1..=MAX_EMAIL_LIMIT`.
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(1, MAX_EMAIL_LIMIT);
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }
}

/// Category known to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

/// Immutable metadata describing a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendProfile {
    pub backend_id: String,
    pub endpoint: Option<String>,
}

/// Blocking backend interface. Calls run on worker threads, never on the UI thread.
pub trait MailBackend: Send + Sync + 'static {
    /// Returns backend identity metadata.
    fn profile(&self) -> BackendProfile;

    /// Answers one question given the prior transcript.
    ///
    /// Any error is opaque to the caller; the conversation treats every failure alike.
    fn ask(&self, request: AnswerRequest) -> Result<Answer, String>;

    /// Lists known categories.
    fn categories(&self) -> Result<Vec<Category>, String>;

    /// Lists stored emails, newest first.
    fn emails(&self, query: &EmailQuery) -> Result<Vec<EmailRecord>, String>;

    /// Fetches one stored email.
    fn email(&self, id: EmailId) -> Result<EmailRecord, String>;

    /// Submits an email for categorization, summarization and storage.
    fn ingest(&self, email: NewEmail) -> Result<EmailRecord, String>;

    /// Moves an email to another category.
    ///
    /// Backends may return an error when manual categorization is unsupported.
    fn recategorize(&self, _id: EmailId, _category: &str) -> Result<(), String> {
        Err("Changing categories is not supported by this backend".to_string())
    }

    /// Deletes a stored email.
    ///
    /// Backends may return an error when deletion is unsupported.
    fn delete(&self, _id: EmailId) -> Result<(), String> {
        Err("Deleting emails is not supported by this backend".to_string())
    }

    /// Adds a category. Names are unique.
    fn add_category(&self, _name: &str, _description: Option<&str>) -> Result<Category, String> {
        Err(CATEGORY_MANAGEMENT_UNSUPPORTED.to_string())
    }

    /// Renames a category. The [`UNCATEGORIZED`] bucket cannot be renamed.
    fn rename_category(&self, _id: CategoryId, _name: &str) -> Result<Category, String> {
        Err(CATEGORY_MANAGEMENT_UNSUPPORTED.to_string())
    }

    /// Deletes a category and moves its emails to [`UNCATEGORIZED`], which itself cannot be
    /// deleted.
    fn delete_category(&self, _id: CategoryId) -> Result<(), String> {
        Err(CATEGORY_MANAGEMENT_UNSUPPORTED.to_string())
    }
}

const CATEGORY_MANAGEMENT_UNSUPPORTED: &str =
    "Managing categories is not supported by this backend";

fn display_or<'a>(value: Option<&'a str>, placeholder: &'a str) -> &'a str {
    match value {
        Some(value) if !value.trim().is_empty() => value,
        _ => placeholder,
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
