//! `mail_api`-backed implementation of the shared `mail_backend` contract.
//!
//! The chat runtime calls backends from plain worker threads, so this adapter
//! drives the async client on a short-lived current-thread tokio runtime per
//! call and maps wire records onto the contract types.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use mail_api::{
    CategoryCreate, CategoryRecord, ChatHistoryEntry, ChatRequest, ChatResponse, ChatRole,
    EmailCreate, EmailListQuery, MailApiClient, MailApiConfig, MailApiError, SourceRecord,
};
use mail_backend::{
    Answer, AnswerRequest, BackendInitError, BackendProfile, Category, CategoryId, ChatTurn,
    EmailId, EmailQuery, EmailRecord, Evidence, MailBackend, NewEmail, Role,
};
use tracing::debug;

/// Stable backend identifier used by `mail_chat` startup selection.
pub const HTTP_BACKEND_ID: &str = "http";

/// Runtime configuration for the HTTP backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpBackendConfig {
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub user_agent: Option<String>,
}

impl HttpBackendConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    fn into_mail_api_config(self) -> MailApiConfig {
        let mut config = MailApiConfig::default();

        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }

        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }

        if let Some(user_agent) = self.user_agent {
            config = config.with_user_agent(user_agent);
        }

        config
    }
}

#[derive(Debug, thiserror::Error)]
enum TransportError {
    #[error(transparent)]
    Api(#[from] MailApiError),
    #[error("failed to initialize tokio runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

trait Transport: Send + Sync {
    fn ask(&self, request: &ChatRequest) -> Result<ChatResponse, TransportError>;
    fn create_email(&self, email: &EmailCreate) -> Result<mail_api::EmailRecord, TransportError>;
    fn list_emails(
        &self,
        query: &EmailListQuery,
    ) -> Result<Vec<mail_api::EmailRecord>, TransportError>;
    fn get_email(&self, email_id: i64) -> Result<mail_api::EmailRecord, TransportError>;
    fn update_category(&self, email_id: i64, category: &str) -> Result<(), TransportError>;
    fn delete_email(&self, email_id: i64) -> Result<(), TransportError>;
    fn list_categories(&self) -> Result<Vec<CategoryRecord>, TransportError>;
    fn create_category(&self, category: &CategoryCreate) -> Result<CategoryRecord, TransportError>;
    fn rename_category(
        &self,
        category_id: i64,
        category: &CategoryCreate,
    ) -> Result<CategoryRecord, TransportError>;
    fn delete_category(&self, category_id: i64) -> Result<(), TransportError>;
}

#[derive(Debug)]
struct DefaultTransport {
    client: MailApiClient,
}

impl DefaultTransport {
    fn block_on<F, T>(&self, future: F) -> Result<T, TransportError>
    where
        F: Future<Output = Result<T, MailApiError>>,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(runtime.block_on(future)?)
    }
}

impl Transport for DefaultTransport {
    fn ask(&self, request: &ChatRequest) -> Result<ChatResponse, TransportError> {
        self.block_on(
            self.client
                .ask_question(&request.question, &request.chat_history),
        )
    }

    fn create_email(&self, email: &EmailCreate) -> Result<mail_api::EmailRecord, TransportError> {
        self.block_on(self.client.create_email(email))
    }

    fn list_emails(
        &self,
        query: &EmailListQuery,
    ) -> Result<Vec<mail_api::EmailRecord>, TransportError> {
        self.block_on(self.client.list_emails(query))
    }

    fn get_email(&self, email_id: i64) -> Result<mail_api::EmailRecord, TransportError> {
        self.block_on(self.client.get_email(email_id))
    }

    fn update_category(&self, email_id: i64, category: &str) -> Result<(), TransportError> {
        self.block_on(self.client.update_email_category(email_id, category))
            .map(|_| ())
    }

    fn delete_email(&self, email_id: i64) -> Result<(), TransportError> {
        self.block_on(self.client.delete_email(email_id))
    }

    fn list_categories(&self) -> Result<Vec<CategoryRecord>, TransportError> {
        self.block_on(self.client.list_categories())
    }

    fn create_category(
        &self,
        category: &CategoryCreate,
    ) -> Result<CategoryRecord, TransportError> {
        self.block_on(self.client.create_category(category))
    }

    fn rename_category(
        &self,
        category_id: i64,
        category: &CategoryCreate,
    ) -> Result<CategoryRecord, TransportError> {
        self.block_on(self.client.update_category_name(category_id, category))
    }

    fn delete_category(&self, category_id: i64) -> Result<(), TransportError> {
        self.block_on(self.client.delete_category(category_id))
    }
}

/// `MailBackend` adapter backed by `mail_api` transport primitives.
pub struct HttpBackend {
    endpoint: String,
    transport: Arc<dyn Transport>,
}

impl HttpBackend {
    /// Creates a backend using real HTTP transport.
    pub fn new(config: HttpBackendConfig) -> Result<Self, BackendInitError> {
        let client = MailApiClient::new(config.into_mail_api_config()).map_err(map_init_error)?;

        Ok(Self {
            endpoint: client.base_url().to_string(),
            transport: Arc::new(DefaultTransport { client }),
        })
    }

    #[cfg(test)]
    fn with_transport_for_tests(transport: Arc<dyn Transport>) -> Self {
        Self {
            endpoint: "http://test.invalid".to_string(),
            transport,
        }
    }
}

impl MailBackend for HttpBackend {
    fn profile(&self) -> BackendProfile {
        BackendProfile {
            backend_id: HTTP_BACKEND_ID.to_string(),
            endpoint: Some(self.endpoint.clone()),
        }
    }

    fn ask(&self, request: AnswerRequest) -> Result<Answer, String> {
        debug!(
            request_id = request.request_id,
            history_len = request.chat_history.len(),
            "sending chat request"
        );
        let payload = ChatRequest::new(
            request.question,
            request.chat_history.iter().map(history_entry).collect(),
        );

        self.transport
            .ask(&payload)
            .map(answer_from_response)
            .map_err(|error| format!("mail API request failed: {error}"))
    }

    fn categories(&self) -> Result<Vec<Category>, String> {
        self.transport
            .list_categories()
            .map(|categories| categories.into_iter().map(category_from_record).collect())
            .map_err(|error| format!("failed to list categories: {error}"))
    }

    fn emails(&self, query: &EmailQuery) -> Result<Vec<EmailRecord>, String> {
        let query = EmailListQuery {
            category: query.category.clone(),
            limit: query.limit,
            offset: query.offset,
        };
        self.transport
            .list_emails(&query)
            .map(|emails| emails.into_iter().map(email_from_record).collect())
            .map_err(|error| format!("failed to list emails: {error}"))
    }

    fn email(&self, id: EmailId) -> Result<EmailRecord, String> {
        self.transport
            .get_email(id)
            .map(email_from_record)
            .map_err(|error| format!("failed to load email {id}: {error}"))
    }

    fn ingest(&self, email: NewEmail) -> Result<EmailRecord, String> {
        let payload = EmailCreate {
            body: email.body,
            sender: email.sender,
            subject: email.subject,
        };
        self.transport
            .create_email(&payload)
            .map(email_from_record)
            .map_err(|error| format!("failed to ingest email: {error}"))
    }

    fn recategorize(&self, id: EmailId, category: &str) -> Result<(), String> {
        self.transport
            .update_category(id, category)
            .map_err(|error| format!("failed to change category of email {id}: {error}"))
    }

    fn delete(&self, id: EmailId) -> Result<(), String> {
        self.transport
            .delete_email(id)
            .map_err(|error| format!("failed to delete email {id}: {error}"))
    }

    fn add_category(&self, name: &str, description: Option<&str>) -> Result<Category, String> {
        let mut payload = CategoryCreate::new(name);
        if let Some(description) = description {
            payload = payload.with_description(description);
        }
        self.transport
            .create_category(&payload)
            .map(category_from_record)
            .map_err(|error| format!("failed to add category: {error}"))
    }

    fn rename_category(&self, id: CategoryId, name: &str) -> Result<Category, String> {
        self.transport
            .rename_category(id, &CategoryCreate::new(name))
            .map(category_from_record)
            .map_err(|error| format!("failed to rename category {id}: {error}"))
    }

    fn delete_category(&self, id: CategoryId) -> Result<(), String> {
        self.transport
            .delete_category(id)
            .map_err(|error| format!("failed to delete category {id}: {error}"))
    }
}

fn history_entry(turn: &ChatTurn) -> ChatHistoryEntry {
    let role = match turn.role {
        Role::User => ChatRole::User,
        Role::Assistant => ChatRole::Assistant,
    };
    ChatHistoryEntry::new(role, turn.content.clone())
}

/// `sources` is authoritative; `source_ids` is not consulted.
fn answer_from_response(response: ChatResponse) -> Answer {
    Answer {
        answer: response.answer,
        sources: response.sources.into_iter().map(evidence_from_source).collect(),
    }
}

fn evidence_from_source(source: SourceRecord) -> Evidence {
    Evidence {
        email_id: source.email_id,
        sender: source.sender,
        subject: source.subject,
        summary: source.summary.unwrap_or_default(),
    }
}

fn email_from_record(record: mail_api::EmailRecord) -> EmailRecord {
    EmailRecord {
        id: record.id,
        body: record.body,
        sender: record.sender,
        subject: record.subject,
        category: record.category,
        summary: record.summary,
        created_at: record.created_at,
    }
}

fn category_from_record(record: CategoryRecord) -> Category {
    Category {
        id: record.id,
        name: record.name,
        description: record.description,
    }
}

fn map_init_error(error: MailApiError) -> BackendInitError {
    BackendInitError::new(format!("Failed to initialize http backend: {error}"))
}
