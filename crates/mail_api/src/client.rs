use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::config::MailApiConfig;
use crate::error::{parse_error_message, MailApiError};
use crate::payload::{
    CategoryChange, CategoryCreate, CategoryRecord, ChatHistoryEntry, ChatRequest, ChatResponse, EmailCreate,
    EmailListQuery, EmailRecord, MAX_LIST_LIMIT,
};
use crate::url::{endpoint_url, normalize_base_url};

#[derive(Debug)]
pub struct MailApiClient {
    http: Client,
    config: MailApiConfig,
    base_url: String,
}

impl MailApiClient {
    pub fn new(config: MailApiConfig) -> Result<Self, MailApiError> {
        let base_url = normalize_base_url(&config.base_url);
        Url::parse(&base_url).map_err(|error| {
            MailApiError::InvalidBaseUrl(format!("{base_url}: {error}"))
        })?;

        let mut builder = Client::builder().user_agent(config.resolved_user_agent().to_string());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(MailApiError::from)?;

        Ok(Self {
            http,
            config,
            base_url,
        })
    }

    pub fn config(&self) -> &MailApiConfig {
        &self.config
    }

    /// Normalized base URL all endpoints are joined onto.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        endpoint_url(&self.base_url, path)
    }

    pub fn build_chat_request(&self, request: &ChatRequest) -> Result<RequestBuilder, MailApiError> {
        if request.question.trim().is_empty() {
            return Err(MailApiError::InvalidInput(
                "question must not be blank".to_string(),
            ));
        }
        Ok(self.http.post(self.endpoint("chat")).json(request))
    }

    pub fn build_create_email_request(
        &self,
        email: &EmailCreate,
    ) -> Result<RequestBuilder, MailApiError> {
        if email.body.trim().is_empty() {
            return Err(MailApiError::InvalidInput(
                "email body must not be blank".to_string(),
            ));
        }
        Ok(self.http.post(self.endpoint("emails")).json(email))
    }

    pub fn build_list_emails_request(
        &self,
        query: &EmailListQuery,
    ) -> Result<RequestBuilder, MailApiError> {
        if query.limit == 0 || query.limit > MAX_LIST_LIMIT {
            return Err(MailApiError::InvalidInput(format!(
                "limit must be between 1 and {MAX_LIST_LIMIT}, got {}",
                query.limit
            )));
        }
        Ok(self
            .http
            .get(self.endpoint("emails"))
            .query(&query.query_pairs()))
    }

    pub fn build_get_email_request(&self, email_id: i64) -> RequestBuilder {
        self.http.get(self.endpoint(&format!("emails/{email_id}")))
    }

    pub fn build_update_category_request(
        &self,
        email_id: i64,
        category: &str,
    ) -> Result<RequestBuilder, MailApiError> {
        let category = category.trim();
        if category.is_empty() {
            return Err(MailApiError::InvalidInput(
                "category must not be blank".to_string(),
            ));
        }
        Ok(self
            .http
            .put(self.endpoint(&format!("emails/{email_id}/category")))
            .query(&[("category", category)]))
    }

    pub fn build_delete_email_request(&self, email_id: i64) -> RequestBuilder {
        self.http
            .delete(self.endpoint(&format!("emails/{email_id}")))
    }

    pub fn build_list_categories_request(&self) -> RequestBuilder {
        self.http.get(self.endpoint("categories"))
    }

    /// `POST /categories`. The backend answers 409 when the name is taken.
    pub fn build_create_category_request(
        &self,
        category: &CategoryCreate,
    ) -> Result<RequestBuilder, MailApiError> {
        let category = category.validated()?;
        Ok(self.http.post(self.endpoint("categories")).json(&category))
    }

    /// `PUT /categories/{id}`. Only the name changes; the uncategorized bucket is refused with 400.
    pub fn build_update_category_name_request(
        &self,
        category_id: i64,
        category: &CategoryCreate,
    ) -> Result<RequestBuilder, MailApiError> {
        let category = category.validated()?;
        Ok(self
            .http
            .put(self.endpoint(&format!("categories/{category_id}")))
            .json(&category))
    }

    pub fn build_delete_category_request(&self, category_id: i64) -> RequestBuilder {
        self.http
            .delete(self.endpoint(&format!("categories/{category_id}")))
    }

    /// `POST /chat`: answer `question` given the prior transcript.
    pub async fn ask_question(
        &self,
        question: &str,
        chat_history: &[ChatHistoryEntry],
    ) -> Result<ChatResponse, MailApiError> {
        let request = ChatRequest::new(question, chat_history.to_vec());
        self.send_json(self.build_chat_request(&request)?).await
    }

    /// `POST /emails`: categorize, summarize and store one email.
    pub async fn create_email(&self, email: &EmailCreate) -> Result<EmailRecord, MailApiError> {
        self.send_json(self.build_create_email_request(email)?)
            .await
    }

    pub async fn list_emails(
        &self,
        query: &EmailListQuery,
    ) -> Result<Vec<EmailRecord>, MailApiError> {
        self.send_json(self.build_list_emails_request(query)?)
            .await
    }

    pub async fn get_email(&self, email_id: i64) -> Result<EmailRecord, MailApiError> {
        self.send_json(self.build_get_email_request(email_id))
            .await
    }

    pub async fn update_email_category(
        &self,
        email_id: i64,
        category: &str,
    ) -> Result<CategoryChange, MailApiError> {
        self.send_json(self.build_update_category_request(email_id, category)?)
            .await
    }

    pub async fn delete_email(&self, email_id: i64) -> Result<(), MailApiError> {
        self.send_empty(self.build_delete_email_request(email_id))
            .await
    }

    pub async fn list_categories(&self) -> Result<Vec<CategoryRecord>, MailApiError> {
        self.send_json(self.build_list_categories_request())
            .await
    }

    pub async fn create_category(
        &self,
        category: &CategoryCreate,
    ) -> Result<CategoryRecord, MailApiError> {
        self.send_json(self.build_create_category_request(category)?)
            .await
    }

    pub async fn update_category_name(
        &self,
        category_id: i64,
        category: &CategoryCreate,
    ) -> Result<CategoryRecord, MailApiError> {
        self.send_json(self.build_update_category_name_request(category_id, category)?)
            .await
    }

    /// `DELETE /categories/{id}`: emails in the category move to the uncategorized bucket.
    pub async fn delete_category(&self, category_id: i64) -> Result<(), MailApiError> {
        self.send_empty(self.build_delete_category_request(category_id))
            .await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, MailApiError> {
        let body = self.send_checked(request).await?;
        serde_json::from_str(&body).map_err(MailApiError::from)
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), MailApiError> {
        self.send_checked(request).await.map(|_| ())
    }

    async fn send_checked(&self, request: RequestBuilder) -> Result<String, MailApiError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.text().await?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(MailApiError::Status {
            status,
            message: parse_error_message(status, &body),
        })
    }
}
