//! Transport-only client for the mail assistant REST API.
//!
//! This crate owns request building, response decoding and error mapping for the
//! backend endpoints (`/chat`, `/emails`, `/categories`). It contains no
//! conversation state and no runtime UI coupling; callers drive the async client
//! from whatever executor they own.
//!
//! Requests are never retried here. A failed `/chat` call surfaces as a single
//! [`MailApiError`] and the caller decides what the user sees.

pub mod client;
pub mod config;
pub mod error;
pub mod payload;
pub mod url;

pub use client::MailApiClient;
pub use config::MailApiConfig;
pub use error::MailApiError;
pub use payload::{
    CategoryChange, CategoryCreate, CategoryRecord, ChatHistoryEntry, ChatRequest, ChatResponse,
    ChatRole, EmailCreate, EmailListQuery, EmailRecord, SourceRecord,
};
pub use url::{endpoint_url, normalize_base_url, DEFAULT_MAIL_API_BASE_URL};
