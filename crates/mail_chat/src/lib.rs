//! Q&A chat over a mail assistant's stored email.
//!
//! ## Backend bootstrap
//!
//! The backend is chosen at startup from, in increasing precedence: built-in defaults, an
//! optional JSON config file, environment variables, and command-line flags.
//!
//! - `MAIL_CHAT_BACKEND=http` (default) talks to the mail-assistant API at
//!   `MAIL_CHAT_BASE_URL` (default `http://localhost:8000`).
//! - `MAIL_CHAT_BACKEND=mock` answers from a deterministic in-memory mailbox.
//!
//! The config file is named by `--config` or `MAIL_CHAT_CONFIG_PATH`:
//!
//! ```json
//! {
//!   "backend": "http",
//!   "base_url": "http://localhost:8000",
//!   "timeout_secs": 30
//! }
//! ```
//!
//! Every field is optional, blank strings are rejected, `timeout_secs` must be > 0 and unknown
//! fields are rejected.
//!
//! ## Conversation contract
//!
//! At most one answer request is outstanding. Each request carries the question plus every
//! earlier turn as role/content pairs; citations are display-only and never sent back.
//! Responses for superseded request ids are dropped.
//!
//! Logs go to `MAIL_CHAT_LOG_FILE` (default: `mail_chat.log` in the temp directory), filtered
//! by `MAIL_CHAT_LOG`.

pub mod app;
pub mod backends;
pub mod cli;
pub mod commands;
pub mod config;
pub mod format;
pub mod headless;
pub mod logging;
pub mod runtime;
pub mod scroll;
pub mod tui;
