use std::sync::Arc;

use mail_backend::{BackendInitError, MailBackend};
use mail_backend_http::{HttpBackend, HttpBackendConfig, HTTP_BACKEND_ID};
use mail_backend_mock::{MockBackend, MOCK_BACKEND_ID};

use crate::config::ChatConfig;

pub const AVAILABLE_BACKENDS: [&str; 2] = [HTTP_BACKEND_ID, MOCK_BACKEND_ID];

/// Builds the backend named by `config.backend`.
pub fn backend_for_config(config: &ChatConfig) -> Result<Arc<dyn MailBackend>, BackendInitError> {
    match config.backend.as_str() {
        HTTP_BACKEND_ID => {
            let http_config = HttpBackendConfig::new()
                .with_base_url(config.base_url.clone())
                .with_timeout(config.timeout)
                .with_user_agent(concat!("mail-chat/", env!("CARGO_PKG_VERSION")));
            Ok(Arc::new(HttpBackend::new(http_config)?))
        }
        MOCK_BACKEND_ID => Ok(Arc::new(MockBackend::default())),
        unknown => Err(BackendInitError::new(format!(
            "Unsupported backend '{unknown}'. Available backends: {}",
            AVAILABLE_BACKENDS.join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(backend: &str) -> ChatConfig {
        ChatConfig {
            backend: backend.to_string(),
            ..ChatConfig::default()
        }
    }

    #[test]
    fn backend_for_config_supports_mock() {
        let backend = backend_for_config(&config("mock")).expect("mock backend should resolve");
        assert_eq!(backend.profile().backend_id, "mock");
    }

    #[test]
    fn backend_for_config_builds_http_backend_for_base_url() {
        let backend = backend_for_config(&ChatConfig {
            base_url: "http://127.0.0.1:9/".to_string(),
            ..config("http")
        })
        .expect("http backend should resolve");
        let profile = backend.profile();
        assert_eq!(profile.backend_id, "http");
        assert!(profile
            .endpoint
            .as_deref()
            .is_some_and(|endpoint| endpoint.starts_with("http://127.0.0.1:9")));
    }

    #[test]
    fn backend_for_config_rejects_unknown_backend() {
        let error = match backend_for_config(&config("imap")) {
            Ok(_) => panic!("unknown backends should fail"),
            Err(error) => error,
        };

        assert!(error.message().contains("Unsupported backend 'imap'"));
        assert!(error.message().contains("http, mock"));
    }
}
