/// Default base URL of a locally running backend.
pub const DEFAULT_MAIL_API_BASE_URL: &str = "http://localhost:8000";

/// Normalize a configured base URL.
///
/// Blank input selects [`DEFAULT_MAIL_API_BASE_URL`]; surrounding whitespace and
/// trailing slashes are removed.
pub fn normalize_base_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_MAIL_API_BASE_URL
    } else {
        input.trim()
    };

    base.trim_end_matches('/').to_string()
}

/// Join an endpoint path onto a base URL with exactly one separating slash.
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        normalize_base_url(base_url),
        path.trim_start_matches('/')
    )
}
