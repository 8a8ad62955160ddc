use reqwest::StatusCode;

use mail_api::error::parse_error_message;
use mail_api::MailApiError;

#[test]
fn parse_error_message_uses_detail_string() {
    let body = r#"{"detail":"메일을 찾을 수 없습니다."}"#;
    let message = parse_error_message(StatusCode::NOT_FOUND, body);
    assert_eq!(message, "메일을 찾을 수 없습니다.");
}

#[test]
fn parse_error_message_joins_validation_messages() {
    let body = r#"{"detail":[{"loc":["query","limit"],"msg":"ensure this value is less than or equal to 200","type":"value_error"},{"loc":["query","offset"],"msg":"must be non-negative"}]}"#;
    let message = parse_error_message(StatusCode::UNPROCESSABLE_ENTITY, body);
    assert_eq!(
        message,
        "ensure this value is less than or equal to 200; must be non-negative"
    );
}

#[test]
fn parse_error_message_falls_back_to_raw_body() {
    let message = parse_error_message(StatusCode::BAD_GATEWAY, "upstream down\n");
    assert_eq!(message, "upstream down");
}

#[test]
fn parse_error_message_falls_back_to_reason_phrase_for_empty_body() {
    let message = parse_error_message(StatusCode::SERVICE_UNAVAILABLE, "");
    assert_eq!(message, "Service Unavailable");
}

#[test]
fn status_error_reports_not_found() {
    let error = MailApiError::Status {
        status: StatusCode::NOT_FOUND,
        message: "메일을 찾을 수 없습니다.".to_string(),
    };
    assert!(error.is_not_found());
    assert_eq!(error.to_string(), "HTTP 404 Not Found 메일을 찾을 수 없습니다.");

    let invalid = MailApiError::InvalidInput("blank".to_string());
    assert_eq!(invalid.status(), None);
    assert!(!invalid.is_not_found());
}
