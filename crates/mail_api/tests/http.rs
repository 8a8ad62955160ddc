use mail_api::{
    CategoryCreate, ChatHistoryEntry, ChatRequest, ChatRole, EmailCreate, EmailListQuery, MailApiClient,
    MailApiConfig, MailApiError,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn client() -> MailApiClient {
    MailApiClient::new(MailApiConfig::new("http://localhost:8000/")).expect("client")
}

fn body_json(request: &reqwest::Request) -> serde_json::Value {
    let bytes = request
        .body()
        .and_then(|body| body.as_bytes())
        .expect("buffered request body");
    serde_json::from_slice(bytes).expect("json body")
}

#[test]
fn chat_request_posts_question_and_history_without_sources() {
    let request = ChatRequest::new(
        "마감일이 언제야?",
        vec![
            ChatHistoryEntry::new(ChatRole::User, "HR 관련 메일 요약해줘"),
            ChatHistoryEntry::new(ChatRole::Assistant, "HR 메일은 두 건입니다."),
        ],
    );

    let http_request = client()
        .build_chat_request(&request)
        .expect("build request")
        .build()
        .expect("request");

    assert_eq!(http_request.method(), "POST");
    assert_eq!(http_request.url().as_str(), "http://localhost:8000/chat");
    assert_eq!(
        body_json(&http_request),
        json!({
            "question": "마감일이 언제야?",
            "chat_history": [
                {"role": "user", "content": "HR 관련 메일 요약해줘"},
                {"role": "assistant", "content": "HR 메일은 두 건입니다."}
            ]
        })
    );
}

#[test]
fn chat_request_rejects_blank_question() {
    let error = client()
        .build_chat_request(&ChatRequest::new("  ", Vec::new()))
        .expect_err("blank question must be rejected");
    assert!(matches!(error, MailApiError::InvalidInput(_)));
}

#[test]
fn create_email_omits_missing_optional_fields() {
    let email = EmailCreate {
        body: "다음 주 월요일 회의".to_string(),
        sender: Some("kim@example.com".to_string()),
        subject: None,
    };

    let http_request = client()
        .build_create_email_request(&email)
        .expect("build request")
        .build()
        .expect("request");

    assert_eq!(http_request.method(), "POST");
    assert_eq!(http_request.url().path(), "/emails");
    assert_eq!(
        body_json(&http_request),
        json!({"body": "다음 주 월요일 회의", "sender": "kim@example.com"})
    );
}

#[test]
fn list_emails_encodes_category_limit_and_offset() {
    let query = EmailListQuery {
        category: Some("HR/인사".to_string()),
        limit: 20,
        offset: 40,
    };

    let http_request = client()
        .build_list_emails_request(&query)
        .expect("build request")
        .build()
        .expect("request");

    assert_eq!(http_request.method(), "GET");
    assert_eq!(http_request.url().path(), "/emails");
    let pairs: Vec<(String, String)> = http_request
        .url()
        .query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("category".to_string(), "HR/인사".to_string()),
            ("limit".to_string(), "20".to_string()),
            ("offset".to_string(), "40".to_string()),
        ]
    );
}

#[test]
fn list_emails_rejects_out_of_range_limit() {
    let query = EmailListQuery {
        limit: 201,
        ..EmailListQuery::default()
    };
    let error = client()
        .build_list_emails_request(&query)
        .expect_err("limit above 200 must be rejected");
    assert!(matches!(error, MailApiError::InvalidInput(_)));
}

#[test]
fn email_management_requests_target_email_paths() {
    let client = client();

    let get = client.build_get_email_request(7).build().expect("get");
    assert_eq!(get.method(), "GET");
    assert_eq!(get.url().as_str(), "http://localhost:8000/emails/7");

    let put = client
        .build_update_category_request(7, " 일정 ")
        .expect("put")
        .build()
        .expect("put request");
    assert_eq!(put.method(), "PUT");
    assert_eq!(put.url().path(), "/emails/7/category");
    assert_eq!(
        put.url().query_pairs().next().map(|(k, v)| (k.into_owned(), v.into_owned())),
        Some(("category".to_string(), "일정".to_string()))
    );

    let delete = client.build_delete_email_request(7).build().expect("delete");
    assert_eq!(delete.method(), "DELETE");
    assert_eq!(delete.url().path(), "/emails/7");

    let categories = client.build_list_categories_request().build().expect("categories");
    assert_eq!(categories.url().as_str(), "http://localhost:8000/categories");
}

#[test]
fn client_rejects_unparseable_base_url() {
    let error = MailApiClient::new(MailApiConfig::new("not a url")).expect_err("invalid base");
    assert!(matches!(error, MailApiError::InvalidBaseUrl(_)));
}

#[test]
fn category_management_requests_target_category_paths() {
    let client = client();

    let create = client
        .build_create_category_request(&CategoryCreate::new(" 교육 ").with_description("  "))
        .expect("create")
        .build()
        .expect("create request");
    assert_eq!(create.method(), "POST");
    assert_eq!(create.url().as_str(), "http://localhost:8000/categories");
    assert_eq!(body_json(&create), json!({"name": "교육"}));

    let rename = client
        .build_update_category_name_request(3, &CategoryCreate::new("회의"))
        .expect("rename")
        .build()
        .expect("rename request");
    assert_eq!(rename.method(), "PUT");
    assert_eq!(rename.url().path(), "/categories/3");
    assert_eq!(body_json(&rename), json!({"name": "회의"}));

    let delete = client.build_delete_category_request(3).build().expect("delete");
    assert_eq!(delete.method(), "DELETE");
    assert_eq!(delete.url().path(), "/categories/3");
}

#[test]
fn category_requests_reject_blank_names() {
    let client = client();
    assert!(matches!(
        client.build_create_category_request(&CategoryCreate::new("   ")),
        Err(MailApiError::InvalidInput(_))
    ));
    assert!(matches!(
        client.build_update_category_name_request(2, &CategoryCreate::new("")),
        Err(MailApiError::InvalidInput(_))
    ));
}
