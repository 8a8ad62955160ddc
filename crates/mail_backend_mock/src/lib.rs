//! Deterministic in-memory implementation of the shared `mail_backend` contract.
//!
//! This crate contains no transport logic. It keeps a small fixture mailbox in
//! memory, answers questions by keyword overlap, and is intended for offline
//! development and contract-level integration testing.

use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use mail_backend::{
    Answer, AnswerRequest, BackendProfile, Category, CategoryId, EmailId, EmailQuery, EmailRecord,
    Evidence, MailBackend, NewEmail, UNCATEGORIZED,
};
use time::macros::format_description;
use time::OffsetDateTime;

/// Stable backend identifier used for explicit startup selection.
pub const MOCK_BACKEND_ID: &str = "mock";

const MAX_EVIDENCE: usize = 3;
const EVIDENCE_SUMMARY_CHARS: usize = 200;
const SUMMARY_CHARS: usize = 80;
const MIN_TERM_CHARS: usize = 2;

const CATEGORY_RULES: &[(&str, &[&str])] = &[
    ("HR/인사", &["인사", "연차", "급여", "채용", "연말정산", "hr"]),
    ("프로젝트", &["프로젝트", "마감", "배포", "개발", "보고서"]),
    ("일정", &["회의", "일정", "미팅", "예약"]),
    ("뉴스레터", &["뉴스레터", "구독", "newsletter"]),
    ("공지사항", &["공지", "점검", "안내"]),
];

#[derive(Debug)]
struct Mailbox {
    emails: Vec<EmailRecord>,
    next_id: EmailId,
    categories: Vec<Category>,
}

/// Deterministic mock backend used by `mail_chat` tests and offline runs.
#[derive(Debug)]
pub struct MockBackend {
    mailbox: Mutex<Mailbox>,
    answer_delay: Duration,
    failure: Option<String>,
}

impl MockBackend {
    /// Creates a mock backend over caller-provided emails with no answer delay.
    #[must_use]
    pub fn new(emails: Vec<EmailRecord>) -> Self {
        let next_id = emails.iter().map(|email| email.id).max().unwrap_or(0) + 1;
        Self {
            mailbox: Mutex::new(Mailbox {
                emails,
                next_id,
                categories: default_categories(),
            }),
            answer_delay: Duration::ZERO,
            failure: None,
        }
    }

    /// Creates a mock backend over the built-in fixture mailbox with no answer delay.
    #[must_use]
    pub fn with_fixtures() -> Self {
        Self::new(fixture_emails())
    }

    /// Delays every answer, simulating backend latency.
    #[must_use]
    pub fn with_answer_delay(mut self, delay: Duration) -> Self {
        self.answer_delay = delay;
        self
    }

    /// Makes every answer request fail with `message`.
    #[must_use]
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    const ANSWER_DELAY_MS: u64 = 400;
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::with_fixtures().with_answer_delay(Duration::from_millis(Self::ANSWER_DELAY_MS))
    }
}

impl MailBackend for MockBackend {
    fn profile(&self) -> BackendProfile {
        BackendProfile {
            backend_id: MOCK_BACKEND_ID.to_string(),
            endpoint: None,
        }
    }

    fn ask(&self, request: AnswerRequest) -> Result<Answer, String> {
        if !self.answer_delay.is_zero() {
            thread::sleep(self.answer_delay);
        }
        if let Some(message) = &self.failure {
            return Err(message.clone());
        }

        let terms = query_terms(&request.question);
        let mailbox = lock_unpoisoned(&self.mailbox);
        let mut ranked: Vec<(usize, &EmailRecord)> = mailbox
            .emails
            .iter()
            .map(|email| (match_score(&terms, email), email))
            .filter(|(score, _)| *score > 0)
            .collect();
        ranked.sort_by(|(left_score, left), (right_score, right)| {
            right_score.cmp(left_score).then(right.id.cmp(&left.id))
        });

        let sources: Vec<Evidence> = ranked
            .into_iter()
            .take(MAX_EVIDENCE)
            .map(|(_, email)| Evidence {
                email_id: email.id,
                sender: email.sender.clone(),
                subject: email.subject.clone(),
                summary: email.summary.chars().take(EVIDENCE_SUMMARY_CHARS).collect(),
            })
            .collect();

        Ok(Answer {
            answer: compose_answer(&sources),
            sources,
        })
    }

    fn categories(&self) -> Result<Vec<Category>, String> {
        Ok(lock_unpoisoned(&self.mailbox).categories.clone())
    }

    fn emails(&self, query: &EmailQuery) -> Result<Vec<EmailRecord>, String> {
        let mailbox = lock_unpoisoned(&self.mailbox);
        let mut emails: Vec<EmailRecord> = mailbox
            .emails
            .iter()
            .filter(|email| {
                query
                    .category
                    .as_deref()
                    .map_or(true, |category| email.category == category)
            })
            .cloned()
            .collect();
        emails.sort_by(|left, right| right.id.cmp(&left.id));

        Ok(emails
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect())
    }

    fn email(&self, id: EmailId) -> Result<EmailRecord, String> {
        lock_unpoisoned(&self.mailbox)
            .emails
            .iter()
            .find(|email| email.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    fn ingest(&self, email: NewEmail) -> Result<EmailRecord, String> {
        if email.is_blank() {
            return Err("메일 본문은 비어있을 수 없습니다.".to_string());
        }

        let mut mailbox = lock_unpoisoned(&self.mailbox);
        let id = mailbox.next_id;
        mailbox.next_id += 1;

        let subject = email
            .subject
            .clone()
            .or_else(|| first_line(&email.body).map(|line| truncate_chars(line, SUMMARY_CHARS)));
        let record = EmailRecord {
            id,
            category: classify(&email),
            summary: first_line(&email.body)
                .map(|line| truncate_chars(line, SUMMARY_CHARS))
                .unwrap_or_default(),
            body: email.body,
            sender: email.sender,
            subject,
            created_at: now_timestamp(),
        };
        mailbox.emails.push(record.clone());

        Ok(record)
    }

    fn recategorize(&self, id: EmailId, category: &str) -> Result<(), String> {
        let category = category.trim();
        if category.is_empty() {
            return Err("category must not be blank".to_string());
        }

        let mut mailbox = lock_unpoisoned(&self.mailbox);
        let email = mailbox
            .emails
            .iter_mut()
            .find(|email| email.id == id)
            .ok_or_else(|| not_found(id))?;
        email.category = category.to_string();
        Ok(())
    }

    fn delete(&self, id: EmailId) -> Result<(), String> {
        let mut mailbox = lock_unpoisoned(&self.mailbox);
        let before = mailbox.emails.len();
        mailbox.emails.retain(|email| email.id != id);
        if mailbox.emails.len() == before {
            return Err(not_found(id));
        }
        Ok(())
    }

    fn add_category(&self, name: &str, description: Option<&str>) -> Result<Category, String> {
        let name = category_name(name)?;
        let mut mailbox = lock_unpoisoned(&self.mailbox);
        if mailbox.categories.iter().any(|category| category.name == name) {
            return Err(DUPLICATE_CATEGORY.to_string());
        }

        let category = Category {
            id: mailbox.categories.iter().map(|category| category.id).max().unwrap_or(0) + 1,
            name,
            description: description
                .map(str::trim)
                .filter(|description| !description.is_empty())
                .map(str::to_string),
        };
        mailbox.categories.push(category.clone());
        Ok(category)
    }

    fn rename_category(&self, id: CategoryId, name: &str) -> Result<Category, String> {
        let name = category_name(name)?;
        let mut mailbox = lock_unpoisoned(&self.mailbox);
        if mailbox
            .categories
            .iter()
            .any(|category| category.name == name && category.id != id)
        {
            return Err(DUPLICATE_CATEGORY.to_string());
        }

        let category = mailbox
            .categories
            .iter_mut()
            .find(|category| category.id == id)
            .ok_or_else(|| CATEGORY_NOT_FOUND.to_string())?;
        if category.name == UNCATEGORIZED {
            return Err(format!("'{UNCATEGORIZED}' 카테고리는 수정할 수 없습니다."));
        }
        category.name = name;
        Ok(category.clone())
    }

    fn delete_category(&self, id: CategoryId) -> Result<(), String> {
        let mut mailbox = lock_unpoisoned(&self.mailbox);
        let position = mailbox
            .categories
            .iter()
            .position(|category| category.id == id)
            .ok_or_else(|| CATEGORY_NOT_FOUND.to_string())?;
        if mailbox.categories[position].name == UNCATEGORIZED {
            return Err(format!("'{UNCATEGORIZED}' 카테고리는 삭제할 수 없습니다."));
        }

        let removed = mailbox.categories.remove(position);
        for email in mailbox
            .emails
            .iter_mut()
            .filter(|email| email.category == removed.name)
        {
            email.category = UNCATEGORIZED.to_string();
        }
        Ok(())
    }
}

const DUPLICATE_CATEGORY: &str = "이미 존재하는 카테고리입니다.";
const CATEGORY_NOT_FOUND: &str = "카테고리를 찾을 수 없습니다.";

fn category_name(name: &str) -> Result<String, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("카테고리 이름은 비어있을 수 없습니다.".to_string());
    }
    Ok(name.to_string())
}

fn compose_answer(sources: &[Evidence]) -> String {
    if sources.is_empty() {
        return "저장된 메일에서 관련 내용을 찾지 못했습니다.".to_string();
    }

    let mut answer = format!("관련 메일 {}건을 찾았습니다.", sources.len());
    for source in sources {
        answer.push_str(&format!("\n- {}: {}", source.subject_label(), source.summary));
    }
    answer
}

/// Splits a question into lowercase terms, dropping one-character fragments.
fn query_terms(question: &str) -> Vec<String> {
    question
        .split(|ch: char| !ch.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|term| term.chars().count() >= MIN_TERM_CHARS)
        .collect()
}

/// Counts terms found in the email. A term also matches after dropping trailing
/// characters, so inflected Korean words ("마감일이") hit their stem ("마감일").
fn match_score(terms: &[String], email: &EmailRecord) -> usize {
    let haystack = format!(
        "{} {} {} {} {}",
        email.sender.as_deref().unwrap_or_default(),
        email.subject.as_deref().unwrap_or_default(),
        email.category,
        email.summary,
        email.body
    )
    .to_lowercase();

    terms
        .iter()
        .filter(|term| {
            let chars: Vec<char> = term.chars().collect();
            (MIN_TERM_CHARS..=chars.len())
                .rev()
                .any(|len| haystack.contains(&chars[..len].iter().collect::<String>()))
        })
        .count()
}

fn classify(email: &NewEmail) -> String {
    let text = format!(
        "{} {}",
        email.subject.as_deref().unwrap_or_default(),
        email.body
    )
    .to_lowercase();

    CATEGORY_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| text.contains(keyword)))
        .map(|(category, _)| (*category).to_string())
        .unwrap_or_else(|| UNCATEGORIZED.to_string())
}

fn first_line(body: &str) -> Option<&str> {
    body.lines().map(str::trim).find(|line| !line.is_empty())
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

fn now_timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second]"
        ))
        .unwrap_or_default()
}

fn not_found(id: EmailId) -> String {
    format!("메일을 찾을 수 없습니다. (id {id})")
}

fn default_categories() -> Vec<Category> {
    [
        ("HR/인사", "인사, 급여, 복리후생 관련 메일"),
        ("프로젝트", "프로젝트 진행, 마감, 산출물 관련 메일"),
        ("일정", "회의 및 일정 조율 메일"),
        ("공지사항", "사내 공지 및 안내"),
        ("뉴스레터", "구독 뉴스레터"),
    ]
    .into_iter()
    .chain(std::iter::once((UNCATEGORIZED, "")))
    .enumerate()
    .map(|(index, (name, description))| Category {
        id: index as i64 + 1,
        name: name.to_string(),
        description: if description.is_empty() {
            None
        } else {
            Some(description.to_string())
        },
    })
    .collect()
}

fn fixture_emails() -> Vec<EmailRecord> {
    let email = |id: EmailId,
                 sender: Option<&str>,
                 subject: Option<&str>,
                 category: &str,
                 summary: &str,
                 body: &str,
                 created_at: &str| EmailRecord {
        id,
        body: body.to_string(),
        sender: sender.map(str::to_string),
        subject: subject.map(str::to_string),
        category: category.to_string(),
        summary: summary.to_string(),
        created_at: created_at.to_string(),
    };

    vec![
        email(
            1,
            Some("인사팀 <hr@example.com>"),
            Some("연말정산 서류 제출 안내"),
            "HR/인사",
            "연말정산 증빙 서류를 1월 20일까지 인사팀에 제출해야 합니다.",
            "안녕하세요, 인사팀입니다.\n연말정산 증빙 서류를 1월 20일까지 제출해주세요.",
            "2025-01-06T09:12:00",
        ),
        email(
            2,
            Some("박영희 <pm@example.com>"),
            Some("알파 프로젝트 마감일 변경"),
            "프로젝트",
            "알파 프로젝트 최종 마감일이 3월 15일로 2주 연기되었습니다.",
            "알파 프로젝트 최종 마감일이 3월 15일로 변경되었습니다.\n일정에 참고 부탁드립니다.",
            "2025-02-20T14:05:00",
        ),
        email(
            3,
            None,
            Some("주간 회의 일정"),
            "일정",
            "주간 회의가 매주 화요일 오전 10시로 변경됩니다.",
            "다음 주부터 주간 회의는 화요일 오전 10시에 진행합니다.",
            "2025-02-24T08:30:00",
        ),
        email(
            4,
            Some("김철수 <kim.cs@example.com>"),
            Some("분기 보고서 파일 공유"),
            "프로젝트",
            "김철수님이 1분기 보고서 초안 파일을 첨부해 공유했습니다.",
            "1분기 보고서 초안 파일 첨부합니다. 검토 후 의견 주세요.",
            "2025-03-03T16:45:00",
        ),
        email(
            5,
            Some("newsletter@example.com"),
            None,
            "뉴스레터",
            "이번 주 기술 뉴스레터: 검색 증강 생성 사례 소개.",
            "이번 주 뉴스레터에서는 검색 증강 생성 사례를 소개합니다.",
            "2025-03-05T07:00:00",
        ),
    ]
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use mail_backend::{AnswerRequest, ChatTurn, EmailQuery, MailBackend, NewEmail, Role};
    use pretty_assertions::assert_eq;

    use super::{fixture_emails, MockBackend, MOCK_BACKEND_ID};

    fn backend() -> MockBackend {
        MockBackend::new(fixture_emails())
    }

    fn ask(backend: &MockBackend, question: &str) -> Result<mail_backend::Answer, String> {
        backend.ask(AnswerRequest {
            request_id: 1,
            question: question.to_string(),
            chat_history: vec![ChatTurn::new(Role::User, "이전 질문")],
        })
    }

    #[test]
    fn profile_reports_mock_backend_id() {
        assert_eq!(backend().profile().backend_id, MOCK_BACKEND_ID);
        assert_eq!(backend().profile().endpoint, None);
    }

    #[test]
    fn answer_cites_matching_emails_as_evidence() {
        let answer = ask(&backend(), "최근 프로젝트 마감일이 언제야?").expect("answer");

        assert_eq!(answer.sources.first().map(|source| source.email_id), Some(2));
        assert!(answer.answer.starts_with("관련 메일"));
        assert!(answer.answer.contains("알파 프로젝트 마감일 변경"));
    }

    #[test]
    fn answer_matches_inflected_sender_name() {
        let answer = ask(&backend(), "김철수님이 보낸 파일 찾아줘").expect("answer");
        assert_eq!(answer.sources[0].email_id, 4);
    }

    #[test]
    fn answer_without_matches_has_no_sources() {
        let answer = ask(&backend(), "zzz qqq").expect("answer");
        assert!(answer.sources.is_empty());
        assert_eq!(answer.answer, "저장된 메일에서 관련 내용을 찾지 못했습니다.");
    }

    #[test]
    fn configured_failure_rejects_every_answer() {
        let backend = backend().with_failure("backend offline");
        assert_eq!(ask(&backend, "프로젝트").unwrap_err(), "backend offline");
    }

    #[test]
    fn emails_filter_by_category_newest_first() {
        let emails = backend()
            .emails(&EmailQuery::new().with_category("프로젝트"))
            .expect("emails");
        assert_eq!(
            emails.iter().map(|email| email.id).collect::<Vec<_>>(),
            vec![4, 2]
        );

        let page = backend()
            .emails(&EmailQuery::new().with_limit(2).with_offset(1))
            .expect("page");
        assert_eq!(
            page.iter().map(|email| email.id).collect::<Vec<_>>(),
            vec![4, 3]
        );
    }

    #[test]
    fn ingest_classifies_and_stores_email() {
        let backend = backend();
        let stored = backend
            .ingest(NewEmail::new("다음 주 팀 회의 일정 공유드립니다.\n장소: 3층").with_sender("lee@example.com"))
            .expect("stored");

        assert_eq!(stored.id, 6);
        assert_eq!(stored.category, "일정");
        assert_eq!(stored.summary, "다음 주 팀 회의 일정 공유드립니다.");
        assert_eq!(stored.subject.as_deref(), Some("다음 주 팀 회의 일정 공유드립니다."));
        assert_eq!(backend.email(6).expect("fetched"), stored);
    }

    #[test]
    fn ingest_rejects_blank_body_and_defaults_category() {
        let backend = backend();
        assert!(backend.ingest(NewEmail::new("  \n")).is_err());

        let stored = backend.ingest(NewEmail::new("안녕하세요")).expect("stored");
        assert_eq!(stored.category, "미분류");
    }

    #[test]
    fn recategorize_and_delete_update_mailbox() {
        let backend = backend();
        backend.recategorize(3, "공지사항").expect("recategorized");
        assert_eq!(backend.email(3).expect("email").category, "공지사항");

        backend.delete(3).expect("deleted");
        assert!(backend.email(3).is_err());
        assert!(backend.delete(3).is_err());
    }

    #[test]
    fn category_management_enforces_unique_names_and_protects_uncategorized() {
        let backend = backend();

        let added = backend
            .add_category(" 교육 ", Some("사내 교육"))
            .expect("added");
        assert_eq!(added.id, 7);
        assert_eq!(added.name, "교육");
        assert_eq!(
            backend.add_category("교육", None).unwrap_err(),
            "이미 존재하는 카테고리입니다."
        );
        assert!(backend.add_category("  ", None).is_err());

        let renamed = backend.rename_category(7, "연수").expect("renamed");
        assert_eq!(renamed.name, "연수");
        assert!(backend.rename_category(7, "일정").is_err());
        assert_eq!(
            backend.rename_category(6, "기타").unwrap_err(),
            "'미분류' 카테고리는 수정할 수 없습니다."
        );
        assert_eq!(
            backend.delete_category(6).unwrap_err(),
            "'미분류' 카테고리는 삭제할 수 없습니다."
        );
        assert_eq!(
            backend.delete_category(99).unwrap_err(),
            "카테고리를 찾을 수 없습니다."
        );
    }

    #[test]
    fn deleting_category_moves_its_emails_to_uncategorized() {
        let backend = backend();

        backend.delete_category(2).expect("deleted");

        let names: Vec<String> = backend
            .categories()
            .expect("categories")
            .into_iter()
            .map(|category| category.name)
            .collect();
        assert!(!names.contains(&"프로젝트".to_string()));
        assert_eq!(backend.email(2).expect("email").category, "미분류");
        assert_eq!(backend.email(4).expect("email").category, "미분류");
        assert_eq!(backend.email(1).expect("email").category, "HR/인사");
    }

    #[test]
    fn categories_end_with_uncategorized() {
        let categories = backend().categories().expect("categories");
        assert_eq!(categories.len(), 6);
        assert_eq!(categories[0].name, "HR/인사");
        assert_eq!(categories[5].name, "미분류");
        assert_eq!(categories[5].description, None);
    }
}
