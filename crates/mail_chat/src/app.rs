use mail_backend::{
    Answer, AnswerEvent, Category, ChatTurn, EmailId, EmailRecord, Evidence, RequestId, Role,
};

use crate::commands::{
    parse_slash_command, SlashCommand, EMAILS_USAGE, EMAIL_USAGE, EXAMPLE_USAGE, HELP_USAGE,
};
use crate::format;

/// Assistant turn appended when an answer request fails for any reason.
pub const FALLBACK_ANSWER: &str =
    "죄송합니다. 답변을 생성하는 중 오류가 발생했습니다. 잠시 후 다시 시도해주세요.";

pub const EXAMPLE_PROMPTS: [&str; 3] = [
    "최근 프로젝트 마감일이 언제야?",
    "HR 관련 메일 요약해줘",
    "김철수님이 보낸 파일 찾아줘",
];

const LOOKUP_FAILURE_PREFIX: &str = "요청을 처리하지 못했습니다";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Awaiting { request_id: RequestId },
    Exiting,
}

/// One transcript entry. Turns are only ever appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    /// `Some` only on assistant turns built from a successful answer.
    pub sources: Option<Vec<Evidence>>,
}

impl Turn {
    fn user(content: String) -> Self {
        Self {
            role: Role::User,
            content,
            sources: None,
        }
    }

    fn answered(answer: Answer) -> Self {
        Self {
            role: Role::Assistant,
            content: answer.answer,
            sources: Some(answer.sources),
        }
    }

    fn fallback() -> Self {
        Self {
            role: Role::Assistant,
            content: FALLBACK_ANSWER.to_string(),
            sources: None,
        }
    }

    pub fn to_chat_turn(&self) -> ChatTurn {
        ChatTurn::new(self.role, self.content.clone())
    }
}

/// Slash-command output. Not part of the conversation sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Number of turns in the history when the notice was issued.
    pub after_turns: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Categories,
    Emails { category: Option<String> },
    Email { id: EmailId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Categories(Vec<Category>),
    Emails {
        category: Option<String>,
        emails: Vec<EmailRecord>,
    },
    Email(EmailRecord),
}

pub trait HostOps {
    fn start_answer(
        &mut self,
        question: String,
        chat_history: Vec<ChatTurn>,
    ) -> Result<RequestId, String>;
    fn start_lookup(&mut self, lookup: Lookup) -> Result<RequestId, String>;
    fn request_render(&mut self);
    fn request_stop(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct App {
    pub mode: Mode,
    pub should_exit: bool,
    history: Vec<Turn>,
    draft: String,
    notices: Vec<Notice>,
    pending_lookups: Vec<RequestId>,
    example_cursor: Option<usize>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            mode: Mode::Idle,
            should_exit: false,
            history: Vec::new(),
            draft: String::new(),
            notices: Vec::new(),
            pending_lookups: Vec::new(),
            example_cursor: None,
        }
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// True exactly while an answer request is outstanding.
    pub fn is_pending(&self) -> bool {
        matches!(self.mode, Mode::Awaiting { .. })
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn update_draft(&mut self, text: &str) {
        if self.draft != text {
            self.example_cursor = None;
        }
        self.draft = text.to_string();
    }

    /// Replaces the draft with `text` without submitting. Ignored while an answer is pending.
    pub fn seed_draft(&mut self, text: &str) {
        if self.is_pending() {
            return;
        }
        self.draft = text.to_string();
    }

    /// Seeds the next example prompt, wrapping around after the last one.
    ///
    /// Only available before the first turn; returns whether the draft changed.
    pub fn cycle_example(&mut self) -> bool {
        if !self.history.is_empty() || self.is_pending() {
            return false;
        }

        let next = self
            .example_cursor
            .map_or(0, |index| (index + 1) % EXAMPLE_PROMPTS.len());
        self.seed_draft(EXAMPLE_PROMPTS[next]);
        self.example_cursor = Some(next);
        true
    }

    /// Submits the current draft, or runs it as a slash command when it starts with `/`.
    pub fn on_submit(&mut self, host: &mut dyn HostOps) {
        if self.should_exit {
            return;
        }

        if let Some(command) = parse_slash_command(&self.draft) {
            self.draft.clear();
            self.run_command(command, host);
            host.request_render();
            return;
        }

        let question = self.draft.clone();
        self.submit(&question, host);
    }

    /// Asks `question` unless it is blank or an answer is already pending.
    pub fn submit(&mut self, question: &str, host: &mut dyn HostOps) {
        if self.should_exit || self.is_pending() {
            return;
        }

        let question = question.trim();
        if question.is_empty() {
            return;
        }

        let chat_history: Vec<ChatTurn> = self.history.iter().map(Turn::to_chat_turn).collect();
        self.history.push(Turn::user(question.to_string()));
        self.draft.clear();
        self.example_cursor = None;

        match host.start_answer(question.to_string(), chat_history) {
            Ok(request_id) => {
                tracing::debug!(request_id, "answer request started");
                self.mode = Mode::Awaiting { request_id };
            }
            Err(error) => {
                tracing::warn!(%error, "failed to start answer request");
                self.history.push(Turn::fallback());
                self.mode = Mode::Idle;
            }
        }

        host.request_render();
    }

    pub fn on_answer_event(&mut self, event: AnswerEvent) {
        if self.should_exit || !self.is_awaiting(event.request_id()) {
            tracing::debug!(
                request_id = event.request_id(),
                "ignoring event for inactive answer request"
            );
            return;
        }

        match event {
            AnswerEvent::Started { .. } => {}
            AnswerEvent::Answered { answer, .. } => {
                self.history.push(Turn::answered(answer));
                self.mode = Mode::Idle;
            }
            AnswerEvent::Failed { request_id, error } => {
                tracing::warn!(request_id, %error, "answer request failed");
                self.history.push(Turn::fallback());
                self.mode = Mode::Idle;
            }
        }
    }

    pub fn on_lookup_finished(
        &mut self,
        request_id: RequestId,
        outcome: Result<LookupOutcome, String>,
    ) {
        let Some(position) = self
            .pending_lookups
            .iter()
            .position(|pending| *pending == request_id)
        else {
            tracing::debug!(request_id, "ignoring result for unknown lookup");
            return;
        };
        self.pending_lookups.remove(position);

        if self.should_exit {
            return;
        }

        match outcome {
            Ok(outcome) => self.push_notice(describe_lookup(&outcome)),
            Err(error) => {
                tracing::warn!(request_id, %error, "lookup failed");
                self.push_notice(format!("{LOOKUP_FAILURE_PREFIX}: {error}"));
            }
        }
    }

    pub fn on_quit(&mut self, host: &mut dyn HostOps) {
        self.mode = Mode::Exiting;
        self.should_exit = true;
        host.request_stop();
        host.request_render();
    }

    pub fn push_notice(&mut self, text: impl Into<String>) {
        self.notices.push(Notice {
            after_turns: self.history.len(),
            text: text.into(),
        });
    }

    fn run_command(&mut self, command: SlashCommand, host: &mut dyn HostOps) {
        match command {
            SlashCommand::Help => self.push_notice(help_text()),
            SlashCommand::Examples => self.push_notice(examples_text()),
            SlashCommand::Example(number) => match number
                .checked_sub(1)
                .and_then(|index| EXAMPLE_PROMPTS.get(index))
            {
                Some(prompt) if !self.is_pending() => self.seed_draft(prompt),
                Some(_) => self.push_notice("답변을 기다리는 중에는 예시를 불러올 수 없습니다."),
                None => self.push_notice(format!(
                    "예시 번호는 1부터 {}까지입니다.",
                    EXAMPLE_PROMPTS.len()
                )),
            },
            SlashCommand::Categories => self.start_lookup(Lookup::Categories, host),
            SlashCommand::Emails { category } => {
                self.start_lookup(Lookup::Emails { category }, host)
            }
            SlashCommand::Email(id) => self.start_lookup(Lookup::Email { id }, host),
            SlashCommand::Quit => self.on_quit(host),
            SlashCommand::Usage(usage) => self.push_notice(format!("사용법: {usage}")),
            SlashCommand::Unknown(command) => self.push_notice(format!(
                "알 수 없는 명령어입니다: {command} ({HELP_USAGE} 로 목록을 확인하세요)"
            )),
        }
    }

    fn start_lookup(&mut self, lookup: Lookup, host: &mut dyn HostOps) {
        match host.start_lookup(lookup) {
            Ok(request_id) => {
                tracing::debug!(request_id, "lookup started");
                self.pending_lookups.push(request_id);
            }
            Err(error) => {
                tracing::warn!(%error, "failed to start lookup");
                self.push_notice(format!("{LOOKUP_FAILURE_PREFIX}: {error}"));
            }
        }
    }

    fn is_awaiting(&self, request_id: RequestId) -> bool {
        matches!(self.mode, Mode::Awaiting { request_id: active } if active == request_id)
    }
}

fn help_text() -> String {
    [
        "명령어:".to_string(),
        format!("  {HELP_USAGE}  도움말"),
        "  /examples  예시 질문 목록".to_string(),
        format!("  {EXAMPLE_USAGE}  예시 질문을 입력창에 채우기"),
        "  /categories  카테고리 목록".to_string(),
        format!("  {EMAILS_USAGE}  저장된 메일 목록"),
        format!("  {EMAIL_USAGE}  메일 상세 보기"),
        "  /quit  종료".to_string(),
        "키: Enter 전송 · Tab 예시 채우기 · PgUp/PgDn 스크롤 · Ctrl+C 종료".to_string(),
    ]
    .join("\n")
}

fn examples_text() -> String {
    let mut lines = vec!["예시 질문:".to_string()];
    lines.extend(
        EXAMPLE_PROMPTS
            .iter()
            .enumerate()
            .map(|(index, prompt)| format!("  {}. {prompt}", index + 1)),
    );
    lines.join("\n")
}

fn describe_lookup(outcome: &LookupOutcome) -> String {
    let (title, lines) = match outcome {
        LookupOutcome::Categories(categories) => {
            ("카테고리".to_string(), format::category_lines(categories))
        }
        LookupOutcome::Emails { category, emails } => {
            let title = match category {
                Some(category) => format!("메일 목록 ({category})"),
                None => "메일 목록".to_string(),
            };
            (title, format::email_list_lines(emails))
        }
        LookupOutcome::Email(email) => ("메일 상세".to_string(), format::email_detail_lines(email)),
    };

    let mut text = format!("{title}:");
    for line in lines {
        text.push('\n');
        text.push_str(&line);
    }
    text
}
