use assert_matches::assert_matches;
use mail_backend::{Answer, AnswerEvent, ChatTurn, Evidence, RequestId, Role};
use mail_chat::app::{App, HostOps, Lookup, Mode, Turn, EXAMPLE_PROMPTS, FALLBACK_ANSWER};
use pretty_assertions::assert_eq;

#[derive(Default)]
struct HostSpy {
    answers: Vec<(String, Vec<ChatTurn>)>,
    lookups: Vec<Lookup>,
    reject_answers: bool,
    next_id: RequestId,
    renders: usize,
}

impl HostOps for HostSpy {
    fn start_answer(
        &mut self,
        question: String,
        chat_history: Vec<ChatTurn>,
    ) -> Result<RequestId, String> {
        if self.reject_answers {
            return Err("worker could not be started".to_string());
        }
        self.answers.push((question, chat_history));
        self.next_id += 1;
        Ok(self.next_id)
    }

    fn start_lookup(&mut self, lookup: Lookup) -> Result<RequestId, String> {
        self.lookups.push(lookup);
        self.next_id += 1;
        Ok(self.next_id)
    }

    fn request_render(&mut self) {
        self.renders += 1;
    }

    fn request_stop(&mut self) {}
}

fn ask(app: &mut App, host: &mut HostSpy, question: &str) -> RequestId {
    app.update_draft(question);
    app.on_submit(host);
    match app.mode {
        Mode::Awaiting { request_id } => request_id,
        ref other => panic!("expected an outstanding request, got {other:?}"),
    }
}

fn answer(request_id: RequestId, text: &str, sources: Vec<Evidence>) -> AnswerEvent {
    AnswerEvent::Answered {
        request_id,
        answer: Answer {
            answer: text.to_string(),
            sources,
        },
    }
}

fn evidence(email_id: i64, sender: Option<&str>, subject: Option<&str>) -> Evidence {
    Evidence {
        email_id,
        sender: sender.map(str::to_string),
        subject: subject.map(str::to_string),
        summary: format!("summary {email_id}"),
    }
}

#[test]
fn each_round_appends_one_user_and_one_assistant_turn() {
    let mut app = App::new();
    let mut host = HostSpy::default();

    for round in 1..=3 {
        let request_id = ask(&mut app, &mut host, &format!("question {round}"));
        assert_eq!(app.history().len(), 2 * round - 1);
        app.on_answer_event(answer(request_id, &format!("answer {round}"), Vec::new()));
        assert_eq!(app.history().len(), 2 * round);
        assert_eq!(app.mode, Mode::Idle);
    }

    let roles: Vec<Role> = app.history().iter().map(|turn| turn.role).collect();
    assert_eq!(
        roles,
        vec![
            Role::User,
            Role::Assistant,
            Role::User,
            Role::Assistant,
            Role::User,
            Role::Assistant,
        ]
    );
    assert_eq!(app.history()[4].content, "question 3");
    assert_eq!(app.history()[5].content, "answer 3");
}

#[test]
fn request_carries_prior_turns_without_current_question_or_sources() {
    let mut app = App::new();
    let mut host = HostSpy::default();

    let first = ask(&mut app, &mut host, "  프로젝트 마감일?  ");
    app.on_answer_event(answer(
        first,
        "3월 15일입니다.",
        vec![evidence(2, Some("박영희"), Some("마감일 변경"))],
    ));
    ask(&mut app, &mut host, "누가 보냈어?");

    assert_eq!(host.answers.len(), 2);
    assert_eq!(host.answers[0], ("프로젝트 마감일?".to_string(), Vec::new()));
    assert_eq!(
        host.answers[1],
        (
            "누가 보냈어?".to_string(),
            vec![
                ChatTurn::new(Role::User, "프로젝트 마감일?"),
                ChatTurn::new(Role::Assistant, "3월 15일입니다."),
            ]
        )
    );
}

#[test]
fn evidence_is_kept_in_order_with_missing_fields() {
    let mut app = App::new();
    let mut host = HostSpy::default();
    let sources = vec![
        evidence(5, Some("newsletter@example.com"), None),
        evidence(3, None, Some("주간 회의 일정")),
    ];

    let request_id = ask(&mut app, &mut host, "요약해줘");
    app.on_answer_event(answer(request_id, "두 건입니다.", sources.clone()));

    assert_eq!(
        app.history().last(),
        Some(&Turn {
            role: Role::Assistant,
            content: "두 건입니다.".to_string(),
            sources: Some(sources),
        })
    );
    assert_eq!(app.history()[0].sources, None);
}

#[test]
fn only_one_request_is_outstanding_at_a_time() {
    let mut app = App::new();
    let mut host = HostSpy::default();

    let request_id = ask(&mut app, &mut host, "first");
    app.update_draft("second");
    app.on_submit(&mut host);

    assert_eq!(host.answers.len(), 1);
    assert_eq!(app.history().len(), 1);
    assert_eq!(app.draft(), "second");
    assert_eq!(app.mode, Mode::Awaiting { request_id });
}

#[test]
fn blank_drafts_are_not_submitted() {
    let mut app = App::new();
    let mut host = HostSpy::default();

    app.update_draft(" \n\t ");
    app.on_submit(&mut host);

    assert!(host.answers.is_empty());
    assert!(app.is_empty());
    assert_eq!(app.draft(), " \n\t ");
    assert_eq!(app.mode, Mode::Idle);
}

#[test]
fn failed_answer_becomes_fallback_turn() {
    let mut app = App::new();
    let mut host = HostSpy::default();

    let request_id = ask(&mut app, &mut host, "HR 관련 메일 요약해줘");
    app.on_answer_event(AnswerEvent::Failed {
        request_id,
        error: "HTTP 500".to_string(),
    });

    assert_eq!(app.mode, Mode::Idle);
    assert_eq!(app.history().len(), 2);
    let last = &app.history()[1];
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.content, FALLBACK_ANSWER);
    assert_eq!(last.sources, None);
    assert!(!last.content.contains("HTTP 500"));
}

#[test]
fn worker_start_failure_falls_back_immediately() {
    let mut app = App::new();
    let mut host = HostSpy {
        reject_answers: true,
        ..HostSpy::default()
    };

    app.update_draft("질문");
    app.on_submit(&mut host);

    assert_eq!(app.mode, Mode::Idle);
    assert_eq!(app.draft(), "");
    let contents: Vec<&str> = app
        .history()
        .iter()
        .map(|turn| turn.content.as_str())
        .collect();
    assert_eq!(contents, vec!["질문", FALLBACK_ANSWER]);
}

#[test]
fn examples_seed_the_draft_without_sending() {
    let mut app = App::new();
    let mut host = HostSpy::default();

    assert!(app.cycle_example());
    assert_eq!(app.draft(), EXAMPLE_PROMPTS[0]);

    app.update_draft("/example 3");
    app.on_submit(&mut host);
    assert_eq!(app.draft(), EXAMPLE_PROMPTS[2]);

    assert!(host.answers.is_empty());
    assert!(app.is_empty());

    app.on_submit(&mut host);
    assert_eq!(host.answers.len(), 1);
    assert_eq!(host.answers[0].0, EXAMPLE_PROMPTS[2]);
}

#[test]
fn slash_commands_never_become_turns() {
    let mut app = App::new();
    let mut host = HostSpy::default();

    for command in ["/help", "/examples", "/categories", "/emails 일정", "/email 4", "/nope"] {
        app.update_draft(command);
        app.on_submit(&mut host);
        assert_eq!(app.draft(), "", "{command} should clear the draft");
    }

    assert!(app.is_empty());
    assert!(host.answers.is_empty());
    assert!(!app.is_pending());
    assert_eq!(
        host.lookups,
        vec![
            Lookup::Categories,
            Lookup::Emails {
                category: Some("일정".to_string())
            },
            Lookup::Email { id: 4 },
        ]
    );
    assert_eq!(app.notices().len(), 3);
    assert!(app.notices()[2].text.contains("/nope"));
}

#[test]
fn lookups_do_not_block_questions() {
    let mut app = App::new();
    let mut host = HostSpy::default();

    app.update_draft("/categories");
    app.on_submit(&mut host);
    let request_id = ask(&mut app, &mut host, "질문");

    assert_matches!(app.mode, Mode::Awaiting { request_id: active } if active == request_id);
    assert_eq!(host.answers.len(), 1);
}
