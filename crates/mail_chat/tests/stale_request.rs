use mail_backend::{Answer, AnswerEvent, ChatTurn, RequestId};
use mail_chat::app::{App, HostOps, Lookup, LookupOutcome, Mode};
use pretty_assertions::assert_eq;

struct HostStub {
    next_request_id: RequestId,
}

impl HostOps for HostStub {
    fn start_answer(
        &mut self,
        _question: String,
        _chat_history: Vec<ChatTurn>,
    ) -> Result<RequestId, String> {
        Ok(self.next_request_id)
    }

    fn start_lookup(&mut self, _lookup: Lookup) -> Result<RequestId, String> {
        Ok(self.next_request_id + 100)
    }

    fn request_render(&mut self) {}

    fn request_stop(&mut self) {}
}

fn answered(request_id: RequestId, text: &str) -> AnswerEvent {
    AnswerEvent::Answered {
        request_id,
        answer: Answer {
            answer: text.to_string(),
            sources: Vec::new(),
        },
    }
}

#[test]
fn responses_for_other_request_ids_are_ignored() {
    let stale_request = 10;
    let active_request = 20;

    let mut app = App::new();
    let mut host = HostStub {
        next_request_id: active_request,
    };

    app.update_draft("active question");
    app.on_submit(&mut host);
    app.on_answer_event(AnswerEvent::Started {
        request_id: active_request,
    });

    let snapshot_mode = app.mode.clone();
    let snapshot_history = app.history().to_vec();

    app.on_answer_event(AnswerEvent::Started {
        request_id: stale_request,
    });
    app.on_answer_event(answered(stale_request, "stale answer"));
    app.on_answer_event(AnswerEvent::Failed {
        request_id: stale_request,
        error: "stale error".to_string(),
    });

    assert_eq!(app.mode, snapshot_mode);
    assert_eq!(app.history(), snapshot_history.as_slice());

    app.on_answer_event(answered(active_request, "live answer"));
    assert_eq!(app.mode, Mode::Idle);
    assert_eq!(app.history().len(), 2);
    assert_eq!(app.history()[1].content, "live answer");
}

#[test]
fn duplicate_terminal_events_are_ignored() {
    let mut app = App::new();
    let mut host = HostStub { next_request_id: 3 };

    app.update_draft("question");
    app.on_submit(&mut host);
    app.on_answer_event(answered(3, "first"));
    app.on_answer_event(answered(3, "second"));
    app.on_answer_event(AnswerEvent::Failed {
        request_id: 3,
        error: "late".to_string(),
    });

    assert_eq!(app.history().len(), 2);
    assert_eq!(app.history()[1].content, "first");
}

#[test]
fn results_arriving_after_quit_are_dropped() {
    let mut app = App::new();
    let mut host = HostStub { next_request_id: 7 };

    app.update_draft("/categories");
    app.on_submit(&mut host);
    app.update_draft("question");
    app.on_submit(&mut host);
    app.on_quit(&mut host);

    app.on_answer_event(answered(7, "too late"));
    app.on_lookup_finished(107, Ok(LookupOutcome::Categories(Vec::new())));

    assert!(app.should_exit);
    assert_eq!(app.mode, Mode::Exiting);
    assert_eq!(app.history().len(), 1);
    assert!(app.notices().is_empty());
}
