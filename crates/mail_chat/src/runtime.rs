use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use mail_backend::{AnswerEvent, AnswerRequest, ChatTurn, MailBackend, RequestId};
use mail_tui::runtime::{
    Command, CustomCommand, CustomCommandCtx, CustomCommandError, RuntimeHandle,
};

use crate::app::{App, HostOps, Lookup, LookupOutcome};

/// Terminal output of a worker thread, applied to [`App`] on the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Answer(AnswerEvent),
    LookupFinished {
        request_id: RequestId,
        outcome: Result<LookupOutcome, String>,
    },
}

struct ActiveAnswer {
    request_id: RequestId,
    join_handle: Option<JoinHandle<()>>,
}

pub struct RuntimeController {
    app: Arc<Mutex<App>>,
    runtime_handle: RuntimeHandle,
    pending_events: Arc<Mutex<VecDeque<ChatEvent>>>,
    next_request_id: AtomicU64,
    active_answer: Mutex<Option<ActiveAnswer>>,
    backend: Arc<dyn MailBackend>,
}

impl RuntimeController {
    /// Creates a controller that buffers worker events before applying them to `App`.
    ///
    /// Inside the TUI, events are drained by a runtime custom command. Callers that never tick
    /// the runtime must call [`RuntimeController::flush_pending_events`] instead.
    pub fn new(
        app: Arc<Mutex<App>>,
        runtime_handle: RuntimeHandle,
        backend: Arc<dyn MailBackend>,
    ) -> Arc<Self> {
        Arc::new(Self {
            app,
            runtime_handle,
            pending_events: Arc::new(Mutex::new(VecDeque::new())),
            next_request_id: AtomicU64::new(1),
            active_answer: Mutex::new(None),
            backend,
        })
    }

    pub fn backend_id(&self) -> String {
        self.backend.profile().backend_id
    }

    fn start_answer_internal(
        self: &Arc<Self>,
        question: String,
        chat_history: Vec<ChatTurn>,
    ) -> Result<RequestId, String> {
        let mut active_answer = self.lock_active_answer();
        if active_answer.is_some() {
            return Err("Answer request already active".to_string());
        }

        let request_id = self.next_request_id();
        let request = AnswerRequest {
            request_id,
            question,
            chat_history,
        };
        let controller = Arc::clone(self);
        let join_handle = thread::Builder::new()
            .name(format!("mail-chat-answer-{request_id}"))
            .spawn(move || controller.run_answer_worker(request))
            .map_err(|error| format!("Failed to spawn answer worker: {error}"))?;

        *active_answer = Some(ActiveAnswer {
            request_id,
            join_handle: Some(join_handle),
        });

        Ok(request_id)
    }

    fn start_lookup_internal(self: &Arc<Self>, lookup: Lookup) -> Result<RequestId, String> {
        let request_id = self.next_request_id();
        let controller = Arc::clone(self);
        thread::Builder::new()
            .name(format!("mail-chat-lookup-{request_id}"))
            .spawn(move || controller.run_lookup_worker(request_id, lookup))
            .map_err(|error| format!("Failed to spawn lookup worker: {error}"))?;

        Ok(request_id)
    }

    fn next_request_id(&self) -> RequestId {
        self.next_request_id.fetch_add(1, Ordering::SeqCst)
    }

    fn run_answer_worker(self: Arc<Self>, request: AnswerRequest) {
        let request_id = request.request_id;
        self.enqueue_event(ChatEvent::Answer(AnswerEvent::Started { request_id }));

        let backend = Arc::clone(&self.backend);
        let outcome = catch_unwind(AssertUnwindSafe(|| backend.ask(request)));
        let event = match outcome {
            Ok(Ok(answer)) => AnswerEvent::Answered { request_id, answer },
            Ok(Err(error)) => AnswerEvent::Failed { request_id, error },
            Err(_) => AnswerEvent::Failed {
                request_id,
                error: "Mail backend panicked".to_string(),
            },
        };

        self.enqueue_event(ChatEvent::Answer(event));
    }

    fn run_lookup_worker(self: Arc<Self>, request_id: RequestId, lookup: Lookup) {
        let backend = Arc::clone(&self.backend);
        let outcome = catch_unwind(AssertUnwindSafe(|| run_lookup(backend.as_ref(), lookup)))
            .unwrap_or_else(|_| Err("Mail backend panicked".to_string()));

        self.enqueue_event(ChatEvent::LookupFinished {
            request_id,
            outcome,
        });
    }

    fn enqueue_event(self: &Arc<Self>, event: ChatEvent) {
        let should_drain = {
            let mut queue = lock_unpoisoned(&self.pending_events);
            let should_drain = queue.is_empty();
            queue.push_back(event);
            should_drain
        };

        if should_drain {
            self.runtime_handle
                .dispatch(Command::Custom(Box::new(DrainChatEventsCommand {
                    controller: Arc::clone(self),
                })));
        }
    }

    fn drain_pending_events(&self) -> usize {
        let mut drained = 0usize;

        loop {
            let event = {
                let mut pending_events = lock_unpoisoned(&self.pending_events);
                pending_events.pop_front()
            };

            match event {
                Some(event) => {
                    self.apply_event(event);
                    drained += 1;
                }
                None => break,
            }
        }

        drained
    }

    /// Drains queued worker events and schedules a render.
    ///
    /// Use this where nothing ticks the runtime (headless harnesses, tests).
    pub fn flush_pending_events(&self) -> usize {
        let drained = self.drain_pending_events();
        if drained > 0 {
            self.runtime_handle.dispatch(Command::RequestRender);
        }

        drained
    }

    fn apply_event(&self, event: ChatEvent) {
        match event {
            ChatEvent::Answer(event) => {
                let request_id = event.request_id();
                let terminal = event.is_terminal();
                lock_unpoisoned(&self.app).on_answer_event(event);
                if terminal {
                    self.clear_active_answer_if_matching(request_id);
                }
            }
            ChatEvent::LookupFinished {
                request_id,
                outcome,
            } => lock_unpoisoned(&self.app).on_lookup_finished(request_id, outcome),
        }
    }

    fn clear_active_answer_if_matching(&self, request_id: RequestId) {
        let mut active_answer = self.lock_active_answer();
        let matches = active_answer.as_ref().map(|active| active.request_id) == Some(request_id);
        if !matches {
            return;
        }

        let Some(mut completed) = active_answer.take() else {
            return;
        };

        if let Some(join_handle) = completed.join_handle.take() {
            let is_current_thread = join_handle.thread().id() == thread::current().id();
            if !is_current_thread && join_handle.is_finished() {
                let _ = join_handle.join();
            }
        }
    }

    fn lock_active_answer(&self) -> MutexGuard<'_, Option<ActiveAnswer>> {
        lock_unpoisoned(&self.active_answer)
    }
}

fn run_lookup(backend: &dyn MailBackend, lookup: Lookup) -> Result<LookupOutcome, String> {
    match lookup {
        Lookup::Categories => backend.categories().map(LookupOutcome::Categories),
        Lookup::Emails { category } => {
            let mut query = mail_backend::EmailQuery::new();
            if let Some(category) = category.clone() {
                query = query.with_category(category);
            }
            backend
                .emails(&query)
                .map(|emails| LookupOutcome::Emails { category, emails })
        }
        Lookup::Email { id } => backend.email(id).map(LookupOutcome::Email),
    }
}

struct DrainChatEventsCommand {
    controller: Arc<RuntimeController>,
}

impl CustomCommand for DrainChatEventsCommand {
    fn name(&self) -> &'static str {
        "drain_chat_events"
    }

    fn apply(self: Box<Self>, ctx: &mut CustomCommandCtx) -> Result<(), CustomCommandError> {
        let drained = self.controller.drain_pending_events();
        if drained > 0 {
            ctx.request_render();
        }
        Ok(())
    }
}

impl HostOps for Arc<RuntimeController> {
    fn start_answer(
        &mut self,
        question: String,
        chat_history: Vec<ChatTurn>,
    ) -> Result<RequestId, String> {
        self.start_answer_internal(question, chat_history)
    }

    fn start_lookup(&mut self, lookup: Lookup) -> Result<RequestId, String> {
        self.start_lookup_internal(lookup)
    }

    fn request_render(&mut self) {
        self.runtime_handle.dispatch(Command::RequestRender);
    }

    fn request_stop(&mut self) {
        self.runtime_handle.dispatch(Command::RequestStop);
    }
}

/// Locks `mutex`, recovering the guard if a panicking thread poisoned it.
pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::thread;

    use super::lock_unpoisoned;

    #[test]
    fn lock_unpoisoned_recovers_poisoned_state() {
        let shared = Arc::new(Mutex::new(1));
        let worker = Arc::clone(&shared);
        let joined = thread::spawn(move || {
            let mut guard = worker.lock().expect("first lock");
            *guard = 2;
            panic!("poison the mutex");
        })
        .join();

        assert!(joined.is_err());
        assert!(shared.is_poisoned());
        assert_eq!(*lock_unpoisoned(&shared), 2);
    }
}
