use std::sync::{Arc, Mutex};

use mail_backend::{Evidence, Role};
use mail_tui::{
    truncate_to_width, visible_width, wrap_text, Component, InputEvent, Loader, RuntimeHandle,
};

use crate::app::{App, HostOps, Notice, Turn, EXAMPLE_PROMPTS};
use crate::format::evidence_heading;
use crate::runtime::{lock_unpoisoned, RuntimeController};
use crate::scroll::ScrollState;

pub const HEADER_TITLE: &str = "Q&A 채팅";
pub const HEADER_SUBTITLE: &str = "메일 내용에 대해 자유롭게 질문하세요";
pub const EMPTY_TITLE: &str = "무엇이 궁금하신가요?";
pub const EMPTY_SUBTITLE: &str = "저장된 메일을 기반으로 답변해드립니다.";
pub const SOURCES_HEADER: &str = "참고한 메일";
pub const PENDING_MESSAGE: &str = "답변을 생성하는 중...";
pub const INPUT_PLACEHOLDER: &str = "질문을 입력하세요...";

const HEADER_ROWS: usize = 3;
const FOOTER_ROWS: usize = 3;
const INDENT: &str = "  ";
const KEY_HINTS: &str = "Enter 전송 · Tab 예시 · PgUp/PgDn 스크롤 · Ctrl+C 종료";

fn ansi_wrap(text: &str, prefix: &str, suffix: &str) -> String {
    format!("{prefix}{text}{suffix}")
}

fn dim(text: &str) -> String {
    ansi_wrap(text, "\x1b[2m", "\x1b[22m")
}

fn bold(text: &str) -> String {
    ansi_wrap(text, "\x1b[1m", "\x1b[22m")
}

fn blue(text: &str) -> String {
    ansi_wrap(text, "\x1b[34m", "\x1b[39m")
}

fn cyan(text: &str) -> String {
    ansi_wrap(text, "\x1b[36m", "\x1b[39m")
}

fn yellow(text: &str) -> String {
    ansi_wrap(text, "\x1b[33m", "\x1b[39m")
}

fn magenta(text: &str) -> String {
    ansi_wrap(text, "\x1b[35m", "\x1b[39m")
}

fn plain(text: &str) -> String {
    text.to_string()
}

pub struct AppComponent {
    app: Arc<Mutex<App>>,
    host: Arc<RuntimeController>,
    input: mail_tui::Input,
    loader: Loader,
    scroll: ScrollState,
    terminal_rows: usize,
    body_rows: usize,
    backend_label: String,
}

impl AppComponent {
    pub fn new(
        app: Arc<Mutex<App>>,
        host: Arc<RuntimeController>,
        runtime_handle: &RuntimeHandle,
    ) -> Self {
        let app_for_change = Arc::clone(&app);
        let app_for_submit = Arc::clone(&app);
        let host_for_submit = Arc::clone(&host);

        let mut input = mail_tui::Input::new();
        input.set_prompt(cyan("› "));
        input.set_placeholder(INPUT_PLACEHOLDER);
        input.set_on_change(Some(Box::new(move |value: &str| {
            lock_unpoisoned(&app_for_change).update_draft(value);
        })));
        input.set_on_submit(Some(Box::new(move |value: String| {
            let mut app = lock_unpoisoned(&app_for_submit);
            app.update_draft(&value);

            let mut host = Arc::clone(&host_for_submit);
            app.on_submit(&mut host);
        })));

        let loader = Loader::new(
            runtime_handle.render_handle(),
            Box::new(cyan),
            Box::new(dim),
            PENDING_MESSAGE,
        );
        let backend_label = host.backend_id();

        Self {
            app,
            host,
            input,
            loader,
            scroll: ScrollState::new(),
            terminal_rows: 0,
            body_rows: 0,
            backend_label,
        }
    }

    fn with_app_mut(&self, mut f: impl FnMut(&mut App, &mut dyn HostOps)) {
        let mut app = lock_unpoisoned(&self.app);
        let mut host = Arc::clone(&self.host);
        f(&mut app, &mut host);
    }

    fn snapshot(&self) -> App {
        lock_unpoisoned(&self.app).clone()
    }

    /// Mirrors draft and pending state into the input and spinner widgets.
    fn sync_widgets(&mut self, app: &App) {
        if self.input.value() != app.draft() {
            self.input.set_value(app.draft());
        }
        self.input.set_disabled(app.is_pending());

        if app.is_pending() {
            self.loader.start();
        } else {
            self.loader.stop();
        }
    }

    fn page_size(&self) -> usize {
        self.body_rows.saturating_sub(1).max(1)
    }

    fn request_render(&self) {
        let mut host = Arc::clone(&self.host);
        host.request_render();
    }
}

impl Component for AppComponent {
    fn render(&mut self, width: usize) -> Vec<String> {
        let snapshot = self.snapshot();
        self.sync_widgets(&snapshot);

        let mut lines = Vec::new();
        lines.push(bold(HEADER_TITLE));
        lines.push(dim(HEADER_SUBTITLE));
        lines.push(rule_line(width, None));

        let mut body = render_body(&snapshot, width);
        if snapshot.is_pending() {
            body.extend(self.loader.render(width));
        }

        self.scroll
            .sync(snapshot.history().len(), snapshot.is_pending(), snapshot.notices().len());
        if self.terminal_rows == 0 {
            lines.extend(body);
        } else {
            self.body_rows = self
                .terminal_rows
                .saturating_sub(HEADER_ROWS + FOOTER_ROWS)
                .max(1);
            let range = self.scroll.window(body.len(), self.body_rows);
            let shown = range.len();
            lines.extend(body.drain(range));
            lines.extend(std::iter::repeat(String::new()).take(self.body_rows - shown));
        }

        let scrolled = (!self.scroll.is_following())
            .then(|| format!(" ↓ {}줄 더 있음 (PgDn) ", self.scroll.offset_from_bottom()));
        lines.push(rule_line(width, scrolled.as_deref()));
        lines.extend(self.input.render(width));
        lines.push(render_footer(width, &self.backend_label));

        lines
    }

    fn set_terminal_rows(&mut self, rows: usize) {
        self.terminal_rows = rows;
    }

    fn handle_event(&mut self, event: &InputEvent) {
        match event.key_id() {
            Some("ctrl+c") => {
                self.with_app_mut(|app, host| app.on_quit(host));
            }
            Some("tab") => {
                let mut changed = false;
                self.with_app_mut(|app, _| changed = app.cycle_example());
                if changed {
                    self.request_render();
                }
            }
            Some("pageUp") => {
                let page = self.page_size();
                self.scroll.scroll_up(page);
                self.request_render();
            }
            Some("pageDown") => {
                let page = self.page_size();
                self.scroll.scroll_down(page);
                self.request_render();
            }
            Some("ctrl+up") => {
                self.scroll.scroll_up(1);
                self.request_render();
            }
            Some("ctrl+down") => {
                self.scroll.scroll_down(1);
                self.request_render();
            }
            _ => self.input.handle_event(event),
        }

        let snapshot = self.snapshot();
        self.sync_widgets(&snapshot);
    }
}

fn render_body(app: &App, width: usize) -> Vec<String> {
    let mut lines = Vec::new();

    if app.is_empty() {
        render_empty_panel(width, &mut lines);
    }

    for (index, turn) in app.history().iter().enumerate() {
        render_notices_at(app.notices(), index, width, &mut lines);
        render_turn(turn, width, &mut lines);
    }
    render_notices_at(app.notices(), app.history().len(), width, &mut lines);

    lines
}

fn render_empty_panel(width: usize, lines: &mut Vec<String>) {
    lines.push(String::new());
    append_wrapped_text(lines, width, EMPTY_TITLE, INDENT, INDENT, bold);
    append_wrapped_text(lines, width, EMPTY_SUBTITLE, INDENT, INDENT, dim);
    lines.push(String::new());
    for (index, prompt) in EXAMPLE_PROMPTS.iter().enumerate() {
        let number = format!("{INDENT}{}. ", index + 1);
        append_wrapped_text(lines, width, prompt, &number, "     ", cyan);
    }
    lines.push(String::new());
    append_wrapped_text(
        lines,
        width,
        "Tab 키로 예시 질문을 입력창에 채울 수 있습니다.",
        INDENT,
        INDENT,
        dim,
    );
    lines.push(String::new());
}

fn render_notices_at(notices: &[Notice], after_turns: usize, width: usize, lines: &mut Vec<String>) {
    for notice in notices.iter().filter(|notice| notice.after_turns == after_turns) {
        append_wrapped_text(lines, width, &notice.text, "• ", INDENT, yellow);
        lines.push(String::new());
    }
}

fn render_turn(turn: &Turn, width: usize, lines: &mut Vec<String>) {
    lines.push(role_label(turn.role));
    append_wrapped_text(lines, width, &turn.content, INDENT, INDENT, plain);

    if let Some(sources) = turn.sources.as_deref().filter(|sources| !sources.is_empty()) {
        lines.push(String::new());
        lines.push(format!("{INDENT}{}", bold(SOURCES_HEADER)));
        for evidence in sources {
            render_evidence(evidence, width, lines);
        }
    }

    lines.push(String::new());
}

fn render_evidence(evidence: &Evidence, width: usize, lines: &mut Vec<String>) {
    append_wrapped_text(lines, width, &evidence_heading(evidence), "  - ", "    ", magenta);
    if !evidence.summary.trim().is_empty() {
        append_wrapped_text(lines, width, evidence.summary.trim(), "    ", "    ", dim);
    }
}

fn role_label(role: Role) -> String {
    match role {
        Role::User => bold(&cyan("you")),
        Role::Assistant => bold(&blue("assistant")),
    }
}

/// Wraps plain `text` under the given prefixes and styles each wrapped segment.
fn append_wrapped_text(
    lines: &mut Vec<String>,
    width: usize,
    text: &str,
    first_prefix: &str,
    continuation_prefix: &str,
    style: fn(&str) -> String,
) {
    let prefix_width = visible_width(first_prefix).max(visible_width(continuation_prefix));
    let available = width.saturating_sub(prefix_width).max(1);

    for (index, segment) in wrap_text(text, available).iter().enumerate() {
        let prefix = if index == 0 {
            first_prefix
        } else {
            continuation_prefix
        };
        if segment.is_empty() {
            lines.push(prefix.trim_end().to_string());
        } else {
            lines.push(format!("{prefix}{}", style(segment)));
        }
    }
}

fn rule_line(width: usize, label: Option<&str>) -> String {
    let width = width.max(1);
    let Some(label) = label else {
        return dim(&"─".repeat(width));
    };

    let label_width = visible_width(label);
    if width <= 2 + label_width {
        return dim(&"─".repeat(width));
    }

    format!(
        "{}{}{}",
        dim("──"),
        yellow(label),
        dim(&"─".repeat(width - 2 - label_width))
    )
}

fn render_footer(width: usize, backend_label: &str) -> String {
    if width == 0 {
        return String::new();
    }

    let right = format!("backend {backend_label}");
    let left_width = visible_width(KEY_HINTS);
    let right_width = visible_width(&right);

    if left_width + right_width + 2 > width {
        return dim(&truncate_to_width(KEY_HINTS, width, "…", false));
    }

    let fill = width - left_width - right_width;
    format!("{}{}{}", dim(KEY_HINTS), " ".repeat(fill), dim(&right))
}
