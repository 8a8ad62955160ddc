//! TUI runtime.
//!
//! The runtime owns the terminal, a root component and a wake queue. Terminal input threads,
//! worker threads and timers only ever touch the wake queue; the UI thread drains it in
//! [`TuiRuntime::run_blocking_once`], applies commands and input, then renders once.

use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use crate::core::component::Component;
use crate::core::input_event::{parse_input_events, InputEvent};
use crate::core::output::{OutputGate, TerminalCmd};
use crate::core::terminal::Terminal;
use crate::render::renderer::DiffRenderer;

/// Work dispatched onto the UI thread from any thread.
pub enum Command {
    RequestRender,
    RequestStop,
    Custom(Box<dyn CustomCommand>),
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestRender => f.write_str("RequestRender"),
            Self::RequestStop => f.write_str("RequestStop"),
            Self::Custom(command) => write!(f, "Custom({})", command.name()),
        }
    }
}

/// A unit of application work executed on the UI thread between input handling and render.
pub trait CustomCommand: Send {
    fn name(&self) -> &'static str;

    fn apply(self: Box<Self>, ctx: &mut CustomCommandCtx) -> Result<(), CustomCommandError>;
}

/// What a custom command may ask of the runtime.
#[derive(Debug, Default)]
pub struct CustomCommandCtx {
    render_requested: bool,
    stop_requested: bool,
}

impl CustomCommandCtx {
    pub fn request_render(&mut self) {
        self.render_requested = true;
    }

    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomCommandError {
    message: String,
}

impl CustomCommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CustomCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CustomCommandError {}

#[derive(Default)]
struct RuntimeWakeState {
    pending_inputs: Vec<String>,
    pending_commands: VecDeque<Command>,
    pending_resize: bool,
    render_requested: bool,
    stop_requested: bool,
}

impl RuntimeWakeState {
    fn has_work(&self) -> bool {
        self.stop_requested
            || self.pending_resize
            || self.render_requested
            || !self.pending_inputs.is_empty()
            || !self.pending_commands.is_empty()
    }
}

#[derive(Default)]
struct RuntimeWake {
    state: Mutex<RuntimeWakeState>,
    cvar: Condvar,
}

impl RuntimeWake {
    fn lock(&self) -> MutexGuard<'_, RuntimeWakeState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn wait_for_event(&self) {
        let mut state = self.lock();
        while !state.has_work() {
            state = self
                .cvar
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    fn with_state(&self, f: impl FnOnce(&mut RuntimeWakeState)) {
        let mut state = self.lock();
        f(&mut state);
        self.cvar.notify_all();
    }

    fn enqueue_input(&self, data: String) {
        self.with_state(|state| state.pending_inputs.push(data));
    }

    fn enqueue_command(&self, command: Command) {
        self.with_state(|state| state.pending_commands.push_back(command));
    }

    fn signal_resize(&self) {
        self.with_state(|state| state.pending_resize = true);
    }

    fn request_render(&self) {
        self.with_state(|state| state.render_requested = true);
    }

    fn request_stop(&self) {
        self.with_state(|state| state.stop_requested = true);
    }

    fn take_pending_resize(&self) -> bool {
        std::mem::take(&mut self.lock().pending_resize)
    }

    fn take_render_requested(&self) -> bool {
        std::mem::take(&mut self.lock().render_requested)
    }

    fn drain_inputs(&self) -> Vec<String> {
        std::mem::take(&mut self.lock().pending_inputs)
    }

    fn drain_commands(&self) -> VecDeque<Command> {
        std::mem::take(&mut self.lock().pending_commands)
    }

    fn stop_requested(&self) -> bool {
        self.lock().stop_requested
    }

    fn reset_for_start(&self) {
        let mut state = self.lock();
        *state = RuntimeWakeState::default();
    }
}

/// Cloneable, thread-safe handle for dispatching [`Command`]s to the runtime.
#[derive(Clone)]
pub struct RuntimeHandle {
    wake: Arc<RuntimeWake>,
}

impl RuntimeHandle {
    pub fn dispatch(&self, command: Command) {
        match command {
            Command::RequestRender => self.wake.request_render(),
            Command::RequestStop => self.wake.request_stop(),
            Command::Custom(_) => self.wake.enqueue_command(command),
        }
    }

    /// A handle that can only request renders, for widgets that animate.
    pub fn render_handle(&self) -> RenderHandle {
        RenderHandle {
            wake: Arc::clone(&self.wake),
        }
    }

    /// A handle that is not attached to any runtime; dispatched work is queued and dropped.
    pub fn detached() -> Self {
        Self {
            wake: Arc::new(RuntimeWake::default()),
        }
    }
}

#[derive(Clone)]
pub struct RenderHandle {
    wake: Arc<RuntimeWake>,
}

impl RenderHandle {
    pub fn request_render(&self) {
        self.wake.request_render();
    }
}

pub struct TuiRuntime<T: Terminal> {
    terminal: T,
    root: Box<dyn Component>,
    renderer: DiffRenderer,
    output: OutputGate,
    wake: Arc<RuntimeWake>,
    stopped: bool,
}

impl<T: Terminal> TuiRuntime<T> {
    pub fn new(terminal: T, root: Box<dyn Component>) -> Self {
        Self {
            terminal,
            root,
            renderer: DiffRenderer::new(),
            output: OutputGate::new(),
            wake: Arc::new(RuntimeWake::default()),
            stopped: true,
        }
    }

    /// Create a runtime with an empty root; install the real root with [`TuiRuntime::set_root`]
    /// once components that need a [`RuntimeHandle`] have been built.
    pub fn with_terminal(terminal: T) -> Self {
        Self::new(terminal, Box::new(EmptyRoot))
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            wake: Arc::clone(&self.wake),
        }
    }

    pub fn set_root(&mut self, root: Box<dyn Component>) {
        self.root = root;
        self.renderer.request_full_redraw_next();
        self.wake.request_render();
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut T {
        &mut self.terminal
    }

    /// Whether a [`Command::RequestStop`] has been observed.
    pub fn is_stop_requested(&self) -> bool {
        self.wake.stop_requested()
    }

    pub fn start(&mut self) -> io::Result<()> {
        self.output.clear();
        self.wake.reset_for_start();

        let wake_input = Arc::clone(&self.wake);
        let wake_resize = Arc::clone(&self.wake);
        self.terminal.start(
            Box::new(move |data| wake_input.enqueue_input(data)),
            Box::new(move || wake_resize.signal_resize()),
        )?;
        self.stopped = false;

        self.output.push(TerminalCmd::AltScreenEnter);
        self.output.push(TerminalCmd::BracketedPasteEnable);
        self.output.push(TerminalCmd::HideCursor);
        self.flush_output();
        self.renderer.request_full_redraw_next();
        self.wake.request_render();

        Ok(())
    }

    pub fn stop(&mut self) -> io::Result<()> {
        if self.stopped {
            return Ok(());
        }
        self.output.push(TerminalCmd::ShowCursor);
        self.output.push(TerminalCmd::BracketedPasteDisable);
        self.output.push(TerminalCmd::AltScreenLeave);
        self.flush_output();
        self.stopped = true;
        self.terminal.stop()
    }

    /// Block until work is queued, then process it and render once.
    pub fn run_blocking_once(&mut self) {
        if self.stopped {
            return;
        }
        self.wake.wait_for_event();
        self.run_once();
    }

    /// Process everything already queued without blocking.
    pub fn run_once(&mut self) {
        let mut render = self.apply_commands();

        if self.wake.take_pending_resize() {
            let event = InputEvent::Resize {
                columns: self.terminal.columns(),
                rows: self.terminal.rows(),
            };
            self.root.handle_event(&event);
            self.renderer.request_full_redraw_next();
            render = true;
        }

        for data in self.wake.drain_inputs() {
            self.handle_input(&data);
        }

        // Input handlers may have queued more commands (for example a submit spawning work that
        // finished immediately).
        render |= self.apply_commands();

        if self.wake.take_render_requested() || render {
            self.do_render();
        }
        self.flush_output();
    }

    /// Parse raw terminal input and deliver it to the root component.
    pub fn handle_input(&mut self, data: &str) {
        let events = parse_input_events(data);
        for event in &events {
            self.root.handle_event(event);
        }
        if !events.is_empty() {
            self.wake.request_render();
        }
    }

    pub fn render_now(&mut self) {
        self.wake.take_render_requested();
        self.do_render();
        self.flush_output();
    }

    fn apply_commands(&mut self) -> bool {
        let mut render = false;
        for command in self.wake.drain_commands() {
            match command {
                Command::RequestRender => render = true,
                Command::RequestStop => self.wake.request_stop(),
                Command::Custom(command) => {
                    let name = command.name();
                    let mut ctx = CustomCommandCtx::default();
                    if let Err(error) = command.apply(&mut ctx) {
                        tracing::warn!(command = name, %error, "custom command failed");
                    }
                    render |= ctx.render_requested;
                    if ctx.stop_requested {
                        self.wake.request_stop();
                    }
                }
            }
        }
        render
    }

    fn do_render(&mut self) {
        let width = self.terminal.columns() as usize;
        let height = self.terminal.rows() as usize;
        self.root.set_terminal_rows(height);
        let lines = self.root.render(width);
        let cmds = self.renderer.render(lines, width, height);
        self.output.extend(cmds);
    }

    fn flush_output(&mut self) {
        self.output.flush(&mut self.terminal);
    }
}

struct EmptyRoot;

impl Component for EmptyRoot {
    fn render(&mut self, _width: usize) -> Vec<String> {
        Vec::new()
    }
}

impl<T: Terminal> Drop for TuiRuntime<T> {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
