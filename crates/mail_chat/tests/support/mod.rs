use std::sync::{Arc, Mutex};

use mail_chat::runtime::lock_unpoisoned;
use mail_tui::Terminal;

type InputHandler = Box<dyn FnMut(String) + Send>;

/// What the runtime did to the terminal: everything written plus session boundaries.
#[derive(Default)]
pub struct TerminalTrace {
    pub output: String,
    pub starts: usize,
    pub stops: usize,
    input: Option<InputHandler>,
}

pub type SharedTrace = Arc<Mutex<TerminalTrace>>;

/// Fixed-size terminal that records into a trace the test keeps a handle to.
pub struct RecordingTerminal {
    trace: SharedTrace,
    size: (u16, u16),
}

impl RecordingTerminal {
    pub fn new(columns: u16, rows: u16) -> (Self, SharedTrace) {
        let trace = SharedTrace::default();
        let terminal = Self {
            trace: Arc::clone(&trace),
            size: (columns, rows),
        };
        (terminal, trace)
    }
}

impl Terminal for RecordingTerminal {
    fn start(
        &mut self,
        on_input: InputHandler,
        _on_resize: Box<dyn FnMut() + Send>,
    ) -> std::io::Result<()> {
        let mut trace = lock_unpoisoned(&self.trace);
        trace.starts += 1;
        trace.input = Some(on_input);
        Ok(())
    }

    fn stop(&mut self) -> std::io::Result<()> {
        lock_unpoisoned(&self.trace).stops += 1;
        Ok(())
    }

    fn write(&mut self, data: &str) {
        lock_unpoisoned(&self.trace).output.push_str(data);
    }

    fn columns(&self) -> u16 {
        self.size.0
    }

    fn rows(&self) -> u16 {
        self.size.1
    }
}

/// Feeds raw bytes to the handler the runtime registered on start.
pub fn type_keys(trace: &SharedTrace, keys: &str) {
    let mut trace = lock_unpoisoned(trace);
    match trace.input.as_mut() {
        Some(handler) => handler(keys.to_string()),
        None => panic!("keys typed before the terminal was started"),
    }
}

pub fn screen(trace: &SharedTrace) -> String {
    lock_unpoisoned(trace).output.clone()
}
