//! Loader widget.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::core::component::Component;
use crate::runtime::tui::RenderHandle;

type RenderRequester = Arc<dyn Fn() + Send + Sync>;

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const FRAME_INTERVAL: Duration = Duration::from_millis(80);

/// One-line spinner with a message. Animates on a background ticker while started.
pub struct Loader {
    spinner_color_fn: Box<dyn Fn(&str) -> String>,
    message_color_fn: Box<dyn Fn(&str) -> String>,
    message: String,
    render_requester: Option<RenderRequester>,
    current_frame: Arc<AtomicUsize>,
    stop_flag: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Loader {
    /// Create a stopped loader; call [`Loader::start`] to animate.
    pub fn new(
        render_handle: RenderHandle,
        spinner_color_fn: Box<dyn Fn(&str) -> String>,
        message_color_fn: Box<dyn Fn(&str) -> String>,
        message: impl Into<String>,
    ) -> Self {
        let requester = Arc::new(move || render_handle.request_render());
        Self::with_requester(Some(requester), spinner_color_fn, message_color_fn, message)
    }

    pub(crate) fn with_requester(
        render_requester: Option<RenderRequester>,
        spinner_color_fn: Box<dyn Fn(&str) -> String>,
        message_color_fn: Box<dyn Fn(&str) -> String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            spinner_color_fn,
            message_color_fn,
            message: message.into(),
            render_requester,
            current_frame: Arc::new(AtomicUsize::new(0)),
            stop_flag: Arc::new(AtomicBool::new(true)),
            thread: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    pub fn start(&mut self) {
        if self.thread.is_some() {
            return;
        }

        self.stop_flag.store(false, Ordering::SeqCst);
        self.current_frame.store(0, Ordering::SeqCst);

        let stop_flag = Arc::clone(&self.stop_flag);
        let current_frame = Arc::clone(&self.current_frame);
        let render_requester = self.render_requester.clone();

        self.thread = thread::Builder::new()
            .name("loader-ticker".to_string())
            .spawn(move || {
                while !stop_flag.load(Ordering::SeqCst) {
                    thread::sleep(FRAME_INTERVAL);
                    current_frame.fetch_add(1, Ordering::SeqCst);
                    if let Some(request) = render_requester.as_ref() {
                        request();
                    }
                }
            })
            .ok();
    }

    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    fn line(&self) -> String {
        let idx = self.current_frame.load(Ordering::SeqCst) % SPINNER_FRAMES.len();
        let spinner = (self.spinner_color_fn)(SPINNER_FRAMES[idx]);
        let message = (self.message_color_fn)(&self.message);
        format!("{spinner} {message}")
    }
}

impl Drop for Loader {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Component for Loader {
    fn render(&mut self, _width: usize) -> Vec<String> {
        vec![self.line()]
    }
}

#[cfg(test)]
mod tests {
    use super::Loader;
    use crate::core::component::Component;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn plain() -> Box<dyn Fn(&str) -> String> {
        Box::new(|text| text.to_string())
    }

    #[test]
    fn loader_ticks_and_requests_render() {
        let requests = Arc::new(AtomicUsize::new(0));
        let requests_clone = Arc::clone(&requests);
        let render_requester = Arc::new(move || {
            requests_clone.fetch_add(1, Ordering::SeqCst);
        });

        let mut loader = Loader::with_requester(Some(render_requester), plain(), plain(), "Working");
        loader.start();

        let before = loader.render(20);
        thread::sleep(Duration::from_millis(200));
        let after = loader.render(20);

        assert!(requests.load(Ordering::SeqCst) >= 1);
        assert_ne!(before, after);
        assert!(after[0].ends_with(" Working"));

        loader.stop();
        assert!(!loader.is_running());
    }

    #[test]
    fn stopped_loader_does_not_tick() {
        let requests = Arc::new(AtomicUsize::new(0));
        let requests_clone = Arc::clone(&requests);
        let loader = Loader::with_requester(
            Some(Arc::new(move || {
                requests_clone.fetch_add(1, Ordering::SeqCst);
            })),
            plain(),
            plain(),
            "idle",
        );

        thread::sleep(Duration::from_millis(120));
        assert!(!loader.is_running());
        assert_eq!(requests.load(Ordering::SeqCst), 0);
    }
}
