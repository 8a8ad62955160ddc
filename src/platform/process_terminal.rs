//! Process-based terminal implementation over the controlling tty.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use libc::{self, c_int};
use signal_hook::iterator::Signals;

use crate::core::terminal::Terminal;

const READ_POLL_MS: i32 = 50;

type InputHandler = Arc<Mutex<Option<Box<dyn FnMut(String) + Send>>>>;
type ResizeHandler = Arc<Mutex<Option<Box<dyn FnMut() + Send>>>>;

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_fd(fd: c_int, data: &str) -> io::Result<()> {
    let mut remaining = data.as_bytes();
    while !remaining.is_empty() {
        let result =
            unsafe { libc::write(fd, remaining.as_ptr() as *const libc::c_void, remaining.len()) };
        if result < 0 {
            let error = io::Error::last_os_error();
            if error.kind() == io::ErrorKind::Interrupted
                || error.kind() == io::ErrorKind::WouldBlock
            {
                continue;
            }
            return Err(error);
        }
        remaining = &remaining[result as usize..];
    }
    Ok(())
}

fn read_winsize(fd: c_int) -> Option<(u16, u16)> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };
    if result == 0 && size.ws_col > 0 && size.ws_row > 0 {
        Some((size.ws_col, size.ws_row))
    } else {
        None
    }
}

fn poll_readable(fd: c_int, timeout_ms: i32) -> bool {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let result = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
    result > 0 && (fds.revents & libc::POLLIN) != 0
}

fn get_termios(fd: c_int) -> io::Result<libc::termios> {
    let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
    let result = unsafe { libc::tcgetattr(fd, &mut termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(termios)
}

fn set_termios(fd: c_int, termios: &libc::termios) -> io::Result<()> {
    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Terminal backed by the process's stdin/stdout in raw mode.
///
/// Input is read on a background thread and handed over as raw UTF-8 chunks; `SIGWINCH` is
/// forwarded to the resize handler from a signal thread.
pub struct ProcessTerminal {
    stdin_fd: c_int,
    stdout_fd: c_int,
    original_termios: Option<libc::termios>,
    input_handler: InputHandler,
    resize_handler: ResizeHandler,
    input_thread: Option<JoinHandle<()>>,
    stop_flag: Arc<AtomicBool>,
    resize_signal_handle: Option<signal_hook::iterator::Handle>,
    resize_thread: Option<JoinHandle<()>>,
    write_failed: bool,
}

impl ProcessTerminal {
    pub fn new() -> Self {
        Self {
            stdin_fd: libc::STDIN_FILENO,
            stdout_fd: libc::STDOUT_FILENO,
            original_termios: None,
            input_handler: Arc::new(Mutex::new(None)),
            resize_handler: Arc::new(Mutex::new(None)),
            input_thread: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
            resize_signal_handle: None,
            resize_thread: None,
            write_failed: false,
        }
    }

    fn enable_raw_mode(&mut self) -> io::Result<()> {
        let original = match self.original_termios {
            Some(original) => original,
            None => {
                let original = get_termios(self.stdin_fd)?;
                self.original_termios = Some(original);
                original
            }
        };
        let mut raw = original;
        unsafe {
            libc::cfmakeraw(&mut raw);
        }
        set_termios(self.stdin_fd, &raw)
    }

    fn restore_raw_mode(&mut self) -> io::Result<()> {
        if let Some(original) = self.original_termios.as_ref() {
            set_termios(self.stdin_fd, original)?;
        }
        Ok(())
    }

    fn start_input_thread(&mut self) -> io::Result<()> {
        let stdin_fd = self.stdin_fd;
        let input_handler = Arc::clone(&self.input_handler);
        let stop_flag = Arc::clone(&self.stop_flag);

        let thread = thread::Builder::new()
            .name("terminal-input".to_string())
            .spawn(move || {
                let mut buffer = [0u8; 4096];
                // Bytes of a UTF-8 character split across two reads.
                let mut carry: Vec<u8> = Vec::new();

                while !stop_flag.load(Ordering::SeqCst) {
                    if !poll_readable(stdin_fd, READ_POLL_MS) {
                        continue;
                    }
                    let read_len = unsafe {
                        libc::read(stdin_fd, buffer.as_mut_ptr() as *mut libc::c_void, buffer.len())
                    };
                    if read_len <= 0 {
                        continue;
                    }

                    carry.extend_from_slice(&buffer[..read_len as usize]);
                    let data = match std::str::from_utf8(&carry) {
                        Ok(text) => text.to_string(),
                        Err(error) if error.error_len().is_none() => {
                            let valid = error.valid_up_to();
                            let text = String::from_utf8_lossy(&carry[..valid]).into_owned();
                            carry.drain(..valid);
                            if text.is_empty() {
                                continue;
                            }
                            deliver(&input_handler, text);
                            continue;
                        }
                        Err(_) => String::from_utf8_lossy(&carry).into_owned(),
                    };
                    carry.clear();
                    deliver(&input_handler, data);
                }
            })?;

        self.input_thread = Some(thread);
        Ok(())
    }

    fn stop_input_thread(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.input_thread.take() {
            let _ = handle.join();
        }
    }

    fn start_resize_thread(&mut self) -> io::Result<()> {
        let mut signals = Signals::new([libc::SIGWINCH])?;
        let handle = signals.handle();
        let resize_handler = Arc::clone(&self.resize_handler);

        let thread = thread::Builder::new()
            .name("terminal-resize".to_string())
            .spawn(move || {
                for _ in signals.forever() {
                    if let Some(handler) = lock_unpoisoned(&resize_handler).as_mut() {
                        handler();
                    }
                }
            })?;

        self.resize_signal_handle = Some(handle);
        self.resize_thread = Some(thread);
        Ok(())
    }

    fn stop_resize_thread(&mut self) {
        if let Some(handle) = self.resize_signal_handle.take() {
            handle.close();
        }
        if let Some(thread) = self.resize_thread.take() {
            let _ = thread.join();
        }
    }

    fn clear_handlers(&self) {
        *lock_unpoisoned(&self.input_handler) = None;
        *lock_unpoisoned(&self.resize_handler) = None;
    }
}

fn deliver(handler: &InputHandler, data: String) {
    if let Some(handler) = lock_unpoisoned(handler).as_mut() {
        handler(data);
    }
}

impl Default for ProcessTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for ProcessTerminal {
    fn start(
        &mut self,
        on_input: Box<dyn FnMut(String) + Send>,
        on_resize: Box<dyn FnMut() + Send>,
    ) -> io::Result<()> {
        *lock_unpoisoned(&self.input_handler) = Some(on_input);
        *lock_unpoisoned(&self.resize_handler) = Some(on_resize);
        self.stop_flag.store(false, Ordering::SeqCst);
        self.write_failed = false;

        if let Err(error) = self.enable_raw_mode() {
            self.clear_handlers();
            return Err(error);
        }

        let started = self
            .start_resize_thread()
            .and_then(|()| self.start_input_thread());
        if let Err(error) = started {
            self.stop_resize_thread();
            self.clear_handlers();
            let _ = self.restore_raw_mode();
            return Err(error);
        }

        Ok(())
    }

    fn stop(&mut self) -> io::Result<()> {
        self.stop_input_thread();
        self.stop_resize_thread();
        self.clear_handlers();

        // Flush input before leaving raw mode to avoid buffered bytes leaking to the shell.
        let _ = unsafe { libc::tcflush(self.stdin_fd, libc::TCIFLUSH) };

        self.restore_raw_mode()
    }

    fn write(&mut self, data: &str) {
        if self.write_failed || data.is_empty() {
            return;
        }
        if let Err(error) = write_fd(self.stdout_fd, data) {
            tracing::error!(%error, "terminal write failed; further output is dropped");
            self.write_failed = true;
        }
    }

    fn columns(&self) -> u16 {
        read_winsize(self.stdout_fd)
            .map(|(cols, _)| cols)
            .unwrap_or(80)
    }

    fn rows(&self) -> u16 {
        read_winsize(self.stdout_fd)
            .map(|(_, rows)| rows)
            .unwrap_or(24)
    }
}

#[cfg(test)]
mod tests {
    use super::{write_fd, ProcessTerminal};
    use crate::core::terminal::Terminal;

    #[test]
    fn write_fd_writes_every_byte_to_a_pipe() {
        let mut fds = [0; 2];
        let result = unsafe { libc::pipe(fds.as_mut_ptr()) };
        assert_eq!(result, 0);
        let (read_fd, write_fd_end) = (fds[0], fds[1]);

        write_fd(write_fd_end, "참고한 메일").expect("write");

        let mut buf = [0u8; 64];
        let len = unsafe { libc::read(read_fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
        assert!(len > 0);
        assert_eq!(
            std::str::from_utf8(&buf[..len as usize]).expect("utf8"),
            "참고한 메일"
        );

        unsafe {
            libc::close(read_fd);
            libc::close(write_fd_end);
        }
    }

    #[test]
    fn dimensions_fall_back_when_stdout_is_not_a_tty() {
        let mut terminal = ProcessTerminal::new();
        terminal.stdout_fd = -1;
        assert_eq!(terminal.columns(), 80);
        assert_eq!(terminal.rows(), 24);
    }
}
