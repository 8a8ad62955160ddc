//! Full-screen line diff renderer.
//!
//! Frames are exactly one screen tall. Only rows whose content changed since the previous frame
//! are rewritten; a width or height change (or an explicit request) repaints everything.

use crate::core::output::TerminalCmd;
use crate::core::text::width::truncate_to_width;

const LINE_RESET: &str = "\x1b[0m";
const CLEAR_TO_EOL: &str = "\x1b[K";
const SYNC_START: &str = "\x1b[?2026h";
const SYNC_END: &str = "\x1b[?2026l";
const CLEAR_ALL: &str = "\x1b[2J\x1b[H";

#[derive(Debug, Default)]
pub struct DiffRenderer {
    previous_lines: Vec<String>,
    previous_width: usize,
    previous_height: usize,
    force_full_redraw_next: bool,
}

impl DiffRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_full_redraw_next(&mut self) {
        self.force_full_redraw_next = true;
    }

    pub fn previous_lines(&self) -> &[String] {
        &self.previous_lines
    }

    pub fn render(&mut self, lines: Vec<String>, width: usize, height: usize) -> Vec<TerminalCmd> {
        let lines = fit_to_screen(lines, width, height);
        let full = std::mem::take(&mut self.force_full_redraw_next)
            || self.previous_lines.is_empty()
            || self.previous_width != width
            || self.previous_height != height;

        let mut buffer = String::new();
        if full {
            buffer.push_str(CLEAR_ALL);
            for (row, line) in lines.iter().enumerate() {
                push_row(&mut buffer, row, line);
            }
        } else {
            for (row, line) in lines.iter().enumerate() {
                if self.previous_lines.get(row) != Some(line) {
                    push_row(&mut buffer, row, line);
                }
            }
        }

        self.previous_lines = lines;
        self.previous_width = width;
        self.previous_height = height;

        if buffer.is_empty() {
            return Vec::new();
        }
        vec![TerminalCmd::Bytes(format!("{SYNC_START}{buffer}{SYNC_END}"))]
    }
}

fn push_row(buffer: &mut String, row: usize, line: &str) {
    buffer.push_str(&format!("\x1b[{};1H", row + 1));
    buffer.push_str(line);
    buffer.push_str(LINE_RESET);
    buffer.push_str(CLEAR_TO_EOL);
}

/// Clamp to `height` rows, pad with blank rows and cut every row to `width` cells.
fn fit_to_screen(mut lines: Vec<String>, width: usize, height: usize) -> Vec<String> {
    lines.truncate(height);
    lines.resize(height, String::new());
    lines
        .into_iter()
        .map(|line| truncate_to_width(&line, width, "", false))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::DiffRenderer;
    use crate::core::output::TerminalCmd;
    use crate::core::text::ansi::strip_ansi;

    fn output(cmds: Vec<TerminalCmd>) -> String {
        cmds.into_iter()
            .map(|cmd| match cmd {
                TerminalCmd::Bytes(data) => data,
                other => format!("{other:?}"),
            })
            .collect()
    }

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn first_render_clears_and_paints_every_row() {
        let mut renderer = DiffRenderer::new();
        let out = output(renderer.render(lines(&["a", "b"]), 10, 3));
        assert!(out.contains("\x1b[2J"));
        assert!(out.contains("\x1b[1;1Ha"));
        assert!(out.contains("\x1b[2;1Hb"));
        assert!(out.contains("\x1b[3;1H"));
        assert_eq!(renderer.previous_lines().len(), 3);
    }

    #[test]
    fn unchanged_frame_writes_nothing() {
        let mut renderer = DiffRenderer::new();
        renderer.render(lines(&["a", "b"]), 10, 2);
        assert!(renderer.render(lines(&["a", "b"]), 10, 2).is_empty());
    }

    #[test]
    fn only_changed_rows_are_rewritten() {
        let mut renderer = DiffRenderer::new();
        renderer.render(lines(&["a", "b", "c"]), 10, 3);
        let out = output(renderer.render(lines(&["a", "x", "c"]), 10, 3));
        assert!(out.contains("\x1b[2;1Hx"));
        assert!(!out.contains("\x1b[1;1H"));
        assert!(!out.contains("\x1b[3;1H"));
        assert!(!out.contains("\x1b[2J"));
    }

    #[test]
    fn width_change_forces_full_redraw() {
        let mut renderer = DiffRenderer::new();
        renderer.render(lines(&["a"]), 10, 1);
        let out = output(renderer.render(lines(&["a"]), 12, 1));
        assert!(out.contains("\x1b[2J"));
    }

    #[test]
    fn rows_are_cut_to_width_and_height() {
        let mut renderer = DiffRenderer::new();
        renderer.render(lines(&["abcdef", "second", "third"]), 3, 2);
        let visible: Vec<String> = renderer
            .previous_lines()
            .iter()
            .map(|line| strip_ansi(line))
            .collect();
        assert_eq!(visible, vec!["abc".to_string(), "sec".to_string()]);
    }
}
