use std::ops::Range;

/// Viewport position over the transcript, measured in lines from the bottom.
///
/// A change in any tracked count snaps the view back to the newest line. Between such changes
/// a manual offset survives re-renders and resizes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrollState {
    seen: Option<ContentMarker>,
    offset_from_bottom: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ContentMarker {
    history_len: usize,
    pending: bool,
    notices: usize,
}

impl ScrollState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the latest content counts, snapping to the bottom when they differ from the last
    /// ones seen. Returns whether a snap happened.
    pub fn sync(&mut self, history_len: usize, pending: bool, notices: usize) -> bool {
        let marker = ContentMarker {
            history_len,
            pending,
            notices,
        };
        if self.seen == Some(marker) {
            return false;
        }

        self.seen = Some(marker);
        self.offset_from_bottom = 0;
        true
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.offset_from_bottom = self.offset_from_bottom.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.offset_from_bottom = self.offset_from_bottom.saturating_sub(lines);
    }

    pub fn offset_from_bottom(&self) -> usize {
        self.offset_from_bottom
    }

    pub fn is_following(&self) -> bool {
        self.offset_from_bottom == 0
    }

    /// Returns the line range to show and clamps the stored offset to the content.
    pub fn window(&mut self, content_len: usize, viewport: usize) -> Range<usize> {
        let max_offset = content_len.saturating_sub(viewport);
        self.offset_from_bottom = self.offset_from_bottom.min(max_offset);

        let end = content_len - self.offset_from_bottom;
        let start = end.saturating_sub(viewport);
        start..end
    }
}
