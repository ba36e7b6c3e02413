//! Maps the current position in the active collection to a visible window.
//!
//! `offset` is the first visible position and `cursor` the selected row
//! within the window, so the current position is `offset + cursor`. After
//! every operation:
//!
//! - `cursor < pane_height`, or `cursor == 0` when nothing can be shown
//! - `offset + pane_height <= len` when `len >= pane_height`, else `offset == 0`

use std::ops::Range;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Viewport {
    offset: usize,
    cursor: usize,
    pane_height: usize,
    len: usize,
}

impl Viewport {
    pub fn new(len: usize, pane_height: usize) -> Self {
        Self { offset: 0, cursor: 0, pane_height, len }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn pane_height(&self) -> usize {
        self.pane_height
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Current position in the active collection, if it has any entries
    pub fn position(&self) -> Option<usize> {
        (self.len > 0).then_some(self.offset + self.cursor)
    }

    /// Positions currently on screen
    pub fn visible_range(&self) -> Range<usize> {
        let end = (self.offset + self.pane_height).min(self.len);
        self.offset.min(end)..end
    }

    fn max_offset(&self) -> usize {
        self.len.saturating_sub(self.pane_height)
    }

    /// Move the current position by `delta`, shifting the window only when
    /// the new position leaves it.
    pub fn scroll(&mut self, delta: isize) {
        if self.len == 0 || self.pane_height == 0 {
            return;
        }

        let current = (self.offset + self.cursor) as isize;
        let new_pos = current.saturating_add(delta).clamp(0, self.len as isize - 1) as usize;

        if new_pos < self.offset {
            self.offset = new_pos;
        } else if new_pos > self.offset + self.pane_height - 1 {
            self.offset = new_pos + 1 - self.pane_height;
        }
        self.offset = self.offset.min(self.max_offset());
        self.cursor = new_pos - self.offset;
    }

    pub fn jump_to_top(&mut self) {
        self.scroll(-(self.len as isize));
    }

    pub fn jump_to_bottom(&mut self) {
        self.scroll(self.len as isize);
    }

    pub fn page_up(&mut self) {
        self.scroll(-(self.pane_height as isize));
    }

    pub fn page_down(&mut self) {
        self.scroll(self.pane_height as isize);
    }

    /// Move to an absolute position
    pub fn scroll_to(&mut self, position: usize) {
        let current = (self.offset + self.cursor) as isize;
        self.scroll(position as isize - current);
    }

    /// Change the pane height, keeping the current position and scaling the
    /// cursor row proportionally.
    pub fn resize(&mut self, new_height: usize) {
        let old_height = self.pane_height;
        let prev = self.offset + self.cursor;
        self.pane_height = new_height;

        if self.len == 0 {
            self.offset = 0;
            self.cursor = 0;
            return;
        }
        if new_height == 0 {
            self.offset = prev;
            self.cursor = 0;
            return;
        }

        let scaled = if old_height == 0 {
            self.cursor
        } else {
            // round half up
            (self.cursor * new_height * 2 + old_height) / (old_height * 2)
        };
        let cursor = scaled.min(new_height - 1).min(prev);

        self.offset = (prev - cursor).min(self.max_offset());
        self.cursor = prev - self.offset;
    }

    /// Re-anchor onto a different collection, centring `anchor` when possible
    pub fn switch_collection(&mut self, new_len: usize, anchor: usize) {
        self.len = new_len;
        if new_len == 0 {
            self.offset = 0;
            self.cursor = 0;
            return;
        }

        let anchor = anchor.min(new_len - 1);
        self.offset = anchor
            .saturating_sub(self.pane_height / 2)
            .min(self.max_offset());
        self.cursor = anchor - self.offset;
    }

    /// Percentage through the collection, `None` when it is empty
    pub fn percent(&self) -> Option<usize> {
        self.position().map(|pos| pos * 100 / self.len())
    }
}
