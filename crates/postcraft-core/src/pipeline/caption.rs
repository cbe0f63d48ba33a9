//! Caption text with a hard length bound and an emoji picker.
//!
//! Lengths and the selection are in Unicode scalar values, never bytes.

use std::ops::Range;

/// Hard ceiling on caption length, in chars.
pub const MAX_CAPTION_CHARS: usize = 2200;

/// Built-in palette offered by the emoji picker.
pub const EMOJI_PALETTE: &[&str] = &[
    "😀", "😂", "😍", "🥰", "😎", "🤩", "😢", "🙏", "👍", "👏", "🔥", "✨", "🎉", "💯", "❤️",
    "🌅", "🌊", "🌿", "📸", "☕",
];

/// The caption being composed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caption {
    text: String,
    /// Current selection as a char range; empty means a plain cursor
    selection: Range<usize>,
    picker_open: bool,
    focused: bool,
}

impl Caption {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in chars.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Chars that can still be added without replacing anything.
    pub fn remaining(&self) -> usize {
        MAX_CAPTION_CHARS.saturating_sub(self.len())
    }

    pub fn selection(&self) -> Range<usize> {
        self.selection.clone()
    }

    /// Cursor position (end of the selection).
    pub fn cursor(&self) -> usize {
        self.selection.end
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    /// Set the selection; bounds are clamped to the text and ordered.
    pub fn select(&mut self, start: usize, end: usize) {
        let len = self.len();
        let (a, b) = (start.min(len), end.min(len));
        self.selection = a.min(b)..a.max(b);
        self.focused = true;
    }

    /// Place the cursor at `pos` with nothing selected.
    pub fn set_cursor(&mut self, pos: usize) {
        self.select(pos, pos);
    }

    /// Type text at the selection. Whatever does not fit is cut off, like a
    /// bounded text input. Returns the number of chars inserted.
    pub fn type_text(&mut self, input: &str) -> usize {
        let room = self.room_for_replacement();
        let inserted: String = input.chars().take(room).collect();
        let count = inserted.chars().count();
        self.replace_selection(&inserted);
        count
    }

    /// Insert an emoji at the selection, all or nothing.
    ///
    /// The picker closes either way. On success focus returns to the text
    /// with the cursor right after the emoji.
    pub fn insert_emoji(&mut self, emoji: &str) -> bool {
        self.picker_open = false;
        let needed = emoji.chars().count();
        if needed > self.room_for_replacement() {
            tracing::debug!("Emoji rejected: caption is at {} chars", self.len());
            return false;
        }
        self.replace_selection(emoji);
        self.focused = true;
        true
    }

    /// Delete the selection, or the char before the cursor.
    pub fn delete_backward(&mut self) {
        if self.selection.is_empty() {
            if self.selection.start == 0 {
                return;
            }
            self.selection.start -= 1;
        }
        self.replace_selection("");
    }

    /// Replace the whole text, truncated to the bound; cursor at the end.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.chars().take(MAX_CAPTION_CHARS).collect();
        let end = self.len();
        self.selection = end..end;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn picker_open(&self) -> bool {
        self.picker_open
    }

    pub fn open_picker(&mut self) {
        self.picker_open = true;
    }

    pub fn close_picker(&mut self) {
        self.picker_open = false;
    }

    pub fn toggle_picker(&mut self) {
        self.picker_open = !self.picker_open;
    }

    /// Max chars an insertion may have, given it replaces the selection.
    fn room_for_replacement(&self) -> usize {
        let selected = self.selection.end - self.selection.start;
        MAX_CAPTION_CHARS.saturating_sub(self.len() - selected)
    }

    fn replace_selection(&mut self, replacement: &str) {
        let start = self.byte_index(self.selection.start);
        let end = self.byte_index(self.selection.end);
        self.text.replace_range(start..end, replacement);
        let cursor = self.selection.start + replacement.chars().count();
        self.selection = cursor..cursor;
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }
}
