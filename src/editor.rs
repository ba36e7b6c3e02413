use ratatui::style::{Color, Style};
use tui_textarea::{CursorMove, TextArea};

use crate::query::{self, Predicate, QueryError};

/// Result of the last compile attempt
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Validity {
    #[default]
    Unset,
    Valid,
    Invalid,
}

impl Validity {
    /// Glyph shown in front of the query text
    pub fn glyph(self) -> char {
        match self {
            Validity::Unset => '?',
            Validity::Valid => '✓',
            Validity::Invalid => 'X',
        }
    }
}

/// What a commit hands on to the match index
#[derive(Debug)]
pub enum Commit {
    /// Empty query: no filter
    Cleared,
    Compiled(Predicate),
    /// The text did not compile; filtering is cleared but the text is kept
    Rejected(QueryError),
}

impl Commit {
    pub fn predicate(&self) -> Option<&Predicate> {
        match self {
            Commit::Compiled(predicate) => Some(predicate),
            _ => None,
        }
    }
}

/// Single-line query buffer with its own cursor
pub struct QueryEditor<'a> {
    textarea: TextArea<'a>,
    validity: Validity,
    /// Text and validity when editing began, restored on cancel
    snapshot: Option<(String, Validity)>,
}

fn new_textarea<'a>(text: String) -> TextArea<'a> {
    let mut textarea = TextArea::new(vec![text]);
    textarea.set_cursor_line_style(Style::default());
    textarea.set_placeholder_text("type a query, e.g. level == \"error\"");
    textarea.set_placeholder_style(Style::default().fg(Color::DarkGray));
    textarea
}

impl Default for QueryEditor<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> QueryEditor<'a> {
    pub fn new() -> Self {
        Self {
            textarea: new_textarea(String::new()),
            validity: Validity::Unset,
            snapshot: None,
        }
    }

    pub fn text(&self) -> String {
        self.textarea.lines().concat()
    }

    /// Cursor position in characters
    #[cfg(test)]
    pub fn edit_cursor(&self) -> usize {
        self.textarea.cursor().1
    }

    pub fn validity(&self) -> Validity {
        self.validity
    }

    pub fn textarea(&self) -> &TextArea<'a> {
        &self.textarea
    }

    /// Enter editing: cursor to the end, remember what to restore on cancel
    pub fn begin(&mut self) {
        self.snapshot = Some((self.text(), self.validity));
        self.textarea.move_cursor(CursorMove::End);
    }

    pub fn insert(&mut self, ch: char) {
        if ch == '\n' || ch == '\r' {
            return;
        }
        self.textarea.insert_char(ch);
        self.validity = Validity::Unset;
    }

    /// Delete the character before the cursor
    pub fn delete(&mut self) {
        self.textarea.delete_char();
        self.validity = Validity::Unset;
    }

    pub fn move_cursor(&mut self, delta: isize) {
        for _ in 0..delta.unsigned_abs() {
            self.textarea.move_cursor(if delta < 0 {
                CursorMove::Back
            } else {
                CursorMove::Forward
            });
        }
    }

    pub fn clear(&mut self) {
        self.textarea = new_textarea(String::new());
        self.validity = Validity::Unset;
    }

    /// Compile the current text and leave editing
    pub fn commit(&mut self) -> Commit {
        self.snapshot = None;
        let text = self.text();
        if text.is_empty() {
            self.validity = Validity::Unset;
            return Commit::Cleared;
        }
        match query::compile(&text) {
            Ok(predicate) => {
                self.validity = Validity::Valid;
                Commit::Compiled(predicate)
            }
            Err(err) => {
                self.validity = Validity::Invalid;
                Commit::Rejected(err)
            }
        }
    }

    /// Leave editing, restoring the text and validity from before `begin`
    pub fn cancel(&mut self) {
        if let Some((text, validity)) = self.snapshot.take() {
            self.textarea = new_textarea(text);
            self.validity = validity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_with(text: &str) -> QueryEditor<'static> {
        let mut editor = QueryEditor::new();
        editor.begin();
        for ch in text.chars() {
            editor.insert(ch);
        }
        editor
    }

    #[test]
    fn test_insert_splices_at_cursor() {
        let mut editor = editor_with("ac");
        editor.move_cursor(-1);
        editor.insert('b');
        assert_eq!(editor.text(), "abc");
        assert_eq!(editor.edit_cursor(), 2);
    }

    #[test]
    fn test_delete_before_cursor() {
        let mut editor = editor_with("abc");
        editor.move_cursor(-1);
        editor.delete();
        assert_eq!(editor.text(), "ac");
        assert_eq!(editor.edit_cursor(), 1);

        editor.move_cursor(-5);
        assert_eq!(editor.edit_cursor(), 0);
        editor.delete();
        assert_eq!(editor.text(), "ac");
    }

    #[test]
    fn test_cursor_is_clamped() {
        let mut editor = editor_with("xy");
        editor.move_cursor(10);
        assert_eq!(editor.edit_cursor(), 2);
        editor.move_cursor(-10);
        assert_eq!(editor.edit_cursor(), 0);
    }

    #[test]
    fn test_multibyte_characters() {
        let mut editor = editor_with("né");
        assert_eq!(editor.edit_cursor(), 2);
        editor.delete();
        assert_eq!(editor.text(), "n");
    }

    #[test]
    fn test_commit_valid_then_edit_resets_validity() {
        let mut editor = editor_with(r#"level == "error""#);
        assert!(matches!(editor.commit(), Commit::Compiled(_)));
        assert_eq!(editor.validity(), Validity::Valid);

        editor.begin();
        assert_eq!(editor.edit_cursor(), editor.text().chars().count());
        editor.insert(' ');
        assert_eq!(editor.validity(), Validity::Unset);
    }

    #[test]
    fn test_commit_empty_is_unset() {
        let mut editor = editor_with("a ==");
        editor.commit();
        assert_eq!(editor.validity(), Validity::Invalid);

        editor.begin();
        editor.clear();
        assert_eq!(editor.edit_cursor(), 0);
        assert!(matches!(editor.commit(), Commit::Cleared));
        assert_eq!(editor.validity(), Validity::Unset);
    }

    #[test]
    fn test_commit_invalid_keeps_text() {
        let mut editor = editor_with("level ==");
        let commit = editor.commit();
        assert!(matches!(commit, Commit::Rejected(_)));
        assert!(commit.predicate().is_none());
        assert_eq!(editor.validity(), Validity::Invalid);
        assert_eq!(editor.text(), "level ==");
    }

    #[test]
    fn test_cancel_restores_previous_state() {
        let mut editor = editor_with("a == 1");
        editor.commit();

        editor.begin();
        editor.clear();
        editor.insert('z');
        editor.cancel();

        assert_eq!(editor.text(), "a == 1");
        assert_eq!(editor.validity(), Validity::Valid);
    }

    #[test]
    fn test_glyphs() {
        assert_eq!(Validity::Unset.glyph(), '?');
        assert_eq!(Validity::Valid.glyph(), '✓');
        assert_eq!(Validity::Invalid.glyph(), 'X');
    }
}
