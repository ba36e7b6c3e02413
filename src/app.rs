use tracing::{debug, info};

use crate::config::{Config, DetailScroll};
use crate::editor::{Commit, QueryEditor};
use crate::layout::PaneLayout;
use crate::matches::MatchIndex;
use crate::store::{EntryStore, LogEntry};
use crate::theme::Theme;
use crate::viewport::Viewport;

/// Input mode for the application
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    /// Keys scroll, resize panes and jump between matches
    Navigating,
    /// Keys edit the query text
    Editing,
}

/// Which collection the log pane walks over
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewMode {
    /// Every entry, matches marked
    All,
    /// Only entries that satisfy the query
    MatchesOnly,
}

/// Main application state
pub struct AppState<'a> {
    /// Entries loaded at startup, never modified
    pub store: EntryStore,
    /// Entries matching the committed query
    pub matches: MatchIndex,
    /// Query text and its validity
    pub editor: QueryEditor<'a>,
    /// Offset and cursor over the active collection
    pub viewport: Viewport,
    /// Pane rectangles and split ratio
    pub layout: PaneLayout,
    /// Current input mode
    pub mode: InputMode,
    /// All entries or matches only
    pub view_mode: ViewMode,
    /// Colors for rendering
    pub theme: Theme,
    /// Whether the detail pane resets when the selection changes
    pub detail_policy: DetailScroll,
    /// First visible line of the detail pane
    pub detail_scroll: usize,
    /// Last known terminal size
    pub terminal_size: (u16, u16),
    /// Whether the app should quit
    pub should_quit: bool,
    /// Status message to display
    pub status_message: Option<String>,
    /// Whether to show help overlay
    pub show_help: bool,
}

impl<'a> AppState<'a> {
    pub fn new(store: EntryStore, config: &Config, theme: Theme) -> Self {
        let view_mode = if config.matches_only { ViewMode::MatchesOnly } else { ViewMode::All };
        let len = match view_mode {
            ViewMode::All => store.len(),
            ViewMode::MatchesOnly => 0,
        };

        Self {
            store,
            matches: MatchIndex::default(),
            editor: QueryEditor::new(),
            viewport: Viewport::new(len, 0),
            layout: PaneLayout::new(config.split_ratio, config.split_step),
            mode: InputMode::Navigating,
            view_mode,
            theme,
            detail_policy: config.detail_scroll,
            detail_scroll: 0,
            terminal_size: (0, 0),
            should_quit: false,
            status_message: None,
            show_help: false,
        }
    }

    /// Length of the collection the viewport currently walks
    pub fn active_len(&self) -> usize {
        match self.view_mode {
            ViewMode::All => self.store.len(),
            ViewMode::MatchesOnly => self.matches.count(),
        }
    }

    /// Entry index shown at a position of the active collection
    pub fn entry_index_at(&self, position: usize) -> Option<usize> {
        match self.view_mode {
            ViewMode::All => (position < self.store.len()).then_some(position),
            ViewMode::MatchesOnly => self.matches.get(position),
        }
    }

    pub fn current_entry_index(&self) -> Option<usize> {
        self.viewport.position().and_then(|pos| self.entry_index_at(pos))
    }

    pub fn current_entry(&self) -> Option<&LogEntry> {
        self.current_entry_index().and_then(|i| self.store.get(i))
    }

    /// Visible rows as `(is_cursor_row, entry index)`
    pub fn visible_rows(&self) -> Vec<(bool, usize)> {
        let cursor_pos = self.viewport.position();
        self.viewport
            .visible_range()
            .filter_map(|pos| {
                self.entry_index_at(pos)
                    .map(|idx| (Some(pos) == cursor_pos, idx))
            })
            .collect()
    }

    /// Terminal resized: recompute panes and rescale the cursor row
    pub fn resize(&mut self, width: u16, height: u16) {
        self.terminal_size = (width, height);
        self.layout.compute(width, height);
        self.viewport.resize(self.layout.log_rows());
        self.clamp_detail_scroll();
        debug!(
            width,
            height,
            rows = self.viewport.pane_height(),
            offset = self.viewport.offset(),
            cursor = self.viewport.cursor(),
            "Resized"
        );
    }

    pub fn shrink_log_pane(&mut self) {
        self.layout.shrink_log();
        self.relayout();
    }

    pub fn grow_log_pane(&mut self) {
        self.layout.grow_log();
        self.relayout();
    }

    fn relayout(&mut self) {
        let (width, height) = self.terminal_size;
        debug!(ratio = self.layout.split_ratio(), "Split adjusted");
        self.resize(width, height);
    }

    fn moved<F: FnOnce(&mut Viewport)>(&mut self, op: F) {
        let before = self.current_entry_index();
        op(&mut self.viewport);
        self.selection_changed(before);
    }

    fn selection_changed(&mut self, before: Option<usize>) {
        if self.current_entry_index() != before {
            match self.detail_policy {
                DetailScroll::Reset => self.detail_scroll = 0,
                DetailScroll::Keep => self.clamp_detail_scroll(),
            }
        }
    }

    pub fn scroll(&mut self, delta: isize) {
        self.moved(|vp| vp.scroll(delta));
    }

    pub fn page_down(&mut self) {
        self.moved(Viewport::page_down);
    }

    pub fn page_up(&mut self) {
        self.moved(Viewport::page_up);
    }

    pub fn go_to_top(&mut self) {
        self.moved(Viewport::jump_to_top);
    }

    pub fn go_to_bottom(&mut self) {
        self.moved(Viewport::jump_to_bottom);
    }

    /// Move to the next match after the current entry; never wraps
    pub fn next_match(&mut self) {
        match self.view_mode {
            ViewMode::MatchesOnly => {
                if self.viewport.position().is_some_and(|pos| pos + 1 < self.active_len()) {
                    self.scroll(1);
                } else {
                    self.status_message = Some("No next match".to_string());
                }
            }
            ViewMode::All => {
                let target = self.viewport.position().and_then(|pos| self.matches.next(pos));
                match target {
                    Some(target) => self.moved(|vp| vp.scroll_to(target)),
                    None => self.status_message = Some("No next match".to_string()),
                }
            }
        }
    }

    /// Move to the previous match before the current entry; never wraps
    pub fn prev_match(&mut self) {
        match self.view_mode {
            ViewMode::MatchesOnly => {
                if self.viewport.position().is_some_and(|pos| pos > 0) {
                    self.scroll(-1);
                } else {
                    self.status_message = Some("No previous match".to_string());
                }
            }
            ViewMode::All => {
                let target = self.viewport.position().and_then(|pos| self.matches.previous(pos));
                match target {
                    Some(target) => self.moved(|vp| vp.scroll_to(target)),
                    None => self.status_message = Some("No previous match".to_string()),
                }
            }
        }
    }

    /// Switch between all entries and matches only, keeping the selection
    /// on (or near) the same entry
    pub fn toggle_view_mode(&mut self) {
        let anchor = self.current_entry_index();
        self.view_mode = match self.view_mode {
            ViewMode::All => ViewMode::MatchesOnly,
            ViewMode::MatchesOnly => ViewMode::All,
        };
        self.reanchor(anchor);
        self.status_message = Some(match self.view_mode {
            ViewMode::All => "Showing all entries".to_string(),
            ViewMode::MatchesOnly => format!("Showing {}", self.matches.status_text()),
        });
    }

    /// Point the viewport at the active collection, nearest to `anchor`
    fn reanchor(&mut self, anchor: Option<usize>) {
        let position = match self.view_mode {
            ViewMode::All => anchor.unwrap_or(0),
            ViewMode::MatchesOnly => anchor
                .and_then(|idx| self.matches.nearest_position(idx))
                .unwrap_or(0),
        };
        let len = self.active_len();
        self.moved(|vp| vp.switch_collection(len, position));
    }

    pub fn begin_query_edit(&mut self) {
        self.mode = InputMode::Editing;
        self.editor.begin();
    }

    /// Compile the query and rebuild matches; runs on the input thread
    pub fn commit_query(&mut self) {
        self.mode = InputMode::Navigating;
        let anchor = self.current_entry_index();

        let commit = self.editor.commit();
        self.matches.rebuild(commit.predicate(), &self.store);

        self.status_message = match &commit {
            Commit::Cleared => None,
            Commit::Compiled(predicate) => {
                info!(query = predicate.source(), matches = self.matches.count(), "Query applied");
                None
            }
            Commit::Rejected(err) => {
                debug!(%err, "Query rejected");
                Some(format!("Invalid query: {}", err))
            }
        };

        if self.view_mode == ViewMode::MatchesOnly {
            self.reanchor(anchor);
        }
    }

    pub fn cancel_query(&mut self) {
        self.mode = InputMode::Navigating;
        self.editor.cancel();
    }

    /// Pretty-printed record for the detail pane
    pub fn detail_text(&self) -> Option<String> {
        self.current_entry().map(|entry| {
            serde_json::to_string_pretty(&entry.fields)
                .unwrap_or_else(|err| format!("[error] failed to format record: {}", err))
        })
    }

    fn max_detail_scroll(&self) -> usize {
        let lines = self.detail_text().map_or(0, |text| text.lines().count());
        lines.saturating_sub(self.layout.detail_rows())
    }

    fn clamp_detail_scroll(&mut self) {
        self.detail_scroll = self.detail_scroll.min(self.max_detail_scroll());
    }

    pub fn scroll_detail(&mut self, delta: isize) {
        let max = self.max_detail_scroll();
        self.detail_scroll = self.detail_scroll.saturating_add_signed(delta).min(max);
    }

    /// Copy the selected record to the system clipboard
    pub fn copy_current_entry(&mut self) {
        let Some(text) = self.detail_text() else {
            self.status_message = Some("Nothing to copy".to_string());
            return;
        };
        let result = arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text));
        self.status_message = Some(match result {
            Ok(()) => "Copied record to clipboard".to_string(),
            Err(err) => format!("Clipboard error: {}", err),
        });
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Percentage shown under the log pane
    pub fn percent(&self) -> Option<usize> {
        self.viewport.percent()
    }
}
