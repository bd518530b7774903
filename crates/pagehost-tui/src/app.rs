//! Dashboard input state
//!
//! Key handling is kept free of I/O: it turns key presses into [`Action`]s
//! that `main` dispatches against the stores.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use pagehost_core::store::ProjectsState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// Editing the search filter
    Search,
    /// Waiting for a second `d` (or `y`) to delete this slug
    ConfirmDelete(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    Refresh,
    Search(String),
    ClearSearch,
    Toggle(String),
    Delete(String),
    CopyUrl(String),
}

#[derive(Debug)]
pub struct App {
    pub selected: usize,
    pub mode: Mode,
    pub input: String,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            selected: 0,
            mode: Mode::Normal,
            input: String::new(),
        }
    }

    /// Keep the selection inside a list of `len` rows
    pub fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    fn selected_slug(&self, state: &ProjectsState) -> Option<String> {
        state.projects.get(self.selected).map(|p| p.slug.clone())
    }

    pub fn handle_key(&mut self, key: KeyEvent, state: &ProjectsState) -> Action {
        if key.kind != KeyEventKind::Press {
            return Action::None;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Action::Quit;
        }

        match std::mem::replace(&mut self.mode, Mode::Normal) {
            Mode::Normal => self.handle_normal(key, state),
            Mode::Search => self.handle_search(key),
            Mode::ConfirmDelete(slug) => match key.code {
                KeyCode::Char('d') | KeyCode::Char('y') => Action::Delete(slug),
                _ => Action::None,
            },
        }
    }

    fn handle_normal(&mut self, key: KeyEvent, state: &ProjectsState) -> Action {
        match key.code {
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('r') => Action::Refresh,
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < state.projects.len() {
                    self.selected += 1;
                }
                Action::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                Action::None
            }
            KeyCode::Char('/') => {
                self.input = state.search_query.clone();
                self.mode = Mode::Search;
                Action::None
            }
            KeyCode::Char('t') => self
                .selected_slug(state)
                .map(Action::Toggle)
                .unwrap_or(Action::None),
            KeyCode::Char('d') => {
                if let Some(slug) = self.selected_slug(state) {
                    self.mode = Mode::ConfirmDelete(slug);
                }
                Action::None
            }
            KeyCode::Char('c') => self
                .selected_slug(state)
                .map(Action::CopyUrl)
                .unwrap_or(Action::None),
            _ => Action::None,
        }
    }

    fn handle_search(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Enter => {
                self.selected = 0;
                let query = std::mem::take(&mut self.input);
                if query.is_empty() {
                    Action::ClearSearch
                } else {
                    Action::Search(query)
                }
            }
            KeyCode::Esc => {
                self.input.clear();
                self.selected = 0;
                Action::ClearSearch
            }
            KeyCode::Backspace => {
                self.input.pop();
                self.mode = Mode::Search;
                Action::None
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                self.mode = Mode::Search;
                Action::None
            }
            _ => {
                self.mode = Mode::Search;
                Action::None
            }
        }
    }
}
