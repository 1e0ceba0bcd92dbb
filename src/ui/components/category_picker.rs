use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};

const ALL_LABEL: &str = "All";

/// Events emitted by the category picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryEvent {
  /// `None` means "All", i.e. no filter
  Selected(Option<String>),
  Cancelled,
}

/// Centered overlay listing "All" followed by the category slugs
#[derive(Debug, Clone, Default)]
pub struct CategoryPicker {
  active: bool,
  categories: Vec<String>,
  selected: usize,
}

impl CategoryPicker {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Show the picker, preselecting `current` if present
  pub fn show(&mut self, categories: Vec<String>, current: Option<&str>) {
    self.selected = current
      .and_then(|c| categories.iter().position(|s| s == c))
      .map(|i| i + 1)
      .unwrap_or(0);
    self.categories = categories;
    self.active = true;
  }

  pub fn hide(&mut self) {
    self.active = false;
  }

  fn len(&self) -> usize {
    self.categories.len() + 1
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<CategoryEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc | KeyCode::Char('q') => {
        self.hide();
        KeyResult::Event(CategoryEvent::Cancelled)
      }
      KeyCode::Enter => {
        self.hide();
        let choice = match self.selected {
          0 => None,
          i => self.categories.get(i - 1).cloned(),
        };
        KeyResult::Event(CategoryEvent::Selected(choice))
      }
      KeyCode::Char('j') | KeyCode::Down => {
        self.selected = (self.selected + 1) % self.len();
        KeyResult::Handled
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.selected = (self.selected + self.len() - 1) % self.len();
        KeyResult::Handled
      }
      KeyCode::Home | KeyCode::Char('g') => {
        self.selected = 0;
        KeyResult::Handled
      }
      KeyCode::End | KeyCode::Char('G') => {
        self.selected = self.len() - 1;
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let widest = self
      .categories
      .iter()
      .map(|s| s.chars().count())
      .max()
      .unwrap_or(0)
      .max(ALL_LABEL.len());
    let width = (widest as u16 + 6).max(24).min(area.width);
    let height = (self.len() as u16 + 2).min(area.height.saturating_sub(2)).max(3);

    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Category ");

    let items: Vec<ListItem> = std::iter::once(ALL_LABEL)
      .chain(self.categories.iter().map(String::as_str))
      .map(|name| ListItem::new(Span::styled(name, Style::default().fg(Color::Cyan))))
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

    let mut state = ListState::default();
    state.select(Some(self.selected));

    frame.render_stateful_widget(list, overlay_area, &mut state);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn categories() -> Vec<String> {
    vec!["beauty".to_string(), "laptops".to_string()]
  }

  #[test]
  fn test_first_entry_is_all() {
    let mut picker = CategoryPicker::new();
    picker.show(categories(), None);
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(CategoryEvent::Selected(None))
    );
    assert!(!picker.is_active());
  }

  #[test]
  fn test_select_category() {
    let mut picker = CategoryPicker::new();
    picker.show(categories(), None);
    picker.handle_key(key(KeyCode::Down));
    picker.handle_key(key(KeyCode::Down));
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(CategoryEvent::Selected(Some("laptops".to_string())))
    );
  }

  #[test]
  fn test_preselects_current_and_wraps() {
    let mut picker = CategoryPicker::new();
    picker.show(categories(), Some("laptops"));
    picker.handle_key(key(KeyCode::Down));
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(CategoryEvent::Selected(None))
    );
  }

  #[test]
  fn test_escape_cancels() {
    let mut picker = CategoryPicker::new();
    assert_eq!(picker.handle_key(key(KeyCode::Esc)), KeyResult::NotHandled);
    picker.show(categories(), None);
    assert_eq!(
      picker.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(CategoryEvent::Cancelled)
    );
  }
}
