//! State shared by the paged list views: the page cursor, the debounced
//! search box, the current request and the row selection.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use std::time::Duration;

use crate::cache::{CacheResult, CacheSource, Page};
use crate::debounce::Debouncer;
use crate::pagination::{PageParams, Pager};
use crate::query::{Query, QueryState};
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;

pub type PageQuery<T> = Query<CacheResult<Page<T>>>;

/// What the owning view has to do after a key or tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseEvent {
  /// The request changed (page or search term); issue a new query
  Reload,
}

pub struct Browser<T> {
  pager: Pager,
  search: SearchInput,
  debouncer: Debouncer<String>,
  /// Applied search term; empty means plain paging
  term: String,
  query: Option<PageQuery<T>>,
  list_state: ListState,
}

impl<T: Send + 'static> Browser<T> {
  pub fn new(page_size: u32, debounce: Duration) -> Self {
    Self {
      pager: Pager::new(page_size),
      search: SearchInput::new(),
      debouncer: Debouncer::new(debounce),
      term: String::new(),
      query: None,
      list_state: ListState::default(),
    }
  }

  pub fn params(&self) -> PageParams {
    self.pager.params()
  }

  /// The applied search term, if any. A blank but non-empty term still
  /// counts as a search and comes back empty.
  pub fn term(&self) -> Option<&str> {
    if self.term.is_empty() {
      None
    } else {
      Some(&self.term)
    }
  }

  /// Drop the search term and close the overlay
  pub fn clear_term(&mut self) {
    self.term.clear();
    self.search.reset();
    self.debouncer.cancel();
  }

  /// Back to page 1 of whatever is being browsed
  pub fn reset_page(&mut self) {
    self.pager.reset();
    self.list_state.select(Some(0));
  }

  /// Install a new request, aborting the old one if it is still running.
  pub fn load(&mut self, query: PageQuery<T>) {
    self.query = Some(query);
  }

  pub fn refetch(&mut self) {
    if let Some(query) = &mut self.query {
      query.refetch();
    }
  }

  pub fn searching(&self) -> bool {
    self.search.is_active()
  }

  pub fn items(&self) -> &[T] {
    self
      .query
      .as_ref()
      .and_then(|q| q.data())
      .map(|r| r.data.items.as_slice())
      .unwrap_or(&[])
  }

  pub fn selected(&self) -> Option<&T> {
    self.list_state.selected().and_then(|i| self.items().get(i))
  }

  fn apply_term(&mut self, term: String) -> bool {
    if term == self.term {
      return false;
    }
    self.term = term;
    self.reset_page();
    true
  }

  /// Search overlay, selection and paging keys.
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<BrowseEvent> {
    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Changed(text)) => {
        self.debouncer.push(text);
        return KeyResult::Handled;
      }
      KeyResult::Event(SearchEvent::Submitted(text)) => {
        // Enter skips the rest of the quiet period
        self.debouncer.cancel();
        return if self.apply_term(text) {
          KeyResult::Event(BrowseEvent::Reload)
        } else {
          KeyResult::Handled
        };
      }
      KeyResult::Handled => return KeyResult::Handled,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
        KeyResult::Handled
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
        KeyResult::Handled
      }
      KeyCode::Char('g') | KeyCode::Home => {
        self.list_state.select_first();
        KeyResult::Handled
      }
      KeyCode::Char('G') | KeyCode::End => {
        self.list_state.select_last();
        KeyResult::Handled
      }
      // Search results come back in one piece
      KeyCode::Char('n') | KeyCode::Right if self.term().is_none() => {
        self.turn_page(Pager::next)
      }
      KeyCode::Char('p') | KeyCode::Left if self.term().is_none() => {
        self.turn_page(Pager::prev)
      }
      _ => KeyResult::NotHandled,
    }
  }

  fn turn_page(&mut self, step: fn(&mut Pager) -> bool) -> KeyResult<BrowseEvent> {
    if step(&mut self.pager) {
      self.list_state.select(Some(0));
      KeyResult::Event(BrowseEvent::Reload)
    } else {
      KeyResult::Handled
    }
  }

  /// Poll the running request and the search debouncer.
  pub fn tick(&mut self) -> Option<BrowseEvent> {
    let paging = self.term.is_empty();
    if let Some(query) = &mut self.query {
      if query.poll() && paging {
        if let Some(result) = query.data() {
          self.pager.set_total(result.data.total);
        }
      }
    }

    let term = self.debouncer.poll()?;
    self.apply_term(term).then_some(BrowseEvent::Reload)
  }

  /// Render the list with a title carrying paging and cache state.
  pub fn render<F>(&mut self, frame: &mut Frame, area: Rect, label: &str, row: F)
  where
    F: Fn(&T) -> Line<'static>,
  {
    let len = self.items().len();
    ensure_valid_selection(&mut self.list_state, len);

    let title = format!(" {} ", self.title(label));
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let state = self.query.as_ref().map(|q| q.state());
    let empty_message = match state {
      None | Some(QueryState::Idle) | Some(QueryState::Loading) if len == 0 => Some("Loading..."),
      Some(QueryState::Error(_)) => Some("Failed to load. Press 'r' to retry."),
      _ if len == 0 => Some(match self.term() {
        Some(_) => "No matches.",
        None => "Nothing here.",
      }),
      _ => None,
    };

    if let Some(message) = empty_message {
      let paragraph = Paragraph::new(message)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
    } else {
      let items: Vec<ListItem> = self.items().iter().map(|item| ListItem::new(row(item))).collect();
      let list = List::new(items)
        .block(block)
        .highlight_style(
          Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
      frame.render_stateful_widget(list, area, &mut self.list_state);
    }

    self.search.render_overlay(frame, area);
  }

  fn title(&self, label: &str) -> String {
    let mut title = match self.term() {
      Some(term) => format!("{} matching \"{}\"", label, term),
      None => label.to_string(),
    };

    match self.query.as_ref().map(|q| q.state()) {
      Some(QueryState::Loading) => title.push_str(" (loading...)"),
      Some(QueryState::Error(e)) => title.push_str(&format!(" (error: {})", e)),
      Some(QueryState::Success(result)) => {
        if self.term().is_some() {
          title.push_str(&format!(" ({} found)", result.data.total));
        } else {
          title.push_str(&format!(
            " page {}/{} (total {})",
            self.pager.page(),
            self.pager.total_pages().max(1),
            self.pager.total()
          ));
        }
        if let (CacheSource::CacheFresh, Some(at)) = (result.source, result.cached_at) {
          let local = at.with_timezone(&chrono::Local);
          title.push_str(&format!(" [cached {}]", local.format("%H:%M:%S")));
        }
      }
      _ => {}
    }
    title
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn loaded(total: u64) -> PageQuery<u32> {
    Query::start(move || async move {
      Ok(CacheResult::from_network(Page::new((1..=10).collect(), total)))
    })
  }

  async fn settle(browser: &mut Browser<u32>) {
    tokio::time::sleep(Duration::from_millis(10)).await;
    browser.tick();
  }

  #[tokio::test]
  async fn test_paging_tracks_total() {
    let mut browser = Browser::new(10, Duration::from_millis(500));
    browser.load(loaded(25));
    settle(&mut browser).await;

    assert_eq!(browser.items().len(), 10);
    assert_eq!(
      browser.handle_key(key(KeyCode::Char('n'))),
      KeyResult::Event(BrowseEvent::Reload)
    );
    assert_eq!(browser.params(), PageParams::new(10, 10));
    assert_eq!(browser.title("Users"), "Users page 2/3 (total 25)");

    browser.handle_key(key(KeyCode::Right));
    assert_eq!(
      browser.handle_key(key(KeyCode::Right)),
      KeyResult::Handled
    );
    assert_eq!(browser.params(), PageParams::new(10, 20));
  }

  #[tokio::test(start_paused = true)]
  async fn test_search_is_debounced() {
    let mut browser: Browser<u32> = Browser::new(10, Duration::from_millis(500));
    browser.handle_key(key(KeyCode::Char('/')));
    browser.handle_key(key(KeyCode::Char('a')));
    tokio::time::advance(Duration::from_millis(300)).await;
    browser.handle_key(key(KeyCode::Char('b')));
    tokio::time::advance(Duration::from_millis(300)).await;
    assert_eq!(browser.tick(), None);

    tokio::time::advance(Duration::from_millis(200)).await;
    assert_eq!(browser.tick(), Some(BrowseEvent::Reload));
    assert_eq!(browser.term(), Some("ab"));
    assert_eq!(browser.tick(), None);
  }

  #[tokio::test(start_paused = true)]
  async fn test_search_resets_page_and_disables_paging() {
    let mut browser: Browser<u32> = Browser::new(10, Duration::from_millis(500));
    browser.pager.set_total(100);
    browser.handle_key(key(KeyCode::Char('n')));
    assert_eq!(browser.params().offset, 10);

    browser.handle_key(key(KeyCode::Char('/')));
    browser.handle_key(key(KeyCode::Char('x')));
    assert_eq!(
      browser.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(BrowseEvent::Reload)
    );
    assert_eq!(browser.params().offset, 0);
    assert_eq!(browser.handle_key(key(KeyCode::Char('n'))), KeyResult::NotHandled);

    // Nothing left pending after Enter
    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(browser.tick(), None);
  }

  #[tokio::test(start_paused = true)]
  async fn test_clearing_search_returns_to_paging() {
    let mut browser: Browser<u32> = Browser::new(10, Duration::from_millis(500));
    browser.handle_key(key(KeyCode::Char('/')));
    browser.handle_key(key(KeyCode::Char('x')));
    browser.handle_key(key(KeyCode::Enter));
    assert!(browser.term().is_some());

    browser.handle_key(key(KeyCode::Char('/')));
    browser.handle_key(key(KeyCode::Esc));
    tokio::time::advance(Duration::from_millis(500)).await;
    assert_eq!(browser.tick(), Some(BrowseEvent::Reload));
    assert_eq!(browser.term(), None);
  }

  #[tokio::test]
  async fn test_search_title_counts_all_matches() {
    let mut browser: Browser<u32> = Browser::new(10, Duration::from_millis(500));
    browser.handle_key(key(KeyCode::Char('/')));
    browser.handle_key(key(KeyCode::Char('a')));
    browser.handle_key(key(KeyCode::Enter));

    browser.load(Query::start(|| async {
      Ok(CacheResult::from_network(Page::new((1..=30).collect(), 95)))
    }));
    settle(&mut browser).await;

    assert_eq!(browser.items().len(), 30);
    assert_eq!(browser.title("Users"), "Users matching \"a\" (95 found)");
    // Search totals never leak into the page count
    assert_eq!(browser.pager.total(), 0);
  }

  #[tokio::test]
  async fn test_blank_term_still_searches() {
    let mut browser: Browser<u32> = Browser::new(10, Duration::from_millis(500));
    browser.handle_key(key(KeyCode::Char('/')));
    browser.handle_key(key(KeyCode::Char(' ')));
    assert_eq!(
      browser.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(BrowseEvent::Reload)
    );
    assert_eq!(browser.term(), Some(" "));

    browser.load(Query::start(|| async {
      Ok(CacheResult::bypassed(Page::new(Vec::new(), 0)))
    }));
    settle(&mut browser).await;
    assert_eq!(browser.title("Users"), "Users matching \" \" (0 found)");
  }
}
