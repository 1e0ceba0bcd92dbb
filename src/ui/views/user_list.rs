use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;

use super::browser::{BrowseEvent, Browser};
use super::UserDetailView;
use crate::api::User;
use crate::config::UiConfig;
use crate::query::Query;
use crate::session::Session;
use crate::ui::components::KeyResult;
use crate::ui::renderfns::truncate;
use crate::ui::view::{ShortcutInfo, View, ViewAction};

/// Paged, searchable list of users
pub struct UserListView {
  session: Session,
  browser: Browser<User>,
}

impl UserListView {
  pub fn new(session: Session, ui: &UiConfig) -> Self {
    let mut view = Self {
      session,
      browser: Browser::new(ui.page_size, ui.search_debounce()),
    };
    view.reload();
    view
  }

  fn reload(&mut self) {
    let users = self.session.users().clone();
    let query = match self.browser.term() {
      Some(term) => {
        let term = term.to_string();
        Query::start(move || {
          let users = users.clone();
          let term = term.clone();
          async move { users.search(&term).await.map_err(|e| e.to_string()) }
        })
      }
      None => {
        let params = self.browser.params();
        Query::start(move || {
          let users = users.clone();
          async move { users.fetch_list(params).await.map_err(|e| e.to_string()) }
        })
      }
    };
    self.browser.load(query);
  }

  fn row(user: &User) -> Line<'static> {
    Line::from(vec![
      Span::styled(format!("{:<5}", user.id), Style::default().fg(Color::Cyan)),
      Span::raw(format!("{:<26}", truncate(&user.full_name(), 24))),
      Span::styled(
        format!("{:<34}", truncate(&user.email, 32)),
        Style::default().fg(Color::White),
      ),
      Span::styled(user.phone.clone(), Style::default().fg(Color::DarkGray)),
    ])
  }
}

impl View for UserListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.browser.handle_key(key) {
      KeyResult::Event(BrowseEvent::Reload) => {
        self.reload();
        return ViewAction::None;
      }
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('r') => {
        self.browser.refetch();
        ViewAction::None
      }
      KeyCode::Enter => match self.browser.selected() {
        Some(user) => ViewAction::Push(Box::new(UserDetailView::new(
          self.session.clone(),
          user.id,
          user.full_name(),
        ))),
        None => ViewAction::None,
      },
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.browser.render(frame, area, "Users", Self::row);
  }

  fn breadcrumb_label(&self) -> String {
    match self.browser.term() {
      Some(term) => format!("Users [/{}]", term),
      None => "Users".to_string(),
    }
  }

  fn tick(&mut self) -> ViewAction {
    if self.browser.tick() == Some(BrowseEvent::Reload) {
      self.reload();
    }
    ViewAction::None
  }

  fn captures_input(&self) -> bool {
    self.browser.searching()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("n/p", "page").with_priority(30),
      ShortcutInfo::new("enter", "open").with_priority(40),
      ShortcutInfo::new("r", "reload").with_priority(50),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::{ApiClient, AuthUser};
  use crate::config::CacheConfig;
  use crossterm::event::KeyModifiers;
  use mockito::{Matcher, Server, ServerGuard};
  use std::time::Duration;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn first_id(view: &UserListView) -> Option<u64> {
    view.browser.items().first().map(|u| u.id)
  }

  async fn tick_until(view: &mut UserListView, done: impl Fn(&UserListView) -> bool) {
    for _ in 0..200 {
      view.tick();
      if done(view) {
        return;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("view never settled");
  }

  fn view_for(server: &ServerGuard) -> UserListView {
    let api = ApiClient::new(&server.url()).unwrap();
    let session = Session::open(&api, &CacheConfig::default(), AuthUser::default());
    UserListView::new(session, &UiConfig::default())
  }

  #[tokio::test]
  async fn test_search_then_open_detail() {
    let mut server = Server::new_async().await;
    server
      .mock("GET", "/users")
      .match_query(Matcher::Any)
      .with_status(200)
      .with_body(r#"{"users":[{"id":1,"firstName":"Emily","lastName":"Johnson"}],"total":208,"skip":0,"limit":10}"#)
      .create_async()
      .await;
    let search = server
      .mock("GET", "/users/search")
      .match_query(Matcher::UrlEncoded("q".into(), "mi".into()))
      .with_status(200)
      .with_body(r#"{"users":[{"id":5,"firstName":"Michael","lastName":"Williams"}],"total":1,"skip":0,"limit":30}"#)
      .expect(1)
      .create_async()
      .await;

    let mut view = view_for(&server);
    tick_until(&mut view, |v| first_id(v) == Some(1)).await;

    for code in [KeyCode::Char('/'), KeyCode::Char('m'), KeyCode::Char('i')] {
      view.handle_key(key(code));
    }
    assert!(view.captures_input());
    view.handle_key(key(KeyCode::Enter));
    assert!(!view.captures_input());
    tick_until(&mut view, |v| first_id(v) == Some(5)).await;
    assert_eq!(view.breadcrumb_label(), "Users [/mi]");
    search.assert_async().await;

    match view.handle_key(key(KeyCode::Enter)) {
      ViewAction::Push(detail) => assert_eq!(detail.breadcrumb_label(), "Michael Williams"),
      _ => panic!("expected the detail view"),
    }
  }

  #[tokio::test]
  async fn test_back_pops() {
    let server = Server::new_async().await;
    let mut view = view_for(&server);
    assert!(matches!(view.handle_key(key(KeyCode::Char('q'))), ViewAction::Pop));
  }
}
