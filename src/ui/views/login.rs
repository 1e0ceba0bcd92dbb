use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use tracing::warn;

use crate::api::{ApiClient, FetchError};
use crate::config::CacheConfig;
use crate::query::{Query, QueryState};
use crate::session::Session;
use crate::ui::components::{InputResult, TextInput};
use crate::ui::view::{ShortcutInfo, View, ViewAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Username,
  Password,
}

/// Username/password form. A successful sign-in hands the new session to
/// the App.
pub struct LoginView {
  api: ApiClient,
  cache: CacheConfig,
  username: TextInput,
  password: TextInput,
  focus: Field,
  query: Option<Query<Session>>,
}

impl LoginView {
  pub fn new(
    api: ApiClient,
    cache: CacheConfig,
    username: Option<String>,
    password: Option<String>,
  ) -> Self {
    let username = TextInput::with_value(username.unwrap_or_default());
    let focus = if username.is_empty() {
      Field::Username
    } else {
      Field::Password
    };

    Self {
      api,
      cache,
      username,
      password: TextInput::with_value(password.unwrap_or_default()),
      focus,
      query: None,
    }
  }

  fn busy(&self) -> bool {
    self.query.as_ref().is_some_and(|q| q.is_loading())
  }

  fn toggle_focus(&mut self) {
    self.focus = match self.focus {
      Field::Username => Field::Password,
      Field::Password => Field::Username,
    };
  }

  fn submit(&mut self) {
    if self.username.value().trim().is_empty() {
      self.focus = Field::Username;
      return;
    }
    if self.password.is_empty() {
      self.focus = Field::Password;
      return;
    }

    let api = self.api.clone();
    let cache = self.cache.clone();
    let username = self.username.value().trim().to_string();
    let password = self.password.value().to_string();
    self.query = Some(Query::start(move || {
      let api = api.clone();
      let cache = cache.clone();
      let username = username.clone();
      let password = password.clone();
      async move {
        Session::sign_in(&api, &cache, &username, &password)
          .await
          .map_err(|e| login_error(&e))
      }
    }));
  }

  fn render_field(&self, field: Field, label: &str) -> Line<'static> {
    let focused = self.focus == field;
    let value = match field {
      Field::Username => self.username.value().to_string(),
      Field::Password => "*".repeat(self.password.value().chars().count()),
    };
    let label_style = if focused {
      Style::default().fg(Color::Yellow).bold()
    } else {
      Style::default().fg(Color::DarkGray)
    };

    let mut spans = vec![
      Span::styled(format!(" {:<10}", label), label_style),
      Span::raw(value),
    ];
    if focused {
      spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
    }
    Line::from(spans)
  }
}

/// What the user sees when sign-in fails
fn login_error(error: &FetchError) -> String {
  match error {
    FetchError::Unauthorized(message) => message.clone(),
    other => {
      warn!(error = %other, "sign-in failed");
      "Network error. Please try again.".to_string()
    }
  }
}

impl View for LoginView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if self.busy() {
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
        self.toggle_focus();
        return ViewAction::None;
      }
      KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }

    let input = match self.focus {
      Field::Username => &mut self.username,
      Field::Password => &mut self.password,
    };
    match input.handle_key(key) {
      InputResult::Submitted(_) => match self.focus {
        Field::Username if self.password.is_empty() => self.focus = Field::Password,
        _ => self.submit(),
      },
      InputResult::Consumed | InputResult::Cancelled | InputResult::NotHandled => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let width = 52.min(area.width);
    let height = 9.min(area.height);
    let form_area = Rect::new(
      area.x + area.width.saturating_sub(width) / 2,
      area.y + area.height.saturating_sub(height) / 2,
      width,
      height,
    );

    let status = match self.query.as_ref().map(|q| q.state()) {
      Some(QueryState::Loading) => {
        Line::from(Span::styled(" Signing in...", Style::default().fg(Color::DarkGray)))
      }
      Some(QueryState::Error(e)) => {
        Line::from(Span::styled(format!(" {}", e), Style::default().fg(Color::Red)))
      }
      _ => Line::default(),
    };

    let lines = vec![
      Line::default(),
      self.render_field(Field::Username, "Username"),
      self.render_field(Field::Password, "Password"),
      Line::default(),
      status,
      Line::default(),
      Line::from(Span::styled(
        " Tab switch field  Enter sign in  Esc quit",
        Style::default().fg(Color::DarkGray),
      )),
    ];

    let block = Block::default()
      .title(" Sign in ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    frame.render_widget(Clear, form_area);
    frame.render_widget(Paragraph::new(lines).block(block), form_area);
  }

  fn breadcrumb_label(&self) -> String {
    "Sign in".to_string()
  }

  fn tick(&mut self) -> ViewAction {
    let Some(query) = &mut self.query else {
      return ViewAction::None;
    };
    if !query.poll() {
      return ViewAction::None;
    }
    match query.data() {
      Some(session) => {
        let session = session.clone();
        self.query = None;
        self.password.clear();
        ViewAction::SignIn(session)
      }
      None => {
        self.password.clear();
        self.focus = Field::Password;
        ViewAction::None
      }
    }
  }

  fn captures_input(&self) -> bool {
    true
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("tab", "switch field").with_priority(10),
      ShortcutInfo::new("enter", "sign in").with_priority(20),
      ShortcutInfo::new("esc", "quit").with_priority(90),
    ]
  }
}
