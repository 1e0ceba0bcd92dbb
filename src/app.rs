use crate::api::{ApiClient, AuthUser};
use crate::auth_store::AuthStore;
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::session::Session;
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{LoginView, ProductListView, UserListView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::{stdout, Stdout};
use std::time::Duration;
use tracing::{debug, info, warn};

const TICK_RATE: Duration = Duration::from_millis(100);

/// Which collection sits at the bottom of the view stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Root {
  Users,
  Products,
}

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  views: Vec<Box<dyn View>>,
  root: Option<Root>,
  command: CommandInput,
  config: Config,
  api: ApiClient,
  /// Present between sign-in and logout
  session: Option<Session>,
  /// Remembers the login across runs; `None` when disabled
  auth_store: Option<AuthStore>,
  /// One-line message for the footer, cleared on the next key
  status: Option<String>,
  should_quit: bool,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let api = ApiClient::new(&config.api.base_url)?;
    let auth_store = AuthStore::from_config(&config.auth)?;
    let mut app = Self {
      views: Vec::new(),
      root: None,
      command: CommandInput::new(),
      config,
      api,
      session: None,
      auth_store,
      status: None,
      should_quit: false,
    };

    match app.auth_store.as_ref().and_then(|store| store.load()) {
      Some(user) => app.resume(user),
      None => app.show_login(),
    }
    Ok(app)
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = self.event_loop(&mut terminal).await;

    // Restore the terminal even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Tick) => self.tick(),
        None => break,
      }
    }

    Ok(())
  }

  fn show_login(&mut self) {
    let login = LoginView::new(
      self.api.clone(),
      self.config.cache.clone(),
      self.config.api.username.clone(),
      Config::get_password(),
    );
    self.views = vec![Box::new(login)];
    self.root = None;
  }

  /// Pick up a remembered login without showing the form
  fn resume(&mut self, user: AuthUser) {
    info!(username = %user.username, "resuming saved login");
    let session = Session::open(&self.api, &self.config.cache, user);
    self.status = Some(format!("Welcome back, {}", session.user().display_name()));
    self.session = Some(session);
    self.show_root(Root::Users);
  }

  /// Replace the whole stack with a fresh list view
  fn show_root(&mut self, root: Root) {
    let Some(session) = &self.session else {
      self.status = Some("Sign in first".to_string());
      return;
    };

    let view: Box<dyn View> = match root {
      Root::Users => Box::new(UserListView::new(session.clone(), &self.config.ui)),
      Root::Products => Box::new(ProductListView::new(session.clone(), &self.config.ui)),
    };
    self.views = vec![view];
    self.root = Some(root);
  }

  fn handle_key(&mut self, key: KeyEvent) {
    self.status = None;

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // `:` belongs to the view while it's taking text
    let view_has_input = self.views.last().is_some_and(|v| v.captures_input());
    if self.command.is_active() || !view_has_input {
      match self.command.handle_key(key) {
        KeyResult::Event(CommandEvent::Submitted(cmd)) => {
          self.execute_command(&cmd);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
    }

    if let Some(view) = self.views.last_mut() {
      let action = view.handle_key(key);
      self.apply(action);
    }
  }

  fn tick(&mut self) {
    if let Some(view) = self.views.last_mut() {
      let action = view.tick();
      self.apply(action);
    }
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => {
        debug!(view = %view.breadcrumb_label(), "push");
        self.views.push(view);
      }
      ViewAction::Pop => {
        if self.views.len() > 1 {
          self.views.pop();
        } else {
          self.should_quit = true;
        }
      }
      ViewAction::SignIn(session) => {
        if let Some(store) = &self.auth_store {
          if let Err(e) = store.save(session.user()) {
            warn!(error = %e, "could not remember login");
          }
        }
        self.status = Some(format!("Signed in as {}", session.user().display_name()));
        self.session = Some(session);
        self.show_root(Root::Users);
      }
    }
  }

  fn execute_command(&mut self, cmd: &str) {
    info!(command = cmd, "command");
    match cmd {
      "users" => self.show_root(Root::Users),
      "products" => self.show_root(Root::Products),
      "refresh" => match &self.session {
        Some(session) => {
          session.invalidate_all();
          if let Some(root) = self.root {
            self.show_root(root);
          }
          self.status = Some("Caches cleared".to_string());
        }
        None => self.status = Some("Sign in first".to_string()),
      },
      "logout" => {
        if let Some(session) = self.session.take() {
          session.close();
          if let Some(store) = &self.auth_store {
            if let Err(e) = store.clear() {
              warn!(error = %e, "could not forget saved login");
            }
          }
          self.show_login();
          self.status = Some("Signed out".to_string());
        }
      }
      "quit" => self.should_quit = true,
      "" => {}
      other => self.status = Some(format!("Unknown command: {}", other)),
    }
  }

  // Accessors for UI rendering
  pub fn render_view(&mut self, frame: &mut Frame, area: Rect) {
    if let Some(view) = self.views.last_mut() {
      view.render(frame, area);
    }
  }

  pub fn command_input(&self) -> &CommandInput {
    &self.command
  }

  pub fn api_url(&self) -> &str {
    self.api.base_url().as_str()
  }

  pub fn user_label(&self) -> Option<String> {
    self.session.as_ref().map(|s| s.user().display_name())
  }

  pub fn status(&self) -> Option<&str> {
    self.status.as_deref()
  }

  pub fn shortcuts(&self) -> Vec<ShortcutInfo> {
    self
      .views
      .last()
      .map(|v| v.shortcuts())
      .unwrap_or_default()
  }

  pub fn breadcrumb(&self) -> Vec<String> {
    self.views.iter().map(|v| v.breadcrumb_label()).collect()
  }
}
