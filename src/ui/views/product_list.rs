use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;

use super::browser::{BrowseEvent, Browser};
use super::ProductDetailView;
use crate::api::Product;
use crate::config::UiConfig;
use crate::query::{Query, QueryState};
use crate::session::Session;
use crate::ui::components::{CategoryEvent, CategoryPicker, KeyResult};
use crate::ui::renderfns::{availability_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};

/// Paged, searchable list of products with an optional category filter.
///
/// Search and category are mutually exclusive: applying a search term
/// drops the category, picking a category drops the search.
pub struct ProductListView {
  session: Session,
  browser: Browser<Product>,
  category: Option<String>,
  picker: CategoryPicker,
  categories: Option<Query<Vec<String>>>,
  /// Open the picker as soon as categories arrive
  picker_pending: bool,
}

impl ProductListView {
  pub fn new(session: Session, ui: &UiConfig) -> Self {
    let mut view = Self {
      session,
      browser: Browser::new(ui.page_size, ui.search_debounce()),
      category: None,
      picker: CategoryPicker::new(),
      categories: None,
      picker_pending: false,
    };
    view.reload();
    view
  }

  fn reload(&mut self) {
    if self.browser.term().is_some() {
      self.category = None;
    }

    let products = self.session.products().clone();
    let params = self.browser.params();
    let query = match (self.browser.term(), &self.category) {
      (Some(term), _) => {
        let term = term.to_string();
        Query::start(move || {
          let products = products.clone();
          let term = term.clone();
          async move { products.search(&term).await.map_err(|e| e.to_string()) }
        })
      }
      (None, Some(category)) => {
        let category = category.clone();
        Query::start(move || {
          let products = products.clone();
          let category = category.clone();
          async move {
            products
              .filter_by_category(&category, params)
              .await
              .map_err(|e| e.to_string())
          }
        })
      }
      (None, None) => Query::start(move || {
        let products = products.clone();
        async move { products.fetch_list(params).await.map_err(|e| e.to_string()) }
      }),
    };
    self.browser.load(query);
  }

  fn open_picker(&mut self) {
    match self.categories.as_ref().and_then(|q| q.data()) {
      Some(categories) => {
        self
          .picker
          .show(categories.clone(), self.category.as_deref());
      }
      None => {
        self.picker_pending = true;
        let idle_or_failed = self
          .categories
          .as_ref()
          .map_or(true, |q| !q.is_loading());
        if idle_or_failed {
          let products = self.session.products().clone();
          self.categories = Some(Query::start(move || {
            let products = products.clone();
            async move { products.categories().await.map_err(|e| e.to_string()) }
          }));
        }
      }
    }
  }

  fn select_category(&mut self, category: Option<String>) {
    if category == self.category && self.browser.term().is_none() {
      return;
    }
    self.category = category;
    self.browser.clear_term();
    self.browser.reset_page();
    self.reload();
  }

  fn label(&self) -> String {
    let mut label = match &self.category {
      Some(category) => format!("Products in {}", category),
      None => "Products".to_string(),
    };
    match self.categories.as_ref().map(|q| q.state()) {
      Some(QueryState::Loading) if self.picker_pending => label.push_str(" (loading categories...)"),
      Some(QueryState::Error(e)) => label.push_str(&format!(" (categories: {})", e)),
      _ => {}
    }
    label
  }

  fn row(product: &Product) -> Line<'static> {
    Line::from(vec![
      Span::styled(format!("{:<5}", product.id), Style::default().fg(Color::Cyan)),
      Span::raw(format!("{:<34}", truncate(&product.title, 32))),
      Span::styled(
        format!("{:<20}", truncate(&product.category, 18)),
        Style::default().fg(Color::DarkGray),
      ),
      Span::styled(
        format!("{:>10}", format!("${:.2}", product.price)),
        Style::default().fg(Color::Green),
      ),
      Span::raw("  "),
      Span::styled(
        product.availability_status.clone(),
        Style::default().fg(availability_color(&product.availability_status)),
      ),
    ])
  }
}

impl View for ProductListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.picker.handle_key(key) {
      KeyResult::Event(CategoryEvent::Selected(category)) => {
        self.select_category(category);
        return ViewAction::None;
      }
      KeyResult::Event(CategoryEvent::Cancelled) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match self.browser.handle_key(key) {
      KeyResult::Event(BrowseEvent::Reload) => {
        self.reload();
        return ViewAction::None;
      }
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('c') => {
        self.open_picker();
        ViewAction::None
      }
      KeyCode::Char('r') => {
        self.browser.refetch();
        ViewAction::None
      }
      KeyCode::Enter => match self.browser.selected() {
        Some(product) => ViewAction::Push(Box::new(ProductDetailView::new(
          self.session.clone(),
          product.id,
          product.title.clone(),
        ))),
        None => ViewAction::None,
      },
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let label = self.label();
    self.browser.render(frame, area, &label, Self::row);
    self.picker.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    match (self.browser.term(), &self.category) {
      (Some(term), _) => format!("Products [/{}]", term),
      (None, Some(category)) => format!("Products [{}]", category),
      (None, None) => "Products".to_string(),
    }
  }

  fn tick(&mut self) -> ViewAction {
    if self.browser.tick() == Some(BrowseEvent::Reload) {
      self.reload();
    }

    if let Some(categories) = &mut self.categories {
      if categories.poll() && self.picker_pending {
        self.picker_pending = false;
        if categories.data().is_some() {
          self.open_picker();
        }
      }
    }
    ViewAction::None
  }

  fn captures_input(&self) -> bool {
    self.browser.searching() || self.picker.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("c", "category").with_priority(25),
      ShortcutInfo::new("n/p", "page").with_priority(30),
      ShortcutInfo::new("enter", "open").with_priority(40),
      ShortcutInfo::new("r", "reload").with_priority(50),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
