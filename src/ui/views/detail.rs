use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::api::types::Resource;
use crate::api::{Product, ResourceCache, User};
use crate::cache::CacheResult;
use crate::query::{Query, QueryState};
use crate::session::Session;
use crate::ui::renderfns::{availability_color, stars};
use crate::ui::view::{ShortcutInfo, View, ViewAction};

/// A resource that has a full-page description
pub trait Detail: Resource {
  fn cache(session: &Session) -> &ResourceCache<Self>;

  fn lines(&self) -> Vec<Line<'static>>;
}

pub type UserDetailView = DetailView<User>;
pub type ProductDetailView = DetailView<Product>;

/// Scrollable detail page for one item, loaded by id through the cache
pub struct DetailView<T> {
  label: String,
  query: Query<CacheResult<T>>,
  scroll: u16,
}

impl<T: Detail> DetailView<T> {
  pub fn new(session: Session, id: u64, label: String) -> Self {
    let query = Query::start(move || {
      let items = T::cache(&session).clone();
      async move { items.get_by_id(id).await.map_err(|e| e.to_string()) }
    });

    Self {
      label,
      query,
      scroll: 0,
    }
  }
}

impl<T: Detail> View for DetailView<T> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
      KeyCode::Char('k') | KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
      KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
      KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
      KeyCode::Char('g') | KeyCode::Home => self.scroll = 0,
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let title = match self.query.state() {
      QueryState::Loading => format!(" {} (loading...) ", self.label),
      QueryState::Success(result) if result.is_cached() => format!(" {} [cached] ", self.label),
      _ => format!(" {} ", self.label),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let paragraph = match self.query.state() {
      QueryState::Success(result) => Paragraph::new(result.data.lines())
        .wrap(Wrap { trim: false })
        .scroll((self.scroll, 0)),
      QueryState::Error(e) => Paragraph::new(format!("Error: {}\n\nPress 'r' to retry.", e))
        .style(Style::default().fg(Color::Red)),
      QueryState::Idle | QueryState::Loading => {
        Paragraph::new("Loading...").style(Style::default().fg(Color::DarkGray))
      }
    };

    frame.render_widget(paragraph.block(block), area);
  }

  fn breadcrumb_label(&self) -> String {
    self.label.clone()
  }

  fn tick(&mut self) -> ViewAction {
    self.query.poll();
    ViewAction::None
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("j/k", "scroll").with_priority(20),
      ShortcutInfo::new("r", "reload").with_priority(50),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}

fn section(title: &str) -> Line<'static> {
  Line::from(Span::styled(
    title.to_string(),
    Style::default().fg(Color::Yellow).bold(),
  ))
}

fn field(label: &str, value: impl Into<String>) -> Line<'static> {
  Line::from(vec![
    Span::styled(format!("  {:<16}", label), Style::default().fg(Color::DarkGray)),
    Span::raw(value.into()),
  ])
}

impl Detail for User {
  fn cache(session: &Session) -> &ResourceCache<Self> {
    session.users()
  }

  fn lines(&self) -> Vec<Line<'static>> {
    let mut lines = vec![
      section("Personal"),
      field("Name", self.full_name()),
      field("Username", format!("@{}", self.username)),
      field("Gender", self.gender.clone()),
      field("Age", self.age.to_string()),
      field("Birth date", self.birth_date.clone()),
    ];
    if let Some(maiden) = self.maiden_name.as_deref().filter(|m| !m.is_empty()) {
      lines.push(field("Maiden name", maiden));
    }

    lines.extend([
      Line::default(),
      section("Contact"),
      field("Email", self.email.clone()),
      field("Phone", self.phone.clone()),
      field(
        "Address",
        format!(
          "{}, {}, {} {}",
          self.address.address, self.address.city, self.address.state, self.address.postal_code
        ),
      ),
    ]);

    if let Some(company) = &self.company {
      lines.extend([
        Line::default(),
        section("Work"),
        field("Company", company.name.clone()),
        field("Department", company.department.clone()),
        field("Title", company.title.clone()),
      ]);
    }

    lines.extend([
      Line::default(),
      section("Physical"),
      field("Height", format!("{:.1} cm", self.height)),
      field("Weight", format!("{:.1} kg", self.weight)),
      field("Eye color", self.eye_color.clone()),
      field("Hair", format!("{} ({})", self.hair.color, self.hair.kind)),
      field("Blood group", self.blood_group.clone()),
      Line::default(),
      section("Other"),
      field("University", self.university.clone()),
      field("Domain", self.domain.clone()),
      field("IP", self.ip.clone()),
    ]);

    lines
  }
}

impl Detail for Product {
  fn cache(session: &Session) -> &ResourceCache<Self> {
    session.products()
  }

  fn lines(&self) -> Vec<Line<'static>> {
    let mut lines = vec![
      Line::from(Span::styled(
        self.title.clone(),
        Style::default().fg(Color::Cyan).bold(),
      )),
      field("Brand", self.brand.clone().unwrap_or_else(|| "-".to_string())),
      Line::from(vec![
        Span::styled(format!("  {:<16}", "Rating"), Style::default().fg(Color::DarkGray)),
        Span::styled(stars(self.rating), Style::default().fg(Color::Yellow)),
        Span::raw(format!(" {:.2} ({} reviews)", self.rating, self.reviews.len())),
      ]),
      field("Category", self.category.clone()),
      field("Tags", self.tags.join(", ")),
      Line::default(),
      section("Pricing"),
      field("Price", format!("${:.2}", self.price)),
      field("Discount", format!("{:.2}%", self.discount_percentage)),
      field("Stock", self.stock.to_string()),
      Line::from(vec![
        Span::styled(format!("  {:<16}", "Availability"), Style::default().fg(Color::DarkGray)),
        Span::styled(
          self.availability_status.clone(),
          Style::default().fg(availability_color(&self.availability_status)),
        ),
      ]),
      field("Minimum order", self.minimum_order_quantity.to_string()),
      Line::default(),
      section("Description"),
      Line::from(format!("  {}", self.description)),
      Line::default(),
      section("Details"),
      field("SKU", self.sku.clone()),
      field("Weight", format!("{} g", self.weight)),
      field(
        "Dimensions",
        format!(
          "{} x {} x {} cm",
          self.dimensions.width, self.dimensions.height, self.dimensions.depth
        ),
      ),
      field("Warranty", self.warranty_information.clone()),
      field("Shipping", self.shipping_information.clone()),
      field("Return policy", self.return_policy.clone()),
    ];

    if !self.reviews.is_empty() {
      lines.push(Line::default());
      lines.push(section("Reviews"));
      for review in &self.reviews {
        lines.push(Line::from(vec![
          Span::styled(
            format!("  {} ", stars(f64::from(review.rating))),
            Style::default().fg(Color::Yellow),
          ),
          Span::styled(review.reviewer_name.clone(), Style::default().bold()),
          Span::styled(format!("  {}", review.date), Style::default().fg(Color::DarkGray)),
        ]));
        lines.push(Line::from(format!("    {}", review.comment)));
      }
    }

    lines
  }
}
