use ratatui::prelude::Color;

/// Truncate to at most `max_len` characters, ending in "..." when cut
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Display color for a product's availability status
pub fn availability_color(status: &str) -> Color {
  match status {
    "In Stock" => Color::Green,
    "Low Stock" => Color::Yellow,
    "Out of Stock" => Color::Red,
    _ => Color::White,
  }
}

/// Five-star bar for a 0-5 rating, rounded to the nearest star
pub fn stars(rating: f64) -> String {
  let filled = rating.clamp(0.0, 5.0).round() as usize;
  format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("Crème brûlée", 8), "Crème...");
  }

  #[test]
  fn test_availability_color() {
    assert_eq!(availability_color("In Stock"), Color::Green);
    assert_eq!(availability_color("Low Stock"), Color::Yellow);
    assert_eq!(availability_color("Out of Stock"), Color::Red);
    assert_eq!(availability_color(""), Color::White);
  }

  #[test]
  fn test_stars() {
    assert_eq!(stars(4.56), "★★★★★");
    assert_eq!(stars(2.4), "★★☆☆☆");
    assert_eq!(stars(-1.0), "☆☆☆☆☆");
  }
}
