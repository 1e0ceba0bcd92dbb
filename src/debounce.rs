//! Quiet-period gate between input changes and the work they trigger.
//!
//! Every `push` cancels whatever was pending and restarts the timer; the
//! value only comes out of `poll` once `delay` has passed with no newer push.
//! Views call `poll` on each tick.

use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
  delay: Duration,
  pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
  pub fn new(delay: Duration) -> Self {
    Self {
      delay,
      pending: None,
    }
  }

  /// Replace any pending value and restart the quiet period.
  pub fn push(&mut self, value: T) {
    self.pending = Some((value, Instant::now() + self.delay));
  }

  /// Take the pending value if its quiet period has elapsed.
  pub fn poll(&mut self) -> Option<T> {
    match &self.pending {
      Some((_, deadline)) if Instant::now() >= *deadline => self.pending.take().map(|(v, _)| v),
      _ => None,
    }
  }

  pub fn cancel(&mut self) {
    self.pending = None;
  }
}

impl<T> Default for Debouncer<T> {
  fn default() -> Self {
    Self::new(DEFAULT_DELAY)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio::time::advance;

  #[tokio::test(start_paused = true)]
  async fn test_fires_after_quiet_period() {
    let mut debouncer = Debouncer::default();
    debouncer.push("emily");

    advance(Duration::from_millis(499)).await;
    assert_eq!(debouncer.poll(), None);

    advance(Duration::from_millis(1)).await;
    assert_eq!(debouncer.poll(), Some("emily"));
    assert_eq!(debouncer.poll(), None);
  }

  #[tokio::test(start_paused = true)]
  async fn test_each_push_restarts_timer() {
    let mut debouncer = Debouncer::new(Duration::from_millis(500));

    debouncer.push("e");
    advance(Duration::from_millis(300)).await;
    debouncer.push("em");
    advance(Duration::from_millis(300)).await;
    assert_eq!(debouncer.poll(), None);
    debouncer.push("emi");

    advance(Duration::from_millis(500)).await;
    // Only the last value survives
    assert_eq!(debouncer.poll(), Some("emi"));
  }

  #[tokio::test(start_paused = true)]
  async fn test_cancel() {
    let mut debouncer = Debouncer::default();
    debouncer.push(2);
    debouncer.cancel();
    advance(Duration::from_secs(1)).await;
    assert_eq!(debouncer.poll(), None);
  }
}
