//! Background fetches polled from the UI loop.
//!
//! A `Query<T>` owns a fetcher closure and runs it on a tokio task. The
//! result comes back over a oneshot that views drain on each tick, so the UI
//! thread never awaits.
//!
//! # Example
//!
//! ```ignore
//! let users = session.users().clone();
//! let mut query = Query::new(move || {
//!     let users = users.clone();
//!     async move { users.fetch_list(params).await.map_err(|e| e.to_string()) }
//! });
//!
//! query.fetch();
//!
//! // In the tick handler
//! if query.poll() {
//!     // State changed, re-render
//! }
//! ```
//!
//! Starting a new request (or dropping the query) aborts the one in flight,
//! so a superseded response never overwrites newer state.

use std::future::Future;
use std::pin::Pin;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// Query is currently fetching data
  Loading,
  /// Query completed successfully
  Success(T),
  /// Query failed with an error
  Error(String),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, String>> + Send>>;

type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<T> + Send + Sync>;

/// The request currently in flight
struct Pending<T> {
  result: oneshot::Receiver<Result<T, String>>,
  task: JoinHandle<()>,
}

impl<T> Drop for Pending<T> {
  fn drop(&mut self) {
    self.task.abort();
  }
}

pub struct Query<T> {
  state: QueryState<T>,
  fetcher: FetcherFn<T>,
  pending: Option<Pending<T>>,
}

impl<T: Send + 'static> Query<T> {
  /// Create a query around a fetcher.
  ///
  /// The fetcher is called each time `fetch()` or `refetch()` starts a
  /// request, so it should clone whatever it captures into the future.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      fetcher: Box::new(move || Box::pin(fetcher())),
      pending: None,
    }
  }

  /// Shorthand for `new` followed by `fetch`.
  pub fn start<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    let mut query = Self::new(fetcher);
    query.fetch();
    query
  }

  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  pub fn error(&self) -> Option<&str> {
    self.state.error()
  }

  /// Start a request unless one is already running.
  pub fn fetch(&mut self) {
    if self.pending.is_some() {
      return;
    }
    self.spawn();
  }

  /// Start a new request, aborting the one in flight.
  pub fn refetch(&mut self) {
    self.pending = None;
    self.spawn();
  }

  /// Move a finished result into the state.
  ///
  /// Returns `true` when the state changed.
  pub fn poll(&mut self) -> bool {
    let Some(pending) = &mut self.pending else {
      return false;
    };

    self.state = match pending.result.try_recv() {
      Ok(Ok(data)) => QueryState::Success(data),
      Ok(Err(error)) => QueryState::Error(error),
      Err(oneshot::error::TryRecvError::Empty) => return false,
      // The task died without reporting
      Err(oneshot::error::TryRecvError::Closed) => {
        QueryState::Error("Request was cancelled".to_string())
      }
    };
    self.pending = None;
    true
  }

  fn spawn(&mut self) {
    let (tx, rx) = oneshot::channel();
    let future = (self.fetcher)();
    let task = tokio::spawn(async move {
      let _ = tx.send(future.await);
    });
    self.pending = Some(Pending { result: rx, task });
    self.state = QueryState::Loading;
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("in_flight", &self.pending.is_some())
      .finish_non_exhaustive()
  }
}
