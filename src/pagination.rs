//! Page/offset bookkeeping for list views.

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Limit/offset pair sent with a collection query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageParams {
  pub limit: u32,
  pub offset: u32,
}

impl PageParams {
  pub fn new(limit: u32, offset: u32) -> Self {
    Self { limit, offset }
  }
}

impl Default for PageParams {
  fn default() -> Self {
    Self {
      limit: DEFAULT_PAGE_SIZE,
      offset: 0,
    }
  }
}

/// 1-based page cursor over a collection whose size is learned from responses.
#[derive(Debug, Clone)]
pub struct Pager {
  page: u32,
  page_size: u32,
  total: u64,
}

impl Pager {
  /// `page_size` of zero is treated as one
  pub fn new(page_size: u32) -> Self {
    Self {
      page: 1,
      page_size: page_size.max(1),
      total: 0,
    }
  }

  pub fn page(&self) -> u32 {
    self.page
  }

  pub fn total(&self) -> u64 {
    self.total
  }

  pub fn params(&self) -> PageParams {
    PageParams::new(self.page_size, (self.page - 1) * self.page_size)
  }

  /// `ceil(total / page_size)`; zero for an empty collection
  pub fn total_pages(&self) -> u32 {
    let pages = self.total.div_ceil(u64::from(self.page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
  }

  /// Record the collection size from the latest response.
  pub fn set_total(&mut self, total: u64) {
    self.total = total;
  }

  /// Move forward one page. Returns false when already on the last page.
  pub fn next(&mut self) -> bool {
    if self.page < self.total_pages() {
      self.page += 1;
      true
    } else {
      false
    }
  }

  /// Move back one page. Returns false on the first page.
  pub fn prev(&mut self) -> bool {
    if self.page > 1 {
      self.page -= 1;
      true
    } else {
      false
    }
  }

  /// Back to page 1 (used whenever the query itself changes).
  pub fn reset(&mut self) {
    self.page = 1;
    self.total = 0;
  }
}
