//! Page arithmetic for post listings.
//!
//! Pages are 1-based. A page past the end is empty rather than an error.

use std::{fmt, num::NonZeroU32};

/// Posts per page on every listing.
pub const PAGE_SIZE: u32 = 10;

const DEFAULT_PAGE_SIZE: NonZeroU32 = match NonZeroU32::new(PAGE_SIZE) {
    Some(size) => size,
    None => panic!("PAGE_SIZE must be non-zero"),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageNumber(NonZeroU32);

impl PageNumber {
    pub const FIRST: PageNumber = PageNumber(NonZeroU32::MIN);

    pub fn new(number: u32) -> Option<Self> {
        NonZeroU32::new(number).map(Self)
    }

    /// Parses a `?page=` value, falling back to the first page.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.trim().parse::<u32>().ok())
            .and_then(Self::new)
            .unwrap_or(Self::FIRST)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Rows to fetch for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: u32,
    pub offset: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: NonZeroU32,
}

impl Paginator {
    pub fn new(page_size: NonZeroU32) -> Self {
        Self { page_size }
    }

    /// `ceil(count / page_size)`; zero when nothing matches.
    pub fn total_pages(&self, count: u64) -> u32 {
        let pages = count.div_ceil(u64::from(self.page_size.get()));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// The `[(N-1)*size, N*size)` slice of the ordered sequence.
    pub fn window(&self, page: PageNumber) -> PageWindow {
        PageWindow {
            limit: self.page_size.get(),
            offset: u64::from(page.get() - 1) * u64::from(self.page_size.get()),
        }
    }

    /// How many of `count` items land on `page`.
    pub fn page_len(&self, count: u64, page: PageNumber) -> u64 {
        let window = self.window(page);
        count
            .saturating_sub(window.offset)
            .min(u64::from(window.limit))
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}
