//! Page requests for listing the catalog.

/// Movies per page on the HTTP surface.
pub const PAGE_SIZE: usize = 15;

/// A 1-based page of `size` movies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: usize,
    pub size: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1, PAGE_SIZE)
    }
}

impl Page {
    /// Page numbers below 1 are clamped to 1.
    pub fn new(number: usize, size: usize) -> Self {
        Self {
            number: number.max(1),
            size,
        }
    }

    /// Parse a `?page=` query value. Absent, non-numeric and non-positive
    /// values fall back to page 1. Numbers too large for `usize` saturate, so
    /// they land past the end of any catalog.
    pub fn parse(raw: Option<&str>) -> Self {
        let number = raw.map(str::trim).map_or(1, parse_number);
        Self::new(number, PAGE_SIZE)
    }

    /// Index of the first movie on this page.
    pub fn offset(&self) -> usize {
        self.number.saturating_sub(1).saturating_mul(self.size)
    }

    /// The `[offset, offset + size)` window clipped to `len`.
    pub fn range(&self, len: usize) -> std::ops::Range<usize> {
        let start = self.offset().min(len);
        let end = start.saturating_add(self.size).min(len);
        start..end
    }
}

fn parse_number(digits: &str) -> usize {
    let digits = digits.strip_prefix('+').unwrap_or(digits);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return 1;
    }
    digits.parse().unwrap_or(usize::MAX)
}
