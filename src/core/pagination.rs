//! Purpose: Track the current feed page and derive the last page from a total.
//! Exports: `PAGE_SIZE`, `Direction`, `Pagination`, `last_page`.
//! Invariants: `last_page` is `ceil(total / PAGE_SIZE)`; zero when the feed is empty.
//! Invariants: Navigation is unclamped; the server decides what an out-of-range page holds.
use serde::{Deserialize, Serialize};

pub const PAGE_SIZE: usize = 2;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Next,
    Previous,
    None,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pagination {
    page: i64,
}

impl Pagination {
    pub fn new() -> Self {
        Self { page: 1 }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    /// Applies a navigation delta and returns the page to request.
    pub fn advance(&mut self, direction: Direction) -> i64 {
        match direction {
            Direction::Next => self.page += 1,
            Direction::Previous => self.page -= 1,
            Direction::None => {}
        }
        self.page
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new()
    }
}

pub fn last_page(total: u64) -> u64 {
    total.div_ceil(PAGE_SIZE as u64)
}

#[cfg(test)]
mod tests {
    use super::{Direction, Pagination, last_page};

    #[test]
    fn starts_on_first_page() {
        assert_eq!(Pagination::new().page(), 1);
    }

    #[test]
    fn last_page_rounds_up() {
        for (total, last) in [(0, 0), (1, 1), (2, 1), (3, 2), (4, 2), (5, 3)] {
            assert_eq!(last_page(total), last, "total {total}");
        }
    }

    #[test]
    fn next_then_previous_restores_page() {
        let mut pagination = Pagination::new();
        pagination.advance(Direction::Next);
        pagination.advance(Direction::Next);
        assert_eq!(pagination.page(), 3);
        pagination.advance(Direction::Next);
        pagination.advance(Direction::Previous);
        assert_eq!(pagination.page(), 3);
    }

    #[test]
    fn none_leaves_page_unchanged() {
        let mut pagination = Pagination::new();
        assert_eq!(pagination.advance(Direction::None), 1);
    }

    #[test]
    fn navigation_is_not_clamped() {
        let mut pagination = Pagination::new();
        assert_eq!(pagination.advance(Direction::Previous), 0);
        assert_eq!(pagination.advance(Direction::Previous), -1);

        let mut pagination = Pagination::new();
        pagination.advance(Direction::Next);
        assert_eq!(pagination.advance(Direction::Next), 3);
        assert!(pagination.page() as u64 > last_page(2));
    }
}
