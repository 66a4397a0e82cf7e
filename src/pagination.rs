//! Page bookkeeping and the page-button window.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Page sizes offered to the user.
pub const PAGE_SIZE_OPTIONS: [usize; 4] = [10, 25, 50, 100];

/// Up to this many pages every page gets its own button.
const MAX_PLAIN_PAGES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaginationState {
    /// 1-indexed
    pub current_page: usize,
    pub page_size: usize,
    pub total_records: usize,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            current_page: 1,
            page_size: PAGE_SIZE_OPTIONS[1],
            total_records: 0,
        }
    }
}

impl PaginationState {
    pub fn new(current_page: usize, page_size: usize, total_records: usize) -> Self {
        Self {
            current_page,
            page_size,
            total_records,
        }
    }

    /// Never less than 1, an empty table still has one (empty) page.
    pub fn total_pages(&self) -> usize {
        let page_size = self.page_size.max(1);
        self.total_records.div_ceil(page_size).max(1)
    }

    /// Current page pulled into `[1, total_pages]`.
    pub fn clamped(&self) -> Self {
        Self {
            current_page: self.current_page.clamp(1, self.total_pages()),
            page_size: self.page_size.max(1),
            total_records: self.total_records,
        }
    }

    pub fn with_total_records(&self, total_records: usize) -> Self {
        Self {
            total_records,
            ..*self
        }
    }

    /// Changing the page size always starts over on page 1.
    pub fn with_page_size(&self, page_size: usize) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
            total_records: self.total_records,
        }
    }

    pub fn first_page(&self) -> Self {
        Self {
            current_page: 1,
            ..*self
        }
    }

    pub fn offset(&self) -> usize {
        let state = self.clamped();
        (state.current_page - 1) * state.page_size
    }

    /// Slice bounds of the current page within the ordered records.
    pub fn range(&self) -> Range<usize> {
        let start = self.offset().min(self.total_records);
        let end = (start + self.page_size.max(1)).min(self.total_records);
        start..end
    }

    pub fn can_go_previous(&self) -> bool {
        self.clamped().current_page > 1
    }

    pub fn can_go_next(&self) -> bool {
        let state = self.clamped();
        state.current_page < state.total_pages()
    }

    /// Page a click asks for. `None` for disabled buttons and ellipses.
    pub fn request(&self, action: PageAction) -> Option<usize> {
        let state = self.clamped();
        match action {
            PageAction::Previous if state.can_go_previous() => Some(state.current_page - 1),
            PageAction::Next if state.can_go_next() => Some(state.current_page + 1),
            PageAction::Token(PageToken::Page(page)) => Some(page.clamp(1, state.total_pages())),
            _ => None,
        }
    }

    pub fn window(&self) -> Vec<PageToken> {
        window(self.current_page, self.total_pages())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageToken {
    Page(usize),
    Ellipsis,
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageToken::Page(n) => write!(f, "{n}"),
            PageToken::Ellipsis => f.write_str("…"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    Previous,
    Next,
    Token(PageToken),
}

/// Page buttons for `current` out of `total` pages.
///
/// Short tables list every page. Longer ones always show the first and the
/// last page, plus either the head (`1 2 3 … n`), the tail (`1 … n-2 n-1 n`)
/// or the neighbourhood of the current page (`1 … c-1 c c+1 … n`).
/// Out-of-range input is treated as the nearest bound.
pub fn window(current: usize, total: usize) -> Vec<PageToken> {
    use PageToken::{Ellipsis, Page};

    let total = total.max(1);
    let current = current.clamp(1, total);

    if total <= MAX_PLAIN_PAGES {
        return (1..=total).map(Page).collect();
    }

    if current <= 3 {
        vec![Page(1), Page(2), Page(3), Ellipsis, Page(total)]
    } else if current >= total - 2 {
        vec![Page(1), Ellipsis, Page(total - 2), Page(total - 1), Page(total)]
    } else {
        vec![
            Page(1),
            Ellipsis,
            Page(current - 1),
            Page(current),
            Page(current + 1),
            Ellipsis,
            Page(total),
        ]
    }
}

pub fn next_page_size(current: usize) -> usize {
    PAGE_SIZE_OPTIONS
        .iter()
        .copied()
        .find(|&size| size > current)
        .unwrap_or(PAGE_SIZE_OPTIONS[PAGE_SIZE_OPTIONS.len() - 1])
}

pub fn previous_page_size(current: usize) -> usize {
    PAGE_SIZE_OPTIONS
        .iter()
        .rev()
        .copied()
        .find(|&size| size < current)
        .unwrap_or(PAGE_SIZE_OPTIONS[0])
}

#[cfg(test)]
mod tests {
    use super::PageToken::{Ellipsis, Page};
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 1, vec![Page(1)])]
    #[case(3, 5, vec![Page(1), Page(2), Page(3), Page(4), Page(5)])]
    #[case(1, 12, vec![Page(1), Page(2), Page(3), Ellipsis, Page(12)])]
    #[case(3, 12, vec![Page(1), Page(2), Page(3), Ellipsis, Page(12)])]
    #[case(4, 12, vec![Page(1), Ellipsis, Page(3), Page(4), Page(5), Ellipsis, Page(12)])]
    #[case(7, 12, vec![Page(1), Ellipsis, Page(6), Page(7), Page(8), Ellipsis, Page(12)])]
    #[case(10, 12, vec![Page(1), Ellipsis, Page(10), Page(11), Page(12)])]
    #[case(12, 12, vec![Page(1), Ellipsis, Page(10), Page(11), Page(12)])]
    #[case(4, 6, vec![Page(1), Ellipsis, Page(4), Page(5), Page(6)])]
    #[case(3, 6, vec![Page(1), Page(2), Page(3), Ellipsis, Page(6)])]
    fn page_window(#[case] current: usize, #[case] total: usize, #[case] expected: Vec<PageToken>) {
        assert_eq!(window(current, total), expected);
    }

    #[rstest]
    #[case(0, 0, vec![Page(1)])]
    #[case(0, 12, vec![Page(1), Page(2), Page(3), Ellipsis, Page(12)])]
    #[case(99, 12, vec![Page(1), Ellipsis, Page(10), Page(11), Page(12)])]
    fn out_of_range_input_uses_nearest_bound(
        #[case] current: usize,
        #[case] total: usize,
        #[case] expected: Vec<PageToken>,
    ) {
        assert_eq!(window(current, total), expected);
    }

    #[test]
    fn first_and_last_page_always_present() {
        for total in 6..40 {
            for current in 1..=total {
                let tokens = window(current, total);
                assert_eq!(tokens.first(), Some(&Page(1)), "{current}/{total}");
                assert_eq!(tokens.last(), Some(&Page(total)), "{current}/{total}");
                assert!(tokens.contains(&Page(current)), "{current}/{total}");
            }
        }
    }

    #[test]
    fn total_pages() {
        assert_eq!(PaginationState::new(1, 25, 0).total_pages(), 1);
        assert_eq!(PaginationState::new(1, 25, 25).total_pages(), 1);
        assert_eq!(PaginationState::new(1, 25, 26).total_pages(), 2);
        assert_eq!(PaginationState::new(1, 10, 115).total_pages(), 12);
    }

    #[test]
    fn range_of_last_partial_page() {
        let state = PaginationState::new(12, 10, 115);
        assert_eq!(state.range(), 110..115);
        assert_eq!(PaginationState::new(1, 10, 0).range(), 0..0);
        // Past the end falls back onto the last page
        assert_eq!(PaginationState::new(40, 10, 115).range(), 110..115);
    }

    #[test]
    fn previous_and_next_buttons() {
        let first = PaginationState::new(1, 10, 30);
        assert!(!first.can_go_previous());
        assert_eq!(first.request(PageAction::Previous), None);
        assert_eq!(first.request(PageAction::Next), Some(2));

        let last = PaginationState::new(3, 10, 30);
        assert!(!last.can_go_next());
        assert_eq!(last.request(PageAction::Next), None);
        assert_eq!(last.request(PageAction::Previous), Some(2));

        let single = PaginationState::new(1, 10, 4);
        assert_eq!(single.request(PageAction::Previous), None);
        assert_eq!(single.request(PageAction::Next), None);
    }

    #[test]
    fn token_clicks() {
        let state = PaginationState::new(7, 10, 115);
        assert_eq!(state.request(PageAction::Token(Page(12))), Some(12));
        assert_eq!(state.request(PageAction::Token(Ellipsis)), None);
    }

    #[test]
    fn page_size_change_resets_page() {
        let state = PaginationState::new(5, 10, 115).with_page_size(50);
        assert_eq!(state.current_page, 1);
        assert_eq!(state.page_size, 50);
    }

    #[test]
    fn page_size_cycling() {
        assert_eq!(next_page_size(10), 25);
        assert_eq!(next_page_size(100), 100);
        assert_eq!(next_page_size(30), 50);
        assert_eq!(previous_page_size(25), 10);
        assert_eq!(previous_page_size(10), 10);
        assert_eq!(previous_page_size(30), 25);
    }

    #[test]
    fn state_round_trips_through_json() {
        let state = PaginationState::new(2, 25, 40);
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"current_page":2,"page_size":25,"total_records":40}"#);
        assert_eq!(serde_json::from_str::<PaginationState>(&json).unwrap(), state);
    }
}
