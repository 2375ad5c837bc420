use serde::Serialize;

/// Read position of the home feed.
///
/// Reset to `{offset: 0, has_more: true}` on every reseed and refresh.
/// `has_more` flips to false the first time a page comes back shorter than
/// `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
}

impl PaginationState {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            offset: 0,
            has_more: true,
        }
    }

    pub fn reset(&mut self) {
        self.offset = 0;
        self.has_more = true;
    }

    /// Record a page of `returned` items fetched at the current offset.
    ///
    /// The offset only moves past what was actually read, so after a reset
    /// it equals the length of the first page. While pages are full this is
    /// the same as advancing by `limit`.
    pub fn record_page(&mut self, returned: usize) {
        self.offset += returned;
        self.has_more = returned == self.limit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_then_short_page() {
        let mut state = PaginationState::new(5);
        state.record_page(5);
        assert_eq!(state.offset, 5);
        assert!(state.has_more);

        state.record_page(2);
        assert_eq!(state.offset, 7);
        assert!(!state.has_more);

        state.reset();
        assert_eq!(state, PaginationState::new(5));
    }

    #[test]
    fn test_empty_page_does_not_advance() {
        let mut state = PaginationState::new(5);
        state.record_page(5);
        state.record_page(0);
        assert_eq!(state.offset, 5);
        assert!(!state.has_more);
    }
}
