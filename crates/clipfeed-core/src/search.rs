//! Title search shared by the gateway and the saved-feed filter.
//!
//! - '+' splits a query into terms that must ALL match
//! - matching is ASCII case-insensitive

/// A parsed title query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
    terms: Vec<String>,
}

impl SearchQuery {
    /// "  sea + Sunset " -> ["sea", "sunset"]; empty terms are dropped.
    pub fn parse(query: &str) -> Self {
        let terms = query
            .split('+')
            .map(|term| term.trim().to_ascii_lowercase())
            .filter(|term| !term.is_empty())
            .collect();
        Self { terms }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// An empty query matches everything.
    pub fn matches(&self, text: &str) -> bool {
        let haystack = text.to_ascii_lowercase();
        self.terms.iter().all(|term| haystack.contains(term.as_str()))
    }
}
