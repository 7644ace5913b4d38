use common::CategoryId;

/// Filter for product listings.
///
/// An empty query matches every product. Results are always ordered by
/// `sort_id` ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    /// Only products in this category.
    pub category: Option<CategoryId>,

    /// Case-insensitive substring that must occur in the name or description.
    /// `%` and `_` match literally.
    pub search: Option<String>,
}

impl ProductQuery {
    /// Creates a query matching every product.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for products in a category.
    pub fn in_category(category: CategoryId) -> Self {
        Self {
            category: Some(category),
            ..Default::default()
        }
    }

    /// Creates a search query.
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Default::default()
        }
    }

    /// The lowercased search term, if any.
    pub fn search_term(&self) -> Option<String> {
        self.search.as_ref().map(|s| s.to_lowercase())
    }
}

/// Escapes `\`, `%` and `_` so a term can be embedded in a `LIKE` pattern.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
