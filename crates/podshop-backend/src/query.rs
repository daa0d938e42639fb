//! Row filters in the backend's query-string dialect.
//!
//! Each filter becomes one `column=operator.value` pair, e.g.
//! `product_id=eq.42` or `cart_id=in.(3,4)`. Encoding happens when the pairs
//! are appended to the request URL.

use std::fmt::Display;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Column list, including embedded joins such as `variant_values(id,value_name)`.
    #[must_use]
    pub fn select(mut self, columns: &str) -> Self {
        self.pairs.push(("select".to_owned(), columns.to_owned()));
        self
    }

    #[must_use]
    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.pairs.push((column.to_owned(), format!("eq.{value}")));
        self
    }

    #[must_use]
    pub fn ilike(mut self, column: &str, pattern: &str) -> Self {
        self.pairs.push((column.to_owned(), format!("ilike.{pattern}")));
        self
    }

    /// `column=in.(v1,v2,...)`. Values containing list syntax are quoted.
    #[must_use]
    pub fn in_list<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Display,
    {
        let list = values
            .into_iter()
            .map(|v| quote_list_value(&v.to_string()))
            .collect::<Vec<_>>()
            .join(",");
        self.pairs.push((column.to_owned(), format!("in.({list})")));
        self
    }

    #[must_use]
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.pairs
            .push(("order".to_owned(), format!("{column}.{direction}")));
        self
    }

    #[must_use]
    pub fn limit(mut self, n: usize) -> Self {
        self.pairs.push(("limit".to_owned(), n.to_string()));
        self
    }

    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

fn quote_list_value(raw: &str) -> String {
    if raw.contains([',', '(', ')', '"']) {
        format!("\"{}\"", raw.replace('"', "\\\""))
    } else {
        raw.to_owned()
    }
}
