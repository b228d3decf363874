use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fmt, str::FromStr};

/// Filter value that disables a categorical filter.
pub const ANY: &str = "all";

/// Sort direction for a list column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("asc"),
            Self::Desc => f.write_str("desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            other => Err(format!("unknown sort direction '{other}': expected asc or desc")),
        }
    }
}

/// Session-scoped state of one list view.
///
/// Fields are private so the paging rules hold: changing the search text,
/// any filter, or the page size always returns to page 1. Pages are
/// 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    search_text: String,
    active_filters: BTreeMap<String, String>,
    sort_field: String,
    sort_direction: SortDirection,
    current_page: usize,
    page_size: usize,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            active_filters: BTreeMap::new(),
            sort_field: String::new(),
            sort_direction: SortDirection::Asc,
            current_page: 1,
            page_size: 10,
        }
    }
}

impl QueryState {
    #[must_use]
    pub fn new(sort_field: &str, sort_direction: SortDirection, page_size: usize) -> Self {
        Self {
            sort_field: sort_field.to_string(),
            sort_direction,
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    #[must_use]
    pub const fn active_filters(&self) -> &BTreeMap<String, String> {
        &self.active_filters
    }

    /// Selected value of a filter, [`ANY`] when unset.
    #[must_use]
    pub fn filter(&self, key: &str) -> &str {
        self.active_filters.get(key).map_or(ANY, String::as_str)
    }

    #[must_use]
    pub fn sort_field(&self) -> &str {
        &self.sort_field
    }

    #[must_use]
    pub const fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    #[must_use]
    pub const fn current_page(&self) -> usize {
        self.current_page
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
        self.current_page = 1;
    }

    /// Select a filter value; [`ANY`] or an empty value clears the filter.
    pub fn set_filter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if is_any(&value) {
            self.active_filters.remove(&key);
        } else {
            self.active_filters.insert(key, value.trim().to_string());
        }
        self.current_page = 1;
    }

    pub fn clear_filter(&mut self, key: &str) {
        self.active_filters.remove(key);
        self.current_page = 1;
    }

    pub fn clear_filters(&mut self) {
        self.active_filters.clear();
        self.current_page = 1;
    }

    pub fn set_sort(&mut self, field: impl Into<String>, direction: SortDirection) {
        self.sort_field = field.into();
        self.sort_direction = direction;
    }

    /// Clicking a column header: same column flips direction, a new column
    /// starts ascending.
    pub fn toggle_sort(&mut self, field: &str) {
        if self.sort_field == field {
            self.sort_direction = self.sort_direction.flipped();
        } else {
            self.sort_field = field.to_string();
            self.sort_direction = SortDirection::Asc;
        }
    }

    pub fn set_page_size(&mut self, size: usize) {
        self.page_size = size.max(1);
        self.current_page = 1;
    }

    /// Jump to `page`; the next query clamps it to the available range.
    pub fn set_page(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.saturating_add(1);
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.saturating_sub(1).max(1);
    }

    /// Adopt the page a query actually served.
    pub fn sync_page(&mut self, served_page: usize) {
        self.current_page = served_page.max(1);
    }

    /// Builder form of [`QueryState::set_filter`], used for view defaults.
    #[must_use]
    pub fn with_filter(mut self, key: &str, value: &str) -> Self {
        self.set_filter(key, value);
        self
    }
}

#[must_use]
pub fn is_any(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case(ANY)
}
