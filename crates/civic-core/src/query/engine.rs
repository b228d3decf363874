//! Filter → search → sort → paginate over an in-memory record slice.
//!
//! A [`QuerySpec`] describes one list: which fields free-text search looks
//! at, which categorical filters exist, and which columns can be sorted.
//! Given the same records and [`QueryState`], [`QuerySpec::apply`] always
//! produces the same [`QueryResult`]; it holds no state of its own.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};

use crate::error::ErrorCode;
use crate::query::state::{QueryState, SortDirection, is_any};
use crate::query::value::Record;

/// Predicate for filters that are not a plain field comparison.
pub type Predicate<R> = Arc<dyn Fn(&R, &str) -> bool + Send + Sync>;

/// How one categorical filter decides whether a record passes.
pub enum FilterRule<R> {
    /// Case-insensitive equality on a field.
    Equals { field: String },
    /// Arbitrary predicate receiving the selected filter value.
    Derived(Predicate<R>),
}

impl<R> Clone for FilterRule<R> {
    fn clone(&self) -> Self {
        match self {
            Self::Equals { field } => Self::Equals {
                field: field.clone(),
            },
            Self::Derived(predicate) => Self::Derived(Arc::clone(predicate)),
        }
    }
}

impl<R> fmt::Debug for FilterRule<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals { field } => f.debug_struct("Equals").field("field", field).finish(),
            Self::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

/// Errors for query states that do not fit a list.
///
/// These are programming errors in the view layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("{view}: '{field}' is not a sortable field")]
    UnknownSortField { view: &'static str, field: String },
    #[error("{view}: '{key}' is not a filter of this list")]
    UnknownFilterKey { view: &'static str, key: String },
}

impl QueryError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownSortField { .. } => ErrorCode::UnknownSortField,
            Self::UnknownFilterKey { .. } => ErrorCode::UnknownFilterKey,
        }
    }
}

/// One page of a query.
#[derive(Debug, Serialize)]
pub struct QueryResult<'a, R> {
    pub items: Vec<&'a R>,
    /// Records surviving search and filters.
    pub total_count: usize,
    /// `ceil(total_count / page_size)`; zero when nothing matched.
    pub total_pages: usize,
    /// Page actually served, clamped to `[1, max(1, total_pages)]`.
    pub current_page: usize,
    pub page_size: usize,
}

impl<R> QueryResult<'_, R> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.current_page > 1
    }
}

/// Search, filter and sort configuration of one list.
pub struct QuerySpec<R> {
    name: &'static str,
    search_fields: Vec<String>,
    filters: BTreeMap<String, FilterRule<R>>,
    sortable: Vec<String>,
    defaults: QueryState,
}

impl<R> Clone for QuerySpec<R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            search_fields: self.search_fields.clone(),
            filters: self.filters.clone(),
            sortable: self.sortable.clone(),
            defaults: self.defaults.clone(),
        }
    }
}

impl<R> fmt::Debug for QuerySpec<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySpec")
            .field("name", &self.name)
            .field("search_fields", &self.search_fields)
            .field("filters", &self.filters)
            .field("sortable", &self.sortable)
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl<R: Record> QuerySpec<R> {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            search_fields: Vec::new(),
            filters: BTreeMap::new(),
            sortable: Vec::new(),
            defaults: QueryState::default(),
        }
    }

    #[must_use]
    pub fn search_fields(mut self, fields: &[&str]) -> Self {
        self.search_fields = fields.iter().map(ToString::to_string).collect();
        self
    }

    #[must_use]
    pub fn filter_equals(mut self, key: &str, field: &str) -> Self {
        self.filters.insert(
            key.to_string(),
            FilterRule::Equals {
                field: field.to_string(),
            },
        );
        self
    }

    #[must_use]
    pub fn filter_with<F>(mut self, key: &str, predicate: F) -> Self
    where
        F: Fn(&R, &str) -> bool + Send + Sync + 'static,
    {
        self.filters
            .insert(key.to_string(), FilterRule::Derived(Arc::new(predicate)));
        self
    }

    #[must_use]
    pub fn sortable(mut self, fields: &[&str]) -> Self {
        self.sortable = fields.iter().map(ToString::to_string).collect();
        self
    }

    #[must_use]
    pub fn default_sort(mut self, field: &str, direction: SortDirection) -> Self {
        self.defaults.set_sort(field, direction);
        self
    }

    #[must_use]
    pub fn default_page_size(mut self, size: usize) -> Self {
        self.defaults.set_page_size(size);
        self
    }

    #[must_use]
    pub fn default_filter(mut self, key: &str, value: &str) -> Self {
        self.defaults.set_filter(key, value);
        self
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// State a freshly mounted view starts from.
    #[must_use]
    pub fn initial_state(&self) -> QueryState {
        self.defaults.clone()
    }

    pub fn filter_keys(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }

    #[must_use]
    pub fn sortable_fields(&self) -> &[String] {
        &self.sortable
    }

    #[must_use]
    pub fn is_sortable(&self, field: &str) -> bool {
        self.sortable.iter().any(|f| f == field)
    }

    /// Check that `state` only names filters and sort fields this list has.
    ///
    /// An empty sort field means "input order" and is always valid.
    ///
    /// # Errors
    ///
    /// Returns the first unknown sort field or filter key.
    pub fn validate(&self, state: &QueryState) -> Result<(), QueryError> {
        let sort = state.sort_field();
        if !sort.is_empty() && !self.is_sortable(sort) {
            return Err(QueryError::UnknownSortField {
                view: self.name,
                field: sort.to_string(),
            });
        }
        if let Some(key) = state
            .active_filters()
            .keys()
            .find(|key| !self.filters.contains_key(key.as_str()))
        {
            return Err(QueryError::UnknownFilterKey {
                view: self.name,
                key: key.clone(),
            });
        }
        Ok(())
    }

    /// Whether `record` passes search and every active filter.
    #[must_use]
    pub fn matches(&self, record: &R, state: &QueryState) -> bool {
        let needle = state.search_text().trim().to_lowercase();
        self.matches_search(record, &needle) && self.matches_filters(record, state)
    }

    fn matches_search(&self, record: &R, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        self.search_fields.iter().any(|field| {
            record
                .field(field)
                .search_text()
                .is_some_and(|text| text.to_lowercase().contains(needle))
        })
    }

    fn matches_filters(&self, record: &R, state: &QueryState) -> bool {
        state.active_filters().iter().all(|(key, value)| {
            if is_any(value) {
                return true;
            }
            match self.filters.get(key) {
                Some(FilterRule::Equals { field }) => record.field(field).matches(value),
                Some(FilterRule::Derived(predicate)) => predicate(record, value),
                None => true,
            }
        })
    }

    /// Indices of matching records in display order.
    #[must_use]
    pub fn ordered_indices(&self, records: &[R], state: &QueryState) -> Vec<usize> {
        if let Err(err) = self.validate(state) {
            warn!(view = self.name, error = %err, "query state does not fit this list");
            if cfg!(debug_assertions) {
                panic!("{err}");
            }
        }

        let needle = state.search_text().trim().to_lowercase();
        let matching = records
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                self.matches_search(record, &needle) && self.matches_filters(record, state)
            })
            .map(|(index, _)| index);

        let field = state.sort_field();
        if field.is_empty() || !self.is_sortable(field) {
            return matching.collect();
        }

        let mut keyed: Vec<_> = matching.map(|index| (index, records[index].field(field))).collect();
        let direction = state.sort_direction();
        keyed.sort_by(|(_, a), (_, b)| {
            let ordering = a.compare(b);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        keyed.into_iter().map(|(index, _)| index).collect()
    }

    /// Slice already ordered indices into the page `state` asks for.
    #[must_use]
    pub fn paginate<'a>(
        &self,
        records: &'a [R],
        ordered: &[usize],
        state: &QueryState,
    ) -> QueryResult<'a, R> {
        let page_size = state.page_size().max(1);
        let total_count = ordered.len();
        let total_pages = total_count.div_ceil(page_size);
        let current_page = state.current_page().clamp(1, total_pages.max(1));
        let start = (current_page - 1) * page_size;
        let end = (start + page_size).min(total_count);

        let items = ordered
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .filter_map(|&index| records.get(index))
            .collect();

        trace!(
            view = self.name,
            total_count,
            total_pages,
            current_page,
            "served page"
        );

        QueryResult {
            items,
            total_count,
            total_pages,
            current_page,
            page_size,
        }
    }

    /// Run the whole pipeline.
    #[must_use]
    pub fn apply<'a>(&self, records: &'a [R], state: &QueryState) -> QueryResult<'a, R> {
        let ordered = self.ordered_indices(records, state);
        self.paginate(records, &ordered, state)
    }
}

#[cfg(test)]
mod tests {
    use super::{QueryError, QuerySpec};
    use crate::error::ErrorCode;
    use crate::query::state::{QueryState, SortDirection};
    use serde_json::{Value, json};

    fn people() -> Vec<Value> {
        vec![
            json!({"id": 1, "name": "Carla Reyes", "purok": "1", "age": 34}),
            json!({"id": 2, "name": "ana santos", "purok": "2", "age": 71}),
            json!({"id": 3, "name": "Benjie Cruz", "purok": "1"}),
            json!({"id": 4, "name": "Dante Lim", "purok": "3", "age": 15}),
            json!({"id": 5, "name": "Elena Cruz", "purok": "2", "age": 44}),
        ]
    }

    fn spec() -> QuerySpec<Value> {
        QuerySpec::new("people")
            .search_fields(&["name", "id"])
            .filter_equals("purok", "purok")
            .filter_with("senior", |row: &Value, wanted| {
                let is_senior = row.get("age").and_then(Value::as_i64).is_some_and(|a| a >= 60);
                wanted.eq_ignore_ascii_case("yes") == is_senior
            })
            .sortable(&["name", "age", "id"])
            .default_sort("name", SortDirection::Asc)
            .default_page_size(2)
    }

    fn ids(items: &[&Value]) -> Vec<i64> {
        items.iter().filter_map(|v| v["id"].as_i64()).collect()
    }

    #[test]
    fn sorts_text_case_insensitively() {
        let rows = people();
        let spec = spec();
        let mut state = spec.initial_state();
        state.set_page_size(10);
        assert_eq!(ids(&spec.apply(&rows, &state).items), vec![2, 3, 1, 4, 5]);
    }

    #[test]
    fn missing_values_sort_smallest() {
        let rows = people();
        let spec = spec();
        let mut state = spec.initial_state();
        state.set_page_size(10);
        state.set_sort("age", SortDirection::Asc);
        assert_eq!(ids(&spec.apply(&rows, &state).items), vec![3, 4, 1, 5, 2]);
        state.set_sort("age", SortDirection::Desc);
        assert_eq!(ids(&spec.apply(&rows, &state).items), vec![2, 5, 1, 4, 3]);
    }

    #[test]
    fn search_and_filters_are_anded() {
        let rows = people();
        let spec = spec();
        let mut state = spec.initial_state();
        state.set_search("CRUZ");
        state.set_page_size(10);
        assert_eq!(ids(&spec.apply(&rows, &state).items), vec![3, 5]);

        state.set_filter("purok", "2");
        assert_eq!(ids(&spec.apply(&rows, &state).items), vec![5]);

        state.set_filter("senior", "yes");
        let result = spec.apply(&rows, &state);
        assert!(result.is_empty());
        assert_eq!(result.total_count, 0);
        assert_eq!(result.total_pages, 0);
        assert_eq!(result.current_page, 1);
    }

    #[test]
    fn search_matches_numeric_fields() {
        let rows = people();
        let spec = spec();
        let mut state = spec.initial_state();
        state.set_search("4");
        assert_eq!(ids(&spec.apply(&rows, &state).items), vec![4]);
    }

    #[test]
    fn all_filter_is_a_no_op() {
        let rows = people();
        let spec = spec();
        let state = spec.initial_state().with_filter("purok", "all");
        assert_eq!(spec.apply(&rows, &state).total_count, rows.len());
    }

    #[test]
    fn pages_are_clamped() {
        let rows = people();
        let spec = spec();
        let mut state = spec.initial_state();
        state.set_page(9);
        let result = spec.apply(&rows, &state);
        assert_eq!(result.total_pages, 3);
        assert_eq!(result.current_page, 3);
        assert_eq!(ids(&result.items), vec![5]);
        assert!(!result.has_next());
        assert!(result.has_previous());

        state.sync_page(result.current_page);
        assert_eq!(state.current_page(), 3);
    }

    #[test]
    fn empty_sort_field_keeps_input_order() {
        let rows = people();
        let spec = spec();
        let mut state = QueryState::new("", SortDirection::Desc, 10);
        state.set_search("a");
        assert_eq!(ids(&spec.apply(&rows, &state).items), vec![1, 2, 4, 5]);
    }

    #[test]
    fn validate_reports_unknown_names() {
        let spec = spec();
        let mut state = spec.initial_state();
        assert!(spec.validate(&state).is_ok());

        state.set_sort("salary", SortDirection::Asc);
        let err = spec.validate(&state).unwrap_err();
        assert!(matches!(err, QueryError::UnknownSortField { .. }));
        assert_eq!(err.code(), ErrorCode::UnknownSortField);

        let state = spec.initial_state().with_filter("barangay", "x");
        let err = spec.validate(&state).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnknownFilterKey);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "not a sortable field")]
    fn unknown_sort_field_fails_loudly_in_debug() {
        let rows = people();
        let spec = spec();
        let mut state = spec.initial_state();
        state.set_sort("salary", SortDirection::Asc);
        let _ = spec.apply(&rows, &state);
    }
}
