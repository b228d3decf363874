//! Memo of the filter+sort step, keyed on everything that step reads.
//!
//! Pagination is cheap and is always recomputed; only the ordered index
//! list is kept. The key includes the snapshot revision, so a new snapshot
//! can never be served from an old ordering.

use std::collections::BTreeMap;

use crate::query::engine::{QueryResult, QuerySpec};
use crate::query::state::{QueryState, SortDirection};
use crate::query::value::Record;

#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheKey {
    revision: u64,
    search_text: String,
    filters: BTreeMap<String, String>,
    sort_field: String,
    sort_direction: SortDirection,
}

impl CacheKey {
    fn new(revision: u64, state: &QueryState) -> Self {
        Self {
            revision,
            search_text: state.search_text().to_string(),
            filters: state.active_filters().clone(),
            sort_field: state.sort_field().to_string(),
            sort_direction: state.sort_direction(),
        }
    }
}

/// Cached ordering for one list view.
#[derive(Debug, Default)]
pub struct QueryCache {
    entry: Option<(CacheKey, Vec<usize>)>,
    hits: u64,
    misses: u64,
}

impl QueryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordered indices for `(revision, state)`, computing them on a miss.
    pub fn ordered<R: Record>(
        &mut self,
        spec: &QuerySpec<R>,
        records: &[R],
        revision: u64,
        state: &QueryState,
    ) -> &[usize] {
        let key = CacheKey::new(revision, state);
        let fresh = matches!(&self.entry, Some((cached, _)) if *cached == key);
        if fresh {
            self.hits += 1;
        } else {
            self.misses += 1;
            self.entry = Some((key, spec.ordered_indices(records, state)));
        }
        match &self.entry {
            Some((_, ordered)) => ordered,
            None => &[],
        }
    }

    /// Run the pipeline, reusing the cached ordering when possible.
    pub fn query<'a, R: Record>(
        &mut self,
        spec: &QuerySpec<R>,
        records: &'a [R],
        revision: u64,
        state: &QueryState,
    ) -> QueryResult<'a, R> {
        let ordered = self.ordered(spec, records, revision, state).to_vec();
        spec.paginate(records, &ordered, state)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    #[must_use]
    pub const fn hits(&self) -> u64 {
        self.hits
    }

    #[must_use]
    pub const fn misses(&self) -> u64 {
        self.misses
    }
}
