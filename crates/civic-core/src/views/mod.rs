//! Administrative list views.
//!
//! A [`ListView`] owns one list's [`QuerySpec`], its session-scoped
//! [`QueryState`], the current [`Snapshot`] and a [`QueryCache`]. Records
//! are replaced wholesale on every load; edits saved through a collaborator
//! replace a single record and bump the snapshot revision.

pub mod fields;
pub mod requests;
pub mod residents;
pub mod snapshot;
pub mod users;

pub use requests::{RequestApi, RequestListView, request_list_spec};
pub use residents::resident_list_spec;
pub use snapshot::{Snapshot, SnapshotFile, load_snapshot};
pub use users::user_access_list_spec;

use tracing::{debug, warn};

use crate::config::QueryConfig;
use crate::error::ErrorCode;
use crate::model::request::TransitionError;
use crate::query::{QueryCache, QueryResult, QuerySpec, QueryState, Record};

/// Stable identity of a listed record.
pub trait Keyed {
    fn key(&self) -> u64;
}

/// Errors from list view actions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    #[error("{view}: no record with id {key}")]
    NotFound { view: &'static str, key: u64 },
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("saving request {key} failed: {message}")]
    Persistence { key: u64, message: String },
    #[error("page size {size} is not one of {allowed:?}")]
    InvalidPageSize { size: usize, allowed: Vec<usize> },
}

impl ViewError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::RequestNotFound,
            Self::Transition(err) => err.code(),
            Self::Persistence { .. } => ErrorCode::PersistenceFailed,
            Self::InvalidPageSize { .. } => ErrorCode::InvalidPageSize,
        }
    }
}

/// Proof that a fetch was started by a particular mount of a view.
///
/// Results carried by a ticket from an earlier fetch, or from before
/// [`ListView::unmount`], are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct FetchTicket {
    session: u64,
    sequence: u64,
}

/// One administrative list.
#[derive(Debug)]
pub struct ListView<R> {
    spec: QuerySpec<R>,
    state: QueryState,
    snapshot: Snapshot<R>,
    cache: QueryCache,
    session: u64,
    issued: u64,
    mounted: bool,
}

impl<R: Record + Keyed> ListView<R> {
    #[must_use]
    pub fn new(spec: QuerySpec<R>) -> Self {
        let state = spec.initial_state();
        Self {
            spec,
            state,
            snapshot: Snapshot::default(),
            cache: QueryCache::new(),
            session: 0,
            issued: 0,
            mounted: true,
        }
    }

    #[must_use]
    pub const fn spec(&self) -> &QuerySpec<R> {
        &self.spec
    }

    #[must_use]
    pub const fn state(&self) -> &QueryState {
        &self.state
    }

    pub const fn state_mut(&mut self) -> &mut QueryState {
        &mut self.state
    }

    #[must_use]
    pub const fn snapshot(&self) -> &Snapshot<R> {
        &self.snapshot
    }

    #[must_use]
    pub const fn cache(&self) -> &QueryCache {
        &self.cache
    }

    #[must_use]
    pub const fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Back to the list's default search, filters, sort and page.
    pub fn reset(&mut self) {
        self.state = self.spec.initial_state();
    }

    /// Replace the records with a freshly fetched batch.
    pub fn load(&mut self, records: Vec<R>) {
        self.snapshot.replace_all(records);
        debug!(
            view = self.spec.name(),
            revision = self.snapshot.revision(),
            records = self.snapshot.len(),
            "loaded snapshot"
        );
    }

    /// Pick a page size from the configured choices.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::InvalidPageSize`] when `size` is not offered.
    pub fn choose_page_size(&mut self, size: usize, cfg: &QueryConfig) -> Result<(), ViewError> {
        if !cfg.page_size_options.contains(&size) {
            return Err(ViewError::InvalidPageSize {
                size,
                allowed: cfg.page_size_options.clone(),
            });
        }
        self.state.set_page_size(size);
        Ok(())
    }

    /// The page the current state asks for. The served page is written back
    /// into the state, so an out-of-range page settles on the last one.
    pub fn page(&mut self) -> QueryResult<'_, R> {
        let result = self.cache.query(
            &self.spec,
            self.snapshot.records(),
            self.snapshot.revision(),
            &self.state,
        );
        self.state.sync_page(result.current_page);
        result
    }

    #[must_use]
    pub fn find(&self, key: u64) -> Option<&R> {
        self.snapshot.find(key)
    }

    /// Swap in a saved copy of a record.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::NotFound`] when no record has the same key.
    pub fn replace(&mut self, record: R) -> Result<(), ViewError> {
        let key = record.key();
        if self.snapshot.replace(record) {
            Ok(())
        } else {
            Err(ViewError::NotFound {
                view: self.spec.name(),
                key,
            })
        }
    }

    /// Start a fetch. Only the most recent ticket of the current mount is
    /// honoured by [`ListView::complete_fetch`].
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket {
            session: self.session,
            sequence: self.issued,
        }
    }

    /// Deliver fetched records. Returns `false` when the result was stale
    /// and discarded.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, records: Vec<R>) -> bool {
        if !self.mounted || ticket.session != self.session || ticket.sequence != self.issued {
            debug!(
                view = self.spec.name(),
                mounted = self.mounted,
                "discarding stale fetch result"
            );
            return false;
        }
        self.load(records);
        true
    }

    /// Report a failed fetch. The previous snapshot stays in place.
    pub fn fail_fetch(&mut self, ticket: FetchTicket, error: &anyhow::Error) {
        if self.mounted && ticket.session == self.session && ticket.sequence == self.issued {
            warn!(view = self.spec.name(), error = %error, "fetch failed, keeping previous records");
        }
    }

    /// Tear the view down; in-flight fetches become stale.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.session += 1;
        self.cache.invalidate();
    }

    /// Mount again with default state and no records.
    pub fn remount(&mut self) {
        self.mounted = true;
        self.session += 1;
        self.snapshot = Snapshot::default();
        self.cache.invalidate();
        self.reset();
    }
}
