//! Document request list: the staff-facing request queue.

use tracing::{info, instrument};

use crate::config::TimelineConfig;
use crate::model::request::{DocumentRequest, StatusChange};
use crate::model::status::Status;
use crate::query::{QuerySpec, SortDirection};
use crate::timeline::{self, TimelineStep};
use crate::views::{ListView, ViewError};

/// Persistence collaborator for staff edits.
///
/// Implementations save the change and return the request as stored.
pub trait RequestApi {
    /// # Errors
    ///
    /// Returns an error when the backend refuses or cannot be reached.
    fn update_status(&mut self, id: u64, change: &StatusChange) -> anyhow::Result<DocumentRequest>;
}

pub type RequestListView = ListView<DocumentRequest>;

/// Search by resident, id, purpose or document type; filter by status and
/// document type; newest submissions first.
#[must_use]
pub fn request_list_spec() -> QuerySpec<DocumentRequest> {
    QuerySpec::new("requests")
        .search_fields(&["resident_name", "id", "purpose", "document_type"])
        .filter_with("status", |request: &DocumentRequest, wanted| {
            wanted
                .parse::<Status>()
                .is_ok_and(|status| status == request.status)
        })
        .filter_equals("document_type", "document_type")
        .sortable(&[
            "id",
            "resident_name",
            "document_type",
            "purpose",
            "status",
            "fee",
            "submitted_at",
            "completed_at",
        ])
        .default_sort("submitted_at", SortDirection::Desc)
}

impl ListView<DocumentRequest> {
    /// Validate a staff status change locally, save it through `api`, and
    /// show the saved record.
    ///
    /// # Errors
    ///
    /// - [`ViewError::NotFound`] when the request is not listed;
    /// - [`ViewError::Transition`] when the lifecycle refuses the change
    ///   (nothing is sent to `api`);
    /// - [`ViewError::Persistence`] when `api` fails (the list is unchanged).
    #[instrument(level = "debug", skip(self, api, change), fields(target = %change.target))]
    pub fn change_status(
        &mut self,
        api: &mut dyn RequestApi,
        id: u64,
        change: StatusChange,
    ) -> Result<DocumentRequest, ViewError> {
        let mut updated = self
            .find(id)
            .cloned()
            .ok_or(ViewError::NotFound {
                view: self.spec().name(),
                key: id,
            })?;
        updated.apply_transition(&change)?;

        let mut saved = api
            .update_status(id, &change)
            .map_err(|err| ViewError::Persistence {
                key: id,
                message: format!("{err:#}"),
            })?;
        if saved.rejected_from.is_none() {
            saved.rejected_from = updated.rejected_from;
        }

        info!(request_id = id, status = %saved.status, "status change saved");
        self.replace(saved.clone())?;
        Ok(saved)
    }

    /// Timeline of a listed request.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::NotFound`] when the request is not listed.
    pub fn view_timeline(&self, id: u64, cfg: &TimelineConfig) -> Result<Vec<TimelineStep>, ViewError> {
        self.find(id)
            .map(|request| timeline::reconstruct(request, cfg))
            .ok_or(ViewError::NotFound {
                view: self.spec().name(),
                key: id,
            })
    }
}
