use crate::error::ErrorCode;
use crate::model::record::{Fee, RequestRecord};
use crate::model::status::{InvalidTransition, Status};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One resident's request for one civic document.
///
/// Mutated only through [`DocumentRequest::apply_transition`], which keeps
/// the lifecycle invariants: `submitted_at` is never touched, status only
/// moves forward (or to `rejected`), `completed_at` is stamped at most once,
/// and `remarks` is present exactly when the request is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRequest {
    pub id: u64,
    pub document_type_id: Option<u64>,
    pub document_type_name: String,
    pub purpose: String,
    pub notes: Option<String>,
    pub remarks: Option<String>,
    pub fee: Fee,
    pub status: Status,
    pub submitted_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
    pub requester_id: Option<u64>,
    pub requester_name: Option<String>,
    pub processed_by: Option<String>,
    /// Stage the request was at when it was rejected, when known.
    pub rejected_from: Option<Status>,
}

impl DocumentRequest {
    /// A freshly submitted request.
    #[must_use]
    pub fn new(
        id: u64,
        document_type_name: impl Into<String>,
        purpose: impl Into<String>,
        submitted_at: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            document_type_id: None,
            document_type_name: document_type_name.into(),
            purpose: purpose.into(),
            notes: None,
            remarks: None,
            fee: Fee::FREE,
            status: Status::Submitted,
            submitted_at,
            completed_at: None,
            requester_id: None,
            requester_name: None,
            processed_by: None,
            rejected_from: None,
        }
    }

    /// Rejection reason, when the request is rejected and staff left one.
    #[must_use]
    pub fn rejection_reason(&self) -> Option<&str> {
        if self.status == Status::Rejected {
            self.remarks.as_deref().filter(|r| !r.trim().is_empty())
        } else {
            None
        }
    }

    /// Apply a staff status change.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Invalid`] when the lifecycle refuses the
    /// move and [`TransitionError::MissingRemarks`] when a rejection has no
    /// remarks. The request is unchanged on error.
    pub fn apply_transition(&mut self, change: &StatusChange) -> Result<(), TransitionError> {
        self.status.can_transition_to(change.target)?;

        let remarks = non_empty(change.remarks.as_deref());
        if change.target == Status::Rejected {
            let Some(remarks) = remarks else {
                return Err(TransitionError::MissingRemarks { id: self.id });
            };
            self.remarks = Some(remarks);
            self.rejected_from = Some(self.status);
        }

        if matches!(
            change.target,
            Status::Ready | Status::Completed | Status::Rejected
        ) && self.completed_at.is_none()
        {
            self.completed_at = Some(change.at);
        }

        debug!(
            request_id = self.id,
            from = %self.status,
            to = %change.target,
            staff = change.staff.as_str(),
            "applied status change"
        );
        self.status = change.target;
        self.processed_by = Some(change.staff.clone());
        Ok(())
    }
}

/// A staff action moving a request to a new status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub target: Status,
    pub remarks: Option<String>,
    pub staff: String,
    pub at: NaiveDateTime,
}

/// Errors raised by staff status changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error(transparent)]
    Invalid(#[from] InvalidTransition),
    #[error("request {id} cannot be rejected without remarks")]
    MissingRemarks { id: u64 },
}

impl TransitionError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Invalid(_) => ErrorCode::InvalidStatusTransition,
            Self::MissingRemarks { .. } => ErrorCode::MissingRejectionRemarks,
        }
    }
}

/// Reasons an API record cannot become a [`DocumentRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    #[error("request record has no id")]
    MissingId,
    #[error("request {id} has no submission timestamp")]
    MissingSubmittedAt { id: u64 },
}

impl TryFrom<RequestRecord> for DocumentRequest {
    type Error = IngestError;

    fn try_from(record: RequestRecord) -> Result<Self, Self::Error> {
        let id = record.id.ok_or(IngestError::MissingId)?;
        let submitted_at = record
            .created_at
            .ok_or(IngestError::MissingSubmittedAt { id })?;
        let status = Status::parse_lenient(&record.status_text);

        let completed_at = match status {
            Status::Submitted | Status::Pending if record.processed_at.is_some() => {
                debug!(request_id = id, "dropping processed_at on a request not yet processed");
                None
            }
            _ => record.processed_at,
        };

        Ok(Self {
            id,
            document_type_id: record.document_id,
            document_type_name: record.document_type.trim().to_string(),
            purpose: record.purpose,
            notes: non_empty(record.notes.as_deref()),
            remarks: non_empty(record.remarks.as_deref()),
            fee: record.fee,
            status,
            submitted_at,
            completed_at,
            requester_id: record.resident_id,
            requester_name: non_empty(record.resident_name.as_deref()),
            processed_by: non_empty(record.processed_by.as_deref()),
            rejected_from: None,
        })
    }
}

/// Convert a fetched batch of API records, skipping records that cannot be
/// placed on a timeline.
#[must_use]
pub fn ingest_records(records: Vec<RequestRecord>) -> Vec<DocumentRequest> {
    records
        .into_iter()
        .filter_map(|record| match DocumentRequest::try_from(record) {
            Ok(request) => Some(request),
            Err(err) => {
                warn!(error = %err, "skipping unusable request record");
                None
            }
        })
        .collect()
}

fn non_empty(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
}
