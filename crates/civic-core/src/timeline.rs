//! Timeline reconstruction for a single document request.
//!
//! Only `submitted_at` and (sometimes) `completed_at` are persisted, so the
//! milestones in between are placed at fixed offsets from submission. Those
//! steps carry `is_synthesized = true`; they are a presentational
//! approximation and are rendered at date precision only.
//!
//! Chronological order is always strictly increasing:
//!
//! 1. synthesized times are pushed forward so each lands at least one
//!    minute after its predecessor;
//! 2. when a real completion time exists, intermediate steps that would not
//!    fit before it are spread evenly between submission and completion;
//! 3. a real completion time at or before submission is ignored.
//!
//! Arithmetic saturates at `NaiveDateTime::MAX`, so a submission at the very
//! end of the calendar collapses its later steps onto that instant instead of
//! overflowing.
//!
//! Output is newest first.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use tracing::{instrument, warn};

use crate::config::TimelineConfig;
use crate::grouping::RequestGroup;
use crate::model::request::DocumentRequest;
use crate::model::status::Status;

/// One key/value row shown in a step's detail panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailEntry {
    pub key: String,
    pub value: String,
}

impl DetailEntry {
    fn new(key: &str, value: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            value: value.into(),
        }
    }
}

/// One milestone of a request's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineStep {
    pub status: Status,
    pub label: &'static str,
    pub timestamp: NaiveDateTime,
    /// True when `timestamp` was derived rather than persisted.
    pub is_synthesized: bool,
    /// Rejection reason; only set on the `rejected` step.
    pub reason: Option<String>,
    pub detail_panel: Option<Vec<DetailEntry>>,
}

impl TimelineStep {
    /// Timestamp text at the precision the data supports.
    #[must_use]
    pub fn display_time(&self) -> String {
        if self.is_synthesized {
            format!("{} (approx.)", self.timestamp.format("%b %-d, %Y"))
        } else {
            self.timestamp.format("%b %-d, %Y %-I:%M %p").to_string()
        }
    }
}

/// Timeline of one request inside a group history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestTimeline {
    pub request_id: u64,
    pub status: Status,
    pub steps: Vec<TimelineStep>,
}

/// Reconstruct the display timeline of `request`, newest step first.
#[instrument(level = "trace", skip_all, fields(request_id = request.id, status = %request.status))]
#[must_use]
pub fn reconstruct(request: &DocumentRequest, cfg: &TimelineConfig) -> Vec<TimelineStep> {
    let stages = stages_reached(request);
    let (times, anchored) = place_timestamps(request, &stages, cfg);
    let last = stages.len() - 1;

    let mut steps: Vec<TimelineStep> = stages
        .iter()
        .zip(times)
        .enumerate()
        .map(|(index, (&status, timestamp))| TimelineStep {
            status,
            label: status.label(),
            timestamp,
            is_synthesized: index > 0 && !(index == last && anchored),
            reason: (status == Status::Rejected).then(|| {
                request
                    .rejection_reason()
                    .map_or_else(|| cfg.rejection_placeholder.clone(), ToString::to_string)
            }),
            detail_panel: detail_panel(status, request, cfg),
        })
        .collect();

    steps.reverse();
    steps
}

/// Reconstruct every request of a group, newest request first.
#[must_use]
pub fn reconstruct_history(group: &RequestGroup, cfg: &TimelineConfig) -> Vec<RequestTimeline> {
    group
        .history
        .iter()
        .map(|request| RequestTimeline {
            request_id: request.id,
            status: request.status,
            steps: reconstruct(request, cfg),
        })
        .collect()
}

/// Statuses the request has passed through, chronologically, ending with
/// its current status.
fn stages_reached(request: &DocumentRequest) -> Vec<Status> {
    match request.status {
        Status::Rejected => {
            let mut stages = vec![Status::Submitted, Status::Pending];
            if request.rejected_from == Some(Status::Processing) {
                stages.push(Status::Processing);
            }
            stages.push(Status::Rejected);
            stages
        }
        current => {
            let reached = current.rank().map_or(0, usize::from);
            Status::FORWARD[..=reached].to_vec()
        }
    }
}

/// Chronological timestamps for `stages`, plus whether the final stage uses
/// the persisted completion time.
fn place_timestamps(
    request: &DocumentRequest,
    stages: &[Status],
    cfg: &TimelineConfig,
) -> (Vec<NaiveDateTime>, bool) {
    let submitted = request.submitted_at;
    let mut times = Vec::with_capacity(stages.len());
    times.push(submitted);
    for &status in &stages[1..] {
        let Some(&previous) = times.last() else {
            break;
        };
        let proposed = match status {
            Status::Rejected => later(previous, cfg.offset(Status::Rejected)),
            tier => later(submitted, cfg.offset(tier)),
        };
        times.push(proposed.max(later(previous, Duration::minutes(1))));
    }

    let last = stages.len() - 1;
    if last == 0 {
        return (times, false);
    }

    let Some(anchor) = request.completed_at else {
        return (times, false);
    };
    if anchor <= submitted {
        warn!(
            request_id = request.id,
            %submitted,
            %anchor,
            "completion time precedes submission, synthesizing instead"
        );
        return (times, false);
    }

    if times[last - 1] < anchor {
        times[last] = anchor;
        return (times, true);
    }

    let span_ms = (anchor - submitted).num_milliseconds();
    let slots = i64::try_from(last).unwrap_or(i64::MAX);
    if span_ms < slots {
        return (times, false);
    }
    for (index, slot) in times.iter_mut().enumerate().take(last).skip(1) {
        let index = i64::try_from(index).unwrap_or(slots);
        *slot = later(submitted, Duration::milliseconds(span_ms * index / slots));
    }
    times[last] = anchor;
    (times, true)
}

/// `base + offset`, saturating at the end of the representable calendar.
fn later(base: NaiveDateTime, offset: Duration) -> NaiveDateTime {
    base.checked_add_signed(offset).unwrap_or(NaiveDateTime::MAX)
}

fn detail_panel(
    status: Status,
    request: &DocumentRequest,
    cfg: &TimelineConfig,
) -> Option<Vec<DetailEntry>> {
    match status {
        Status::Pending => {
            let mut entries = vec![
                DetailEntry::new("Document", request.document_type_name.as_str()),
                DetailEntry::new("Purpose", request.purpose.as_str()),
            ];
            if let Some(notes) = request.notes.as_deref() {
                entries.push(DetailEntry::new("Notes", notes));
            }
            entries.push(DetailEntry::new("Fee", request.fee.to_string()));
            Some(entries)
        }
        Status::Processing => Some(vec![
            DetailEntry::new(
                "Handled by",
                request
                    .processed_by
                    .as_deref()
                    .unwrap_or(cfg.unassigned_staff.as_str()),
            ),
            DetailEntry::new("Fee", request.fee.to_string()),
        ]),
        Status::Ready => Some(vec![
            DetailEntry::new("Pickup location", cfg.pickup_location.as_str()),
            DetailEntry::new("Amount due", request.fee.to_string()),
            DetailEntry::new("Requirement", cfg.pickup_requirement.as_str()),
        ]),
        Status::Submitted | Status::Completed | Status::Rejected => None,
    }
}
