//! Status vocabulary and lifecycle state machine for document requests.
//!
//! # Forward track
//!
//! ```text
//! submitted(0) -> pending(1) -> processing(2) -> ready(3) -> completed(4)
//!                     \               /
//!                      +-> rejected <+
//! ```
//!
//! Movement is monotonic: a request only advances along the forward track
//! (skipping tiers is allowed) or branches to `rejected` from `pending` or
//! `processing`. `completed` and `rejected` are terminal; a rejected request
//! is never resumed, the resident files a new request instead.
//!
//! # Presentation
//!
//! Every status owns exactly one [`StatusMeta`] entry in a single lookup
//! table. Unknown or legacy strings resolve to [`StatusMeta::UNKNOWN`], which
//! presents like `pending`.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing::debug;

use crate::error::ErrorCode;

/// Lifecycle state of a document request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Submitted,
    Pending,
    Processing,
    Ready,
    #[serde(alias = "claimed")]
    Completed,
    Rejected,
}

/// Display metadata for one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusMeta {
    /// Canonical human label.
    pub label: &'static str,
    /// Icon token understood by the view layer.
    pub icon: &'static str,
    /// Color class applied to badges and timeline markers.
    pub color_class: &'static str,
}

impl StatusMeta {
    /// Presentation used for status strings that do not parse.
    pub const UNKNOWN: Self = Self {
        label: "Pending Review",
        icon: "hourglass-split",
        color_class: "status-pending",
    };
}

const STATUS_TABLE: [(Status, StatusMeta); 6] = [
    (
        Status::Submitted,
        StatusMeta {
            label: "Submitted",
            icon: "send",
            color_class: "status-submitted",
        },
    ),
    (
        Status::Pending,
        StatusMeta {
            label: "Pending Review",
            icon: "hourglass-split",
            color_class: "status-pending",
        },
    ),
    (
        Status::Processing,
        StatusMeta {
            label: "Processing",
            icon: "gear",
            color_class: "status-processing",
        },
    ),
    (
        Status::Ready,
        StatusMeta {
            label: "Ready for Pickup",
            icon: "box-seam",
            color_class: "status-ready",
        },
    ),
    (
        Status::Completed,
        StatusMeta {
            label: "Completed",
            icon: "check-circle",
            color_class: "status-completed",
        },
    ),
    (
        Status::Rejected,
        StatusMeta {
            label: "Rejected",
            icon: "x-circle",
            color_class: "status-rejected",
        },
    ),
];

impl Status {
    /// Forward track in canonical order.
    pub const FORWARD: [Self; 5] = [
        Self::Submitted,
        Self::Pending,
        Self::Processing,
        Self::Ready,
        Self::Completed,
    ];

    /// Every status, forward track first.
    pub const ALL: [Self; 6] = [
        Self::Submitted,
        Self::Pending,
        Self::Processing,
        Self::Ready,
        Self::Completed,
        Self::Rejected,
    ];

    /// Canonical wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }

    /// Position on the forward track, `None` for `rejected`.
    #[must_use]
    pub const fn rank(self) -> Option<u8> {
        match self {
            Self::Submitted => Some(0),
            Self::Pending => Some(1),
            Self::Processing => Some(2),
            Self::Ready => Some(3),
            Self::Completed => Some(4),
            Self::Rejected => None,
        }
    }

    /// Whether no further transition is expected.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }

    /// Display metadata from the shared lookup table.
    #[must_use]
    pub fn meta(self) -> &'static StatusMeta {
        STATUS_TABLE
            .iter()
            .find(|(status, _)| *status == self)
            .map_or(&StatusMeta::UNKNOWN, |(_, meta)| meta)
    }

    /// Canonical display label.
    #[must_use]
    pub fn label(self) -> &'static str {
        self.meta().label
    }

    /// Parse a status string coming from the portal API.
    ///
    /// Never fails: unknown values fall back to [`Status::Pending`]. Legacy
    /// aliases (`claimed`, `under review`, `ready for pickup`, ...) are
    /// folded onto their canonical status here so nothing downstream sees
    /// them.
    #[must_use]
    pub fn parse_lenient(text: &str) -> Self {
        match Self::from_str(text) {
            Ok(status) => status,
            Err(_) => {
                debug!(status_text = text, "unknown status, presenting as pending");
                Self::Pending
            }
        }
    }

    /// Validate whether a transition from self to `target` is allowed.
    ///
    /// Forward moves along the track are allowed, including skips.
    /// `rejected` is reachable from `pending` and `processing` only.
    /// Terminal states and no-op moves are refused.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] describing the refused move.
    pub fn can_transition_to(self, target: Self) -> Result<(), InvalidTransition> {
        let refuse = |reason| InvalidTransition {
            from: self,
            to: target,
            reason,
        };

        if self == target {
            return Err(refuse("no-op transition is not allowed"));
        }
        if self.is_terminal() {
            return Err(refuse("request is already in a terminal state"));
        }

        match (self.rank(), target.rank()) {
            (_, None) if matches!(self, Self::Pending | Self::Processing) => Ok(()),
            (_, None) => Err(refuse("only pending or processing requests can be rejected")),
            (Some(from), Some(to)) if to > from => Ok(()),
            _ => Err(refuse("status never moves backward")),
        }
    }
}

/// Presentation for an arbitrary status string, falling back to
/// [`StatusMeta::UNKNOWN`].
#[must_use]
pub fn presentation_for(text: &str) -> &'static StatusMeta {
    Status::from_str(text).map_or(&StatusMeta::UNKNOWN, Status::meta)
}

/// Error returned when a status transition is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move request from {from} to {to}: {reason}")]
pub struct InvalidTransition {
    pub from: Status,
    pub to: Status,
    pub reason: &'static str,
}

/// Error returned when a status string does not name a known status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid status: '{got}'")]
pub struct ParseStatusError {
    pub got: String,
}

impl ParseStatusError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::InvalidStatusValue
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(input: &str) -> String {
    input
        .trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "submitted" | "new" => Ok(Self::Submitted),
            "pending" | "review" | "under review" | "for review" => Ok(Self::Pending),
            "processing" | "in progress" | "approved" => Ok(Self::Processing),
            "ready" | "ready for pickup" | "for pickup" => Ok(Self::Ready),
            "completed" | "complete" | "claimed" | "released" => Ok(Self::Completed),
            "rejected" | "denied" | "declined" => Ok(Self::Rejected),
            _ => Err(ParseStatusError { got: s.to_string() }),
        }
    }
}
