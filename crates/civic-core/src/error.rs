use std::fmt;

/// Machine-readable error codes shared by the library and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    SnapshotParseError,
    RequestNotFound,
    InvalidStatusTransition,
    MissingRejectionRemarks,
    InvalidStatusValue,
    UnknownSortField,
    UnknownFilterKey,
    InvalidPageSize,
    FetchInFlight,
    FetchFailed,
    PersistenceFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::SnapshotParseError => "E1002",
            Self::RequestNotFound => "E2001",
            Self::InvalidStatusTransition => "E2002",
            Self::MissingRejectionRemarks => "E2003",
            Self::InvalidStatusValue => "E2004",
            Self::UnknownSortField => "E3001",
            Self::UnknownFilterKey => "E3002",
            Self::InvalidPageSize => "E3003",
            Self::FetchInFlight => "E5001",
            Self::FetchFailed => "E5002",
            Self::PersistenceFailed => "E5003",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::SnapshotParseError => "Snapshot parse error",
            Self::RequestNotFound => "Document request not found",
            Self::InvalidStatusTransition => "Invalid status transition",
            Self::MissingRejectionRemarks => "Rejection requires remarks",
            Self::InvalidStatusValue => "Invalid status value",
            Self::UnknownSortField => "Unknown sort field",
            Self::UnknownFilterKey => "Unknown filter key",
            Self::InvalidPageSize => "Invalid page size",
            Self::FetchInFlight => "Fetch already in flight",
            Self::FetchFailed => "Fetch failed",
            Self::PersistenceFailed => "Persistence collaborator failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .civic/config.toml and retry."),
            Self::SnapshotParseError => {
                Some("Export the snapshot again as a JSON array of request records or an object of record arrays.")
            }
            Self::RequestNotFound => None,
            Self::InvalidStatusTransition => Some(
                "Follow valid transitions: submitted -> pending -> processing -> ready -> completed, or reject from pending/processing.",
            ),
            Self::MissingRejectionRemarks => {
                Some("Provide remarks explaining why the request was rejected.")
            }
            Self::InvalidStatusValue => Some(
                "Use one of: submitted, pending, processing, ready, completed, rejected.",
            ),
            Self::UnknownSortField => Some("Sort by one of the list's sortable columns."),
            Self::UnknownFilterKey => Some("Filter by one of the list's configured filters."),
            Self::InvalidPageSize => Some("Pick one of the configured page sizes (query.page_size_options)."),
            Self::FetchInFlight => Some("Retry after the in-flight fetch completes."),
            Self::FetchFailed => Some("Retry the refresh; the previous snapshot is kept."),
            Self::PersistenceFailed => Some("Check the portal API and retry the action."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    const ALL: [ErrorCode; 12] = [
        ErrorCode::ConfigParseError,
        ErrorCode::SnapshotParseError,
        ErrorCode::RequestNotFound,
        ErrorCode::InvalidStatusTransition,
        ErrorCode::MissingRejectionRemarks,
        ErrorCode::InvalidStatusValue,
        ErrorCode::UnknownSortField,
        ErrorCode::UnknownFilterKey,
        ErrorCode::InvalidPageSize,
        ErrorCode::FetchInFlight,
        ErrorCode::FetchFailed,
        ErrorCode::PersistenceFailed,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let rendered = code.code();
            assert_eq!(rendered.len(), 5);
            assert!(rendered.starts_with('E'));
            assert!(rendered.chars().skip(1).all(|c| c.is_ascii_digit()));
            assert!(!code.message().is_empty());
        }
    }

    #[test]
    fn display_matches_code() {
        assert_eq!(ErrorCode::UnknownSortField.to_string(), "E3001");
    }
}
