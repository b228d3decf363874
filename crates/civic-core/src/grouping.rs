//! Collapse a resident's request history into one thread per document type.
//!
//! Groups whose active request is still in flight sort ahead of settled
//! ones; within each partition the most recently submitted active request
//! comes first.

use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

use crate::model::request::DocumentRequest;

/// Every request a resident made for one document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestGroup {
    pub document_type_name: String,
    /// Full history, newest submission first.
    pub history: Vec<DocumentRequest>,
    /// Index into `history` of the representative request.
    active_index: usize,
}

impl RequestGroup {
    /// The request that represents this document type's current status.
    #[must_use]
    pub fn active(&self) -> &DocumentRequest {
        &self.history[self.active_index]
    }

    /// Whether the active request has settled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.active().status.is_terminal()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    fn from_history(document_type_name: String, mut history: Vec<DocumentRequest>) -> Self {
        history.sort_by_key(|r| Reverse((r.submitted_at, r.id)));
        // Newest in-flight request wins; otherwise the newest overall.
        let active_index = history
            .iter()
            .position(|r| !r.status.is_terminal())
            .unwrap_or(0);
        Self {
            document_type_name,
            history,
            active_index,
        }
    }
}

/// `true` when `filter` does not narrow anything.
fn is_any(filter: Option<&str>) -> bool {
    filter.is_none_or(|f| {
        let f = f.trim();
        f.is_empty() || f.eq_ignore_ascii_case("all")
    })
}

/// Group `requests` by document type, optionally keeping only one type.
///
/// The filter matches document type names case-insensitively; `None`, an
/// empty string and `"all"` keep every type.
#[instrument(level = "debug", skip(requests), fields(count = requests.len()))]
#[must_use]
pub fn group_requests(requests: &[DocumentRequest], type_filter: Option<&str>) -> Vec<RequestGroup> {
    let keep_all = is_any(type_filter);
    let wanted = type_filter.map(|f| f.trim().to_lowercase());

    let mut by_type: BTreeMap<String, (String, Vec<DocumentRequest>)> = BTreeMap::new();
    for request in requests {
        let key = request.document_type_name.trim().to_lowercase();
        if !keep_all && wanted.as_deref() != Some(key.as_str()) {
            continue;
        }
        by_type
            .entry(key)
            .or_insert_with(|| (request.document_type_name.trim().to_string(), Vec::new()))
            .1
            .push(request.clone());
    }

    let mut groups: Vec<RequestGroup> = by_type
        .into_values()
        .map(|(name, history)| RequestGroup::from_history(name, history))
        .collect();
    groups.sort_by(compare_groups);

    debug!(groups = groups.len(), "grouped request history");
    groups
}

/// Group only the requests filed by `resident_id`.
#[must_use]
pub fn group_for_resident(
    requests: &[DocumentRequest],
    resident_id: u64,
    type_filter: Option<&str>,
) -> Vec<RequestGroup> {
    let own: Vec<DocumentRequest> = requests
        .iter()
        .filter(|r| r.requester_id == Some(resident_id))
        .cloned()
        .collect();
    group_requests(&own, type_filter)
}

fn compare_groups(a: &RequestGroup, b: &RequestGroup) -> Ordering {
    a.is_settled()
        .cmp(&b.is_settled())
        .then_with(|| b.active().submitted_at.cmp(&a.active().submitted_at))
        .then_with(|| a.document_type_name.cmp(&b.document_type_name))
}
