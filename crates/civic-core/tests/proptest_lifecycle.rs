use proptest::prelude::*;
use std::collections::BTreeSet;

use civic_core::config::TimelineConfig;
use civic_core::grouping::group_requests;
use civic_core::model::status::Status;
use civic_core::query::{QueryState, SortDirection};
use civic_core::timeline::reconstruct;
use civic_core::views::request_list_spec;

#[path = "generators.rs"]
mod generators;
use generators::*;

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    #[test]
    fn submitted_requests_have_one_step(request in arb_request_with(Just(Status::Submitted))) {
        let steps = reconstruct(&request, &TimelineConfig::default());
        prop_assert_eq!(steps.len(), 1);
        prop_assert_eq!(steps[0].status, Status::Submitted);
        prop_assert!(!steps[0].is_synthesized);
        prop_assert_eq!(steps[0].timestamp, request.submitted_at);
    }

    #[test]
    fn rejected_requests_stop_at_the_rejecting_stage(request in arb_request_with(Just(Status::Rejected))) {
        let cfg = TimelineConfig::default();
        let steps = reconstruct(&request, &cfg);

        let rejected = steps.iter().find(|s| s.status == Status::Rejected);
        prop_assert!(rejected.is_some());
        let reason = rejected.and_then(|s| s.reason.clone()).unwrap_or_default();
        match request.remarks.as_deref().filter(|r| !r.trim().is_empty()) {
            Some(remarks) => prop_assert_eq!(reason, remarks),
            None => prop_assert_eq!(reason, cfg.rejection_placeholder.clone()),
        }

        let statuses: Vec<Status> = steps.iter().map(|s| s.status).collect();
        prop_assert!(!statuses.contains(&Status::Ready));
        prop_assert!(!statuses.contains(&Status::Completed));
        prop_assert_eq!(
            statuses.contains(&Status::Processing),
            request.rejected_from == Some(Status::Processing)
        );
    }

    #[test]
    fn timelines_are_chronological(request in arb_request()) {
        let steps = reconstruct(&request, &TimelineConfig::default());
        prop_assert!(!steps.is_empty());
        prop_assert_eq!(steps[0].status, request.status);
        let chronological: Vec<_> = steps.iter().rev().map(|s| s.timestamp).collect();
        for pair in chronological.windows(2) {
            prop_assert!(pair[0] < pair[1], "not strictly increasing: {:?}", chronological);
        }
        prop_assert_eq!(chronological[0], request.submitted_at);
    }

    #[test]
    fn one_group_per_document_type(requests in arb_requests(40)) {
        let groups = group_requests(&requests, None);
        let distinct: BTreeSet<String> = requests
            .iter()
            .map(|r| r.document_type_name.trim().to_lowercase())
            .collect();
        prop_assert_eq!(groups.len(), distinct.len());
        prop_assert_eq!(groups.iter().map(|g| g.len()).sum::<usize>(), requests.len());

        for group in &groups {
            let active = group.active();
            let open: Vec<_> = group.history.iter().filter(|r| !r.status.is_terminal()).collect();
            let pool: Vec<_> = if open.is_empty() { group.history.iter().collect() } else { open };
            prop_assert!(pool.iter().all(|r| r.submitted_at <= active.submitted_at));
            prop_assert!(pool.iter().any(|r| r.id == active.id));
        }
    }

    #[test]
    fn type_filter_keeps_only_that_type(requests in arb_requests(40)) {
        let groups = group_requests(&requests, Some("BARANGAY CLEARANCE"));
        prop_assert!(groups.len() <= 1);
        let expected = requests
            .iter()
            .filter(|r| r.document_type_name.trim().eq_ignore_ascii_case("barangay clearance"))
            .count();
        prop_assert_eq!(groups.iter().map(|g| g.len()).sum::<usize>(), expected);
    }

    #[test]
    fn pages_concatenate_to_the_ordered_list(
        requests in arb_requests(60),
        page_size in 1usize..8,
        search in prop::sample::select(vec!["", "ana", "cedula", "1", "employment"]),
        status in prop::sample::select(vec!["all", "pending", "completed", "rejected"]),
        sort in prop::sample::select(vec!["submitted_at", "fee", "resident_name", "status", "id"]),
        descending in any::<bool>(),
    ) {
        let spec = request_list_spec();
        let mut state = spec.initial_state();
        state.set_search(search);
        state.set_filter("status", status);
        let direction = if descending { SortDirection::Desc } else { SortDirection::Asc };
        state.set_sort(sort, direction);
        state.set_page_size(page_size);

        let ordered = spec.ordered_indices(&requests, &state);
        let first = spec.apply(&requests, &state);
        prop_assert_eq!(first.total_count, ordered.len());
        prop_assert_eq!(first.total_pages, ordered.len().div_ceil(page_size));

        let mut seen = Vec::new();
        for page in 1..=first.total_pages {
            state.set_page(page);
            let result = spec.apply(&requests, &state);
            prop_assert_eq!(result.current_page, page);
            prop_assert!(result.items.len() <= page_size);
            seen.extend(result.items.iter().map(|r| r.id));
        }
        let expected: Vec<u64> = ordered.iter().map(|&i| requests[i].id).collect();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn search_and_filters_reset_the_page(
        page in 1usize..500,
        text in "[a-z ]{0,8}",
        value in prop::sample::select(vec!["all", "pending", "ready", ""]),
    ) {
        let mut state = QueryState::new("submitted_at", SortDirection::Desc, 10);
        state.set_page(page);
        state.set_search(text);
        prop_assert_eq!(state.current_page(), 1);

        state.set_page(page);
        state.set_filter("status", value);
        prop_assert_eq!(state.current_page(), 1);

        state.set_page(page);
        state.clear_filter("status");
        prop_assert_eq!(state.current_page(), 1);
    }
}
