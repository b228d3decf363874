#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use civic_core::model::directory::Resident;
use civic_core::model::record::Fee;
use civic_core::model::request::DocumentRequest;
use civic_core::model::status::Status;
use proptest::prelude::*;

pub const DOCUMENT_TYPES: [&str; 5] = [
    "Barangay Clearance",
    "barangay clearance ",
    "Cedula",
    "Certificate of Indigency",
    "Business Permit",
];

pub fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .unwrap_or_default()
}

pub fn arb_status() -> impl Strategy<Value = Status> + Clone {
    prop::sample::select(Status::ALL.to_vec())
}

pub fn arb_remarks() -> impl Strategy<Value = Option<String>> + Clone {
    prop::option::of(prop::sample::select(vec![
        String::new(),
        "   ".to_string(),
        "Incomplete requirements".to_string(),
        "Duplicate request".to_string(),
    ]))
}

/// Distance from submission to the persisted completion time. Includes
/// anchors only milliseconds or a few minutes after submission, which leave
/// little or no room for the synthesized steps.
pub fn arb_completion_offset() -> impl Strategy<Value = Duration> + Clone {
    prop_oneof![
        (-2_000i64..20_000).prop_map(Duration::minutes),
        (0i64..180_000).prop_map(Duration::milliseconds),
        (0i64..5).prop_map(Duration::milliseconds),
    ]
}

pub fn arb_request_with(status: impl Strategy<Value = Status> + Clone) -> impl Strategy<Value = DocumentRequest> + Clone {
    (
        0u64..10_000,
        prop::sample::select(DOCUMENT_TYPES.to_vec()),
        status,
        0i64..500_000,
        prop::option::of(arb_completion_offset()),
        arb_remarks(),
        prop::option::of(prop::sample::select(vec![Status::Pending, Status::Processing])),
        0u64..50_000,
        prop::option::of(prop::sample::select(vec!["Ana", "Ben", "Carla"])),
    )
        .prop_map(
            |(id, doc, status, start, finish, remarks, rejected_from, fee, name)| {
                let submitted_at = base_time() + Duration::minutes(start);
                let mut request = DocumentRequest::new(id, doc, "Employment", submitted_at);
                request.status = status;
                request.completed_at = finish.map(|offset| submitted_at + offset);
                request.remarks = remarks;
                request.rejected_from = rejected_from.filter(|_| status == Status::Rejected);
                request.fee = Fee::from_centavos(fee);
                request.requester_name = name.map(str::to_string);
                request
            },
        )
}

pub fn arb_request() -> impl Strategy<Value = DocumentRequest> + Clone {
    arb_request_with(arb_status())
}

/// Requests with unique ids.
pub fn arb_requests(max: usize) -> impl Strategy<Value = Vec<DocumentRequest>> + Clone {
    prop::collection::vec(arb_request(), 0..max).prop_map(|mut requests| {
        for (index, request) in requests.iter_mut().enumerate() {
            request.id = index as u64 + 1;
        }
        requests
    })
}

pub fn arb_resident() -> impl Strategy<Value = Resident> + Clone {
    (
        prop::sample::select(vec!["Reyes", "Santos", "Cruz", "Bautista", "Ocampo"]),
        prop::sample::select(vec!["Ana", "Jose", "Maria", "Pedro"]),
        prop::option::of(0i64..36_500),
        prop::sample::select(vec!["Purok 1", "Purok 2", "Purok 3"]),
        any::<bool>(),
    )
        .prop_map(|(last, first, age_days, purok, active)| Resident {
            first_name: first.to_string(),
            last_name: last.to_string(),
            birth_date: age_days.map(|d| {
                NaiveDate::from_ymd_opt(2024, 6, 30).unwrap_or_default() - Duration::days(d)
            }),
            purok: Some(purok.to_string()),
            is_active: active,
            ..Resident::default()
        })
}
