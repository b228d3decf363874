use chrono::NaiveDate;

use crate::model::directory::{AgeBracket, Resident};
use crate::query::{QuerySpec, SortDirection};

pub const RESIDENT_PAGE_SIZE: usize = 25;

/// Resident registry list. Ages (and so the `age_bracket` filter) are taken
/// on `as_of`.
#[must_use]
pub fn resident_list_spec(as_of: NaiveDate) -> QuerySpec<Resident> {
    QuerySpec::new("residents")
        .search_fields(&["full_name", "id", "address"])
        .filter_equals("status", "status")
        .filter_equals("gender", "gender")
        .filter_equals("purok", "purok")
        .filter_with("age_bracket", move |resident: &Resident, wanted| {
            let Ok(wanted) = wanted.parse::<AgeBracket>() else {
                return false;
            };
            resident
                .age_on(as_of)
                .is_some_and(|age| AgeBracket::from_age(age) == wanted)
        })
        .sortable(&[
            "id",
            "full_name",
            "last_name",
            "birth_date",
            "gender",
            "purok",
            "registered_at",
        ])
        .default_sort("full_name", SortDirection::Asc)
        .default_page_size(RESIDENT_PAGE_SIZE)
        .default_filter("status", "active")
}
