use crate::model::directory::UserAccount;
use crate::query::{QuerySpec, SortDirection};

/// User access list: staff and resident logins.
#[must_use]
pub fn user_access_list_spec() -> QuerySpec<UserAccount> {
    QuerySpec::new("users")
        .search_fields(&["username", "full_name", "email"])
        .filter_equals("role", "role")
        .filter_equals("status", "status")
        .sortable(&[
            "id",
            "username",
            "full_name",
            "email",
            "role",
            "last_login",
            "created_at",
        ])
        .default_sort("username", SortDirection::Asc)
}
