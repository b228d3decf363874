//! Named fields of the listed record types.

use crate::model::directory::{Resident, UserAccount};
use crate::model::request::DocumentRequest;
use crate::query::FieldValue;
use crate::query::Record;
use crate::views::Keyed;

fn id_value(id: u64) -> FieldValue<'static> {
    i64::try_from(id).map_or_else(|_| FieldValue::owned(id.to_string()), FieldValue::Int)
}

fn active_label(is_active: bool) -> &'static str {
    if is_active { "active" } else { "inactive" }
}

impl Keyed for DocumentRequest {
    fn key(&self) -> u64 {
        self.id
    }
}

impl Record for DocumentRequest {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "id" => id_value(self.id),
            "resident_name" => FieldValue::opt_text(self.requester_name.as_deref()),
            "resident_id" => self.requester_id.map_or(FieldValue::Missing, id_value),
            "document_type" => FieldValue::text(&self.document_type_name),
            "purpose" => FieldValue::text(&self.purpose),
            "notes" => FieldValue::opt_text(self.notes.as_deref()),
            "remarks" => FieldValue::opt_text(self.remarks.as_deref()),
            "status" => FieldValue::text(self.status.as_str()),
            "fee" => FieldValue::Float(self.fee.as_pesos()),
            "submitted_at" => FieldValue::Time(self.submitted_at),
            "completed_at" => FieldValue::opt_time(self.completed_at),
            "processed_by" => FieldValue::opt_text(self.processed_by.as_deref()),
            _ => FieldValue::Missing,
        }
    }
}

impl Keyed for Resident {
    fn key(&self) -> u64 {
        self.id
    }
}

impl Record for Resident {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "id" => id_value(self.id),
            "full_name" => FieldValue::owned(self.full_name()),
            "first_name" => FieldValue::text(&self.first_name),
            "last_name" => FieldValue::text(&self.last_name),
            "birth_date" => FieldValue::opt_date(self.birth_date),
            "gender" => FieldValue::opt_text(self.gender.as_deref()),
            "civil_status" => FieldValue::opt_text(self.civil_status.as_deref()),
            "purok" => FieldValue::opt_text(self.purok.as_deref()),
            "address" => FieldValue::opt_text(self.address.as_deref()),
            "contact_number" => FieldValue::opt_text(self.contact_number.as_deref()),
            "status" => FieldValue::text(active_label(self.is_active)),
            "registered_at" => FieldValue::opt_time(self.registered_at),
            _ => FieldValue::Missing,
        }
    }
}

impl Keyed for UserAccount {
    fn key(&self) -> u64 {
        self.id
    }
}

impl Record for UserAccount {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "id" => id_value(self.id),
            "username" => FieldValue::text(&self.username),
            "full_name" => FieldValue::text(&self.full_name),
            "email" => FieldValue::opt_text(self.email.as_deref()),
            "role" => FieldValue::text(&self.role),
            "status" => FieldValue::text(active_label(self.is_active)),
            "last_login" => FieldValue::opt_time(self.last_login),
            "created_at" => FieldValue::opt_time(self.created_at),
            _ => FieldValue::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::directory::Resident;
    use crate::model::request::DocumentRequest;
    use crate::query::{FieldValue, Record};
    use chrono::NaiveDate;

    #[test]
    fn request_fields() {
        let at = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let mut request = DocumentRequest::new(12, "Cedula", "Employment", at);
        request.requester_name = Some("Juan Dela Cruz".into());

        assert_eq!(request.field("id"), FieldValue::Int(12));
        assert_eq!(request.field("status"), FieldValue::text("submitted"));
        assert_eq!(request.field("submitted_at"), FieldValue::Time(at));
        assert_eq!(request.field("resident_name"), FieldValue::text("Juan Dela Cruz"));
        assert!(request.field("completed_at").is_missing());
        assert!(request.field("salary").is_missing());
    }

    #[test]
    fn resident_status_and_name() {
        let resident = Resident {
            id: 3,
            first_name: "Ana".into(),
            last_name: "Reyes".into(),
            is_active: false,
            ..Resident::default()
        };
        assert_eq!(resident.field("status"), FieldValue::text("inactive"));
        assert_eq!(resident.field("full_name"), FieldValue::text("Reyes, Ana"));
        assert!(resident.field("purok").is_missing());
    }
}
