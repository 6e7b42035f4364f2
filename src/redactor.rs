//! Field-limited views of records for non-owners

use crate::user_record::UserRecord;

/// Owners get the record untouched; everyone else only its public fields.
pub fn redact(record: UserRecord, authenticated: bool) -> UserRecord {
    if authenticated {
        return record;
    }
    public_view(&record)
}

/// Copy of the record holding only public fields; private ones are omitted, not blanked
pub fn public_view(record: &UserRecord) -> UserRecord {
    record
        .iter()
        .filter(|(field, _)| field.is_public())
        .map(|(field, value)| (field, value.clone()))
        .collect()
}

pub fn redact_all(records: Vec<UserRecord>, authenticated: bool) -> Vec<UserRecord> {
    records
        .into_iter()
        .map(|record| redact(record, authenticated))
        .collect()
}
