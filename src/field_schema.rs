//! Canonical member fields and where they come from in the remote export
//!
//! Every canonical field is described exactly once in [`FIELD_TABLE`]. The
//! column lookup, the custom-field lookup, the public allow-list and the
//! multi-valued set are all derived from that table.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Stable field identifiers used internally and as JSON keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Id,
    Username,
    Email,
    FirstName,
    MiddleName,
    LastName,
    MembershipId,
    LastLogin,
    SignupDate,
    Status,
    ProfessionalTitle,
    Description,
    Skills,
    Interests,
    Twitter,
    Facebook,
    Instagram,
    Linkedin,
    Avatar,
    Websites,
    PhoneNumber,
    Address,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 22] = [
        CanonicalField::Id,
        CanonicalField::Username,
        CanonicalField::Email,
        CanonicalField::FirstName,
        CanonicalField::MiddleName,
        CanonicalField::LastName,
        CanonicalField::MembershipId,
        CanonicalField::LastLogin,
        CanonicalField::SignupDate,
        CanonicalField::Status,
        CanonicalField::ProfessionalTitle,
        CanonicalField::Description,
        CanonicalField::Skills,
        CanonicalField::Interests,
        CanonicalField::Twitter,
        CanonicalField::Facebook,
        CanonicalField::Instagram,
        CanonicalField::Linkedin,
        CanonicalField::Avatar,
        CanonicalField::Websites,
        CanonicalField::PhoneNumber,
        CanonicalField::Address,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Id => "id",
            CanonicalField::Username => "username",
            CanonicalField::Email => "email",
            CanonicalField::FirstName => "first_name",
            CanonicalField::MiddleName => "middle_name",
            CanonicalField::LastName => "last_name",
            CanonicalField::MembershipId => "membership_id",
            CanonicalField::LastLogin => "last_login",
            CanonicalField::SignupDate => "signup_date",
            CanonicalField::Status => "status",
            CanonicalField::ProfessionalTitle => "professional_title",
            CanonicalField::Description => "description",
            CanonicalField::Skills => "skills",
            CanonicalField::Interests => "interests",
            CanonicalField::Twitter => "twitter",
            CanonicalField::Facebook => "facebook",
            CanonicalField::Instagram => "instagram",
            CanonicalField::Linkedin => "linkedin",
            CanonicalField::Avatar => "avatar",
            CanonicalField::Websites => "websites",
            CanonicalField::PhoneNumber => "phone_number",
            CanonicalField::Address => "address",
        }
    }

    /// Whether the field may be shown to callers that are not the record owner
    pub fn is_public(&self) -> bool {
        field_spec(*self).is_some_and(|spec| spec.public)
    }

    /// Whether the field holds a comma-separated list
    pub fn is_multi_valued(&self) -> bool {
        field_spec(*self).is_some_and(|spec| spec.multi_valued)
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a canonical field is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    /// A named column of the export
    Column(&'static str),
    /// A label from the custom-field list, value taken from the `custom_fields` column
    Custom(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: CanonicalField,
    pub source: FieldSource,
    pub public: bool,
    pub multi_valued: bool,
}

const fn column(field: CanonicalField, name: &'static str, public: bool) -> FieldSpec {
    FieldSpec {
        field,
        source: FieldSource::Column(name),
        public,
        multi_valued: false,
    }
}

const fn custom(field: CanonicalField, label: &'static str, public: bool, multi_valued: bool) -> FieldSpec {
    FieldSpec {
        field,
        source: FieldSource::Custom(label),
        public,
        multi_valued,
    }
}

/// Name of the export column that carries the `::`-joined custom field values
pub const CUSTOM_FIELDS_COLUMN: &str = "custom_fields";

pub const CUSTOM_FIELD_SEPARATOR: &str = "::";

pub static FIELD_TABLE: &[FieldSpec] = &[
    // Built-in export columns
    column(CanonicalField::Id, "id", false),
    column(CanonicalField::Username, "username", false),
    column(CanonicalField::Email, "email", false),
    column(CanonicalField::FirstName, "fname", true),
    column(CanonicalField::LastName, "lname", true),
    column(CanonicalField::MembershipId, "membership_id", false),
    column(CanonicalField::LastLogin, "last_login", false),
    column(CanonicalField::SignupDate, "signup_date", false),
    column(CanonicalField::Status, "status", false),
    // Custom fields configured on the platform
    custom(CanonicalField::MiddleName, "Middle Name", true, false),
    custom(CanonicalField::ProfessionalTitle, "Professional Title", true, false),
    custom(CanonicalField::Description, "Short Bio", true, false),
    custom(CanonicalField::Skills, "Skills", true, true),
    custom(CanonicalField::Interests, "Interests", true, true),
    custom(CanonicalField::Twitter, "Twitter", true, false),
    custom(CanonicalField::Facebook, "Facebook", true, false),
    custom(CanonicalField::Instagram, "Instagram", true, false),
    custom(CanonicalField::Linkedin, "LinkedIn", true, false),
    custom(CanonicalField::Avatar, "Avatar", true, false),
    custom(CanonicalField::Websites, "Websites", true, true),
    custom(CanonicalField::PhoneNumber, "Phone", false, false),
    custom(CanonicalField::Address, "Address", false, false),
];

pub fn field_spec(field: CanonicalField) -> Option<&'static FieldSpec> {
    FIELD_TABLE.iter().find(|spec| spec.field == field)
}

/// Canonical field for a raw export column name
pub fn column_field(raw_name: &str) -> Option<CanonicalField> {
    FIELD_TABLE.iter().find_map(|spec| match spec.source {
        FieldSource::Column(name) if name == raw_name => Some(spec.field),
        _ => None,
    })
}

/// Canonical field for a custom-field label
pub fn custom_field(label: &str) -> Option<CanonicalField> {
    FIELD_TABLE.iter().find_map(|spec| match spec.source {
        FieldSource::Custom(name) if name == label => Some(spec.field),
        _ => None,
    })
}

pub fn public_fields() -> impl Iterator<Item = CanonicalField> {
    FIELD_TABLE
        .iter()
        .filter(|spec| spec.public)
        .map(|spec| spec.field)
}

pub fn multi_valued_fields() -> impl Iterator<Item = CanonicalField> {
    FIELD_TABLE
        .iter()
        .filter(|spec| spec.multi_valued)
        .map(|spec| spec.field)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    MissingField(CanonicalField),
    DuplicateField(CanonicalField),
    DuplicateSource(String),
    ReservedColumn,
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::MissingField(field) => write!(f, "Field {field} has no source"),
            SchemaError::DuplicateField(field) => write!(f, "Field {field} is defined twice"),
            SchemaError::DuplicateSource(name) => write!(f, "Source {name:?} maps to more than one field"),
            SchemaError::ReservedColumn => {
                write!(f, "Column {CUSTOM_FIELDS_COLUMN:?} cannot map to a field directly")
            }
        }
    }
}

impl std::error::Error for SchemaError {}

/// Check that the field table covers every canonical field exactly once
pub fn verify_schema() -> Result<(), SchemaError> {
    verify_table(FIELD_TABLE)
}

pub(crate) fn verify_table(table: &[FieldSpec]) -> Result<(), SchemaError> {
    let mut fields = HashSet::new();
    let mut sources = HashSet::new();

    for spec in table {
        if !fields.insert(spec.field) {
            return Err(SchemaError::DuplicateField(spec.field));
        }
        let key = match spec.source {
            FieldSource::Column(CUSTOM_FIELDS_COLUMN) => return Err(SchemaError::ReservedColumn),
            FieldSource::Column(name) => format!("column:{name}"),
            FieldSource::Custom(label) => format!("custom:{label}"),
        };
        if !sources.insert(key) {
            let name = match spec.source {
                FieldSource::Column(name) | FieldSource::Custom(name) => name,
            };
            return Err(SchemaError::DuplicateSource(name.to_string()));
        }
    }

    match CanonicalField::ALL.into_iter().find(|field| !fields.contains(field)) {
        Some(field) => Err(SchemaError::MissingField(field)),
        None => Ok(()),
    }
}
