use crate::field_schema::{
    column_field, custom_field, multi_valued_fields, public_fields, verify_schema, verify_table,
    CanonicalField, FieldSource, FieldSpec, SchemaError, FIELD_TABLE,
};

#[test]
fn test_builtin_table_is_consistent() {
    assert_eq!(verify_schema(), Ok(()));
}

#[test]
fn test_every_public_field_has_a_source() {
    for field in public_fields() {
        let reachable = FIELD_TABLE.iter().any(|spec| {
            spec.field == field
                && match spec.source {
                    FieldSource::Column(name) => column_field(name) == Some(field),
                    FieldSource::Custom(label) => custom_field(label) == Some(field),
                }
        });
        assert!(reachable, "{field} is public but unreachable");
    }
}

#[test]
fn test_column_and_custom_lookups() {
    assert_eq!(column_field("fname"), Some(CanonicalField::FirstName));
    assert_eq!(column_field("lname"), Some(CanonicalField::LastName));
    assert_eq!(custom_field("Skills"), Some(CanonicalField::Skills));
    assert_eq!(custom_field("Short Bio"), Some(CanonicalField::Description));

    // Lookups are per source kind and exact
    assert_eq!(column_field("Skills"), None);
    assert_eq!(custom_field("fname"), None);
    assert_eq!(custom_field("skills"), None);
    assert_eq!(column_field("custom_fields"), None);
}

#[test]
fn test_public_and_multi_valued_sets() {
    assert!(CanonicalField::FirstName.is_public());
    assert!(CanonicalField::Websites.is_public());
    assert!(!CanonicalField::Email.is_public());
    assert!(!CanonicalField::PhoneNumber.is_public());
    assert!(!CanonicalField::LastLogin.is_public());

    let multi: Vec<_> = multi_valued_fields().collect();
    assert_eq!(
        multi,
        vec![
            CanonicalField::Skills,
            CanonicalField::Interests,
            CanonicalField::Websites
        ]
    );
}

#[test]
fn test_field_names_serialize_as_snake_case() {
    for field in CanonicalField::ALL {
        let json = serde_json::to_string(&field).unwrap();
        assert_eq!(json, format!("\"{}\"", field.as_str()));
    }
}

#[test]
fn test_verify_table_rejects_missing_field() {
    let table: Vec<FieldSpec> = FIELD_TABLE
        .iter()
        .copied()
        .filter(|spec| spec.field != CanonicalField::Avatar)
        .collect();
    assert_eq!(
        verify_table(&table),
        Err(SchemaError::MissingField(CanonicalField::Avatar))
    );
}

#[test]
fn test_verify_table_rejects_duplicates() {
    let mut table: Vec<FieldSpec> = FIELD_TABLE.to_vec();
    table.push(table[0]);
    assert_eq!(
        verify_table(&table),
        Err(SchemaError::DuplicateField(table[0].field))
    );

    let mut table: Vec<FieldSpec> = FIELD_TABLE.to_vec();
    let first_custom = table
        .iter()
        .position(|spec| matches!(spec.source, FieldSource::Custom(_)))
        .unwrap();
    table[first_custom].source = FieldSource::Custom("Skills");
    assert!(matches!(
        verify_table(&table),
        Err(SchemaError::DuplicateSource(name)) if name == "Skills"
    ));
}

#[test]
fn test_verify_table_rejects_custom_fields_column() {
    let mut table: Vec<FieldSpec> = FIELD_TABLE.to_vec();
    table[0].source = FieldSource::Column("custom_fields");
    assert_eq!(verify_table(&table), Err(SchemaError::ReservedColumn));
}
