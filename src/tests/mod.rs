mod field_schema_tests;
mod roster_service_tests;
