pub mod auth_verifier;
pub mod config;
pub mod field_schema;
pub mod profile_handler;
pub mod redactor;
pub mod roster_fetcher;
pub mod roster_parser;
pub mod roster_service;
pub mod user_record;

#[cfg(test)]
mod tests;

pub use auth_verifier::{issue_token, AuthVerifier, TokenIdentity};
pub use config::{PlatformConfig, ServiceConfig};
pub use field_schema::{verify_schema, CanonicalField};
pub use profile_handler::{load_fixture, router, AppState};
pub use redactor::redact;
pub use roster_fetcher::{FetchError, PlatformClient, RosterProvider, RosterSource};
pub use roster_parser::{parse, parse_csv, ShapeError};
pub use roster_service::{OwnerClaim, PipelineError, RosterService};
pub use user_record::{FieldValue, UserRecord};
