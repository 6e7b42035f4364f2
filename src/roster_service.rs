//! Fetch → parse → verify → redact, once per request

use crate::auth_verifier::AuthVerifier;
use crate::field_schema::CanonicalField;
use crate::redactor::{redact, redact_all};
use crate::roster_fetcher::{FetchError, RosterProvider};
use crate::roster_parser::{parse, parse_csv, ShapeError};
use crate::user_record::UserRecord;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug)]
pub enum PipelineError {
    Fetch(FetchError),
    Shape(ShapeError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Fetch(e) => write!(f, "Roster fetch failed: {e}"),
            PipelineError::Shape(e) => write!(f, "Roster export malformed: {e}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Fetch(e) => Some(e),
            PipelineError::Shape(e) => Some(e),
        }
    }
}

impl From<FetchError> for PipelineError {
    fn from(e: FetchError) -> Self {
        PipelineError::Fetch(e)
    }
}

impl From<ShapeError> for PipelineError {
    fn from(e: ShapeError) -> Self {
        PipelineError::Shape(e)
    }
}

/// Credentials a caller presents to see their own private fields
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerClaim<'a> {
    pub username: Option<&'a str>,
    pub token: Option<&'a str>,
}

impl<'a> OwnerClaim<'a> {
    pub fn new(username: Option<&'a str>, token: Option<&'a str>) -> Self {
        Self { username, token }
    }
}

pub struct RosterService {
    provider: Arc<dyn RosterProvider>,
    verifier: AuthVerifier,
}

impl RosterService {
    pub fn new(provider: Arc<dyn RosterProvider>, verifier: AuthVerifier) -> Self {
        Self { provider, verifier }
    }

    /// Fetch the live roster and return it as visible to the claimant
    pub async fn profiles(&self, claim: OwnerClaim<'_>) -> Result<Vec<UserRecord>, PipelineError> {
        let session = self.provider.connect().await?;

        // Both fetches share the session but not each other's results
        let (export, labels) = tokio::try_join!(
            session.fetch_raw_export(),
            session.fetch_custom_field_labels()
        )?;

        let rows = parse_csv(&export)?;
        let records = parse(&rows, &labels)?;
        info!("Loaded {} member records", records.len());

        Ok(self.present(records, claim))
    }

    /// Apply the owner check and redaction to already-loaded records.
    ///
    /// Only the authenticated owner's own record keeps its private fields.
    pub fn present(&self, records: Vec<UserRecord>, claim: OwnerClaim<'_>) -> Vec<UserRecord> {
        let owner = match (claim.username, claim.token) {
            (Some(username), Some(token))
                if self.verifier.is_authenticated(username, token, &records) =>
            {
                username
            }
            _ => return redact_all(records, false),
        };

        debug!("Serving full record to owner {}", owner);
        records
            .into_iter()
            .map(|record| {
                let is_owner = record.text(CanonicalField::Username) == Some(owner);
                redact(record, is_owner)
            })
            .collect()
    }
}
