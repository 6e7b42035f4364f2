//! Time-windowed owner tokens
//!
//! A token is `hex(HMAC-SHA1(last_login ++ minute, email:full name:id:membership id))`
//! where `minute` is the minute of the hour. Tokens for the current minute and
//! its neighbours are accepted, so issuer and verifier clocks may drift by up
//! to a minute without a shared nonce store.

use crate::field_schema::CanonicalField;
use crate::user_record::UserRecord;
use chrono::{DateTime, Timelike, Utc};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use tracing::debug;

type HmacSha1 = Hmac<Sha1>;

const MINUTES_PER_HOUR: i64 = 60;

/// Hex length of an HMAC-SHA1 tag
const TOKEN_LEN: usize = 40;

/// Fields of a record that feed the token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIdentity {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub id: String,
    pub membership_id: String,
    pub last_login: String,
}

impl TokenIdentity {
    /// `None` when the record has no last login
    pub fn from_record(record: &UserRecord) -> Option<Self> {
        let text = |field: CanonicalField| record.text(field).unwrap_or_default().to_string();

        let last_login = text(CanonicalField::LastLogin);
        if last_login.is_empty() {
            return None;
        }

        Some(Self {
            email: text(CanonicalField::Email),
            first_name: text(CanonicalField::FirstName),
            last_name: text(CanonicalField::LastName),
            id: text(CanonicalField::Id),
            membership_id: text(CanonicalField::MembershipId),
            last_login,
        })
    }

    fn message(&self) -> String {
        format!(
            "{}:{} {}:{}:{}",
            self.email, self.first_name, self.last_name, self.id, self.membership_id
        )
    }

    fn keyed_mac(&self, minute: u32) -> Option<HmacSha1> {
        let key = format!("{}{}", self.last_login, minute);
        let mut mac = <HmacSha1 as KeyInit>::new_from_slice(key.as_bytes()).ok()?;
        mac.update(self.message().as_bytes());
        Some(mac)
    }

    /// Token valid for the given minute of the hour
    pub fn token_for_minute(&self, minute: u32) -> Option<String> {
        self.keyed_mac(minute)
            .map(|mac| hex::encode(mac.finalize().into_bytes()))
    }

    /// Constant-time comparison of a decoded tag against the given minute's MAC
    fn matches_minute(&self, minute: u32, tag: &[u8]) -> bool {
        self.keyed_mac(minute)
            .is_some_and(|mac| mac.verify_slice(tag).is_ok())
    }
}

/// Token for `identity` at the wall-clock time `now`
pub fn issue_token(identity: &TokenIdentity, now: DateTime<Utc>) -> Option<String> {
    identity.token_for_minute(now.minute())
}

/// Raw tag bytes of a well-formed token. Only lowercase hex of the exact tag
/// length is accepted.
fn decode_token(token: &str) -> Option<Vec<u8>> {
    let well_formed = token.len() == TOKEN_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if !well_formed {
        return None;
    }
    hex::decode(token).ok()
}

/// Decides whether a caller owns the record they name
#[derive(Debug, Clone, Copy)]
pub struct AuthVerifier {
    skew_minutes: i64,
}

impl Default for AuthVerifier {
    fn default() -> Self {
        Self { skew_minutes: 1 }
    }
}

impl AuthVerifier {
    pub fn new(skew_minutes: u32) -> Self {
        Self {
            skew_minutes: i64::from(skew_minutes).min(MINUTES_PER_HOUR / 2),
        }
    }

    pub fn is_authenticated(&self, username: &str, token: &str, records: &[UserRecord]) -> bool {
        self.is_authenticated_at(username, token, records, Utc::now())
    }

    /// Never fails: unknown users and unusable records read as not authenticated.
    pub fn is_authenticated_at(
        &self,
        username: &str,
        token: &str,
        records: &[UserRecord],
        now: DateTime<Utc>,
    ) -> bool {
        let Some(record) = records
            .iter()
            .find(|record| record.text(CanonicalField::Username) == Some(username))
        else {
            debug!("No record for user {}", username);
            return false;
        };

        let Some(identity) = TokenIdentity::from_record(record) else {
            debug!("Record for user {} has no last login", username);
            return false;
        };

        let Some(tag) = decode_token(token) else {
            debug!("Malformed token for user {}", username);
            return false;
        };

        let authenticated = self
            .candidate_minutes(now.minute())
            .any(|minute| identity.matches_minute(minute, &tag));

        debug!("Owner check for user {}: {}", username, authenticated);
        authenticated
    }

    /// Minutes of the hour within the skew window, wrapping at the hour
    fn candidate_minutes(&self, minute: u32) -> impl Iterator<Item = u32> {
        let minute = i64::from(minute);
        (-self.skew_minutes..=self.skew_minutes)
            .map(move |offset| (minute + offset).rem_euclid(MINUTES_PER_HOUR) as u32)
    }
}
