//! Retrieves the member export and custom-field labels from the membership platform

use crate::config::PlatformConfig;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::error::Error;
use std::fmt;
use tracing::{debug, info, warn};

/// Step of the remote exchange that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    Login,
    Export,
    CustomFields,
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStage::Login => f.write_str("login"),
            FetchStage::Export => f.write_str("export"),
            FetchStage::CustomFields => f.write_str("custom fields"),
        }
    }
}

#[derive(Debug)]
pub enum FetchError {
    Network { stage: FetchStage, message: String },
    Status { stage: FetchStage, status: u16 },
    Timeout { stage: FetchStage },
    Markup(String),
}

impl FetchError {
    /// A timed-out fetch may succeed if the caller asks again
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }

    fn from_reqwest(stage: FetchStage, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout { stage }
        } else {
            FetchError::Network {
                stage,
                message: error.to_string(),
            }
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Network { stage, message } => {
                write!(f, "{stage} request failed: {message}")
            }
            FetchError::Status { stage, status } => {
                write!(f, "{stage} request failed with status: {status}")
            }
            FetchError::Timeout { stage } => write!(f, "{stage} request timed out"),
            FetchError::Markup(msg) => write!(f, "Unexpected custom fields page: {msg}"),
        }
    }
}

impl Error for FetchError {}

/// An authenticated session against the platform
#[async_trait]
pub trait RosterSource: Send + Sync {
    /// Raw CSV export of all members
    async fn fetch_raw_export(&self) -> Result<String, FetchError>;

    /// Custom-field labels, in the order their values appear in `custom_fields`
    async fn fetch_custom_field_labels(&self) -> Result<Vec<String>, FetchError>;
}

/// Opens sessions; one per pipeline run
#[async_trait]
pub trait RosterProvider: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn RosterSource>, FetchError>;
}

/// Roster provider backed by the live platform
#[derive(Debug, Clone)]
pub struct PlatformClient {
    config: PlatformConfig,
}

impl PlatformClient {
    pub fn new(config: PlatformConfig) -> Self {
        Self { config }
    }

    /// Log in with a fresh cookie jar and return the session
    pub async fn login(&self) -> Result<PlatformSession, FetchError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(self.config.fetch_timeout)
            .user_agent("MemberProfiles/1.0")
            .build()
            .map_err(|e| FetchError::from_reqwest(FetchStage::Login, e))?;

        debug!("Logging in to {} as {}", self.config.login_url, self.config.username);

        let form = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
            ("submit", ""),
            ("doLogin", "1"),
        ];

        let response = client
            .post(&self.config.login_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(FetchStage::Login, e))?;

        if !response.status().is_success() {
            warn!("Login failed with status {}", response.status());
            return Err(FetchError::Status {
                stage: FetchStage::Login,
                status: response.status().as_u16(),
            });
        }

        info!("Logged in to membership platform");
        Ok(PlatformSession {
            client,
            export_url: self.config.export_url(),
            custom_fields_url: self.config.custom_fields_url(),
        })
    }
}

#[async_trait]
impl RosterProvider for PlatformClient {
    async fn connect(&self) -> Result<Box<dyn RosterSource>, FetchError> {
        Ok(Box::new(self.login().await?))
    }
}

/// Logged-in session; the cookie jar lives in the client
pub struct PlatformSession {
    client: Client,
    export_url: String,
    custom_fields_url: String,
}

impl PlatformSession {
    async fn get_text(&self, stage: FetchStage, url: &str) -> Result<String, FetchError> {
        debug!("Fetching {} from {}", stage, url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(stage, e))?;

        if !response.status().is_success() {
            warn!("{} request returned {}", stage, response.status());
            return Err(FetchError::Status {
                stage,
                status: response.status().as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(stage, e))
    }
}

#[async_trait]
impl RosterSource for PlatformSession {
    async fn fetch_raw_export(&self) -> Result<String, FetchError> {
        let body = self.get_text(FetchStage::Export, &self.export_url).await?;
        debug!("Fetched export of {} bytes", body.len());
        Ok(body)
    }

    async fn fetch_custom_field_labels(&self) -> Result<Vec<String>, FetchError> {
        let body = self
            .get_text(FetchStage::CustomFields, &self.custom_fields_url)
            .await?;
        let labels = parse_custom_field_labels(&body)?;
        debug!("Found {} custom field labels", labels.len());
        Ok(labels)
    }
}

/// Labels from the field settings page: the second cell of every row of the
/// content table. Rows without a second cell keep their position with an
/// empty label.
pub fn parse_custom_field_labels(html: &str) -> Result<Vec<String>, FetchError> {
    let selector = |css: &str| {
        Selector::parse(css).map_err(|e| FetchError::Markup(format!("bad selector {css}: {e:?}")))
    };
    let table_sel = selector(".content table")?;
    let row_sel = selector(".content table tr")?;
    let cell_sel = selector("td")?;

    let document = Html::parse_document(html);
    if document.select(&table_sel).next().is_none() {
        return Err(FetchError::Markup("no field table found".to_string()));
    }

    let labels = document
        .select(&row_sel)
        .map(|row| {
            row.select(&cell_sel)
                .nth(1)
                .map(|cell| cell.text().collect::<String>().trim().to_string())
                .unwrap_or_default()
        })
        .collect();

    Ok(labels)
}
