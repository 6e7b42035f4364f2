use crate::roster_service::{OwnerClaim, PipelineError, RosterService};
use crate::user_record::UserRecord;
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

static BUILTIN_FIXTURE: &str = include_str!("../fixtures/test_data.json");

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RosterService>,
    /// Records served when a request asks for test data
    pub fixture: Arc<Vec<UserRecord>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileQuery {
    pub user: Option<String>,
    pub auth_key: Option<String>,
    pub test: Option<String>,
}

impl ProfileQuery {
    /// `test` counts when present, unless it is an explicit negative
    pub fn wants_fixture(&self) -> bool {
        match self.test.as_deref() {
            Some(value) => !matches!(value.to_ascii_lowercase().as_str(), "0" | "false" | "no"),
            None => false,
        }
    }
}

/// Fixture records from `path`, or the built-in set
pub fn load_fixture(path: Option<&Path>) -> Result<Vec<UserRecord>> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read fixture {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid fixture {}", path.display()))
        }
        None => serde_json::from_str(BUILTIN_FIXTURE).context("Invalid built-in fixture"),
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(profiles_handler))
        .route("/health", get(|| async { "OK" }))
        .layer(cors)
        .with_state(state)
}

pub async fn profiles_handler(
    State(state): State<AppState>,
    Query(params): Query<ProfileQuery>,
) -> Response {
    let claim = OwnerClaim::new(params.user.as_deref(), params.auth_key.as_deref());

    if params.wants_fixture() {
        info!("Serving {} fixture records", state.fixture.len());
        let records = state.service.present(state.fixture.as_ref().clone(), claim);
        return Json(records).into_response();
    }

    match state.service.profiles(claim).await {
        Ok(records) => Json(records).into_response(),
        Err(e) => e.into_response(),
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = match &self {
            PipelineError::Fetch(e) if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
            PipelineError::Fetch(_) => StatusCode::BAD_GATEWAY,
            PipelineError::Shape(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!("Profile request failed ({}): {}", status, self);
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
