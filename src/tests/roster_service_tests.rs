use crate::auth_verifier::{issue_token, AuthVerifier, TokenIdentity};
use crate::field_schema::CanonicalField;
use crate::roster_fetcher::{FetchError, FetchStage, RosterProvider, RosterSource};
use crate::roster_parser::ShapeError;
use crate::roster_service::{OwnerClaim, PipelineError, RosterService};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const EXPORT: &str = "\
id,username,email,fname,lname,membership_id,last_login,custom_fields
101,annl,ann@example.com,Ann,Lee,2,2016-03-01 10:22:41,Designer::555-1234::Figma
102,omark,omar@example.com,Omar,Khan,1,2016-02-27 18:05:09,Engineer::555-9876::Rust
";

#[derive(Clone)]
struct StaticSource {
    export: Result<String, u16>,
    labels: Vec<String>,
}

#[async_trait]
impl RosterSource for StaticSource {
    async fn fetch_raw_export(&self) -> Result<String, FetchError> {
        self.export.clone().map_err(|status| FetchError::Status {
            stage: FetchStage::Export,
            status,
        })
    }

    async fn fetch_custom_field_labels(&self) -> Result<Vec<String>, FetchError> {
        Ok(self.labels.clone())
    }
}

struct StaticProvider {
    source: Option<StaticSource>,
    connects: AtomicUsize,
}

impl StaticProvider {
    fn new(export: &str) -> Self {
        Self {
            source: Some(StaticSource {
                export: Ok(export.to_string()),
                labels: ["Professional Title", "Phone", "Skills"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
            connects: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RosterProvider for StaticProvider {
    async fn connect(&self) -> Result<Box<dyn RosterSource>, FetchError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match &self.source {
            Some(source) => Ok(Box::new(source.clone())),
            None => Err(FetchError::Timeout {
                stage: FetchStage::Login,
            }),
        }
    }
}

fn service(provider: Arc<StaticProvider>) -> RosterService {
    RosterService::new(provider, AuthVerifier::default())
}

fn ann_token() -> String {
    let identity = TokenIdentity {
        email: "ann@example.com".to_string(),
        first_name: "Ann".to_string(),
        last_name: "Lee".to_string(),
        id: "101".to_string(),
        membership_id: "2".to_string(),
        last_login: "2016-03-01 10:22:41".to_string(),
    };
    issue_token(&identity, Utc::now()).unwrap()
}

#[tokio::test]
async fn test_anonymous_caller_sees_public_fields_only() {
    let service = service(Arc::new(StaticProvider::new(EXPORT)));
    let records = service.profiles(OwnerClaim::default()).await.unwrap();

    assert_eq!(records.len(), 2);
    for record in &records {
        assert!(record.fields().all(|field| field.is_public()));
    }
    assert_eq!(records[0].text(CanonicalField::FirstName), Some("Ann"));
    assert_eq!(
        records[0].text(CanonicalField::ProfessionalTitle),
        Some("Designer")
    );
    assert!(!records[0].contains(CanonicalField::PhoneNumber));
}

#[tokio::test]
async fn test_owner_sees_own_private_fields() {
    let service = service(Arc::new(StaticProvider::new(EXPORT)));
    let token = ann_token();
    let records = service
        .profiles(OwnerClaim::new(Some("annl"), Some(token.as_str())))
        .await
        .unwrap();

    let ann = &records[0];
    assert_eq!(ann.text(CanonicalField::PhoneNumber), Some("555-1234"));
    assert_eq!(ann.text(CanonicalField::Email), Some("ann@example.com"));
    assert_eq!(ann.text(CanonicalField::Username), Some("annl"));

    let omar = &records[1];
    assert!(omar.fields().all(|field| field.is_public()));
    assert!(!omar.contains(CanonicalField::PhoneNumber));
}

#[tokio::test]
async fn test_bad_token_falls_back_to_public_view() {
    let service = service(Arc::new(StaticProvider::new(EXPORT)));
    let records = service
        .profiles(OwnerClaim::new(Some("annl"), Some("deadbeef")))
        .await
        .unwrap();
    assert!(records
        .iter()
        .all(|record| record.fields().all(|field| field.is_public())));

    // Token without a username, and an unknown username
    let token = ann_token();
    for claim in [
        OwnerClaim::new(None, Some(token.as_str())),
        OwnerClaim::new(Some("ghost"), Some(token.as_str())),
        OwnerClaim::new(Some("annl"), None),
    ] {
        let records = service.profiles(claim).await.unwrap();
        assert!(!records[0].contains(CanonicalField::PhoneNumber));
    }
}

#[tokio::test]
async fn test_every_request_fetches_again() {
    let provider = Arc::new(StaticProvider::new(EXPORT));
    let service = service(provider.clone());

    service.profiles(OwnerClaim::default()).await.unwrap();
    service.profiles(OwnerClaim::default()).await.unwrap();
    assert_eq!(provider.connects.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_fetch_failure_aborts_pipeline() {
    let provider = Arc::new(StaticProvider {
        source: Some(StaticSource {
            export: Err(500),
            labels: vec![],
        }),
        connects: AtomicUsize::new(0),
    });
    let result = service(provider).profiles(OwnerClaim::default()).await;
    assert!(matches!(
        result,
        Err(PipelineError::Fetch(FetchError::Status {
            stage: FetchStage::Export,
            status: 500
        }))
    ));
}

#[tokio::test]
async fn test_login_failure_aborts_pipeline() {
    let provider = Arc::new(StaticProvider {
        source: None,
        connects: AtomicUsize::new(0),
    });
    match service(provider).profiles(OwnerClaim::default()).await {
        Err(PipelineError::Fetch(e)) => assert!(e.is_retryable()),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_export_is_shape_error() {
    let export = "fname,lname\nAnn,Lee\nOmar\n";
    let result = service(Arc::new(StaticProvider::new(export)))
        .profiles(OwnerClaim::default())
        .await;
    assert!(matches!(
        result,
        Err(PipelineError::Shape(ShapeError::RowLength { row: 2, .. }))
    ));
}

#[tokio::test]
async fn test_empty_export_is_shape_error() {
    let result = service(Arc::new(StaticProvider::new("")))
        .profiles(OwnerClaim::default())
        .await;
    assert!(matches!(
        result,
        Err(PipelineError::Shape(ShapeError::MissingHeader))
    ));
}
