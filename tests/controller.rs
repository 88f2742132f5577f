mod common;

use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use common::{config_for, leaf_spot_response, sample_reading, serve, Recorded};
use crop_risk_client::controller::{export_notice, SubmitResult};
use crop_risk_client::export::{PdfConverter, PermissionStatus, StoragePermission};
use crop_risk_client::{
    AnalysisClient, AnalysisState, Config, ExportError, Exporter, Outcome, PredictionClient,
    RangePolicy, ScreenController,
};
use serde_json::Value;

#[derive(Clone)]
struct Service {
    predictions: Recorded,
    delay: Duration,
    describe_status: StatusCode,
}

async fn predict(State(svc): State<Service>, Json(body): Json<Value>) -> (StatusCode, String) {
    svc.predictions.push(body);
    tokio::time::sleep(svc.delay).await;
    (StatusCode::OK, leaf_spot_response().to_string())
}

async fn describe(State(svc): State<Service>) -> (StatusCode, &'static str) {
    if svc.describe_status.is_success() {
        (svc.describe_status, "<p>Rotate crops.</p>")
    } else {
        (svc.describe_status, r#"{"error":"bad input"}"#)
    }
}

async fn start(delay: Duration, describe_status: StatusCode) -> (Config, Recorded) {
    let predictions = Recorded::default();
    let svc = Service { predictions: predictions.clone(), delay, describe_status };
    let router = Router::new()
        .route("/predict", post(predict))
        .route("/describe", post(describe))
        .with_state(svc);
    (config_for(&serve(router).await), predictions)
}

fn screen(config: &Config) -> ScreenController {
    ScreenController::new(
        PredictionClient::new(config).unwrap(),
        AnalysisClient::new(config).unwrap(),
        config.range_policy,
    )
}

struct PassThrough;

impl PdfConverter for PassThrough {
    async fn convert(&self, _html: &str, _file_name: &str) -> Result<Vec<u8>, ExportError> {
        Ok(b"%PDF-1.7".to_vec())
    }
}

struct Deny;

impl StoragePermission for Deny {
    async fn request(&self) -> PermissionStatus {
        PermissionStatus::Denied
    }
}

#[tokio::test]
async fn submit_then_load_analysis() {
    let (config, predictions) = start(Duration::ZERO, StatusCode::OK).await;
    let screen = screen(&config);

    let result = match screen.submit(&sample_reading()).await {
        Outcome::Completed(SubmitResult::Prediction(result)) => result,
        other => panic!("expected prediction, got {:?}", other),
    };
    assert_eq!(result.disease, "Leaf Spot");
    assert_eq!(predictions.all().len(), 1);

    let report = screen.load_analysis(result).await.completed().unwrap();
    assert_eq!(report.state, AnalysisState::Ready("<p>Rotate crops.</p>".to_string()));

    let exporter = Exporter::new(&config, PassThrough);
    let file = screen.export(&exporter, &report).await.completed().unwrap().unwrap();
    assert!(file.path.exists());
    let _ = std::fs::remove_dir_all(&config.export_dir);
}

#[tokio::test]
async fn invalid_input_never_reaches_the_service() {
    let (config, predictions) = start(Duration::ZERO, StatusCode::OK).await;
    let screen = screen(&config);
    let mut raw = sample_reading();
    raw.nitrogen = "".into();
    raw.ph_value = "seven".into();

    let outcome = screen.submit(&raw).await.completed().unwrap();

    match &outcome {
        SubmitResult::Invalid(errors) => assert_eq!(errors.0.len(), 2),
        other => panic!("expected validation errors, got {:?}", other),
    }
    assert_eq!(outcome.notice().unwrap().title, "Invalid Input");
    assert!(predictions.all().is_empty());
}

#[tokio::test]
async fn enforced_ranges_reject_out_of_range_values() {
    let (mut config, predictions) = start(Duration::ZERO, StatusCode::OK).await;
    config.range_policy = RangePolicy::Enforce;
    let screen = screen(&config);
    let mut raw = sample_reading();
    raw.humidity = "140".into();

    let outcome = screen.submit(&raw).await.completed().unwrap();

    assert!(matches!(outcome, SubmitResult::Invalid(_)));
    assert!(predictions.all().is_empty());
}

#[tokio::test]
async fn failed_prediction_shows_generic_notice() {
    let mut config = config_for(&common::closed_port_url().await);
    config.request_timeout = Some(Duration::from_secs(5));
    let screen = screen(&config);

    let outcome = screen.submit(&sample_reading()).await.completed().unwrap();

    assert_eq!(outcome, SubmitResult::NoPrediction);
    assert_eq!(outcome.notice().unwrap().title, "No Prediction Received");
}

#[tokio::test]
async fn analysis_failure_still_yields_report() {
    let (config, _) = start(Duration::ZERO, StatusCode::INTERNAL_SERVER_ERROR).await;
    let screen = screen(&config);
    let result = screen.submit(&sample_reading()).await.completed().unwrap();
    let SubmitResult::Prediction(result) = result else {
        panic!("expected prediction");
    };

    let report = screen.load_analysis(result).await.completed().unwrap();

    match report.state {
        AnalysisState::Failed(text) => assert!(text.contains("500")),
        other => panic!("expected placeholder, got {:?}", other),
    }
}

#[tokio::test]
async fn dismiss_discards_in_flight_prediction() {
    let (config, predictions) = start(Duration::from_secs(30), StatusCode::OK).await;
    let screen = screen(&config);

    let dismisser = screen.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        dismisser.dismiss();
    });

    let outcome = tokio::time::timeout(Duration::from_secs(10), screen.submit(&sample_reading()))
        .await
        .expect("cancellation should not wait for the service");
    assert_eq!(outcome, Outcome::Discarded);
    assert!(screen.is_dismissed());
    assert_eq!(predictions.all().len(), 1);
}

#[tokio::test]
async fn dismissed_screen_issues_nothing() {
    let (config, predictions) = start(Duration::ZERO, StatusCode::OK).await;
    let screen = screen(&config);
    screen.dismiss();

    assert_eq!(screen.submit(&sample_reading()).await, Outcome::Discarded);
    assert!(predictions.all().is_empty());
}

#[tokio::test]
async fn export_denial_produces_permission_notice() {
    let (config, _) = start(Duration::ZERO, StatusCode::OK).await;
    let config = Config { require_storage_permission: true, ..config };
    let screen = screen(&config);
    let SubmitResult::Prediction(result) = screen.submit(&sample_reading()).await.completed().unwrap() else {
        panic!("expected prediction");
    };
    let report = screen.load_analysis(result).await.completed().unwrap();

    let exporter = Exporter::with_platform(&config, PassThrough, Deny, crop_risk_client::export::LogShare);
    let err = screen.export(&exporter, &report).await.completed().unwrap().unwrap_err();

    assert_eq!(export_notice(&err).title, "Permission Denied");
    assert!(!exporter.target_path().exists());
}
