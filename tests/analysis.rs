mod common;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use common::{config_for, serve, Recorded};
use crop_risk_client::{
    AnalysisClient, AnalysisError, AnalysisReport, AnalysisState, Pest, PredictionResult, Probability,
    ReportDocument,
};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

async fn fake_describe(status: StatusCode, body: &'static str) -> (String, Recorded) {
    let recorded = Recorded::default();
    let router = Router::new()
        .route(
            "/describe",
            post(move |State(seen): State<Recorded>, Json(request): Json<Value>| async move {
                seen.push(request);
                (status, body)
            }),
        )
        .with_state(recorded.clone());
    (serve(router).await, recorded)
}

fn leaf_spot() -> PredictionResult {
    PredictionResult {
        disease: "Leaf Spot".to_string(),
        pest_attacks: Pest::ALL
            .into_iter()
            .zip(["12%", "5%", "3%", "8%", "2%", "4%"])
            .map(|(pest, p)| (pest, Probability::from(p)))
            .collect(),
    }
}

#[tokio::test]
async fn fetch_analysis_strips_percent_and_returns_body_verbatim() {
    let markup = "<h3>Leaf Spot</h3><p>Remove infected leaves.</p>";
    let (url, seen) = fake_describe(StatusCode::OK, markup).await;
    let client = AnalysisClient::new(&config_for(&url)).unwrap();

    let text = client.fetch_analysis(&leaf_spot()).await.unwrap();

    assert_eq!(text, markup);
    assert_eq!(
        seen.all(),
        vec![json!({
            "disease": "Leaf Spot",
            "flea_beetle": "12",
            "thrips": "5",
            "mealybug": "3",
            "jassids": "8",
            "red_spider_mites": "2",
            "leaf_eating_caterpillar": "4"
        })]
    );
}

#[tokio::test]
async fn server_error_becomes_placeholder_in_report() {
    let (url, _) = fake_describe(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":"bad input"}"#).await;
    let client = AnalysisClient::new(&config_for(&url)).unwrap();

    let outcome = client.fetch_analysis(&leaf_spot()).await;
    match &outcome {
        Err(AnalysisError::Status { status, body }) => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, r#"{"error":"bad input"}"#);
        }
        other => panic!("expected status error, got {:?}", other),
    }
    let message = outcome.as_ref().unwrap_err().to_string();
    assert!(message.contains("500"));
    assert!(message.contains("bad input"));

    let mut report = AnalysisReport::loading(leaf_spot());
    report.resolve(outcome);
    assert!(matches!(report.state, AnalysisState::Failed(_)));

    let html = ReportDocument::from_report(&report).to_standalone_html();
    assert!(html.contains("Failed to load LLM analysis"));
    assert!(html.contains("Leaf Spot"));
    assert_eq!(html.matches("class=\"bar-container\"").count(), 6);
}

#[tokio::test]
async fn missing_pest_is_rejected_without_a_request() {
    let (url, seen) = fake_describe(StatusCode::OK, "unused").await;
    let client = AnalysisClient::new(&config_for(&url)).unwrap();
    let mut result = leaf_spot();
    result.pest_attacks.remove(&Pest::LeafEatingCaterpillar);

    let err = client.fetch_analysis(&result).await.unwrap_err();

    assert!(matches!(err, AnalysisError::MissingPest(Pest::LeafEatingCaterpillar)));
    assert!(seen.all().is_empty());
}

#[tokio::test]
async fn truncated_success_body_becomes_placeholder() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        let _ = socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 1000\r\n\r\n<p>partial")
            .await;
        let _ = socket.shutdown().await;
    });
    let client = AnalysisClient::new(&config_for(&url)).unwrap();

    let outcome = client.fetch_analysis(&leaf_spot()).await;
    assert!(matches!(outcome, Err(AnalysisError::Transport(_))), "got {:?}", outcome);

    let mut report = AnalysisReport::loading(leaf_spot());
    report.resolve(outcome);
    match &report.state {
        AnalysisState::Failed(text) => assert!(text.contains("Failed to load LLM analysis")),
        other => panic!("expected placeholder, got {:?}", other),
    }
}
