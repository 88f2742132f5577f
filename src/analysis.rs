use reqwest::StatusCode;

use crate::config::Config;
use crate::models::{AnalysisRequest, PredictionResult};
use crate::pests::Pest;
use crate::util::{endpoint, escape_html, truncate};

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("prediction has no probability for {0}")]
    MissingPest(Pest),

    #[error("analysis request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error: {status} - {body}")]
    Status { status: StatusCode, body: String },
}

/// Client for the `/describe` endpoint.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    url: String,
}

impl AnalysisClient {
    pub fn new(config: &Config) -> Result<Self, AnalysisError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, config))
    }

    pub fn with_client(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            url: endpoint(&config.analysis_base_url, "describe"),
        }
    }

    /// Fetches the free-text analysis for a prediction. The body is returned verbatim.
    pub async fn fetch_analysis(&self, result: &PredictionResult) -> Result<String, AnalysisError> {
        let request = AnalysisRequest::from_result(result).map_err(AnalysisError::MissingPest)?;
        tracing::debug!("POST {} {:?}", self.url, request);

        let res = self.http.post(&self.url).json(&request).send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AnalysisError::Status { status, body: truncate(&body) });
        }
        Ok(res.text().await?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisState {
    Loading,
    Ready(String),
    /// Placeholder markup shown in place of the analysis.
    Failed(String),
}

/// A prediction plus its analysis, which arrives after the prediction itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisReport {
    pub result: PredictionResult,
    pub state: AnalysisState,
}

impl AnalysisReport {
    pub fn loading(result: PredictionResult) -> Self {
        Self { result, state: AnalysisState::Loading }
    }

    /// Applies the outcome of `fetch_analysis`. Errors become a placeholder and never propagate.
    pub fn resolve(&mut self, outcome: Result<String, AnalysisError>) {
        self.state = match outcome {
            Ok(text) => AnalysisState::Ready(text),
            Err(e) => {
                tracing::error!("Error fetching analysis: {}", e);
                AnalysisState::Failed(placeholder(&e))
            }
        };
    }

    pub fn is_loading(&self) -> bool {
        self.state == AnalysisState::Loading
    }

    /// Markup for the analysis section, `None` while still loading.
    pub fn analysis_markup(&self) -> Option<&str> {
        match &self.state {
            AnalysisState::Loading => None,
            AnalysisState::Ready(text) | AnalysisState::Failed(text) => Some(text),
        }
    }
}

pub fn placeholder(error: &AnalysisError) -> String {
    format!(
        "<p>Failed to load LLM analysis. Error: {}</p>",
        escape_html(&error.to_string())
    )
}
