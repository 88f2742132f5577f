use reqwest::StatusCode;

use crate::config::{Config, MissingPestPolicy};
use crate::models::{PredictionResponse, PredictionResult};
use crate::pests::Pest;
use crate::reading::SensorReading;
use crate::util::{endpoint, truncate};

#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("prediction request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("prediction service returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("prediction response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("prediction response lacks pests: {0:?}")]
    MissingPests(Vec<Pest>),
}

/// Client for the `/predict` endpoint. Holds no per-call state.
#[derive(Debug, Clone)]
pub struct PredictionClient {
    http: reqwest::Client,
    url: String,
    missing_pest_policy: MissingPestPolicy,
}

impl PredictionClient {
    pub fn new(config: &Config) -> Result<Self, PredictionError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, config))
    }

    pub fn with_client(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            url: endpoint(&config.prediction_base_url, "predict"),
            missing_pest_policy: config.missing_pest_policy,
        }
    }

    /// Posts the reading and maps the reply, keeping the failure detail.
    pub async fn try_predict(&self, reading: &SensorReading) -> Result<PredictionResult, PredictionError> {
        tracing::debug!("POST {} {:?}", self.url, reading);
        let res = self.http.post(&self.url).json(reading).send().await?;

        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            return Err(PredictionError::Status { status, body: truncate(&body) });
        }

        let response: PredictionResponse = serde_json::from_str(&body)?;
        let result = response
            .into_result(self.missing_pest_policy)
            .map_err(PredictionError::MissingPests)?;
        tracing::info!(
            "Prediction received: disease={} pests={}",
            result.disease,
            result.pest_attacks.len()
        );
        Ok(result)
    }

    /// Posts the reading; any failure is logged and turned into `None`.
    pub async fn predict(&self, reading: &SensorReading) -> Option<PredictionResult> {
        match self.try_predict(reading).await {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::warn!("Failed to get prediction: {}", e);
                None
            }
        }
    }
}
