use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::analysis::{AnalysisClient, AnalysisReport};
use crate::export::{ExportError, ExportedFile, Exporter, PdfConverter, ShareSheet, StoragePermission};
use crate::models::PredictionResult;
use crate::prediction::PredictionClient;
use crate::reading::{RangePolicy, RawSensorReading, ValidationErrors};
use crate::report::ReportDocument;

/// A result, or the marker that the screen went away before it arrived.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Completed(T),
    Discarded,
}

impl<T> Outcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(v) => Some(v),
            Outcome::Discarded => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Completed(v) => Outcome::Completed(f(v)),
            Outcome::Discarded => Outcome::Discarded,
        }
    }
}

/// What the input screen shows after a submit.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitResult {
    Prediction(PredictionResult),
    Invalid(ValidationErrors),
    NoPrediction,
}

/// Title and detail for a user-visible notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: &'static str,
    pub message: String,
}

impl SubmitResult {
    pub fn notice(&self) -> Option<Notice> {
        match self {
            SubmitResult::Prediction(_) => None,
            SubmitResult::Invalid(errors) => Some(Notice {
                title: "Invalid Input",
                message: errors.to_string(),
            }),
            SubmitResult::NoPrediction => Some(Notice {
                title: "No Prediction Received",
                message: "Please check your input values and try again.".to_string(),
            }),
        }
    }
}

pub fn export_notice(error: &ExportError) -> Notice {
    match error {
        ExportError::PermissionDenied => Notice {
            title: "Permission Denied",
            message: error.to_string(),
        },
        _ => Notice {
            title: "Error",
            message: "Failed to generate or share PDF".to_string(),
        },
    }
}

/// Owns the requests issued by one screen. Dismissing the screen cancels them all.
#[derive(Debug, Clone)]
pub struct ScreenController {
    prediction: PredictionClient,
    analysis: AnalysisClient,
    range_policy: RangePolicy,
    token: CancellationToken,
}

impl ScreenController {
    pub fn new(prediction: PredictionClient, analysis: AnalysisClient, range_policy: RangePolicy) -> Self {
        Self {
            prediction,
            analysis,
            range_policy,
            token: CancellationToken::new(),
        }
    }

    pub fn dismiss(&self) {
        tracing::debug!("Screen dismissed; pending requests discarded");
        self.token.cancel();
    }

    pub fn is_dismissed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Token other tasks can use to tie their lifetime to this screen.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    async fn guard<T>(&self, fut: impl Future<Output = T>) -> Outcome<T> {
        if self.token.is_cancelled() {
            return Outcome::Discarded;
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Outcome::Discarded,
            value = fut => {
                if self.token.is_cancelled() {
                    Outcome::Discarded
                } else {
                    Outcome::Completed(value)
                }
            }
        }
    }

    /// Validates the inputs and, if they pass, asks for a prediction.
    pub async fn submit(&self, raw: &RawSensorReading) -> Outcome<SubmitResult> {
        let reading = match raw.validate(self.range_policy) {
            Ok(reading) => reading,
            Err(errors) => {
                tracing::info!("Rejected reading before sending: {}", errors);
                return Outcome::Completed(SubmitResult::Invalid(errors));
            }
        };
        for advisory in reading.advisories() {
            tracing::info!("Advisory: {}", advisory);
        }

        self.guard(self.prediction.predict(&reading)).await.map(|prediction| match prediction {
            Some(result) => SubmitResult::Prediction(result),
            None => SubmitResult::NoPrediction,
        })
    }

    /// Fetches the analysis for a prediction. The report always resolves, with a placeholder on failure.
    pub async fn load_analysis(&self, result: PredictionResult) -> Outcome<AnalysisReport> {
        let mut report = AnalysisReport::loading(result);
        let fetched = self.guard(self.analysis.fetch_analysis(&report.result)).await;
        fetched.map(|outcome| {
            report.resolve(outcome);
            report
        })
    }

    pub async fn export<C, P, S>(
        &self,
        exporter: &Exporter<C, P, S>,
        report: &AnalysisReport,
    ) -> Outcome<Result<ExportedFile, ExportError>>
    where
        C: PdfConverter,
        P: StoragePermission,
        S: ShareSheet,
    {
        let document = ReportDocument::from_report(report);
        self.guard(exporter.export(&document)).await
    }
}
