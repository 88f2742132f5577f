pub mod analysis;
pub mod config;
pub mod controller;
pub mod export;
pub mod models;
pub mod pests;
pub mod prediction;
pub mod reading;
pub mod report;
pub mod util;

pub use analysis::{AnalysisClient, AnalysisError, AnalysisReport, AnalysisState};
pub use config::{Config, ConfigError, MissingPestPolicy};
pub use controller::{Outcome, ScreenController};
pub use export::{ExportError, ExportedFile, Exporter};
pub use models::PredictionResult;
pub use pests::{Pest, Probability};
pub use prediction::{PredictionClient, PredictionError};
pub use reading::{RangePolicy, RawSensorReading, SensorReading, ValidationErrors};
pub use report::ReportDocument;
