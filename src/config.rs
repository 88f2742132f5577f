use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::reading::RangePolicy;
use crate::util::mask_url;

/// What to do when a prediction response lacks one of the six pests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPestPolicy {
    /// Reject the whole response.
    #[default]
    Strict,
    /// Keep the pests that are present and log the rest.
    Lenient,
}

impl FromStr for MissingPestPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(format!("expected 'strict' or 'lenient', got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Services
    pub prediction_base_url: String,
    pub analysis_base_url: String,
    pub request_timeout: Option<Duration>,

    // Contract policies
    pub missing_pest_policy: MissingPestPolicy,
    pub range_policy: RangePolicy,

    // Export
    pub pdf_service_url: Option<String>,
    pub export_dir: PathBuf,
    pub export_file_name: String,
    pub require_storage_permission: bool,
}

pub const DEFAULT_BASE_URL: &str = "http://10.0.2.2:8000";
pub const DEFAULT_EXPORT_FILE_NAME: &str = "OutputScreenContent";

impl Default for Config {
    fn default() -> Self {
        Self {
            prediction_base_url: DEFAULT_BASE_URL.to_string(),
            analysis_base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: None,
            missing_pest_policy: MissingPestPolicy::default(),
            range_policy: RangePolicy::default(),
            pdf_service_url: None,
            export_dir: env::temp_dir().join("crop-risk-reports"),
            export_file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
            require_storage_permission: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let prediction_base_url =
            get("PREDICTION_BASE_URL").unwrap_or(defaults.prediction_base_url);
        let analysis_base_url =
            get("ANALYSIS_BASE_URL").unwrap_or_else(|| prediction_base_url.clone());

        let request_timeout = match get("REQUEST_TIMEOUT") {
            Some(raw) => Some(
                humantime::parse_duration(&raw)
                    .map_err(|e| ConfigError::InvalidEnvVar("REQUEST_TIMEOUT".to_string(), e.to_string()))?,
            ),
            None => None,
        };

        let missing_pest_policy = match get("MISSING_PEST_POLICY") {
            Some(raw) => raw
                .parse()
                .map_err(|e| ConfigError::InvalidEnvVar("MISSING_PEST_POLICY".to_string(), e))?,
            None => defaults.missing_pest_policy,
        };

        let range_policy = match get("RANGE_POLICY") {
            Some(raw) => raw
                .parse()
                .map_err(|e| ConfigError::InvalidEnvVar("RANGE_POLICY".to_string(), e))?,
            None => defaults.range_policy,
        };

        let require_storage_permission = match get("REQUIRE_STORAGE_PERMISSION") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "REQUIRE_STORAGE_PERMISSION".to_string(),
                    format!("expected a boolean, got '{}'", raw),
                )
            })?,
            None => defaults.require_storage_permission,
        };

        let config = Config {
            prediction_base_url,
            analysis_base_url,
            request_timeout,
            missing_pest_policy,
            range_policy,
            pdf_service_url: get("PDF_SERVICE_URL"),
            export_dir: get("EXPORT_DIR").map(PathBuf::from).unwrap_or(defaults.export_dir),
            export_file_name: get("EXPORT_FILE_NAME").unwrap_or(defaults.export_file_name),
            require_storage_permission,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("PREDICTION_BASE_URL", &self.prediction_base_url)?;
        check_url("ANALYSIS_BASE_URL", &self.analysis_base_url)?;
        if let Some(url) = &self.pdf_service_url {
            check_url("PDF_SERVICE_URL", url)?;
        }

        if self.request_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::InvalidEnvVar("REQUEST_TIMEOUT".to_string(), "cannot be zero".to_string()));
        }

        if self.export_file_name.is_empty()
            || self.export_file_name.contains(['/', '\\'])
        {
            return Err(ConfigError::InvalidEnvVar(
                "EXPORT_FILE_NAME".to_string(),
                "must be a plain file name".to_string(),
            ));
        }

        Ok(())
    }

    /// One-line description for startup logs, with credentials in URLs masked.
    pub fn masked_summary(&self) -> String {
        format!(
            "prediction={} analysis={} timeout={} missing_pests={:?} ranges={:?} pdf_service={} export_dir={}",
            mask_url(&self.prediction_base_url),
            mask_url(&self.analysis_base_url),
            self.request_timeout
                .map(|d| humantime::format_duration(d).to_string())
                .unwrap_or_else(|| "none".to_string()),
            self.missing_pest_policy,
            self.range_policy,
            self.pdf_service_url.as_deref().map(mask_url).unwrap_or_else(|| "unset".to_string()),
            self.export_dir.display(),
        )
    }
}

fn check_url(key: &str, url: &str) -> Result<(), ConfigError> {
    if url.is_empty() {
        return Err(ConfigError::InvalidEnvVar(key.to_string(), "cannot be empty".to_string()));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::InvalidEnvVar(key.to_string(), format!("not an http(s) url: {}", url)));
    }
    Ok(())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}
