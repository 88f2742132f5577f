use std::future::Future;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::report::ReportDocument;
use crate::util::truncate;

pub const PDF_MIME: &str = "application/pdf";
pub const SHARE_TITLE: &str = "Output Screen Content";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("You need to give storage permission to generate the PDF")]
    PermissionDenied,

    #[error("PDF conversion failed: {0}")]
    Conversion(String),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("share failed: {0}")]
    Share(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Turns standalone report markup into PDF bytes.
pub trait PdfConverter {
    fn convert(&self, html: &str, file_name: &str) -> impl Future<Output = Result<Vec<u8>, ExportError>> + Send;
}

/// Asks the platform for write access to the export location.
pub trait StoragePermission {
    fn request(&self) -> impl Future<Output = PermissionStatus> + Send;
}

/// Hands a finished file to the platform share action.
pub trait ShareSheet {
    fn share(&self, request: &ShareRequest) -> impl Future<Output = Result<(), ExportError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRequest {
    pub url: String,
    pub mime: &'static str,
    pub title: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub mime: &'static str,
}

/// Sends the markup to an HTML-to-PDF service and returns the response bytes.
#[derive(Debug, Clone)]
pub struct HttpPdfConverter {
    http: reqwest::Client,
    url: String,
}

impl HttpPdfConverter {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self { http, url: url.into() }
    }

    /// `None` when no conversion service is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>, ExportError> {
        let Some(url) = config.pdf_service_url.clone() else {
            return Ok(None);
        };
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| ExportError::Conversion(e.to_string()))?;
        Ok(Some(Self::new(http, url)))
    }
}

impl PdfConverter for HttpPdfConverter {
    async fn convert(&self, html: &str, file_name: &str) -> Result<Vec<u8>, ExportError> {
        let res = self
            .http
            .post(&self.url)
            .query(&[("fileName", file_name)])
            .header(reqwest::header::CONTENT_TYPE, "text/html; charset=utf-8")
            .body(html.to_string())
            .send()
            .await
            .map_err(|e| ExportError::Conversion(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ExportError::Conversion(format!("status={} body={}", status, truncate(&body))));
        }
        let bytes = res.bytes().await.map_err(|e| ExportError::Conversion(e.to_string()))?;
        if !bytes.starts_with(b"%PDF") {
            return Err(ExportError::Conversion("response is not a PDF document".to_string()));
        }
        Ok(bytes.to_vec())
    }
}

/// Grants every request; for platforms without a storage permission model.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unrestricted;

impl StoragePermission for Unrestricted {
    async fn request(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }
}

/// Logs the share request instead of opening a share sheet.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogShare;

impl ShareSheet for LogShare {
    async fn share(&self, request: &ShareRequest) -> Result<(), ExportError> {
        tracing::info!("Report ready to share: {} ({}, {})", request.url, request.mime, request.title);
        Ok(())
    }
}

pub struct Exporter<C, P = Unrestricted, S = LogShare> {
    converter: C,
    permission: P,
    share: S,
    dir: PathBuf,
    file_name: String,
    require_permission: bool,
}

impl<C: PdfConverter> Exporter<C> {
    pub fn new(config: &Config, converter: C) -> Self {
        Self::with_platform(config, converter, Unrestricted, LogShare)
    }
}

impl<C, P, S> Exporter<C, P, S>
where
    C: PdfConverter,
    P: StoragePermission,
    S: ShareSheet,
{
    pub fn with_platform(config: &Config, converter: C, permission: P, share: S) -> Self {
        Self {
            converter,
            permission,
            share,
            dir: config.export_dir.clone(),
            file_name: config.export_file_name.clone(),
            require_permission: config.require_storage_permission,
        }
    }

    pub fn target_path(&self) -> PathBuf {
        self.dir.join(format!("{}.pdf", self.file_name))
    }

    /// Renders, converts, stores and shares the report. Nothing is written unless permission is held.
    pub async fn export(&self, document: &ReportDocument) -> Result<ExportedFile, ExportError> {
        if self.require_permission && self.permission.request().await != PermissionStatus::Granted {
            tracing::warn!("Storage permission denied; export aborted");
            return Err(ExportError::PermissionDenied);
        }

        let html = document.to_standalone_html();
        let pdf = self.converter.convert(&html, &self.file_name).await?;

        let path = self.target_path();
        write_atomically(&path, &pdf).await?;
        tracing::info!("Report exported to {} ({} bytes)", path.display(), pdf.len());

        let request = ShareRequest {
            url: format!("file://{}", path.display()),
            mime: PDF_MIME,
            title: SHARE_TITLE,
        };
        self.share.share(&request).await?;

        Ok(ExportedFile { path, mime: PDF_MIME })
    }
}

/// Writes to a sibling temp file and renames it into place, removing the temp file on failure.
async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io { path: path.to_path_buf(), source };

    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await.map_err(io_err)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".partial");
    let tmp = PathBuf::from(tmp);

    let written = match tokio::fs::write(&tmp, bytes).await {
        Ok(()) => tokio::fs::rename(&tmp, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(io_err(e));
    }
    Ok(())
}
