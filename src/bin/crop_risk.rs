use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crop_risk_client::{
    controller::{export_notice, SubmitResult},
    export::HttpPdfConverter,
    reading::SensorField,
    AnalysisClient, Config, Exporter, Outcome, PredictionClient, RawSensorReading, ReportDocument,
    ScreenController,
};
use tokio::signal;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Submit sensor readings for a disease and pest-risk prediction", long_about = None)]
struct Args {
    /// JSON file with the eight readings (camelCase keys, string values)
    #[arg(long = "reading-file")]
    reading_file: Option<PathBuf>,

    #[arg(long = "solar-radiation", help = SensorField::SolarRadiation.guideline())]
    solar_radiation: Option<String>,
    #[arg(long, help = SensorField::Humidity.guideline())]
    humidity: Option<String>,
    #[arg(long, help = SensorField::Conductivity.guideline())]
    conductivity: Option<String>,
    #[arg(long, help = SensorField::Phosphorus.guideline())]
    phosphorus: Option<String>,
    #[arg(long = "ph", help = SensorField::PhValue.guideline())]
    ph_value: Option<String>,
    #[arg(long, allow_hyphen_values = true, help = SensorField::Temperature.guideline())]
    temperature: Option<String>,
    #[arg(long, help = SensorField::Nitrogen.guideline())]
    nitrogen: Option<String>,
    #[arg(long, help = SensorField::Potassium.guideline())]
    potassium: Option<String>,

    /// Write the standalone HTML report here
    #[arg(long = "html-out")]
    html_out: Option<PathBuf>,

    /// Convert the report to PDF through PDF_SERVICE_URL and share it
    #[arg(long)]
    export: bool,
}

impl Args {
    fn reading(&self) -> Result<RawSensorReading> {
        let mut raw = match &self.reading_file {
            Some(path) => {
                let s = std::fs::read_to_string(path)
                    .with_context(|| format!("read {}", path.display()))?;
                serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))?
            }
            None => RawSensorReading::default(),
        };
        let overrides = [
            (&self.solar_radiation, &mut raw.solar_radiation),
            (&self.humidity, &mut raw.humidity),
            (&self.conductivity, &mut raw.conductivity),
            (&self.phosphorus, &mut raw.phosphorous),
            (&self.ph_value, &mut raw.ph_value),
            (&self.temperature, &mut raw.temperature),
            (&self.nitrogen, &mut raw.nitrogen),
            (&self.potassium, &mut raw.potassium),
        ];
        for (arg, slot) in overrides {
            if let Some(v) = arg {
                *slot = v.clone();
            }
        }
        Ok(raw)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    // Loads .env before the subscriber reads RUST_LOG.
    let cfg = Config::from_env().context("load configuration")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crop_risk_client=info,crop_risk=info".into()),
        )
        .with_target(false)
        .compact()
        .init();

    tracing::info!("crop-risk starting; {}", cfg.masked_summary());

    let raw = args.reading()?;
    let screen = ScreenController::new(
        PredictionClient::new(&cfg)?,
        AnalysisClient::new(&cfg)?,
        cfg.range_policy,
    );

    let token = screen.token();
    tokio::spawn({
        let screen = screen.clone();
        async move {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received");
                    screen.dismiss();
                }
                _ = token.cancelled() => {}
            }
        }
    });

    let result = match screen.submit(&raw).await {
        Outcome::Completed(SubmitResult::Prediction(result)) => result,
        Outcome::Completed(other) => match other.notice() {
            Some(notice) => anyhow::bail!("{}: {}", notice.title, notice.message),
            None => anyhow::bail!("prediction failed"),
        },
        Outcome::Discarded => return Ok(()),
    };

    println!("Predicted disease: {}", result.disease);
    for (pest, probability) in &result.pest_attacks {
        println!("  {:<24} {}", pest.display_name(), probability);
    }

    let report = match screen.load_analysis(result).await {
        Outcome::Completed(report) => report,
        Outcome::Discarded => return Ok(()),
    };
    let document = ReportDocument::from_report(&report);

    if let Some(path) = &args.html_out {
        tokio::fs::write(path, document.to_standalone_html())
            .await
            .with_context(|| format!("write {}", path.display()))?;
        tracing::info!("HTML report written to {}", path.display());
    }

    if args.export {
        let converter = HttpPdfConverter::from_config(&cfg)?
            .context("PDF_SERVICE_URL must be set to export a PDF")?;
        let exporter = Exporter::new(&cfg, converter);
        match screen.export(&exporter, &report).await {
            Outcome::Completed(Ok(file)) => println!("Exported {}", file.path.display()),
            Outcome::Completed(Err(e)) => {
                tracing::error!("Error generating PDF: {:#}", e);
                let notice = export_notice(&e);
                eprintln!("{}: {}", notice.title, notice.message);
            }
            Outcome::Discarded => {}
        }
    }

    screen.token().cancel();
    Ok(())
}
