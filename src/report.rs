use std::fmt::Write as _;

use crate::analysis::AnalysisReport;
use crate::models::PredictionResult;
use crate::pests::{Pest, Probability};
use crate::util::escape_html;

pub const REPORT_TITLE: &str = "Prediction Results";
pub const LOADING_MARKER: &str = "<p class=\"loading\">Loading analysis...</p>";

const STYLE: &str = r#"
      body { font-family: Arial, sans-serif; }
      .title { font-size: 24px; color: #8E44AD; text-align: center; }
      .card { margin-bottom: 20px; border: 1px solid #ddd; padding: 15px; border-radius: 5px; }
      .card-title { font-size: 18px; margin-bottom: 10px; }
      .bar-container { display: flex; align-items: center; margin-bottom: 10px; }
      .bar-label { width: 30%; }
      .bar-wrapper { flex: 1; }
      .bar { height: 20px; background-color: #8E44AD; border-radius: 10px; }
      .probability-text { margin-left: 10px; }
"#;

#[derive(Debug, Clone, PartialEq)]
pub struct PestRow {
    pub pest: Pest,
    pub probability: Probability,
    pub bar_width: f64,
}

/// The three report sections. On-screen and exported output are both rendered from this.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub disease: String,
    pub rows: Vec<PestRow>,
    /// `None` while the analysis is still loading.
    pub analysis: Option<String>,
}

impl ReportDocument {
    pub fn render(result: &PredictionResult, analysis: Option<&str>) -> Self {
        let rows = result
            .pest_attacks
            .iter()
            .map(|(&pest, probability)| PestRow {
                pest,
                probability: probability.clone(),
                bar_width: probability.bar_width(),
            })
            .collect();
        Self {
            disease: result.disease.clone(),
            rows,
            analysis: analysis.map(str::to_string),
        }
    }

    pub fn from_report(report: &AnalysisReport) -> Self {
        Self::render(&report.result, report.analysis_markup())
    }

    /// Body markup without document chrome, for embedding in a view.
    pub fn to_fragment(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "<h1 class=\"title\">{}</h1>", REPORT_TITLE);

        out.push_str("<div class=\"card\">\n");
        out.push_str("  <h2 class=\"card-title\">Predicted Disease</h2>\n");
        let _ = writeln!(out, "  <p class=\"disease\">{}</p>", escape_html(&self.disease));
        out.push_str("</div>\n");

        out.push_str("<div class=\"card\">\n");
        out.push_str("  <h2 class=\"card-title\">Pest Attack Probabilities</h2>\n");
        for row in &self.rows {
            let _ = write!(
                out,
                concat!(
                    "  <div class=\"bar-container\">\n",
                    "    <div class=\"bar-label\">{}</div>\n",
                    "    <div class=\"bar-wrapper\"><div class=\"bar\" style=\"width: {}%;\"></div></div>\n",
                    "    <span class=\"probability-text\">{}</span>\n",
                    "  </div>\n",
                ),
                escape_html(row.pest.display_name()),
                row.bar_width,
                escape_html(row.probability.as_str()),
            );
        }
        out.push_str("</div>\n");

        out.push_str("<div class=\"card\">\n");
        out.push_str("  <h2 class=\"card-title\">Detailed Analysis</h2>\n");
        // Analysis markup comes from the service and is embedded as-is.
        out.push_str(self.analysis.as_deref().unwrap_or(LOADING_MARKER));
        out.push_str("\n</div>\n");
        out
    }

    /// Complete document with inline styling, used for export.
    pub fn to_standalone_html(&self) -> String {
        format!(
            "<!DOCTYPE html>\n<html>\n  <head>\n    <meta charset=\"utf-8\">\n    <title>{}</title>\n    <style>{}    </style>\n  </head>\n  <body>\n{}  </body>\n</html>\n",
            REPORT_TITLE,
            STYLE,
            self.to_fragment(),
        )
    }
}
