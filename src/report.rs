//! Report assembly
//!
//! Turns a finished [`AggregateReport`] into a document for people or
//! machines. Assemblers only read the report.

use std::fs;
use std::path::Path;

use crate::aggregator::{AggregateReport, OverallStatus};
use crate::errors::Result;

/// Sources listed in rendered reports
const MAX_LISTED_SOURCES: usize = 5;

/// Renders an aggregate report into a document
pub trait ReportAssembler {
    /// File extension for written documents, without the dot
    fn extension(&self) -> &'static str;

    fn render(&self, report: &AggregateReport) -> Result<String>;

    /// Render and write to `path`
    fn write_to(&self, report: &AggregateReport, path: &Path) -> Result<()> {
        let document = self.render(report)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, document)?;
        tracing::info!(path = %path.display(), "report written");
        Ok(())
    }
}

/// Markdown education report
#[derive(Debug, Clone, Default)]
pub struct MarkdownAssembler;

impl ReportAssembler for MarkdownAssembler {
    fn extension(&self) -> &'static str {
        "md"
    }

    fn render(&self, report: &AggregateReport) -> Result<String> {
        let mut out = String::new();

        out.push_str("# Autism Education Report\n\n");
        out.push_str(&format!("**Question:** {}\n\n", report.query));

        if report.overall_status == OverallStatus::Failed {
            out.push_str("## Request Failed\n\n");
            if let Some(reason) = &report.failure_reason {
                out.push_str(reason);
                out.push_str("\n\n");
            }
        }

        if let Some(text) = report.simplified_text() {
            out.push_str("## Simple Explanation (Grade 2)\n\n");
            out.push_str(text);
            out.push_str("\n\n");
        }

        if report.retrieval.is_usable() {
            out.push_str("## Sources\n\n");
            for (i, (source, score)) in report
                .retrieval
                .sources()
                .into_iter()
                .take(MAX_LISTED_SOURCES)
                .enumerate()
            {
                out.push_str(&format!("{}. {} (Relevance: {:.2})\n", i + 1, source, score));
            }
            out.push('\n');
        }

        if let Some((prompt, path)) = report.image() {
            out.push_str("## Educational Image\n\n");
            match path {
                Some(path) => out.push_str(&format!("![{}]({})\n\n", prompt, path.display())),
                None => out.push_str(&format!("_{}_\n\n", prompt)),
            }
        }

        if let Some((title, story)) = report.story() {
            out.push_str(&format!("## Social Story: {}\n\n", title));
            for line in story.lines() {
                out.push_str(line);
                out.push_str("  \n");
            }
            out.push('\n');
        }

        let failed = report.failed_tasks();
        if !failed.is_empty() {
            out.push_str("## Incomplete Tasks\n\n");
            for result in failed {
                let kind = result
                    .error_kind
                    .map(|k| k.to_string())
                    .unwrap_or_else(|| "Unknown".to_string());
                out.push_str(&format!(
                    "- {} ({}): {}\n",
                    result.task_name,
                    kind,
                    result.error.as_deref().unwrap_or("")
                ));
            }
            out.push('\n');
        }

        out.push_str("---\n\n");
        out.push_str(&format!(
            "_Generated: {}_  \n",
            report.timestamp.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&format!("_Status: {}_  \n", report.overall_status));
        out.push_str(&format!(
            "_Total processing time: {:.2}s_\n",
            report.total_elapsed_ms as f64 / 1000.0
        ));

        Ok(out)
    }
}

/// Pretty-printed JSON with the report's stable field names
#[derive(Debug, Clone, Default)]
pub struct JsonAssembler;

impl ReportAssembler for JsonAssembler {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, report: &AggregateReport) -> Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }
}
