//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use crate::pipeline::DocumentReport;
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the reports of a metadata run.
    pub fn format_reports(&self, reports: &[DocumentReport]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(reports)?),
            OutputFormat::Table => Ok(self.format_reports_table(reports)),
            OutputFormat::Quiet => Ok(reports
                .iter()
                .map(|r| r.output_path.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_reports_table(&self, reports: &[DocumentReport]) -> String {
        if reports.is_empty() {
            return self.colorize("No batch files found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Output", "Fields", "Chunks", "Calls", "Input tokens", "Output tokens"]);

        for report in reports {
            let fields = if report.is_empty() {
                self.colorize("0", "yellow")
            } else {
                report.field_count.to_string()
            };
            builder.push_record([
                report.output_path.clone(),
                fields,
                report.chunk_count.to_string(),
                report.call_count.to_string(),
                report.usage.input_tokens.to_string(),
                report.usage.output_tokens.to_string(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format a list of written paths.
    pub fn format_paths(&self, label: &str, paths: &[String]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(paths)?),
            OutputFormat::Quiet => Ok(paths.join("\n")),
            OutputFormat::Table => {
                let mut lines = vec![self.success(&format!("{} {} file(s)", label, paths.len()))];
                lines.extend(paths.iter().map(|p| format!("  {}", p)));
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}
