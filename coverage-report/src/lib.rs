// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod cobertura;
pub mod coverlet;
pub mod discover;
pub mod format;
pub mod lcov;

pub use discover::discover_report;
pub use format::{FormatSetting, ReportFormat};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid cobertura XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid coverage JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed LCOV data on line {line}: `{text}`")]
    Lcov { line: usize, text: String },

    #[error("invalid value `{value}` for attribute `{attribute}`")]
    Attribute {
        attribute: &'static str,
        value: String,
    },

    #[error("source lines must be 1-indexed")]
    ZeroLine,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineCoverage {
    /// Line number in the source file (1-indexed).
    pub line_number: u32,
    pub covered: bool,
}

impl LineCoverage {
    pub fn new(line_number: u32, covered: bool) -> Result<Self, ParseError> {
        if line_number == 0 {
            return Err(ParseError::ZeroLine);
        }

        Ok(Self {
            line_number,
            covered,
        })
    }
}

/// Line coverage of one source file, independent of the report format it
/// was read from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageRecord {
    pub file_path: String,

    /// Percentage of tracked lines that are covered, in `0..=100`.
    pub percentage: f64,

    /// Tracked lines in report order. Lines that are absent are untracked,
    /// not uncovered.
    pub lines: Vec<LineCoverage>,
}

impl CoverageRecord {
    pub fn new(file_path: impl Into<String>, percentage: f64, lines: Vec<LineCoverage>) -> Self {
        Self {
            file_path: file_path.into(),
            percentage,
            lines,
        }
    }

    /// Build a record whose percentage is derived from its own lines.
    pub fn from_lines(file_path: impl Into<String>, lines: Vec<LineCoverage>) -> Self {
        let percentage = derived_percentage(&lines);
        Self::new(file_path, percentage, lines)
    }

    pub fn covered_lines(&self) -> usize {
        self.lines.iter().filter(|l| l.covered).count()
    }

    pub fn total_lines(&self) -> usize {
        self.lines.len()
    }

    /// `None` when the line is not tracked by the report.
    pub fn is_line_covered(&self, line_number: u32) -> Option<bool> {
        self.lines
            .iter()
            .find(|l| l.line_number == line_number)
            .map(|l| l.covered)
    }
}

/// `covered / total * 100`, defined as 0 when there are no lines.
pub fn derived_percentage(lines: &[LineCoverage]) -> f64 {
    if lines.is_empty() {
        return 0.0;
    }

    let covered = lines.iter().filter(|l| l.covered).count();
    covered as f64 / lines.len() as f64 * 100.0
}

/// Parse report text in a known format.
pub fn parse_report(format: ReportFormat, text: &str) -> Result<Vec<CoverageRecord>, ParseError> {
    match format {
        ReportFormat::Cobertura => cobertura::parse(text),
        ReportFormat::CoverletJson => coverlet::parse(text),
        ReportFormat::Lcov => lcov::parse(text),
    }
}

/// Read and parse a report file, choosing the format from `setting` or, for
/// `FormatSetting::Auto`, from the file extension.
pub fn read_report(path: impl AsRef<Path>, setting: FormatSetting) -> Result<Vec<CoverageRecord>> {
    let path = path.as_ref();

    let format = ReportFormat::resolve(setting, path).with_context(|| {
        format!(
            "unable to infer coverage report format: {}",
            path.display()
        )
    })?;

    let text = fs::read_to_string(path)
        .with_context(|| format!("unable to read coverage report: {}", path.display()))?;

    let records = parse_report(format, &text)
        .with_context(|| format!("unable to parse {} report: {}", format, path.display()))?;

    log::debug!(
        "parsed {} coverage records from {}",
        records.len(),
        path.display()
    );

    Ok(records)
}
