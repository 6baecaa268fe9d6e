// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde::{Deserialize, Serialize};
use std::fmt;

mod dotnet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestResult {
    Passed,
    Failed,
    Skipped,
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestResult::Passed => write!(f, "passed"),
            TestResult::Failed => write!(f, "failed"),
            TestResult::Skipped => write!(f, "skipped"),
        }
    }
}

/// A single sealed test case result scraped from test-runner output.
///
/// `name` may be empty when a terminal marker was seen without any preceding
/// name marker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestOutcome {
    pub name: String,
    pub result: TestResult,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_millis: Option<f64>,
    /// Only set on failed outcomes.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Only set on failed outcomes.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

impl TestOutcome {
    pub fn new(name: impl Into<String>, result: TestResult) -> Self {
        Self {
            name: name.into(),
            result,
            duration_millis: None,
            error_message: None,
            stack_trace: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl TestSummary {
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a TestOutcome>) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            summary.add(outcome.result);
        }
        summary
    }

    pub fn add(&mut self, result: TestResult) {
        self.total += 1;
        match result {
            TestResult::Passed => self.passed += 1,
            TestResult::Failed => self.failed += 1,
            TestResult::Skipped => self.skipped += 1,
        }
    }
}

/// Parse the captured console text of a test run into test outcomes.
///
/// Never fails: unrecognized lines are ignored, and a record that never sees
/// a pass/fail/skip marker is dropped.
pub fn parse_test_output(text: &str) -> Vec<TestOutcome> {
    dotnet::parse_test_output(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_summary_counts() {
        let outcomes = vec![
            TestOutcome::new("a", TestResult::Passed),
            TestOutcome::new("b", TestResult::Failed),
            TestOutcome::new("c", TestResult::Passed),
            TestOutcome::new("d", TestResult::Skipped),
        ];

        assert_eq!(
            TestSummary::from_outcomes(&outcomes),
            TestSummary {
                total: 4,
                passed: 2,
                failed: 1,
                skipped: 1,
            }
        );
    }

    #[test]
    fn test_outcome_json_shape() {
        let mut outcome = TestOutcome::new("Addition_ReturnsSum", TestResult::Passed);
        outcome.duration_millis = Some(12.0);

        let text = serde_json::to_string(&outcome).unwrap();
        assert_eq!(
            text,
            r#"{"name":"Addition_ReturnsSum","result":"passed","durationMillis":12.0}"#
        );
    }
}
