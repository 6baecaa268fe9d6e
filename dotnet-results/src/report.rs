// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Write;

use test_output::TestResult;

use crate::store::ResultStore;

/// Plain-text rendering of everything in `store`.
pub fn format_summary(store: &ResultStore) -> String {
    let mut text = String::new();
    // writing to a String cannot fail
    let _ = write_summary(&mut text, store);
    text
}

fn write_summary(out: &mut String, store: &ResultStore) -> std::fmt::Result {
    let summary = store.summary();
    writeln!(
        out,
        "Tests: {} total, {} passed, {} failed, {} skipped",
        summary.total, summary.passed, summary.failed, summary.skipped
    )?;

    let failed: Vec<_> = store
        .test_runs()
        .flat_map(|(_, outcomes)| outcomes)
        .filter(|outcome| outcome.result == TestResult::Failed)
        .collect();

    if !failed.is_empty() {
        writeln!(out)?;
        writeln!(out, "Failed tests:")?;
        for outcome in failed {
            writeln!(out, "  {}", outcome.name)?;
            if let Some(message) = &outcome.error_message {
                writeln!(out, "    {}", message)?;
            }
        }
    }

    if store.coverage().next().is_some() {
        writeln!(out)?;
        writeln!(out, "Coverage: {:.1}% overall", store.overall_coverage())?;
        for record in store.coverage() {
            writeln!(
                out,
                "  {:>5.1}%  {} ({}/{} lines)",
                record.percentage,
                record.file_path,
                record.covered_lines(),
                record.total_lines()
            )?;
        }
    }

    Ok(())
}
