// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::Result;
use coverage_report::{discover_report, read_report, FormatSetting};
use serde::Serialize;
use std::path::{Path, PathBuf};
use test_output::{parse_test_output, TestOutcome};

use crate::command::test_args;
use crate::config::Config;
use crate::process::run_cmd;
use crate::project::DotnetProject;
use crate::store::ResultStore;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Projects whose outcomes were recorded.
    pub projects: usize,

    /// Projects that could not be run at all.
    pub failed_projects: Vec<PathBuf>,

    /// Source files with coverage recorded by this run.
    pub coverage_files: usize,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed_projects.is_empty()
    }
}

// A relative program path with a directory part would otherwise resolve
// against the child's working directory.
fn resolve_program(program: &Path) -> Result<PathBuf> {
    if program.is_relative() && program.components().count() > 1 {
        Ok(std::env::current_dir()?.join(program))
    } else {
        Ok(program.to_owned())
    }
}

/// Run `dotnet test` from the project's directory and parse its console
/// output.
///
/// Failing tests exit non-zero, so the exit status only matters when the
/// output held no results.
pub async fn run_project(config: &Config, project: &DotnetProject) -> Result<Vec<TestOutcome>> {
    let project_file = project
        .path
        .file_name()
        .map(Path::new)
        .ok_or_else(|| format_err!("not a project file: {}", project.path.display()))?;

    // relative to `project.dir`, so coverage lands in `<dir>/coverage/`
    let args = test_args(project_file, config);
    let output = run_cmd(
        &resolve_program(&config.dotnet_path)?,
        args,
        &config.env,
        Some(&project.dir),
        config.timeout(),
    )
    .await?;

    let outcomes = parse_test_output(&output.combined());
    debug!(
        "{}: exit status {:?}, {} outcomes",
        project.name,
        output.exit_status,
        outcomes.len()
    );

    if outcomes.is_empty() && !output.exit_status.success {
        bail!(
            "dotnet test failed for {}: {:?}\n{}",
            project.path.display(),
            output.exit_status,
            output.stderr.trim_end()
        );
    }

    Ok(outcomes)
}

/// Read the project's coverage report, if one exists, into `store`.
///
/// Returns the number of files recorded. A report that fails to parse is
/// logged and skipped.
pub fn collect_coverage(project_dir: &Path, setting: FormatSetting, store: &mut ResultStore) -> usize {
    let Some(path) = discover_report(project_dir) else {
        return 0;
    };

    let records = match read_report(&path, setting) {
        Ok(records) => records,
        Err(err) => {
            warn!("skipping coverage report: {:#}", err);
            return 0;
        }
    };

    let files = records.len();
    for record in records {
        store.record_coverage(record);
    }
    store.notify_coverage_updated(files);

    info!("recorded coverage for {} files from {}", files, path.display());
    files
}

/// Run every project in turn, recording results as each one finishes.
pub async fn run_tests(
    config: &Config,
    projects: &[DotnetProject],
    store: &mut ResultStore,
) -> Result<RunReport> {
    if projects.is_empty() {
        bail!("no test projects to run");
    }

    let mut report = RunReport::default();

    for project in projects {
        info!("running tests: {}", project.path.display());

        let outcomes = match run_project(config, project).await {
            Ok(outcomes) => outcomes,
            Err(err) => {
                error!("unable to run tests for {}: {:#}", project.name, err);
                report.failed_projects.push(project.path.clone());
                continue;
            }
        };

        store.record_test_run(project.path.clone(), outcomes);
        report.projects += 1;

        if config.coverage_enabled {
            report.coverage_files +=
                collect_coverage(&project.dir, config.coverage_format, store);
        }
    }

    if config.coverage_enabled && report.coverage_files == 0 {
        warn!("no coverage data collected");
    }

    Ok(report)
}
