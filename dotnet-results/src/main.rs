// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use coverage_report::{read_report, FormatSetting};
use dotnet_results::config::{Config, ConfigOverrides};
use dotnet_results::project::{discover_projects, DotnetProject};
use dotnet_results::report::format_summary;
use dotnet_results::run::run_tests;
use dotnet_results::ResultStore;
use serde_json::json;
use test_output::{parse_test_output, TestSummary};

#[derive(Parser, Debug)]
#[clap(version, about = "Run .NET tests and collect their results and coverage")]
struct Opt {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Run `dotnet test` for the workspace's test projects.
    Test(TestOpt),

    /// Parse captured test runner output and print the outcomes as JSON.
    ParseOutput { file: PathBuf },

    /// Parse a coverage report and print its records as JSON.
    ParseCoverage {
        file: PathBuf,

        #[clap(long, default_value_t = FormatSetting::Auto)]
        coverage_format: FormatSetting,
    },

    /// List the .NET projects under a directory.
    Projects {
        #[clap(default_value = ".")]
        dir: PathBuf,
    },
}

#[derive(Parser, Debug)]
struct TestOpt {
    #[clap(long, default_value = ".")]
    workspace: PathBuf,

    /// Project files to run. Defaults to every test project in the workspace.
    #[clap(long = "project")]
    projects: Vec<PathBuf>,

    #[clap(long)]
    config: Option<PathBuf>,

    #[clap(long, conflicts_with = "no_coverage")]
    coverage: bool,

    #[clap(long)]
    no_coverage: bool,

    #[clap(long)]
    coverage_format: Option<FormatSetting>,

    /// Seconds each `dotnet test` invocation may run.
    #[clap(long)]
    timeout: Option<u64>,

    #[clap(long)]
    dotnet: Option<PathBuf>,

    /// Print the collected results as JSON instead of text.
    #[clap(long)]
    json: bool,

    /// Extra arguments passed through to `dotnet test`.
    #[clap(last = true)]
    test_arguments: Vec<String>,
}

impl TestOpt {
    fn load_config(&self) -> Result<Config> {
        let config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        let coverage_enabled = match (self.coverage, self.no_coverage) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };

        Ok(config.with_overrides(ConfigOverrides {
            dotnet_path: self.dotnet.clone(),
            coverage_enabled,
            coverage_format: self.coverage_format,
            test_timeout: self.timeout,
            test_arguments: self.test_arguments.clone(),
        }))
    }

    fn load_projects(&self) -> Result<Vec<DotnetProject>> {
        if !self.projects.is_empty() {
            return self
                .projects
                .iter()
                .map(|path| DotnetProject::load(path.as_path()))
                .collect();
        }

        let projects = discover_projects(&self.workspace)?
            .into_iter()
            .filter(|project| project.is_test)
            .collect();

        Ok(projects)
    }
}

fn main() -> Result<()> {
    let opt = Opt::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(opt))
}

async fn run(opt: Opt) -> Result<()> {
    match opt.command {
        Command::Test(test) => test_workspace(test).await,
        Command::ParseOutput { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("unable to read {}", file.display()))?;
            let outcomes = parse_test_output(&text);
            let output = json!({
                "summary": TestSummary::from_outcomes(&outcomes),
                "outcomes": outcomes,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Command::ParseCoverage {
            file,
            coverage_format,
        } => {
            let mut store = ResultStore::new();
            for record in read_report(&file, coverage_format)? {
                store.record_coverage(record);
            }
            let output = json!({
                "overallCoverage": store.overall_coverage(),
                "files": store.coverage().collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Command::Projects { dir } => {
            for project in discover_projects(&dir)? {
                let kind = if project.is_test { "test" } else { "library" };
                println!("{:<8} {}", kind, project.path.display());
            }
            Ok(())
        }
    }
}

async fn test_workspace(opt: TestOpt) -> Result<()> {
    let config = opt.load_config()?;
    let projects = opt.load_projects()?;

    let mut store = ResultStore::new();
    let report = run_tests(&config, &projects, &mut store).await?;

    if opt.json {
        let output = json!({
            "run": report,
            "results": store.snapshot(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", format_summary(&store));
    }

    if !report.is_success() {
        bail!(
            "{} project(s) could not be run: {:?}",
            report.failed_projects.len(),
            report.failed_projects
        );
    }

    let summary = store.summary();
    if summary.failed > 0 {
        bail!("{} test(s) failed", summary.failed);
    }

    Ok(())
}
