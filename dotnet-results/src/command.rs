// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use coverage_report::discover::REPORT_DIR;
use coverage_report::FormatSetting;
use std::path::Path;

use crate::config::Config;

const CONSOLE_LOGGER: &str = "console;verbosity=normal";

/// Coverlet's name for the output format. `auto` collects Cobertura.
pub fn coverlet_format(setting: FormatSetting) -> &'static str {
    match setting {
        FormatSetting::Auto | FormatSetting::Cobertura => "cobertura",
        FormatSetting::Json => "json",
        FormatSetting::Lcov => "lcov",
    }
}

/// Arguments for `dotnet test` against a single project file.
pub fn test_args(project: &Path, config: &Config) -> Vec<String> {
    let mut args = vec![
        "test".to_owned(),
        project.display().to_string(),
        "--nologo".to_owned(),
        "--logger".to_owned(),
        CONSOLE_LOGGER.to_owned(),
    ];

    args.extend(config.test_arguments.iter().cloned());

    if config.coverage_enabled {
        let project_dir = project.parent().unwrap_or_else(|| Path::new("."));

        // Coverlet treats a trailing separator as a directory
        let mut output = project_dir.join(REPORT_DIR).display().to_string();
        output.push(std::path::MAIN_SEPARATOR);

        args.push("/p:CollectCoverage=true".to_owned());
        args.push(format!(
            "/p:CoverletOutputFormat={}",
            coverlet_format(config.coverage_format)
        ));
        args.push(format!("/p:CoverletOutput={output}"));
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_args_without_coverage() {
        let config = Config {
            test_arguments: vec!["--filter".into(), "Category=Unit".into()],
            ..Config::default()
        };

        assert_eq!(
            test_args(Path::new("tests/App.Tests.csproj"), &config),
            vec![
                "test",
                "tests/App.Tests.csproj",
                "--nologo",
                "--logger",
                "console;verbosity=normal",
                "--filter",
                "Category=Unit",
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_args_with_coverage() {
        let config = Config {
            coverage_enabled: true,
            coverage_format: FormatSetting::Lcov,
            ..Config::default()
        };

        let args = test_args(Path::new("/work/tests/App.Tests.csproj"), &config);
        assert_eq!(
            &args[5..],
            [
                "/p:CollectCoverage=true",
                "/p:CoverletOutputFormat=lcov",
                "/p:CoverletOutput=/work/tests/coverage/",
            ]
        );
    }

    #[test]
    fn test_auto_collects_cobertura() {
        assert_eq!(coverlet_format(FormatSetting::Auto), "cobertura");
        assert_eq!(coverlet_format(FormatSetting::Cobertura), "cobertura");
        assert_eq!(coverlet_format(FormatSetting::Json), "json");
        assert_eq!(coverlet_format(FormatSetting::Lcov), "lcov");
    }
}
