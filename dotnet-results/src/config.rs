// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{Context, Result};
use coverage_report::FormatSetting;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TEST_TIMEOUT: u64 = 30;

fn default_dotnet_path() -> PathBuf {
    PathBuf::from("dotnet")
}

fn default_test_timeout() -> u64 {
    DEFAULT_TEST_TIMEOUT
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    #[serde(default = "default_dotnet_path")]
    pub dotnet_path: PathBuf,

    pub coverage_enabled: bool,

    pub coverage_format: FormatSetting,

    /// Seconds a single `dotnet test` invocation may run.
    #[serde(default = "default_test_timeout")]
    pub test_timeout: u64,

    /// Extra arguments appended to `dotnet test`.
    pub test_arguments: Vec<String>,

    pub env: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dotnet_path: default_dotnet_path(),
            coverage_enabled: false,
            coverage_format: FormatSetting::default(),
            test_timeout: DEFAULT_TEST_TIMEOUT,
            test_arguments: vec![],
            env: HashMap::new(),
        }
    }
}

/// Values given on the command line. Set fields win over the config file.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub dotnet_path: Option<PathBuf>,
    pub coverage_enabled: Option<bool>,
    pub coverage_format: Option<FormatSetting>,
    pub test_timeout: Option<u64>,
    pub test_arguments: Vec<String>,
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self> {
        let config = serde_json::from_str(text)?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read config file: {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.test_timeout)
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(dotnet_path) = overrides.dotnet_path {
            self.dotnet_path = dotnet_path;
        }

        if let Some(enabled) = overrides.coverage_enabled {
            self.coverage_enabled = enabled;
        }

        if let Some(format) = overrides.coverage_format {
            self.coverage_format = format;
        }

        if let Some(timeout) = overrides.test_timeout {
            self.test_timeout = timeout;
        }

        self.test_arguments.extend(overrides.test_arguments);
        self
    }
}
