// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{Context, Result};
use process_control::{ChildExt, Control};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

/// Serializable representation of a process output.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Output {
    pub exit_status: ExitStatus,
    pub stderr: String,
    pub stdout: String,
}

impl Output {
    /// stdout followed by stderr, which is how the test runner output is read.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&self.stderr);
        }
        text
    }
}

impl From<process_control::Output> for Output {
    fn from(output: process_control::Output) -> Self {
        let exit_status = output.status.into();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        Self {
            exit_status,
            stderr,
            stdout,
        }
    }
}

/// Serializable representation of a process exit status.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ExitStatus {
    pub code: Option<i32>,
    pub signal: Option<i32>,
    pub success: bool,
}

impl From<process_control::ExitStatus> for ExitStatus {
    #[cfg(not(unix))]
    fn from(status: process_control::ExitStatus) -> Self {
        Self {
            code: status.code().map(|s| s as i32),
            signal: None,
            success: status.success(),
        }
    }

    #[cfg(unix)]
    fn from(status: process_control::ExitStatus) -> Self {
        Self {
            code: status.code().map(|s| s as i32),
            signal: status.signal(),
            success: status.success(),
        }
    }
}

/// Run `program` to completion, killing it if it outlives `timeout`.
pub async fn run_cmd<S: ::std::hash::BuildHasher>(
    program: &Path,
    argv: Vec<String>,
    env: &HashMap<String, String, S>,
    cwd: Option<&Path>,
    timeout: Duration,
) -> Result<Output> {
    debug!(
        "running command with timeout: cmd:{:?} argv:{:?} env:{:?} cwd:{:?} timeout:{:?}",
        program, argv, env, cwd, timeout
    );

    let mut cmd = Command::new(program);
    cmd.env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .args(argv)
        .envs(env);

    if let Some(cwd) = cwd {
        cmd.current_dir(cwd);
    }

    let program_name = program.display().to_string();

    let runner = tokio::task::spawn_blocking(move || {
        let child = cmd
            .spawn()
            .with_context(|| format!("process failed to start: {program_name}"))?;
        child
            .controlled_with_output()
            .time_limit(timeout)
            .terminate_for_timeout()
            .wait()?
            .ok_or_else(|| format_err!("process timed out after {:?}: {}", timeout, program_name))
    });

    runner.await?.map(Output::from)
}
