// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

const PROJECT_EXTENSIONS: [&str; 3] = ["csproj", "fsproj", "vbproj"];
const SKIPPED_DIRS: [&str; 4] = ["bin", "obj", "node_modules", ".git"];

// Matched case-insensitively against the project file text.
const TEST_MARKERS: [&str; 6] = [
    "microsoft.net.test.sdk",
    "<istestproject>true</istestproject>",
    "\"xunit",
    "\"nunit",
    "\"mstest.testframework",
    "\"mstest.testadapter",
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DotnetProject {
    /// Project file, e.g. `tests/App.Tests/App.Tests.csproj`.
    pub path: PathBuf,
    pub dir: PathBuf,
    pub name: String,
    pub is_test: bool,
}

impl DotnetProject {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let text = fs::read_to_string(&path)
            .with_context(|| format!("unable to read project file: {}", path.display()))?;

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| format_err!("project file has no name: {}", path.display()))?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_owned(),
            _ => PathBuf::from("."),
        };

        Ok(Self {
            is_test: is_test_project(&text),
            path,
            dir,
            name,
        })
    }
}

pub fn is_project_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            PROJECT_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

pub fn is_test_project(project_text: &str) -> bool {
    let text = project_text.to_ascii_lowercase();
    TEST_MARKERS.iter().any(|marker| text.contains(marker))
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    // the root is walked even when its own name is hidden
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }

    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.iter().any(|skipped| *skipped == name)
}

/// Every .NET project file under `root`, sorted by path.
///
/// Directories and project files that cannot be read are logged and skipped.
pub fn discover_projects(root: impl AsRef<Path>) -> Result<Vec<DotnetProject>> {
    let root = root.as_ref();
    if !root.is_dir() {
        bail!("not a directory: {}", root.display());
    }

    let mut paths = vec![];
    for entry in WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !is_skipped_dir(entry))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable path during project discovery: {}", err);
                continue;
            }
        };

        if entry.file_type().is_file() && is_project_file(entry.path()) {
            paths.push(entry.into_path());
        }
    }
    paths.sort();

    let mut projects = vec![];
    for path in paths {
        match DotnetProject::load(&path) {
            Ok(project) => projects.push(project),
            Err(err) => warn!("skipping project: {:#}", err),
        }
    }

    debug!(
        "found {} projects under {}",
        projects.len(),
        root.display()
    );

    Ok(projects)
}
