// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::{Path, PathBuf};

/// Report file names, in lookup order.
pub const REPORT_FILE_NAMES: [&str; 3] = ["coverage.cobertura.xml", "coverage.json", "coverage.info"];

/// Directory (relative to the project) that coverage tools write into.
pub const REPORT_DIR: &str = "coverage";

/// Conventional report locations under `project_dir`, in lookup order.
pub fn candidate_paths(project_dir: &Path) -> Vec<PathBuf> {
    REPORT_FILE_NAMES
        .iter()
        .flat_map(|name| [project_dir.join(name), project_dir.join(REPORT_DIR).join(name)])
        .collect()
}

/// First conventional report file that exists, if any.
pub fn discover_report(project_dir: &Path) -> Option<PathBuf> {
    let found = candidate_paths(project_dir)
        .into_iter()
        .find(|path| path.is_file());

    match &found {
        Some(path) => log::debug!("found coverage report: {}", path.display()),
        None => log::debug!("no coverage report under {}", project_dir.display()),
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_candidate_order() {
        let dir = Path::new("proj");
        let names: Vec<PathBuf> = candidate_paths(dir);
        assert_eq!(
            names,
            vec![
                dir.join("coverage.cobertura.xml"),
                dir.join("coverage").join("coverage.cobertura.xml"),
                dir.join("coverage.json"),
                dir.join("coverage").join("coverage.json"),
                dir.join("coverage.info"),
                dir.join("coverage").join("coverage.info"),
            ]
        );
    }

    #[test]
    fn test_discover_first_existing() -> Result<()> {
        let dir = tempfile::tempdir()?;
        assert_eq!(discover_report(dir.path()), None);

        fs::create_dir(dir.path().join("coverage"))?;
        fs::write(dir.path().join("coverage").join("coverage.info"), "")?;
        assert_eq!(
            discover_report(dir.path()),
            Some(dir.path().join("coverage").join("coverage.info"))
        );

        fs::write(dir.path().join("coverage").join("coverage.json"), "{}")?;
        assert_eq!(
            discover_report(dir.path()),
            Some(dir.path().join("coverage").join("coverage.json"))
        );

        fs::write(dir.path().join("coverage.cobertura.xml"), "<coverage/>")?;
        assert_eq!(
            discover_report(dir.path()),
            Some(dir.path().join("coverage.cobertura.xml"))
        );

        Ok(())
    }

    #[test]
    fn test_directory_is_not_a_report() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir(dir.path().join("coverage.json"))?;
        assert_eq!(discover_report(dir.path()), None);
        Ok(())
    }
}
