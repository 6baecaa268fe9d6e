// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strum_macros::EnumString;

use crate::{CoverageRecord, ParseError};

/// On-disk coverage report formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReportFormat {
    /// Cobertura XML: `packages/package/classes/class/lines/line`.
    Cobertura,

    /// Nested JSON: modules, then documents, then lines.
    CoverletJson,

    /// Line-oriented LCOV tracefile.
    Lcov,
}

impl ReportFormat {
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();

        match ext.as_str() {
            "xml" => Some(Self::Cobertura),
            "json" => Some(Self::CoverletJson),
            "lcov" | "info" => Some(Self::Lcov),
            _ => None,
        }
    }

    /// An explicit setting wins over the file extension.
    pub fn resolve(setting: FormatSetting, path: &Path) -> Option<Self> {
        match setting {
            FormatSetting::Auto => Self::from_extension(path),
            FormatSetting::Cobertura => Some(Self::Cobertura),
            FormatSetting::Json => Some(Self::CoverletJson),
            FormatSetting::Lcov => Some(Self::Lcov),
        }
    }

    pub fn parse(self, text: &str) -> Result<Vec<CoverageRecord>, ParseError> {
        crate::parse_report(self, text)
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Cobertura => write!(f, "cobertura"),
            ReportFormat::CoverletJson => write!(f, "json"),
            ReportFormat::Lcov => write!(f, "lcov"),
        }
    }
}

/// User-facing format selector.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum FormatSetting {
    #[default]
    #[strum(serialize = "auto")]
    Auto,

    #[serde(alias = "xml")]
    #[strum(serialize = "cobertura", serialize = "xml")]
    Cobertura,

    #[strum(serialize = "json")]
    Json,

    #[serde(alias = "info")]
    #[strum(serialize = "lcov", serialize = "info")]
    Lcov,
}

impl fmt::Display for FormatSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatSetting::Auto => write!(f, "auto"),
            FormatSetting::Cobertura => write!(f, "cobertura"),
            FormatSetting::Json => write!(f, "json"),
            FormatSetting::Lcov => write!(f, "lcov"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_extension_sniffing() {
        let cases = [
            ("coverage.cobertura.xml", Some(ReportFormat::Cobertura)),
            ("coverage/coverage.json", Some(ReportFormat::CoverletJson)),
            ("lcov.info", Some(ReportFormat::Lcov)),
            ("report.LCOV", Some(ReportFormat::Lcov)),
            ("coverage.txt", None),
            ("coverage", None),
        ];

        for (path, expected) in cases {
            assert_eq!(ReportFormat::from_extension(Path::new(path)), expected, "{path}");
        }
    }

    #[test]
    fn test_explicit_setting_wins() {
        let path = Path::new("coverage.json");
        assert_eq!(
            ReportFormat::resolve(FormatSetting::Lcov, path),
            Some(ReportFormat::Lcov)
        );
        assert_eq!(
            ReportFormat::resolve(FormatSetting::Auto, path),
            Some(ReportFormat::CoverletJson)
        );
        assert_eq!(
            ReportFormat::resolve(FormatSetting::Auto, Path::new("coverage.bin")),
            None
        );
    }

    #[test]
    fn test_setting_from_str() {
        assert_eq!(FormatSetting::from_str("auto").unwrap(), FormatSetting::Auto);
        assert_eq!(FormatSetting::from_str("XML").unwrap(), FormatSetting::Cobertura);
        assert_eq!(FormatSetting::from_str("lcov").unwrap(), FormatSetting::Lcov);
        assert!(FormatSetting::from_str("opencover").is_err());
    }

    #[test]
    fn test_setting_deserialize() {
        let setting: FormatSetting = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(setting, FormatSetting::Json);

        let setting: FormatSetting = serde_json::from_str(r#""xml""#).unwrap();
        assert_eq!(setting, FormatSetting::Cobertura);
    }
}
