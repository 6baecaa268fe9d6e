// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::{CoverageRecord, LineCoverage, ParseError};

pub type ModuleName = String;
pub type DocumentPath = String;
pub use line_number::LineNumber;

#[derive(Deserialize)]
#[serde(untagged)]
pub enum CoverageJson {
    Wrapped {
        #[serde(alias = "Modules")]
        modules: BTreeMap<ModuleName, ModuleJson>,
    },
    Bare(BTreeMap<ModuleName, ModuleJson>),
}

#[derive(Deserialize)]
#[serde(untagged)]
pub enum ModuleJson {
    Wrapped {
        #[serde(alias = "Documents")]
        documents: BTreeMap<DocumentPath, DocumentJson>,
    },
    Bare(BTreeMap<DocumentPath, DocumentJson>),
}

#[derive(Deserialize)]
#[serde(untagged)]
pub enum DocumentJson {
    /// Document with a pre-computed line coverage fraction.
    Summary {
        #[serde(default, rename = "lineCoverage", alias = "LineCoverage")]
        line_coverage: Option<f64>,
        #[serde(alias = "Lines")]
        lines: BTreeMap<LineNumber, HitsJson>,
    },

    /// Coverlet's native layout: class, then method, then lines.
    Classes(BTreeMap<String, BTreeMap<String, MethodJson>>),
}

#[derive(Deserialize)]
pub struct MethodJson {
    #[serde(default, rename = "Lines", alias = "lines")]
    pub lines: BTreeMap<LineNumber, HitsJson>,
}

#[derive(Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum HitsJson {
    Count(u64),
    Usage {
        #[serde(rename = "usageCount", alias = "UsageCount")]
        usage_count: u64,
    },
}

impl HitsJson {
    pub fn count(self) -> u64 {
        match self {
            HitsJson::Count(count) => count,
            HitsJson::Usage { usage_count } => usage_count,
        }
    }
}

impl CoverageJson {
    fn into_modules(self) -> BTreeMap<ModuleName, ModuleJson> {
        match self {
            CoverageJson::Wrapped { modules } => modules,
            CoverageJson::Bare(modules) => modules,
        }
    }
}

impl ModuleJson {
    fn into_documents(self) -> BTreeMap<DocumentPath, DocumentJson> {
        match self {
            ModuleJson::Wrapped { documents } => documents,
            ModuleJson::Bare(documents) => documents,
        }
    }
}

impl DocumentJson {
    fn into_record(self, path: DocumentPath) -> Result<CoverageRecord, ParseError> {
        match self {
            DocumentJson::Summary {
                line_coverage,
                lines,
            } => {
                let lines = lines
                    .into_iter()
                    .map(|(number, hits)| LineCoverage::new(number.0, hits.count() > 0))
                    .collect::<Result<Vec<_>, _>>()?;

                let record = match line_coverage {
                    Some(fraction) => CoverageRecord::new(path, fraction * 100.0, lines),
                    None => CoverageRecord::from_lines(path, lines),
                };

                Ok(record)
            }
            DocumentJson::Classes(classes) => {
                // methods may report the same line more than once
                let mut hits: BTreeMap<LineNumber, u64> = BTreeMap::new();
                for method in classes.into_values().flat_map(BTreeMap::into_values) {
                    for (number, count) in method.lines {
                        *hits.entry(number).or_default() += count.count();
                    }
                }

                let lines = hits
                    .into_iter()
                    .map(|(number, count)| LineCoverage::new(number.0, count > 0))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(CoverageRecord::from_lines(path, lines))
            }
        }
    }
}

/// Parse a nested JSON report into one record per document.
pub fn parse(text: &str) -> Result<Vec<CoverageRecord>, ParseError> {
    let json: CoverageJson = serde_json::from_str(text)?;

    let mut records = vec![];
    for (module, module_json) in json.into_modules() {
        let documents = module_json.into_documents();
        log::debug!("module {} has {} documents", module, documents.len());

        for (path, document) in documents {
            records.push(document.into_record(path)?);
        }
    }

    Ok(records)
}

mod line_number {
    use serde::{Deserialize, Deserializer};

    #[derive(Clone, Copy, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd)]
    pub struct LineNumber(#[serde(deserialize_with = "self::deserialize")] pub u32);

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.trim().parse::<u32>().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn line(number: u32, covered: bool) -> LineCoverage {
        LineCoverage {
            line_number: number,
            covered,
        }
    }

    #[test]
    fn test_parse_summary_documents() -> Result<(), ParseError> {
        let text = r#"{
            "modules": {
                "Calculator.dll": {
                    "documents": {
                        "src/Math.cs": {
                            "lineCoverage": 0.5,
                            "lines": { "2": { "usageCount": 0 }, "1": { "usageCount": 3 } }
                        }
                    }
                }
            }
        }"#;

        let records = parse(text)?;
        assert_eq!(
            records,
            vec![CoverageRecord {
                file_path: "src/Math.cs".to_owned(),
                percentage: 50.0,
                lines: vec![line(1, true), line(2, false)],
            }]
        );

        Ok(())
    }

    #[test]
    fn test_parse_bare_modules_with_counts() -> Result<(), ParseError> {
        let text = r#"{
            "A.dll": { "a.cs": { "LineCoverage": 1.0, "Lines": { "10": 1 } } },
            "B.dll": { "b.cs": { "lines": { "3": 0, "4": 2 } } }
        }"#;

        let records = parse(text)?;
        assert_eq!(
            records,
            vec![
                CoverageRecord::new("a.cs", 100.0, vec![line(10, true)]),
                CoverageRecord::new("b.cs", 50.0, vec![line(3, false), line(4, true)]),
            ]
        );

        Ok(())
    }

    #[test]
    fn test_parse_coverlet_native_layout() -> Result<(), ParseError> {
        let text = r#"{
            "Calculator.dll": {
                "/work/Calculator/Math.cs": {
                    "Calculator.Math": {
                        "System.Int32 Calculator.Math::Add(System.Int32,System.Int32)": {
                            "Lines": { "8": 4, "9": 4 },
                            "Branches": []
                        },
                        "System.Int32 Calculator.Math::Divide(System.Int32,System.Int32)": {
                            "Lines": { "13": 1, "14": 0 },
                            "Branches": []
                        }
                    }
                }
            }
        }"#;

        let records = parse(text)?;
        assert_eq!(
            records,
            vec![CoverageRecord::new(
                "/work/Calculator/Math.cs",
                75.0,
                vec![line(8, true), line(9, true), line(13, true), line(14, false)],
            )]
        );

        Ok(())
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(parse("{ not json"), Err(ParseError::Json(_))));
    }

    #[test]
    fn test_zero_line_number() {
        let text = r#"{ "m": { "a.cs": { "lines": { "0": 1 } } } }"#;
        assert!(parse(text).is_err());
    }
}
