// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::str::FromStr;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::{CoverageRecord, LineCoverage, ParseError};

// <!ELEMENT class (methods,lines)>
// <!ATTLIST class filename    CDATA #REQUIRED>
// <!ATTLIST class line-rate   CDATA #REQUIRED>
//
// <!ELEMENT line (conditions*)>
// <!ATTLIST line number CDATA #REQUIRED>
// <!ATTLIST line hits   CDATA #REQUIRED>
#[derive(Debug, Default)]
struct ClassState {
    filename: Option<String>,
    line_rate: Option<f64>,
    lines: Vec<LineCoverage>,

    // `method` elements repeat the class's lines; only the class-level list counts.
    methods_depth: usize,
}

impl ClassState {
    fn from_element(e: &BytesStart<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            filename: attribute(e, "filename")?,
            line_rate: numeric(e, "line-rate")?,
            ..Default::default()
        })
    }

    fn finish(self) -> Option<CoverageRecord> {
        let Some(filename) = self.filename else {
            log::debug!("skipping cobertura class without a filename");
            return None;
        };

        let record = match self.line_rate {
            Some(rate) => CoverageRecord::new(filename, rate * 100.0, self.lines),
            None => CoverageRecord::from_lines(filename, self.lines),
        };

        Some(record)
    }
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Result<Option<String>, ParseError> {
    match e.try_get_attribute(name)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

fn numeric<T: FromStr>(e: &BytesStart<'_>, name: &'static str) -> Result<Option<T>, ParseError> {
    let Some(value) = attribute(e, name)? else {
        return Ok(None);
    };

    match value.trim().parse() {
        Ok(parsed) => Ok(Some(parsed)),
        Err(_) => Err(ParseError::Attribute {
            attribute: name,
            value,
        }),
    }
}

fn line_element(e: &BytesStart<'_>) -> Result<LineCoverage, ParseError> {
    let number: u32 = numeric(e, "number")?.ok_or(ParseError::Attribute {
        attribute: "number",
        value: String::new(),
    })?;
    let hits: u64 = numeric(e, "hits")?.unwrap_or_default();

    LineCoverage::new(number, hits > 0)
}

/// Parse a Cobertura XML report into one record per `class` element.
///
/// Classes that share a file name yield one record each, in document order.
pub fn parse(text: &str) -> Result<Vec<CoverageRecord>, ParseError> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut records = vec![];
    let mut class: Option<ClassState> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"class" => {
                    class = Some(ClassState::from_element(&e)?);
                }
                b"methods" => {
                    if let Some(class) = class.as_mut() {
                        class.methods_depth += 1;
                    }
                }
                b"line" => {
                    if let Some(class) = class.as_mut() {
                        if class.methods_depth == 0 {
                            class.lines.push(line_element(&e)?);
                        }
                    }
                }
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"class" => {
                    // a class without any lines
                    records.extend(ClassState::from_element(&e)?.finish());
                }
                b"line" => {
                    if let Some(class) = class.as_mut() {
                        if class.methods_depth == 0 {
                            class.lines.push(line_element(&e)?);
                        }
                    }
                }
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"class" => {
                    if let Some(class) = class.take() {
                        records.extend(class.finish());
                    }
                }
                b"methods" => {
                    if let Some(class) = class.as_mut() {
                        class.methods_depth = class.methods_depth.saturating_sub(1);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const REPORT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<coverage line-rate="0.75" branch-rate="1" version="1.9" timestamp="1700000000" lines-covered="3" lines-valid="4">
  <sources>
    <source>/work/Calculator/</source>
  </sources>
  <packages>
    <package name="Calculator" line-rate="0.75" branch-rate="1" complexity="2">
      <classes>
        <class name="Calculator.Math" filename="Math.cs" line-rate="0.75" branch-rate="1" complexity="2">
          <methods>
            <method name="Add" signature="(System.Int32,System.Int32)" line-rate="1" branch-rate="1">
              <lines>
                <line number="8" hits="4" branch="False" />
              </lines>
            </method>
          </methods>
          <lines>
            <line number="8" hits="4" branch="False" />
            <line number="9" hits="4" branch="False" />
            <line number="13" hits="1" branch="False" />
            <line number="14" hits="0" branch="False" />
          </lines>
        </class>
      </classes>
    </package>
  </packages>
</coverage>
"#;

    fn line(number: u32, covered: bool) -> LineCoverage {
        LineCoverage {
            line_number: number,
            covered,
        }
    }

    #[test]
    fn test_parse_cobertura() -> Result<(), ParseError> {
        let records = parse(REPORT)?;

        assert_eq!(
            records,
            vec![CoverageRecord {
                file_path: "Math.cs".to_owned(),
                percentage: 75.0,
                lines: vec![
                    line(8, true),
                    line(9, true),
                    line(13, true),
                    line(14, false),
                ],
            }]
        );

        Ok(())
    }

    #[test]
    fn test_single_and_repeated_elements() -> Result<(), ParseError> {
        let text = r#"<coverage><packages>
            <package name="A"><classes>
              <class filename="a.cs" line-rate="1"><lines><line number="1" hits="2"/></lines></class>
            </classes></package>
            <package name="B"><classes>
              <class filename="b.cs" line-rate="0.5"><lines>
                <line number="1" hits="1"/><line number="2" hits="0"/>
              </lines></class>
              <class filename="c.cs" line-rate="0"/>
            </classes></package>
        </packages></coverage>"#;

        let records = parse(text)?;
        let summary: Vec<(&str, f64, usize)> = records
            .iter()
            .map(|r| (r.file_path.as_str(), r.percentage, r.lines.len()))
            .collect();

        assert_eq!(
            summary,
            vec![("a.cs", 100.0, 1), ("b.cs", 50.0, 2), ("c.cs", 0.0, 0)]
        );

        Ok(())
    }

    #[test]
    fn test_missing_line_rate_is_derived() -> Result<(), ParseError> {
        let text = r#"<coverage><packages><package><classes>
            <class filename="a.cs"><lines>
              <line number="1" hits="1"/><line number="2" hits="0"/>
            </lines></class>
        </classes></package></packages></coverage>"#;

        let records = parse(text)?;
        assert_eq!(records[0].percentage, 50.0);

        Ok(())
    }

    #[test]
    fn test_invalid_attribute() {
        let text = r#"<coverage><packages><package><classes>
            <class filename="a.cs" line-rate="high"/>
        </classes></package></packages></coverage>"#;

        assert!(matches!(
            parse(text),
            Err(ParseError::Attribute {
                attribute: "line-rate",
                ..
            })
        ));
    }

    #[test]
    fn test_malformed_xml() {
        let text = "<coverage><packages></coverage>";
        assert!(parse(text).is_err());
    }
}
