// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use regex::Regex;

use crate::{TestOutcome, TestResult};

const MAX_STACK_TRACE_LINES: usize = 20;

const PASSED_GLYPHS: &[char] = &['✓', '✔'];
const FAILED_GLYPHS: &[char] = &['✗', '✘', '×'];
const SKIPPED_GLYPHS: &[char] = &['○', '⊘', '↷'];

lazy_static::lazy_static! {
    static ref TEST_NAME_REGEX: Regex =
        Regex::new(r"(?i)^\s*test\s*name:\s*(?P<name>.*?)\s*$").unwrap();
    static ref METHOD_NAME_REGEX: Regex =
        Regex::new(r"(?i)^\s*(?:test\s+)?method(?:\s*name)?:\s*(?P<name>.*?)\s*$").unwrap();
    static ref DURATION_REGEX: Regex =
        Regex::new(r"(?i)^\s*duration:\s*(?P<value>\S+?)\s*(?P<unit>ms|s)\s*$").unwrap();
    static ref ERROR_MESSAGE_REGEX: Regex =
        Regex::new(r"(?i)^\s*error\s*message:\s*(?P<message>.*?)\s*$").unwrap();
    static ref STACK_TRACE_REGEX: Regex = Regex::new(r"(?i)^\s*stack\s*trace:").unwrap();
    static ref GLYPH_DURATION_REGEX: Regex =
        Regex::new(r"(?i)^(?P<name>.*?)\s*\[\s*(?P<value>[^\]\s]+?)\s*(?P<unit>ms|s)\s*\]$").unwrap();
}

// Fields collected for the test case currently being scanned.
#[derive(Debug, Default)]
struct PendingOutcome {
    name: Option<String>,
    duration_millis: Option<f64>,
    error_message: Option<String>,
    stack_trace: Option<String>,
}

impl PendingOutcome {
    fn set_name_if_unset(&mut self, name: &str) {
        if self.name.is_none() && !name.is_empty() {
            self.name = Some(name.to_string());
        }
    }

    fn seal(self, result: TestResult) -> TestOutcome {
        let failed = result == TestResult::Failed;

        TestOutcome {
            name: self.name.unwrap_or_default(),
            result,
            duration_millis: self.duration_millis,
            error_message: self.error_message.filter(|_| failed),
            stack_trace: self.stack_trace.filter(|_| failed),
        }
    }
}

fn parse_duration(value: &str, unit: &str) -> Option<f64> {
    let value = value.parse::<f64>().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    if unit.eq_ignore_ascii_case("s") {
        Some(value * 1000.0)
    } else {
        Some(value)
    }
}

// Text after a glyph marker, e.g. `Adds [4 ms]`.
#[derive(Debug, PartialEq)]
struct GlyphLabel<'a> {
    name: &'a str,
    duration_millis: Option<f64>,
}

impl<'a> GlyphLabel<'a> {
    fn parse(text: &'a str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let label = match GLYPH_DURATION_REGEX.captures(text) {
            Some(parsed) => {
                let name = parsed.name("name").map_or("", |m| m.as_str());
                let duration = match (parsed.name("value"), parsed.name("unit")) {
                    (Some(value), Some(unit)) => parse_duration(value.as_str(), unit.as_str()),
                    _ => None,
                };
                Self {
                    name,
                    duration_millis: duration,
                }
            }
            None => Self {
                name: text,
                duration_millis: None,
            },
        };

        Some(label)
    }
}

// Lines that start, feed or seal a record, and so can never be message text.
fn is_marker(line: &str) -> bool {
    TEST_NAME_REGEX.is_match(line)
        || METHOD_NAME_REGEX.is_match(line)
        || DURATION_REGEX.is_match(line)
        || ERROR_MESSAGE_REGEX.is_match(line)
        || STACK_TRACE_REGEX.is_match(line)
        || terminal_marker(line).is_some()
}

// Returns the outcome signalled by a line, plus the label that trails a
// glyph marker.
fn terminal_marker(line: &str) -> Option<(TestResult, Option<GlyphLabel<'_>>)> {
    if line.contains("Failed!") {
        return Some((TestResult::Failed, None));
    }

    if line.contains("Passed!") {
        return Some((TestResult::Passed, None));
    }

    if line.contains("Skipped") {
        return Some((TestResult::Skipped, None));
    }

    let trimmed = line.trim_start();
    let glyph = trimmed.chars().next()?;
    let result = if PASSED_GLYPHS.contains(&glyph) {
        TestResult::Passed
    } else if FAILED_GLYPHS.contains(&glyph) {
        TestResult::Failed
    } else if SKIPPED_GLYPHS.contains(&glyph) {
        TestResult::Skipped
    } else {
        return None;
    };

    let label = GlyphLabel::parse(&trimmed[glyph.len_utf8()..]);

    Some((result, label))
}

pub(crate) fn parse_test_output(text: &str) -> Vec<TestOutcome> {
    let lines: Vec<&str> = text.lines().collect();

    let mut outcomes = vec![];
    let mut current: Option<PendingOutcome> = None;

    let mut ix = 0;
    while ix < lines.len() {
        let line = lines[ix];
        ix += 1;

        if let Some(parsed) = TEST_NAME_REGEX.captures(line) {
            let name = parsed.name("name").map_or("", |m| m.as_str());
            current.get_or_insert_with(Default::default).set_name_if_unset(name);
        } else if let Some(parsed) = METHOD_NAME_REGEX.captures(line) {
            if let Some(pending) = current.as_mut() {
                let name = parsed.name("name").map_or("", |m| m.as_str());
                pending.set_name_if_unset(name);
            }
        } else if let Some(parsed) = DURATION_REGEX.captures(line) {
            let duration = match (parsed.name("value"), parsed.name("unit")) {
                (Some(value), Some(unit)) => parse_duration(value.as_str(), unit.as_str()),
                _ => None,
            };
            let pending = current.get_or_insert_with(Default::default);
            match duration {
                Some(duration) => pending.duration_millis = Some(duration),
                None => log::debug!("ignoring malformed duration: {}", line.trim()),
            }
        } else if let Some(parsed) = ERROR_MESSAGE_REGEX.captures(line) {
            let Some(pending) = current.as_mut() else {
                continue;
            };

            let inline = parsed.name("message").map_or("", |m| m.as_str());
            if !inline.is_empty() {
                pending.error_message = Some(inline.to_string());
            } else {
                // the message follows the label, possibly after blank lines
                let next = (ix..lines.len()).find(|&n| !lines[n].trim().is_empty());
                if let Some(next) = next.filter(|&n| !is_marker(lines[n])) {
                    pending.error_message = Some(lines[next].trim().to_string());
                    ix = next + 1;
                }
            }
        } else if STACK_TRACE_REGEX.is_match(line) {
            let start = ix;
            while ix < lines.len()
                && ix - start < MAX_STACK_TRACE_LINES
                && !lines[ix].trim().is_empty()
            {
                ix += 1;
            }

            if let Some(pending) = current.as_mut() {
                if ix > start {
                    pending.stack_trace = Some(lines[start..ix].join("\n"));
                }
            }
        } else if let Some((result, label)) = terminal_marker(line) {
            let mut pending = current.take().unwrap_or_default();
            if let Some(label) = label {
                pending.set_name_if_unset(label.name);
                if pending.duration_millis.is_none() {
                    pending.duration_millis = label.duration_millis;
                }
            }
            outcomes.push(pending.seal(result));
        }
    }

    if let Some(pending) = current {
        log::debug!(
            "dropping unfinished test record at end of output: {:?}",
            pending.name
        );
    }

    outcomes
}
