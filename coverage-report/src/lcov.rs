// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::{CoverageRecord, LineCoverage, ParseError};

const SOURCE_FILE_PREFIX: &str = "SF:";
const LINE_DATA_PREFIX: &str = "DA:";
const END_OF_RECORD: &str = "end_of_record";

// `DA:<line>,<hits>[,<checksum>]`
fn parse_line_data(data: &str) -> Option<(u32, i64)> {
    let mut fields = data.split(',');
    let line = fields.next()?.trim().parse().ok()?;
    let hits = fields.next()?.trim().parse().ok()?;
    Some((line, hits))
}

/// Parse an LCOV tracefile.
///
/// Only records closed by `end_of_record` are returned. An `SF:` line that
/// arrives while another record is still open discards the open record.
pub fn parse(text: &str) -> Result<Vec<CoverageRecord>, ParseError> {
    let mut records = vec![];
    let mut current: Option<(String, Vec<LineCoverage>)> = None;

    for (ix, line) in text.lines().enumerate() {
        let line = line.trim();

        if let Some(path) = line.strip_prefix(SOURCE_FILE_PREFIX) {
            if let Some((lost, _)) = current.replace((path.to_owned(), vec![])) {
                log::debug!("discarding unterminated LCOV record: {}", lost);
            }
        } else if let Some(data) = line.strip_prefix(LINE_DATA_PREFIX) {
            let Some((_, lines)) = current.as_mut() else {
                continue;
            };

            let (number, hits) = parse_line_data(data).ok_or_else(|| ParseError::Lcov {
                line: ix + 1,
                text: line.to_owned(),
            })?;

            lines.push(LineCoverage::new(number, hits > 0)?);
        } else if line == END_OF_RECORD {
            if let Some((path, lines)) = current.take() {
                records.push(CoverageRecord::from_lines(path, lines));
            }
        }
    }

    if let Some((path, _)) = current {
        log::debug!("discarding LCOV record without end_of_record: {}", path);
    }

    Ok(records)
}
