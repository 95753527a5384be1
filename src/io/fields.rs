//! # Record field extraction
//!
//! SMPS files are line oriented. A line whose first character is not blank is a section header;
//! every other nonempty line is a data record belonging to the current section. A data record
//! consists of up to six positional fields which this module extracts, either by the fixed
//! character columns of the SMPS convention or by whitespace splitting.
use std::ops::Range;

use crate::io::error::{FileLocation, Format, FormatResult};

/// Indicates the start of a comment line.
pub const COMMENT_INDICATOR: &str = "*";

/// How data record fields are located on a line.
///
/// The time and stochastics formats inherit the fixed field columns of MPS, but files written by
/// whitespace-separating tools are common enough that both strategies are provided.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FieldFormat {
    /// Fields live in fixed character columns; blank fields are unambiguous.
    Fixed,
    /// Fields are whitespace separated.
    ///
    /// A blank first field can't be told apart from a missing one by splitting alone, so each
    /// section provides the set of tags that may legally occupy the first field; any other first
    /// token is taken to be the second field. Empty fields in the middle of a record can't be
    /// represented at all in this format.
    Free,
}

/// Character ranges of the six record fields (0-based; the convention documents them 1-based as
/// 2-3, 5-12, 15-22, 25-36, 40-47 and 50-61).
const FIELDS: [Range<usize>; 6] = [
    1..3,
    4..12,
    14..22,
    24..36,
    39..47,
    49..61,
];

/// Split a file into numbered lines, skipping comments and blank lines.
///
/// Lines are numbered from 1, as an end user would count them.
pub fn into_lines(text: &str) -> impl Iterator<Item = FileLocation> {
    text.lines()
        .enumerate()
        .map(|(number, line)| (number + 1, line))
        .filter(|(_, line)| !line.starts_with(COMMENT_INDICATOR))
        .filter(|(_, line)| !line.trim().is_empty())
}

/// Whether this line is a data record of the currently open section.
///
/// Section headers start at the first character; everything else is data.
pub fn is_data_line(line: &str) -> bool {
    line.starts_with(' ') || line.starts_with('\t')
}

/// Extract the six positional fields of a data record.
///
/// Fields that are absent are returned as the empty string.
///
/// # Arguments
///
/// * `location`: The data record with its line number.
/// * `format`: Extraction strategy.
/// * `field_one_tags`: Tokens that may occupy the first field. Only consulted in the free format;
///   the fixed format decides by position.
///
/// # Errors
///
/// `Format` when a fixed field boundary falls inside a multi-byte character.
pub fn fields<'a>(
    location: FileLocation<'a>,
    format: FieldFormat,
    field_one_tags: &[&str],
) -> FormatResult<[&'a str; 6]> {
    let line = location.1;
    let mut result = [""; 6];
    match format {
        FieldFormat::Fixed => {
            for (slot, range) in result.iter_mut().zip(FIELDS) {
                if line.len() > range.start {
                    *slot = line.get(range.start..range.end.min(line.len()))
                        .ok_or_else(|| Format::with_location(
                            "Field boundaries fall inside a multi-byte character", location,
                        ))?
                        .trim();
                }
            }
        },
        FieldFormat::Free => {
            let mut tokens = line.split_whitespace().peekable();

            let start = match tokens.peek() {
                Some(first) if field_one_tags.contains(first) => 0,
                _ => 1,
            };
            for (slot, token) in result.iter_mut().skip(start).zip(&mut tokens) {
                *slot = token;
            }
        },
    }

    Ok(result)
}

/// Parse a field as a numeric value, with line context on failure.
pub fn parse_value(text: &str, location: FileLocation) -> FormatResult<f64> {
    if text.is_empty() {
        return Err(Format::with_location("Missing numeric field", location));
    }

    text.parse().map_err(|error| Format::wrap_other(
        error,
        format!("Failed to parse value text \"{}\"", text),
    ).wrap(format!("Malformed data record on line {}", location.0)))
}
