//! # Reading time (`.tim`) files
//!
//! The time file partitions the rows and columns of the core file into periods (stages). Two
//! styles exist: the common implicit style marks, for each period, the first column and row in
//! core file declaration order; the explicit style lists every row and column membership
//! individually.
use log::debug;

use crate::io::error::{FileLocation, Format, Import};
use crate::io::fields::{FieldFormat, fields, into_lines, is_data_line};

/// Contents of a time file.
#[derive(Debug, PartialEq)]
pub struct TimeFile {
    /// Problem name from the TIME header.
    pub problem_name: String,
    /// The period structure, in file order.
    pub periods: Periods,
}

/// The two styles of describing the period partition.
#[derive(Debug, PartialEq)]
pub enum Periods {
    /// Periods are contiguous stretches of core file declaration order, each given by its first
    /// column and row.
    Implicit(Vec<ImplicitPeriod>),
    /// Row and column memberships are listed one by one.
    Explicit(Vec<ExplicitPeriod>),
}

/// One period of an implicit time file.
#[derive(Debug, Eq, PartialEq)]
pub struct ImplicitPeriod {
    /// Period name, referenced by the stochastics file.
    pub name: String,
    /// Name of the first core file row belonging to this period.
    pub row_start: String,
    /// Name of the first core file column belonging to this period.
    pub col_start: String,
}

/// One period of an explicit time file.
#[derive(Debug, Eq, PartialEq)]
pub struct ExplicitPeriod {
    /// Period name.
    pub name: String,
    /// Names of the rows assigned to this period.
    pub rows: Vec<String>,
    /// Names of the columns assigned to this period.
    pub columns: Vec<String>,
}

/// Second token of the PERIODS header that selects the explicit style. Any other token, or none,
/// selects the implicit style.
const EXPLICIT_MARKER: &str = "EXPLICIT";

/// Parse a time file, in string form, to a `TimeFile`.
///
/// # Errors
///
/// `Format` when the section structure or a record is malformed.
pub fn parse(text: &str, format: FieldFormat) -> Result<TimeFile, Import> {
    let mut problem_name = None;
    let mut periods = None;
    let mut explicit_section = ExplicitSection::None;

    for (number, line) in into_lines(text) {
        let location = (number, line);
        if is_data_line(line) {
            match (&mut periods, explicit_section) {
                (None, _) => return Err(Format::with_location(
                    "Data record before the PERIODS section", location,
                ).into()),
                (Some(Periods::Implicit(periods)), _) => {
                    parse_implicit_record(periods, format, location)?;
                },
                (Some(Periods::Explicit(periods)), ExplicitSection::None) => {
                    parse_period_declaration(periods, format, location)?;
                },
                (Some(Periods::Explicit(periods)), section) => {
                    parse_explicit_record(periods, section, format, location)?;
                },
            }
        } else {
            let mut tokens = line.split_whitespace();
            let keyword = tokens.next().expect("blank lines are filtered out");
            match keyword {
                "TIME" => {
                    problem_name = Some(tokens.next().ok_or_else(|| Format::with_location(
                        "TIME header without a problem name", location,
                    ))?.to_string());
                },
                "PERIODS" => {
                    periods = Some(match tokens.next() {
                        Some(EXPLICIT_MARKER) => Periods::Explicit(Vec::new()),
                        _ => Periods::Implicit(Vec::new()),
                    });
                    explicit_section = ExplicitSection::None;
                },
                "ROWS" | "COLUMNS" => {
                    match periods {
                        Some(Periods::Explicit(_)) => {
                            explicit_section = if keyword == "ROWS" {
                                ExplicitSection::Rows
                            } else {
                                ExplicitSection::Columns
                            };
                        },
                        _ => return Err(Format::with_location(
                            format!("{} section outside an explicit PERIODS section", keyword),
                            location,
                        ).into()),
                    }
                },
                "ENDATA" => break,
                _ => return Err(Format::with_location(
                    format!("Time file has unrecognized section \"{}\"", keyword), location,
                ).into()),
            }
        }
    }

    let problem_name = problem_name
        .ok_or_else(|| Format::new("Time file has no TIME header"))?;
    let periods = periods
        .ok_or_else(|| Format::new("Time file has no PERIODS section"))?;
    debug!(
        "parsed time file \"{}\": {} periods",
        problem_name,
        match &periods {
            Periods::Implicit(periods) => periods.len(),
            Periods::Explicit(periods) => periods.len(),
        },
    );

    Ok(TimeFile { problem_name, periods, })
}

/// Which subsection of an explicit PERIODS section is currently open.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum ExplicitSection {
    None,
    Rows,
    Columns,
}

fn parse_implicit_record(
    periods: &mut Vec<ImplicitPeriod>,
    format: FieldFormat,
    location: FileLocation,
) -> Result<(), Import> {
    let [_, col_start, row_start, name, ..] = fields(location, format, &[])?;
    if col_start.is_empty() || row_start.is_empty() || name.is_empty() {
        return Err(Format::with_location(
            "Implicit period record needs a column, a row and a period name", location,
        ).into());
    }

    // Additional records for a known period are ignored; the first mention wins.
    if !periods.iter().any(|period| period.name == name) {
        periods.push(ImplicitPeriod {
            name: name.to_string(),
            row_start: row_start.to_string(),
            col_start: col_start.to_string(),
        });
    }

    Ok(())
}

/// Records between an explicit PERIODS header and the first ROWS or COLUMNS subsection declare
/// the periods and their order. They share the implicit record layout; the column and row fields
/// carry no meaning here and are ignored.
fn parse_period_declaration(
    periods: &mut Vec<ExplicitPeriod>,
    format: FieldFormat,
    location: FileLocation,
) -> Result<(), Import> {
    let [_, _, _, name, ..] = fields(location, format, &[])?;
    if name.is_empty() {
        return Err(Format::with_location(
            "Period declaration record without a period name", location,
        ).into());
    }

    if !periods.iter().any(|period| period.name == name) {
        periods.push(ExplicitPeriod {
            name: name.to_string(),
            rows: Vec::new(),
            columns: Vec::new(),
        });
    }

    Ok(())
}

fn parse_explicit_record(
    periods: &mut Vec<ExplicitPeriod>,
    section: ExplicitSection,
    format: FieldFormat,
    location: FileLocation,
) -> Result<(), Import> {
    let [_, member, name, ..] = fields(location, format, &[])?;
    if member.is_empty() || name.is_empty() {
        return Err(Format::with_location(
            "Explicit period record needs a member name and a period name", location,
        ).into());
    }

    let period = match periods.iter_mut().find(|period| period.name == name) {
        Some(period) => period,
        None => {
            periods.push(ExplicitPeriod {
                name: name.to_string(),
                rows: Vec::new(),
                columns: Vec::new(),
            });
            periods.last_mut().expect("just pushed")
        },
    };
    match section {
        ExplicitSection::Rows => period.rows.push(member.to_string()),
        ExplicitSection::Columns => period.columns.push(member.to_string()),
        ExplicitSection::None => unreachable!("caller checks for an open subsection"),
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    pub const TIME_STRING: &str =
"TIME          TESTPROB
PERIODS       IMPLICIT
    XONE      LIM1      PERIOD1
    YTWO      LIM2      PERIOD2
ENDATA";

    #[test]
    fn parse_implicit() {
        let result = parse(TIME_STRING, FieldFormat::Free).unwrap();

        assert_eq!(result.problem_name, "TESTPROB");
        assert_eq!(result.periods, Periods::Implicit(vec![
            ImplicitPeriod {
                name: "PERIOD1".to_string(),
                row_start: "LIM1".to_string(),
                col_start: "XONE".to_string(),
            },
            ImplicitPeriod {
                name: "PERIOD2".to_string(),
                row_start: "LIM2".to_string(),
                col_start: "YTWO".to_string(),
            },
        ]));
    }

    #[test]
    fn parse_implicit_fixed() {
        let result = parse(TIME_STRING, FieldFormat::Fixed).unwrap();
        assert_eq!(result, parse(TIME_STRING, FieldFormat::Free).unwrap());
    }

    #[test]
    fn first_record_per_period_wins() {
        let text = "TIME          TESTPROB
PERIODS
    XONE      LIM1                     PERIOD1
    YTWO      LIM2                     PERIOD1
ENDATA";
        let result = parse(text, FieldFormat::Free).unwrap();
        assert_eq!(result.periods, Periods::Implicit(vec![ImplicitPeriod {
            name: "PERIOD1".to_string(),
            row_start: "LIM1".to_string(),
            col_start: "XONE".to_string(),
        }]));
    }

    #[test]
    fn parse_explicit() {
        let text = "TIME          TESTPROB
PERIODS       EXPLICIT
ROWS
    LIM1                               PERIOD1
    LIM2                               PERIOD2
COLUMNS
    XONE                               PERIOD1
    YTWO                               PERIOD2
ENDATA";
        let result = parse(text, FieldFormat::Free).unwrap();

        assert_eq!(result.periods, Periods::Explicit(vec![
            ExplicitPeriod {
                name: "PERIOD1".to_string(),
                rows: vec!["LIM1".to_string()],
                columns: vec!["XONE".to_string()],
            },
            ExplicitPeriod {
                name: "PERIOD2".to_string(),
                rows: vec!["LIM2".to_string()],
                columns: vec!["YTWO".to_string()],
            },
        ]));
    }

    #[test]
    fn explicit_period_declarations() {
        // Declaration records under the PERIODS header fix the period order, even when the ROWS
        // subsection first mentions the periods in a different order.
        let text = "TIME          TESTPROB
PERIODS       EXPLICIT
    XONE      LIM1      PERIOD1
    YTWO      LIM2      PERIOD2
ROWS
    LIM2                               PERIOD2
    LIM1                               PERIOD1
COLUMNS
    XONE                               PERIOD1
    YTWO                               PERIOD2
ENDATA";
        let result = parse(text, FieldFormat::Free).unwrap();

        assert_eq!(result.periods, Periods::Explicit(vec![
            ExplicitPeriod {
                name: "PERIOD1".to_string(),
                rows: vec!["LIM1".to_string()],
                columns: vec!["XONE".to_string()],
            },
            ExplicitPeriod {
                name: "PERIOD2".to_string(),
                rows: vec!["LIM2".to_string()],
                columns: vec!["YTWO".to_string()],
            },
        ]));
    }

    #[test]
    fn rows_section_requires_explicit_style() {
        let text = "TIME          TESTPROB
PERIODS
ROWS
    LIM1                               PERIOD1
ENDATA";
        assert!(matches!(
            parse(text, FieldFormat::Free),
            Err(Import::Format(_)),
        ));
    }

    #[test]
    fn missing_periods_section() {
        let text = "TIME          TESTPROB\nENDATA";
        assert!(matches!(
            parse(text, FieldFormat::Free),
            Err(Import::Format(_)),
        ));
    }
}
