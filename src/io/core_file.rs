//! # Reading core (`.cor`) files
//!
//! The core file describes the deterministic linear program underlying an SMPS triplet in MPS
//! form. Parsing checks syntax only; consistency of the described program (unknown row names and
//! the like) is checked when the record is canonicalized.
use std::str::FromStr;

use log::debug;

use crate::data::linear_program::elements::{BOUND_KIND_TAGS, BoundKind, RowKind};
use crate::io::error::{FileLocation, Format, Import};
use crate::io::fields::{FieldFormat, fields, into_lines, is_data_line, parse_value};

/// Contents of a core file, with declaration order preserved.
///
/// Built once by `parse` and read-only thereafter.
#[derive(Debug, PartialEq)]
pub struct CoreFile {
    /// Problem name from the NAME header.
    pub problem_name: String,
    /// All rows, including the objective row, in declaration order.
    pub rows: Vec<Row>,
    /// All columns in declaration order.
    pub columns: Vec<Column>,
    /// Right-hand side sets.
    pub rhs: Vec<ValueGroup>,
    /// Range sets.
    pub ranges: Vec<ValueGroup>,
    /// Bound sets.
    pub bounds: Vec<BoundGroup>,
}

/// A named row and its kind.
#[derive(Debug, Eq, PartialEq)]
pub struct Row {
    /// Row name.
    pub name: String,
    /// Kind tag of the ROWS section.
    pub kind: RowKind,
}

/// A column and its coefficients, in file order.
#[derive(Debug, PartialEq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// (row name, coefficient) pairs.
    pub entries: Vec<(String, f64)>,
}

/// A named group of (row name, value) pairs, as appearing in the RHS and RANGES sections.
#[derive(Debug, PartialEq)]
pub struct ValueGroup {
    /// Set name (first field of each record).
    pub name: String,
    /// (row name, value) pairs in file order.
    pub entries: Vec<(String, f64)>,
}

/// A named group of bound records.
#[derive(Debug, PartialEq)]
pub struct BoundGroup {
    /// Bound set name.
    pub name: String,
    /// (kind, column name, value) triples in file order.
    pub entries: Vec<(BoundKind, String, f64)>,
}

/// The sections of a core file that can hold data records.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Section {
    Rows,
    Columns,
    Rhs,
    Ranges,
    Bounds,
}

/// Marks a variable type change in the COLUMNS section; skipped, since integer semantics are not
/// interpreted and all variables are treated as continuous.
const COLUMN_SECTION_MARKER: &str = "'MARKER'";

/// Parse a core file, in string form, to a `CoreFile`.
///
/// # Errors
///
/// `Format` when a section keyword or record is not recognized, `Unsupported` for valid MPS
/// bound kinds outside the supported subset.
pub fn parse(text: &str, format: FieldFormat) -> Result<CoreFile, Import> {
    let mut problem_name = None;
    let mut section = None;
    let mut rows = Vec::new();
    let mut columns: Vec<Column> = Vec::new();
    let mut rhs: Vec<ValueGroup> = Vec::new();
    let mut ranges: Vec<ValueGroup> = Vec::new();
    let mut bounds: Vec<BoundGroup> = Vec::new();

    for (number, line) in into_lines(text) {
        let location = (number, line);
        if is_data_line(line) {
            match section {
                None => return Err(Format::with_location(
                    "Data record before any section header", location,
                ).into()),
                Some(Section::Rows) => parse_row_record(&mut rows, format, location)?,
                Some(Section::Columns) => parse_column_record(&mut columns, format, location)?,
                Some(Section::Rhs) => parse_group_record(&mut rhs, format, location)?,
                Some(Section::Ranges) => parse_group_record(&mut ranges, format, location)?,
                Some(Section::Bounds) => parse_bound_record(&mut bounds, format, location)?,
            }
        } else {
            let mut tokens = line.split_whitespace();
            let keyword = tokens.next().expect("blank lines are filtered out");
            section = match keyword {
                "NAME" => {
                    problem_name = Some(tokens.next().ok_or_else(|| Format::with_location(
                        "NAME header without a problem name", location,
                    ))?.to_string());
                    None
                },
                "ROWS" => Some(Section::Rows),
                "COLUMNS" => Some(Section::Columns),
                "RHS" => Some(Section::Rhs),
                "RANGES" => Some(Section::Ranges),
                "BOUNDS" => Some(Section::Bounds),
                "ENDATA" => break,
                _ => return Err(Format::with_location(
                    format!("Core file has unrecognized section \"{}\"", keyword), location,
                ).into()),
            };
        }
    }

    let problem_name = problem_name
        .ok_or_else(|| Format::new("Core file has no NAME header"))?;
    debug!(
        "parsed core file \"{}\": {} rows, {} columns",
        problem_name, rows.len(), columns.len(),
    );

    Ok(CoreFile { problem_name, rows, columns, rhs, ranges, bounds, })
}

fn parse_row_record(
    rows: &mut Vec<Row>,
    format: FieldFormat,
    location: FileLocation,
) -> Result<(), Import> {
    let [kind, name, ..] = fields(location, format, &["N", "E", "L", "G"])?;
    if name.is_empty() {
        return Err(Format::with_location("Row record without a name", location).into());
    }

    let kind = RowKind::from_str(kind)
        .map_err(|error| error.wrap(format!("Malformed row record on line {}", location.0)))?;
    rows.push(Row { name: name.to_string(), kind, });

    Ok(())
}

fn parse_column_record(
    columns: &mut Vec<Column>,
    format: FieldFormat,
    location: FileLocation,
) -> Result<(), Import> {
    let [_, name, row, value, row2, value2] = fields(location, format, &[])?;
    if row == COLUMN_SECTION_MARKER {
        // INTORG/INTEND blocks: variable types are not interpreted.
        return Ok(());
    }
    if name.is_empty() || row.is_empty() {
        return Err(Format::with_location("Column record without name or row", location).into());
    }

    // Data for one column usually arrives contiguously, but nothing requires that.
    let column = match columns.last_mut().filter(|column| column.name == name) {
        Some(column) => column,
        None => match columns.iter_mut().find(|column| column.name == name) {
            Some(column) => column,
            None => {
                columns.push(Column { name: name.to_string(), entries: Vec::new(), });
                columns.last_mut().expect("just pushed")
            },
        },
    };

    column.entries.push((row.to_string(), parse_value(value, location)?));
    if !row2.is_empty() {
        column.entries.push((row2.to_string(), parse_value(value2, location)?));
    }

    Ok(())
}

fn parse_group_record(
    groups: &mut Vec<ValueGroup>,
    format: FieldFormat,
    location: FileLocation,
) -> Result<(), Import> {
    let [_, name, row, value, row2, value2] = fields(location, format, &[])?;
    if name.is_empty() || row.is_empty() {
        return Err(Format::with_location("Record without set name or row", location).into());
    }

    let group = match groups.iter_mut().find(|group| group.name == name) {
        Some(group) => group,
        None => {
            groups.push(ValueGroup { name: name.to_string(), entries: Vec::new(), });
            groups.last_mut().expect("just pushed")
        },
    };

    group.entries.push((row.to_string(), parse_value(value, location)?));
    if !row2.is_empty() {
        group.entries.push((row2.to_string(), parse_value(value2, location)?));
    }

    Ok(())
}

fn parse_bound_record(
    bounds: &mut Vec<BoundGroup>,
    format: FieldFormat,
    location: FileLocation,
) -> Result<(), Import> {
    let [kind, name, column, value, ..] = fields(location, format, &BOUND_KIND_TAGS)?;
    if column.is_empty() {
        return Err(Format::with_location("Bound record without a column name", location).into());
    }

    let kind = BoundKind::try_from_tag(kind)?;
    // MI and PL bounds don't need a value.
    let value = match kind {
        BoundKind::MinusInfinity | BoundKind::PlusInfinity if value.is_empty() => 0.0,
        _ => parse_value(value, location)?,
    };

    let group = match bounds.iter_mut().find(|group| group.name == name) {
        Some(group) => group,
        None => {
            bounds.push(BoundGroup { name: name.to_string(), entries: Vec::new(), });
            bounds.last_mut().expect("just pushed")
        },
    };
    group.entries.push((kind, column.to_string(), value));

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    /// A complete core file, in a static `&str`.
    pub const CORE_STRING: &str =
"NAME          TESTPROB
ROWS
 N  COST
 L  LIM1
 G  LIM2
 E  MYEQN
COLUMNS
    XONE      COST      1              LIM1      1
    XONE      LIM2      1
    YTWO      COST      4              LIM1      1
    YTWO      MYEQN     -1
RHS
    RHS1      LIM1      5              LIM2      10
    RHS1      MYEQN     7
RANGES
    RNG1      LIM1      4
BOUNDS
 UP BND1      XONE      4
 LO BND1      YTWO      -1
ENDATA";

    #[test]
    fn parse_complete_file() {
        let result = parse(CORE_STRING, FieldFormat::Free).unwrap();

        assert_eq!(result.problem_name, "TESTPROB");
        assert_eq!(result.rows, vec![
            Row { name: "COST".to_string(), kind: RowKind::Objective, },
            Row { name: "LIM1".to_string(), kind: RowKind::LessEqual, },
            Row { name: "LIM2".to_string(), kind: RowKind::GreaterEqual, },
            Row { name: "MYEQN".to_string(), kind: RowKind::Equality, },
        ]);
        assert_eq!(result.columns, vec![
            Column {
                name: "XONE".to_string(),
                entries: vec![
                    ("COST".to_string(), 1.0),
                    ("LIM1".to_string(), 1.0),
                    ("LIM2".to_string(), 1.0),
                ],
            },
            Column {
                name: "YTWO".to_string(),
                entries: vec![
                    ("COST".to_string(), 4.0),
                    ("LIM1".to_string(), 1.0),
                    ("MYEQN".to_string(), -1.0),
                ],
            },
        ]);
        assert_eq!(result.rhs, vec![ValueGroup {
            name: "RHS1".to_string(),
            entries: vec![
                ("LIM1".to_string(), 5.0),
                ("LIM2".to_string(), 10.0),
                ("MYEQN".to_string(), 7.0),
            ],
        }]);
        assert_eq!(result.ranges, vec![ValueGroup {
            name: "RNG1".to_string(),
            entries: vec![("LIM1".to_string(), 4.0)],
        }]);
        assert_eq!(result.bounds, vec![BoundGroup {
            name: "BND1".to_string(),
            entries: vec![
                (BoundKind::Upper, "XONE".to_string(), 4.0),
                (BoundKind::Lower, "YTWO".to_string(), -1.0),
            ],
        }]);
    }

    #[test]
    fn parse_fixed_format() {
        let result = parse(CORE_STRING, FieldFormat::Fixed).unwrap();
        assert_eq!(result, parse(CORE_STRING, FieldFormat::Free).unwrap());
    }

    #[test]
    fn marker_lines_are_skipped() {
        let text = "NAME          TESTPROB
ROWS
 N  COST
 L  LIM1
COLUMNS
    MARK0     'MARKER'                 'INTORG'
    XONE      COST             1   LIM1             1
    MARK1     'MARKER'                 'INTEND'
ENDATA";
        let result = parse(text, FieldFormat::Free).unwrap();
        assert_eq!(result.columns.len(), 1);
        assert_eq!(result.columns[0].entries.len(), 2);
    }

    #[test]
    fn unrecognized_section() {
        let text = "NAME          TESTPROB\nQUADOBJ\n    X X 1.0\nENDATA";
        assert!(matches!(
            parse(text, FieldFormat::Free),
            Err(Import::Format(_)),
        ));
    }

    #[test]
    fn unrecognized_row_kind() {
        let text = "NAME          TESTPROB\nROWS\n X  BAD\nENDATA";
        assert!(matches!(
            parse(text, FieldFormat::Free),
            Err(Import::Format(_)),
        ));
    }

    #[test]
    fn unsupported_bound_kind() {
        let text = "NAME          TESTPROB\nROWS\n N  COST\nBOUNDS\n FR BND1      XONE\nENDATA";
        assert!(matches!(
            parse(text, FieldFormat::Free),
            Err(Import::Unsupported(_)),
        ));
    }

    #[test]
    fn missing_name_header() {
        let text = "ROWS\n N  COST\nENDATA";
        assert!(matches!(
            parse(text, FieldFormat::Free),
            Err(Import::Format(_)),
        ));
    }
}
