//! # Canonicalization of the core file
//!
//! Rewrites the parsed core file into the canonical form
//!
//! ```text
//! minimize    c · x
//! subject to  A_eq · x  =  b_eq
//!             A_ub · x  <= b_ub
//!             l <= x <= u
//! ```
//!
//! L rows pass into the inequality system unchanged, G rows are negated, and ranged rows from the
//! RANGES section contribute synthetic rows enforcing the second end of their interval. Every
//! inequality row remembers the core file row it derives from, so scenario overrides of original
//! data can later be replayed onto all derived rows.
use std::collections::HashMap;

use enum_map::{EnumMap, enum_map};
use itertools::Itertools;
use log::debug;

use crate::data::linear_algebra::matrix::{SparseMatrix, SparseMatrixBuilder};
use crate::data::linear_program::elements::{Branch, BoundKind, InequalityRow, RowKind};
use crate::io::core_file::CoreFile;
use crate::io::error::{Import, Inconsistency};

/// A linear program in canonical form.
///
/// Vectors over columns all use core file column declaration order; `column_names` maps indices
/// back to names.
#[derive(Debug, PartialEq)]
pub struct CanonicalLp {
    /// Dense cost vector.
    pub objective: Vec<f64>,
    /// Name of the core file row the cost vector was read from.
    pub objective_row_name: String,

    /// Coefficients of the `A_eq · x = b_eq` system, one row per unranged E row.
    pub equalities: SparseMatrix,
    /// Right-hand side of the equality system.
    pub equality_rhs: Vec<f64>,
    /// Core file row names of the equality system, parallel to its rows.
    pub equality_row_names: Vec<String>,

    /// Coefficients of the `A_ub · x <= b_ub` system.
    pub inequalities: SparseMatrix,
    /// Right-hand side of the inequality system.
    pub inequality_rhs: Vec<f64>,
    /// Identity and storage convention of each inequality row, parallel to its rows.
    pub inequality_rows: Vec<InequalityRow>,

    /// Lower variable bounds, default `0`.
    pub lower_bounds: Vec<f64>,
    /// Upper variable bounds, default infinity.
    pub upper_bounds: Vec<f64>,
    /// Variables pinned by FX bounds. The `lower_bounds` and `upper_bounds` entries of these
    /// variables keep their defaults.
    pub fixed_values: Vec<(usize, f64)>,

    /// Column names in declaration order.
    pub column_names: Vec<String>,
}

/// Where the coefficients of one core file row end up.
enum RowTarget {
    Objective,
    Equality(usize),
    /// Indices into the inequality system; one for a plain L or G row, two for a ranged row.
    Inequalities(Vec<usize>),
}

/// Rewrite a parsed core file into canonical form.
///
/// # Errors
///
/// `Inconsistency` when the core file references undeclared rows or columns, has no unique
/// objective row, or ranges a row twice.
pub fn canonicalize(core: &CoreFile) -> Result<CanonicalLp, Import> {
    let column_names = core.columns.iter()
        .map(|column| column.name.clone())
        .collect::<Vec<_>>();
    let column_index = column_names.iter()
        .enumerate()
        .map(|(j, name)| (name.as_str(), j))
        .collect::<HashMap<_, _>>();
    let nr_columns = column_names.len();

    let objective_position = core.rows.iter()
        .positions(|row| row.kind == RowKind::Objective)
        .exactly_one()
        .map_err(|_| Inconsistency::new("core file must have exactly one objective (N) row"))?;
    let objective_row_name = core.rows[objective_position].name.clone();

    let ranges = collect_ranges(core, &objective_row_name)?;
    let rhs = collect_rhs(core, &objective_row_name)?;

    // Layout of the inequality system: the direct images of the L and G rows in declaration
    // order, then one synthetic row per ranged L or G row, then a pair per ranged E row.
    let mut equality_row_names = Vec::new();
    let mut inequality_rows = Vec::new();
    let mut targets: HashMap<&str, RowTarget> = HashMap::new();
    targets.insert(&objective_row_name, RowTarget::Objective);
    for row in &core.rows {
        match row.kind {
            RowKind::Objective => {},
            RowKind::Equality if !ranges.contains_key(row.name.as_str()) => {
                targets.insert(&row.name, RowTarget::Equality(equality_row_names.len()));
                equality_row_names.push(row.name.clone());
            },
            RowKind::Equality => {},
            RowKind::LessEqual | RowKind::GreaterEqual => {
                targets.insert(&row.name, RowTarget::Inequalities(vec![inequality_rows.len()]));
                inequality_rows.push(InequalityRow {
                    origin: row.name.clone(),
                    branch: None,
                    negated: row.kind == RowKind::GreaterEqual,
                    rhs_shift: 0.0,
                });
            },
        }
    }
    for row in &core.rows {
        let Some(&range_value) = ranges.get(row.name.as_str()) else { continue };
        match row.kind {
            RowKind::Objective => unreachable!("rejected by collect_ranges"),
            // A ranged L row gains the lower end of its interval, a ranged G the upper end.
            RowKind::LessEqual | RowKind::GreaterEqual => {
                let index = inequality_rows.len();
                match targets.get_mut(row.name.as_str()) {
                    Some(RowTarget::Inequalities(indices)) => indices.push(index),
                    _ => unreachable!("L and G rows were registered above"),
                }
                inequality_rows.push(InequalityRow {
                    origin: row.name.clone(),
                    branch: Some(match row.kind {
                        RowKind::LessEqual => Branch::Lower,
                        _ => Branch::Upper,
                    }),
                    negated: row.kind == RowKind::LessEqual,
                    rhs_shift: range_value.abs(),
                });
            },
            // A ranged E row becomes the interval [b + min(r, 0), b + max(r, 0)].
            RowKind::Equality => {
                let index = inequality_rows.len();
                targets.insert(&row.name, RowTarget::Inequalities(vec![index, index + 1]));
                inequality_rows.push(InequalityRow {
                    origin: row.name.clone(),
                    branch: Some(Branch::Lower),
                    negated: true,
                    rhs_shift: -range_value.min(0.0),
                });
                inequality_rows.push(InequalityRow {
                    origin: row.name.clone(),
                    branch: Some(Branch::Upper),
                    negated: false,
                    rhs_shift: range_value.max(0.0),
                });
            },
        }
    }

    let mut objective = vec![0.0; nr_columns];
    let mut equality_builder = SparseMatrixBuilder::new(equality_row_names.len(), nr_columns);
    let mut inequality_builder = SparseMatrixBuilder::new(inequality_rows.len(), nr_columns);
    for (j, column) in core.columns.iter().enumerate() {
        for (row_name, value) in &column.entries {
            match targets.get(row_name.as_str()) {
                Some(RowTarget::Objective) => objective[j] = *value,
                Some(RowTarget::Equality(i)) => equality_builder.set(*i, j, *value),
                Some(RowTarget::Inequalities(indices)) => {
                    for &index in indices {
                        inequality_builder.set(index, j, inequality_rows[index].sign() * value);
                    }
                },
                None => return Err(Inconsistency::new(format!(
                    "column \"{}\" references undeclared row \"{}\"", column.name, row_name,
                )).into()),
            }
        }
    }

    let equality_rhs = equality_row_names.iter()
        .map(|name| rhs.get(name.as_str()).copied().unwrap_or(0.0))
        .collect();
    let inequality_rhs = inequality_rows.iter()
        .map(|row| {
            let b = rhs.get(row.origin.as_str()).copied().unwrap_or(0.0);
            row.sign() * b + row.rhs_shift
        })
        .collect();

    let (lower_bounds, upper_bounds, fixed_values) = collect_bounds(core, &column_index)?;

    debug!(
        "canonicalized \"{}\": {} columns, {} equality and {} inequality rows",
        core.problem_name, nr_columns, equality_row_names.len(), inequality_rows.len(),
    );

    Ok(CanonicalLp {
        objective,
        objective_row_name,
        equalities: equality_builder.finish(),
        equality_rhs,
        equality_row_names,
        inequalities: inequality_builder.finish(),
        inequality_rhs,
        inequality_rows,
        lower_bounds,
        upper_bounds,
        fixed_values,
        column_names,
    })
}

/// The range value per ranged row. Each row can carry at most one range.
fn collect_ranges<'a>(
    core: &'a CoreFile,
    objective_row_name: &str,
) -> Result<HashMap<&'a str, f64>, Inconsistency> {
    let known = core.rows.iter()
        .map(|row| row.name.as_str())
        .collect::<std::collections::HashSet<_>>();

    let mut ranges = HashMap::new();
    for group in &core.ranges {
        for (row_name, value) in &group.entries {
            if row_name == objective_row_name {
                return Err(Inconsistency::new("the objective row cannot be ranged"));
            }
            if !known.contains(row_name.as_str()) {
                return Err(Inconsistency::new(format!(
                    "range for undeclared row \"{}\"", row_name,
                )));
            }
            if ranges.insert(row_name.as_str(), *value).is_some() {
                return Err(Inconsistency::new(format!(
                    "row \"{}\" is ranged more than once", row_name,
                )));
            }
        }
    }

    Ok(ranges)
}

/// The right-hand side per row name. Rows without an entry default to `0`.
fn collect_rhs<'a>(
    core: &'a CoreFile,
    objective_row_name: &str,
) -> Result<HashMap<&'a str, f64>, Inconsistency> {
    let known = core.rows.iter()
        .map(|row| row.name.as_str())
        .collect::<std::collections::HashSet<_>>();

    let mut rhs = HashMap::new();
    for group in &core.rhs {
        for (row_name, value) in &group.entries {
            if row_name == objective_row_name {
                return Err(Inconsistency::new(
                    "right-hand side value for the objective row",
                ));
            }
            if !known.contains(row_name.as_str()) {
                return Err(Inconsistency::new(format!(
                    "right-hand side for undeclared row \"{}\"", row_name,
                )));
            }
            rhs.insert(row_name.as_str(), *value);
        }
    }

    Ok(rhs)
}

/// Variable bound vectors and the fixed-variable list.
fn collect_bounds(
    core: &CoreFile,
    column_index: &HashMap<&str, usize>,
) -> Result<(Vec<f64>, Vec<f64>, Vec<(usize, f64)>), Inconsistency> {
    struct BoundData {
        lower: Vec<f64>,
        upper: Vec<f64>,
        fixed: Vec<(usize, f64)>,
    }

    fn set_upper(data: &mut BoundData, j: usize, value: f64) {
        data.upper[j] = value;
    }
    fn set_lower(data: &mut BoundData, j: usize, value: f64) {
        data.lower[j] = value;
    }
    fn record_fixed(data: &mut BoundData, j: usize, value: f64) {
        data.fixed.push((j, value));
    }
    fn set_minus_infinity(data: &mut BoundData, j: usize, _: f64) {
        data.lower[j] = f64::NEG_INFINITY;
        data.upper[j] = 0.0;
    }
    fn keep_default(_: &mut BoundData, _: usize, _: f64) {
    }

    let apply: EnumMap<BoundKind, fn(&mut BoundData, usize, f64)> = enum_map! {
        BoundKind::Upper => set_upper,
        BoundKind::Lower => set_lower,
        BoundKind::Fixed => record_fixed,
        BoundKind::MinusInfinity => set_minus_infinity,
        BoundKind::PlusInfinity => keep_default,
    };

    let nr_columns = column_index.len();
    let mut data = BoundData {
        lower: vec![0.0; nr_columns],
        upper: vec![f64::INFINITY; nr_columns],
        fixed: Vec::new(),
    };
    for group in &core.bounds {
        for (kind, column_name, value) in &group.entries {
            let &j = column_index.get(column_name.as_str()).ok_or_else(|| {
                Inconsistency::new(format!(
                    "bound for undeclared column \"{}\"", column_name,
                ))
            })?;
            apply[*kind](&mut data, j, *value);
        }
    }

    Ok((data.lower, data.upper, data.fixed))
}
