//! # Assembly of a two-stage stochastic program
//!
//! Combines the canonical form of the core file with the period split of the time file and the
//! scenarios of the stochastics file into the standard two-stage shape: deterministic first-stage
//! blocks, and per scenario a transition matrix over the first-stage columns, a recourse matrix
//! over the second-stage columns, a right-hand side, costs and bounds.
//!
//! Scenarios form a tree: each realization starts from its parent's data (the core file data for
//! children of the root) and applies its own overrides on top.
use std::collections::{HashMap, HashSet};

use log::warn;

use crate::data::linear_algebra::matrix::SparseMatrix;
use crate::data::linear_program::canonical::{CanonicalLp, canonicalize};
use crate::data::linear_program::elements::{BoundKind, InequalityRow};
use crate::io::core_file::CoreFile;
use crate::io::error::{Import, Inconsistency, Unsupported};
use crate::io::stoch::{Override, Parent, StochFile, Uncertainty};
use crate::io::time::{Periods, TimeFile};

/// A two-stage stochastic linear program in scenario form.
#[derive(Debug, PartialEq)]
pub struct TwoStage {
    /// The deterministic blocks over the first-stage columns and rows.
    pub first_stage: FirstStage,
    /// Names of the second-stage columns; indices in per-scenario data refer to this order.
    pub second_stage_columns: Vec<String>,
    /// Core file row names of the second-stage equality system.
    pub second_stage_equality_rows: Vec<String>,
    /// Identity of each second-stage inequality row.
    pub second_stage_inequality_rows: Vec<InequalityRow>,
    /// One realization per scenario, in file order.
    pub scenarios: Vec<Realization>,
}

/// The deterministic part of the program.
#[derive(Debug, PartialEq)]
pub struct FirstStage {
    /// First-stage costs.
    pub objective: Vec<f64>,
    /// Equality system over the first-stage columns.
    pub equalities: SparseMatrix,
    /// Right-hand side of the equality system.
    pub equality_rhs: Vec<f64>,
    /// Core file row names of the equality system.
    pub equality_row_names: Vec<String>,
    /// Inequality system over the first-stage columns.
    pub inequalities: SparseMatrix,
    /// Right-hand side of the inequality system.
    pub inequality_rhs: Vec<f64>,
    /// Identity of each inequality row.
    pub inequality_rows: Vec<InequalityRow>,
    /// Lower variable bounds.
    pub lower_bounds: Vec<f64>,
    /// Upper variable bounds.
    pub upper_bounds: Vec<f64>,
    /// Variables pinned by FX bounds.
    pub fixed_values: Vec<(usize, f64)>,
    /// First-stage column names.
    pub column_names: Vec<String>,
}

/// The second-stage data of one scenario.
#[derive(Clone, Debug, PartialEq)]
pub struct Realization {
    /// Scenario name.
    pub name: String,
    /// Probability of this scenario occurring.
    pub probability: f64,
    /// Second-stage costs.
    pub objective: Vec<f64>,
    /// Second-stage equality system.
    pub equalities: StageConstraints,
    /// Second-stage inequality system.
    pub inequalities: StageConstraints,
    /// Lower bounds of the second-stage columns.
    pub lower_bounds: Vec<f64>,
    /// Upper bounds of the second-stage columns.
    pub upper_bounds: Vec<f64>,
    /// Second-stage variables pinned by FX bounds of the core file.
    pub fixed_values: Vec<(usize, f64)>,
}

/// One block of second-stage constraints: `T · x + W · y (= or <=) h`.
#[derive(Clone, Debug, PartialEq)]
pub struct StageConstraints {
    /// `T`: coefficients of the first-stage columns.
    pub transition: SparseMatrix,
    /// `W`: coefficients of the second-stage columns.
    pub recourse: SparseMatrix,
    /// `h`: the right-hand side.
    pub rhs: Vec<f64>,
}

/// Assemble the two-stage scenario form of a parsed SMPS triplet.
///
/// # Errors
///
/// `Unsupported` for explicit time files, `Inconsistency` when the period structure is not
/// two-stage, uncertainty is not in scenario form, or data placement contradicts the stage split.
pub fn assemble(
    core: &CoreFile,
    time: &TimeFile,
    stoch: &StochFile,
) -> Result<TwoStage, Import> {
    let lp = canonicalize(core)?;

    let periods = match &time.periods {
        Periods::Implicit(periods) => periods,
        Periods::Explicit(_) => return Err(Unsupported::new(
            "explicit time files in two-stage assembly",
        ).into()),
    };
    let [first_period, second_period] = periods.as_slice() else {
        return Err(Inconsistency::new(format!(
            "problem is not two-stage: time file has {} periods", periods.len(),
        )).into());
    };
    let scenarios = match &stoch.uncertainty {
        Uncertainty::Scenarios(scenarios) => scenarios,
        Uncertainty::Distributions(_) => return Err(Inconsistency::new(
            "uncertainty is not represented as scenarios",
        ).into()),
    };

    if lp.column_names.first() != Some(&first_period.col_start) {
        return Err(Inconsistency::new(format!(
            "first period does not start at the first column \"{}\"",
            lp.column_names.first().map_or("", String::as_str),
        )).into());
    }
    let col_split = lp.column_names.iter()
        .position(|name| name == &second_period.col_start)
        .ok_or_else(|| Inconsistency::new(format!(
            "second period starts at undeclared column \"{}\"", second_period.col_start,
        )))?;
    let row_positions = core.rows.iter()
        .enumerate()
        .map(|(position, row)| (row.name.as_str(), position))
        .collect::<HashMap<_, _>>();
    let row_split = *row_positions.get(second_period.row_start.as_str())
        .ok_or_else(|| Inconsistency::new(format!(
            "second period starts at undeclared row \"{}\"", second_period.row_start,
        )))?;
    let is_second_stage = |name: &str| row_positions[name] >= row_split;

    let (second_eq, first_eq): (Vec<usize>, Vec<usize>) = (0..lp.equality_row_names.len())
        .partition(|&i| is_second_stage(&lp.equality_row_names[i]));
    let (second_ub, first_ub): (Vec<usize>, Vec<usize>) = (0..lp.inequality_rows.len())
        .partition(|&i| is_second_stage(&lp.inequality_rows[i].origin));

    let first_stage = FirstStage {
        objective: lp.objective[..col_split].to_vec(),
        equalities: first_stage_block(&lp.equalities, &first_eq, col_split)?,
        equality_rhs: first_eq.iter().map(|&i| lp.equality_rhs[i]).collect(),
        equality_row_names: first_eq.iter()
            .map(|&i| lp.equality_row_names[i].clone())
            .collect(),
        inequalities: first_stage_block(&lp.inequalities, &first_ub, col_split)?,
        inequality_rhs: first_ub.iter().map(|&i| lp.inequality_rhs[i]).collect(),
        inequality_rows: first_ub.iter().map(|&i| lp.inequality_rows[i].clone()).collect(),
        lower_bounds: lp.lower_bounds[..col_split].to_vec(),
        upper_bounds: lp.upper_bounds[..col_split].to_vec(),
        fixed_values: lp.fixed_values.iter()
            .filter(|&&(j, _)| j < col_split)
            .copied()
            .collect(),
        column_names: lp.column_names[..col_split].to_vec(),
    };

    let second_stage_equality_rows = second_eq.iter()
        .map(|&i| lp.equality_row_names[i].clone())
        .collect::<Vec<_>>();
    let second_stage_inequality_rows = second_ub.iter()
        .map(|&i| lp.inequality_rows[i].clone())
        .collect::<Vec<_>>();

    let (equality_transition, equality_recourse) =
        lp.equalities.select_rows(&second_eq).split_columns(col_split);
    let (inequality_transition, inequality_recourse) =
        lp.inequalities.select_rows(&second_ub).split_columns(col_split);
    let base = Realization {
        name: String::new(),
        probability: 0.0,
        objective: lp.objective[col_split..].to_vec(),
        equalities: StageConstraints {
            transition: equality_transition,
            recourse: equality_recourse,
            rhs: second_eq.iter().map(|&i| lp.equality_rhs[i]).collect(),
        },
        inequalities: StageConstraints {
            transition: inequality_transition,
            recourse: inequality_recourse,
            rhs: second_ub.iter().map(|&i| lp.inequality_rhs[i]).collect(),
        },
        lower_bounds: lp.lower_bounds[col_split..].to_vec(),
        upper_bounds: lp.upper_bounds[col_split..].to_vec(),
        fixed_values: lp.fixed_values.iter()
            .filter(|&&(j, _)| j >= col_split)
            .map(|&(j, value)| (j - col_split, value))
            .collect(),
    };

    let context = OverrideContext {
        lp: &lp,
        col_split,
        equality_local: second_stage_equality_rows.iter()
            .enumerate()
            .map(|(local, name)| (name.as_str(), local))
            .collect(),
        inequality_local: {
            let mut map: HashMap<&str, Vec<usize>> = HashMap::new();
            for (local, row) in second_stage_inequality_rows.iter().enumerate() {
                map.entry(row.origin.as_str()).or_default().push(local);
            }
            map
        },
        inequality_rows: &second_stage_inequality_rows,
        known_rows: core.rows.iter().map(|row| row.name.as_str()).collect(),
    };

    let mut by_name: HashMap<&str, usize> = HashMap::new();
    let mut realizations: Vec<Realization> = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        let mut realization = match &scenario.parent {
            Parent::Root => base.clone(),
            Parent::Scenario(name) => realizations[by_name[name.as_str()]].clone(),
        };
        realization.name = scenario.name.clone();
        realization.probability = scenario.probability;
        for record in &scenario.overrides {
            apply_override(&mut realization, record, &context)?;
        }
        by_name.insert(scenario.name.as_str(), realizations.len());
        realizations.push(realization);
    }

    let total: f64 = realizations.iter().map(|realization| realization.probability).sum();
    if (total - 1.0).abs() > 1e-6 {
        warn!("scenario probabilities of \"{}\" sum to {} rather than one", core.problem_name, total);
    }

    Ok(TwoStage {
        first_stage,
        second_stage_columns: lp.column_names[col_split..].to_vec(),
        second_stage_equality_rows,
        second_stage_inequality_rows,
        scenarios: realizations,
    })
}

/// The listed rows restricted to the first-stage columns.
///
/// # Errors
///
/// `Inconsistency` when any of the rows has a coefficient in a second-stage column.
fn first_stage_block(
    matrix: &SparseMatrix,
    rows: &[usize],
    col_split: usize,
) -> Result<SparseMatrix, Inconsistency> {
    let (block, spill) = matrix.select_rows(rows).split_columns(col_split);
    if spill.size() != 0 {
        return Err(Inconsistency::new(
            "a first-stage row references a second-stage column",
        ));
    }

    Ok(block)
}

/// Lookup data needed to interpret scenario override records.
struct OverrideContext<'a> {
    lp: &'a CanonicalLp,
    col_split: usize,
    /// Second-stage equality row name to local index.
    equality_local: HashMap<&'a str, usize>,
    /// Core file row name to the local indices of all second-stage inequality rows derived from
    /// it.
    inequality_local: HashMap<&'a str, Vec<usize>>,
    /// Second-stage inequality rows, in local order.
    inequality_rows: &'a [InequalityRow],
    known_rows: HashSet<&'a str>,
}

impl OverrideContext<'_> {
    fn column(&self, name: &str) -> Option<usize> {
        self.lp.column_names.iter().position(|column| column == name)
    }

    /// Index of a column within the second stage.
    fn second_stage_column(&self, name: &str) -> Result<usize, Inconsistency> {
        let j = self.column(name).ok_or_else(|| Inconsistency::new(format!(
            "scenario override for unknown column \"{}\"", name,
        )))?;
        j.checked_sub(self.col_split).ok_or_else(|| Inconsistency::new(format!(
            "scenario overrides first-stage column \"{}\"", name,
        )))
    }
}

/// Apply one scenario data record to a realization.
///
/// What the record targets is decided by inspection, in this order: a nonempty tag marks a bound
/// override of the tagged kind; a (column, row) pair marks a coefficient override, applied to
/// every row derived from the named row with its stored sign, or to the scenario costs when the
/// row is the objective; a (set name, row) pair marks a right-hand side override.
fn apply_override(
    realization: &mut Realization,
    record: &Override,
    context: &OverrideContext,
) -> Result<(), Import> {
    if !record.tag.is_empty() {
        let kind = BoundKind::try_from_tag(&record.tag)?;
        let j = context.second_stage_column(&record.second)?;
        match kind {
            BoundKind::Upper => realization.upper_bounds[j] = record.value,
            BoundKind::Lower => realization.lower_bounds[j] = record.value,
            // Unlike core file FX bounds, a scenario must pin the value in the bound vectors:
            // there is no per-scenario fixed list to defer to.
            BoundKind::Fixed => {
                realization.lower_bounds[j] = record.value;
                realization.upper_bounds[j] = record.value;
            },
            BoundKind::MinusInfinity => {
                realization.lower_bounds[j] = f64::NEG_INFINITY;
                realization.upper_bounds[j] = 0.0;
            },
            BoundKind::PlusInfinity => {},
        }
        return Ok(());
    }

    let column = context.column(&record.first);
    if !context.known_rows.contains(record.second.as_str()) {
        return Err(Inconsistency::new(format!(
            "scenario override targets unknown row \"{}\"", record.second,
        )).into());
    }

    match column {
        Some(j) if record.second == context.lp.objective_row_name => {
            let local = j.checked_sub(context.col_split)
                .ok_or_else(|| Inconsistency::new(format!(
                    "scenario overrides the cost of first-stage column \"{}\"", record.first,
                )))?;
            realization.objective[local] = record.value;
        },
        Some(j) => {
            if let Some(&local) = context.equality_local.get(record.second.as_str()) {
                set_coefficient(&mut realization.equalities, local, j, record.value, context);
            } else if let Some(locals) = context.inequality_local.get(record.second.as_str()) {
                for &local in locals {
                    let value = context.inequality_rows[local].sign() * record.value;
                    set_coefficient(&mut realization.inequalities, local, j, value, context);
                }
            } else {
                return Err(Inconsistency::new(format!(
                    "scenario overrides first-stage row \"{}\"", record.second,
                )).into());
            }
        },
        None => {
            if record.second == context.lp.objective_row_name {
                return Err(Inconsistency::new(
                    "scenario overrides the right-hand side of the objective row",
                ).into());
            }
            if let Some(&local) = context.equality_local.get(record.second.as_str()) {
                realization.equalities.rhs[local] = record.value;
            } else if let Some(locals) = context.inequality_local.get(record.second.as_str()) {
                for &local in locals {
                    let row = &context.inequality_rows[local];
                    realization.inequalities.rhs[local] = row.sign() * record.value + row.rhs_shift;
                }
            } else {
                return Err(Inconsistency::new(format!(
                    "scenario overrides first-stage row \"{}\"", record.second,
                )).into());
            }
        },
    }

    Ok(())
}

/// Store a coefficient in the transition or recourse matrix, whichever the column falls in.
fn set_coefficient(
    constraints: &mut StageConstraints,
    row: usize,
    column: usize,
    value: f64,
    context: &OverrideContext,
) {
    if column < context.col_split {
        constraints.transition.set_value(row, column, value);
    } else {
        constraints.recourse.set_value(row, column - context.col_split, value);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::io::fields::FieldFormat;
    use crate::io::{core_file, stoch, time};

    const CORE_STRING: &str =
"NAME          FARM
ROWS
 N  COST
 L  LAND
 G  YIELD
 L  CAP
COLUMNS
    X1        COST             2   LAND             1
    X1        YIELD            3
    X2        COST             3   LAND             1
    Y         COST             1   YIELD            1
    Y         CAP              1
RHS
    RHS       LAND            10   YIELD           20
    RHS       CAP              8
ENDATA";

    const TIME_STRING: &str =
"TIME          FARM
PERIODS
    X1        LAND      STAGE1
    Y         YIELD     STAGE2
ENDATA";

    const STOCH_STRING: &str =
"STOCH         FARM
SCENARIOS
 SC GOOD      ROOT      0.5            STAGE2
    X1        YIELD          4.0
 SC BAD       GOOD      0.5            STAGE2
    RHS       YIELD         16.0
 UP BND       Y              6.0
ENDATA";

    fn assembled(
        core: &str,
        time_text: &str,
        stoch_text: &str,
    ) -> Result<TwoStage, Import> {
        assemble(
            &core_file::parse(core, FieldFormat::Free).unwrap(),
            &time::parse(time_text, FieldFormat::Free).unwrap(),
            &stoch::parse(stoch_text, FieldFormat::Free).unwrap(),
        )
    }

    #[test]
    fn first_stage_blocks() {
        let program = assembled(CORE_STRING, TIME_STRING, STOCH_STRING).unwrap();

        let first = &program.first_stage;
        assert_eq!(first.column_names, vec!["X1".to_string(), "X2".to_string()]);
        assert_eq!(first.objective, vec![2.0, 3.0]);
        assert_eq!(first.equalities.nr_rows(), 0);
        assert_eq!(first.inequalities, SparseMatrix::from_data(vec![vec![1.0, 1.0]]));
        assert_eq!(first.inequality_rhs, vec![10.0]);
        assert_eq!(first.inequality_rows[0].origin, "LAND");
        assert_eq!(program.second_stage_columns, vec!["Y".to_string()]);
    }

    #[test]
    fn base_data_and_overrides() {
        let program = assembled(CORE_STRING, TIME_STRING, STOCH_STRING).unwrap();
        assert_eq!(program.scenarios.len(), 2);

        // YIELD is a G row and stored negated; CAP passes through unchanged.
        let good = &program.scenarios[0];
        assert_eq!(good.name, "GOOD");
        assert_eq!(good.probability, 0.5);
        assert_eq!(good.objective, vec![1.0]);
        assert_eq!(good.inequalities.transition, SparseMatrix::from_data(vec![
            vec![-4.0, 0.0],
            vec![0.0, 0.0],
        ]));
        assert_eq!(good.inequalities.recourse, SparseMatrix::from_data(vec![
            vec![-1.0],
            vec![1.0],
        ]));
        assert_eq!(good.inequalities.rhs, vec![-20.0, 8.0]);
        assert_eq!(good.upper_bounds, vec![f64::INFINITY]);

        // BAD branches off GOOD: it inherits the coefficient override and changes the rhs and a
        // bound on top.
        let bad = &program.scenarios[1];
        assert_eq!(bad.name, "BAD");
        assert_eq!(bad.inequalities.transition.get_value(0, 0), -4.0);
        assert_eq!(bad.inequalities.rhs, vec![-16.0, 8.0]);
        assert_eq!(bad.upper_bounds, vec![6.0]);
    }

    #[test]
    fn override_of_ranged_row_updates_both_branches() {
        let core = "NAME          FARM
ROWS
 N  COST
 L  LAND
 L  YIELD
COLUMNS
    X1        COST             2   LAND             1
    Y         COST             1   YIELD            1
RHS
    RHS       LAND            10   YIELD           20
RANGES
    RNG       YIELD            5
ENDATA";
        let time_text = "TIME          FARM
PERIODS
    X1        LAND      STAGE1
    Y         YIELD     STAGE2
ENDATA";
        let stoch_text = "STOCH         FARM
SCENARIOS
 SC ONLY      ROOT      1.0            STAGE2
    RHS       YIELD         30.0
ENDATA";
        let program = assembled(core, time_text, stoch_text).unwrap();

        // YIELD in [b - 5, b]: the direct row keeps rhs b, the lower branch -b + 5.
        let only = &program.scenarios[0];
        assert_eq!(only.inequalities.rhs, vec![30.0, -25.0]);
    }

    #[test]
    fn explicit_time_file() {
        let time_text = "TIME          FARM
PERIODS       EXPLICIT
ROWS
    LAND                               STAGE1
COLUMNS
    X1                                 STAGE1
ENDATA";
        assert!(matches!(
            assembled(CORE_STRING, time_text, STOCH_STRING),
            Err(Import::Unsupported(_)),
        ));
    }

    #[test]
    fn not_two_stage() {
        let time_text = "TIME          FARM
PERIODS
    X1        LAND      STAGE1
    X2        YIELD     STAGE2
    Y         CAP       STAGE3
ENDATA";
        assert!(matches!(
            assembled(CORE_STRING, time_text, STOCH_STRING),
            Err(Import::Inconsistency(_)),
        ));
    }

    #[test]
    fn distributions_are_rejected() {
        let stoch_text = "STOCH         FARM
INDEP         DISCRETE
    Y         YIELD          8.0      STAGE2    1.0
ENDATA";
        assert!(matches!(
            assembled(CORE_STRING, TIME_STRING, stoch_text),
            Err(Import::Inconsistency(_)),
        ));
    }

    #[test]
    fn first_stage_row_with_second_stage_column() {
        let core = "NAME          FARM
ROWS
 N  COST
 L  LAND
 G  YIELD
COLUMNS
    X1        COST             2   LAND             1
    Y         LAND             1   YIELD            1
ENDATA";
        let time_text = "TIME          FARM
PERIODS
    X1        LAND      STAGE1
    Y         YIELD     STAGE2
ENDATA";
        let stoch_text = "STOCH         FARM
SCENARIOS
 SC ONLY      ROOT      1.0            STAGE2
ENDATA";
        assert!(matches!(
            assembled(core, time_text, stoch_text),
            Err(Import::Inconsistency(_)),
        ));
    }

    #[test]
    fn override_of_first_stage_data() {
        let stoch_text = "STOCH         FARM
SCENARIOS
 SC ONLY      ROOT      1.0            STAGE2
    X1        LAND           2.0
ENDATA";
        assert!(matches!(
            assembled(CORE_STRING, TIME_STRING, stoch_text),
            Err(Import::Inconsistency(_)),
        ));
    }

    #[test]
    fn override_of_unknown_row() {
        let stoch_text = "STOCH         FARM
SCENARIOS
 SC ONLY      ROOT      1.0            STAGE2
    RHS       NOWHERE        2.0
ENDATA";
        assert!(matches!(
            assembled(CORE_STRING, TIME_STRING, stoch_text),
            Err(Import::Inconsistency(_)),
        ));
    }
}
