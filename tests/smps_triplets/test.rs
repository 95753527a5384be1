use approx::assert_relative_eq;

use smps::data::linear_program::two_stage::TwoStage;
use smps::io::error::Import;
use smps::io::fields::FieldFormat;
use smps::io::{FileTriplet, import};

use super::get_test_file_path;

fn assemble(name: &str) -> TwoStage {
    import(get_test_file_path(name)).unwrap()
        .two_stage().unwrap()
}

#[test]
fn farm_two_stage() {
    let program = assemble("farm");

    let first = &program.first_stage;
    assert_eq!(first.column_names, vec!["X1".to_string(), "X2".to_string()]);
    assert_eq!(first.objective, vec![150.0, 230.0]);
    assert_eq!(first.equality_row_names, vec!["PLANT".to_string()]);
    assert_eq!(first.inequality_rhs, vec![100.0]);
    assert_eq!(first.upper_bounds, vec![f64::INFINITY, 60.0]);

    assert_eq!(program.second_stage_columns, vec!["Y1".to_string(), "Y2".to_string()]);
    assert_eq!(program.second_stage_equality_rows, vec!["BALANCE".to_string()]);
    // YIELD, QUOTA and the synthetic lower end of the ranged QUOTA.
    assert_eq!(program.second_stage_inequality_rows.len(), 3);

    assert_eq!(program.scenarios.len(), 3);
    let total: f64 = program.scenarios.iter()
        .map(|scenario| scenario.probability)
        .sum();
    assert_relative_eq!(total, 1.0, epsilon = 1e-12);

    // The G row YIELD is stored negated, so the overridden coefficient and rhs appear with a
    // flipped sign; the rhs override of the ranged QUOTA reaches both derived rows.
    let below = &program.scenarios[2];
    assert_eq!(below.name, "BELOW");
    assert_eq!(below.inequalities.transition.get_value(0, 0), -2.0);
    assert_eq!(below.inequalities.rhs, vec![-180.0, 100.0, -60.0]);
    assert_eq!(below.lower_bounds, vec![0.0, 20.0]);
    assert_eq!(below.upper_bounds, vec![50.0, 20.0]);
}

#[test]
fn farm_fixed_format() {
    let triplet = FileTriplet::from_any(get_test_file_path("farm"));
    let problem = triplet.read(FieldFormat::Fixed).unwrap();
    let program = problem.two_stage().unwrap();

    assert_eq!(program.scenarios.len(), 3);
    assert_eq!(program.scenarios[0].inequalities.transition.get_value(0, 0), -3.0);
}

#[test]
fn farm_canonical() {
    let lp = import(get_test_file_path("farm")).unwrap()
        .canonicalize().unwrap();

    assert_eq!(lp.objective, vec![150.0, 230.0, -170.0, -150.0]);
    assert_eq!(lp.equalities.nr_rows(), 2);
    // #L + #G + #ranged L
    assert_eq!(lp.inequalities.nr_rows(), 2 + 1 + 1);
    assert_eq!(lp.inequality_rhs, vec![100.0, -200.0, 120.0, -80.0]);
}

#[test]
fn mismatched_problem_names() {
    let result = import(get_test_file_path("mismatch"));
    assert!(matches!(result, Err(Import::Inconsistency(_))));
}

#[test]
fn distributions_parse_but_do_not_assemble() {
    let problem = import(get_test_file_path("indep")).unwrap();
    assert!(matches!(
        problem.two_stage(),
        Err(Import::Inconsistency(_)),
    ));
}
