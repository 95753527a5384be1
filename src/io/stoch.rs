//! # Reading stochastics (`.sto`) files
//!
//! The stochastics file describes the uncertain entries of the core file, either as complete
//! scenarios branching off a parent, or as discrete distributions of individual entries (INDEP)
//! and of groups of entries (BLOCKS).
use log::debug;

use crate::data::linear_program::elements::BOUND_KIND_TAGS;
use crate::io::error::{FileLocation, Format, Import, Inconsistency, Unsupported};
use crate::io::fields::{FieldFormat, fields, into_lines, is_data_line, parse_value};

/// Contents of a stochastics file.
#[derive(Debug, PartialEq)]
pub struct StochFile {
    /// Problem name from the STOCH header.
    pub problem_name: String,
    /// How uncertainty is represented.
    pub uncertainty: Uncertainty,
}

/// The two supported representations of uncertainty.
///
/// A file mixing both is rejected as inconsistent.
#[derive(Debug, PartialEq)]
pub enum Uncertainty {
    /// Complete realizations of all uncertain data, as a tree of scenarios.
    Scenarios(Vec<Scenario>),
    /// Discrete distributions of individual entries and of entry groups.
    Distributions(Distributions),
}

/// One scenario of a SCENARIOS section.
#[derive(Debug, PartialEq)]
pub struct Scenario {
    /// Scenario name, unique within the file.
    pub name: String,
    /// The scenario this one branches off.
    pub parent: Parent,
    /// Probability of this scenario occurring.
    pub probability: f64,
    /// Name of the period at which this scenario branches off its parent.
    ///
    /// Read from the fifth record field, where the convention and fixed-column files place it.
    /// Some readers take it from the sixth field instead; files written that way yield an empty
    /// name here. The value is informational: two-stage assembly always branches at the second
    /// period.
    pub period: String,
    /// The data overrides relative to the parent, in file order.
    pub overrides: Vec<Override>,
}

/// What a scenario branches off.
#[derive(Debug, Eq, PartialEq)]
pub enum Parent {
    /// The core file data itself.
    Root,
    /// An earlier scenario in the same file.
    Scenario(String),
}

/// Tag of the core file data parent.
const ROOT_NAME: &str = "ROOT";

/// One data record of a scenario, replacing a single value of the parent.
///
/// What the record targets is only determined against the core file: a nonempty `tag` names a
/// bound kind with `second` the column; otherwise `first` and `second` name a (column, row)
/// coefficient or an (rhs set, row) right-hand side.
#[derive(Debug, PartialEq)]
pub struct Override {
    /// Bound kind tag, or empty for coefficient and rhs records.
    pub tag: String,
    /// Second field of the record.
    pub first: String,
    /// Third field of the record.
    pub second: String,
    /// The replacement value.
    pub value: f64,
}

/// The distribution representation: INDEP entries and BLOCKS groups.
#[derive(Debug, PartialEq)]
pub struct Distributions {
    /// Independently distributed single entries.
    pub independent: Vec<DistributionEntry>,
    /// Jointly distributed entry groups; one element per realization.
    pub blocks: Vec<BlockInstance>,
}

/// The discrete distribution of a single uncertain entry.
#[derive(Debug, PartialEq)]
pub struct DistributionEntry {
    /// Column name of the entry.
    pub column: String,
    /// Row name of the entry.
    pub row: String,
    /// Period the entry belongs to, often left empty.
    pub period: String,
    /// The values the entry can take.
    pub values: Vec<f64>,
    /// Probability of each value, same order and length as `values`.
    pub probabilities: Vec<f64>,
}

/// One realization of a block: a group of entries that change together.
#[derive(Debug, PartialEq)]
pub struct BlockInstance {
    /// Block name; all realizations of one block share it.
    pub name: String,
    /// Period the block belongs to.
    pub period: String,
    /// Probability of this realization.
    pub probability: f64,
    /// (column, row, value) entries of this realization.
    pub entries: Vec<(String, String, f64)>,
}

/// The sections of a stochastics file that can hold data records.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Section {
    Scenarios,
    Indep,
    Blocks,
}

/// Valid SMPS sections this crate doesn't interpret.
const UNSUPPORTED_SECTIONS: [&str; 7] = [
    "SIMPLE", "ROBUST", "PLINQUAD", "CHANCE", "ICC", "NODE", "DISTRIB",
];

/// Parse a stochastics file, in string form, to a `StochFile`.
///
/// # Errors
///
/// `Format` for malformed records, `Unsupported` for non-discrete distributions, modifications
/// other than REPLACE and the sections in `UNSUPPORTED_SECTIONS`, `Inconsistency` when the
/// representation is ambiguous or the scenario tree is broken.
pub fn parse(text: &str, format: FieldFormat) -> Result<StochFile, Import> {
    let mut problem_name = None;
    let mut section = None;
    let mut scenarios: Vec<Scenario> = Vec::new();
    let mut independent: Vec<DistributionEntry> = Vec::new();
    let mut blocks: Vec<BlockInstance> = Vec::new();
    let mut saw_scenarios = false;
    let mut saw_distributions = false;

    for (number, line) in into_lines(text) {
        let location = (number, line);
        if is_data_line(line) {
            match section {
                None => return Err(Format::with_location(
                    "Data record before any section header", location,
                ).into()),
                Some(Section::Scenarios) => {
                    parse_scenario_record(&mut scenarios, format, location)?;
                },
                Some(Section::Indep) => {
                    parse_indep_record(&mut independent, format, location)?;
                },
                Some(Section::Blocks) => {
                    parse_block_record(&mut blocks, format, location)?;
                },
            }
        } else {
            let mut tokens = line.split_whitespace();
            let keyword = tokens.next().expect("blank lines are filtered out");
            section = match keyword {
                "STOCH" => {
                    problem_name = Some(tokens.next().ok_or_else(|| Format::with_location(
                        "STOCH header without a problem name", location,
                    ))?.to_string());
                    None
                },
                "SCENARIOS" => {
                    saw_scenarios = true;
                    Some(Section::Scenarios)
                },
                "INDEP" => {
                    check_distribution_header(&mut tokens, location)?;
                    saw_distributions = true;
                    Some(Section::Indep)
                },
                "BLOCKS" => {
                    check_distribution_header(&mut tokens, location)?;
                    saw_distributions = true;
                    Some(Section::Blocks)
                },
                "ENDATA" => break,
                _ if UNSUPPORTED_SECTIONS.contains(&keyword) => {
                    return Err(Unsupported::with_location(
                        format!("stochastics section \"{}\"", keyword), location,
                    ).into());
                },
                _ => return Err(Format::with_location(
                    format!("Stochastics file has unrecognized section \"{}\"", keyword),
                    location,
                ).into()),
            };
        }
    }

    let problem_name = problem_name
        .ok_or_else(|| Format::new("Stochastics file has no STOCH header"))?;
    let uncertainty = match (saw_scenarios, saw_distributions) {
        (true, false) => Uncertainty::Scenarios(scenarios),
        (false, true) => Uncertainty::Distributions(Distributions { independent, blocks, }),
        (true, true) => return Err(Inconsistency::new(
            "stochastics file mixes scenario and distribution representations",
        ).into()),
        (false, false) => return Err(Inconsistency::new(
            "stochastics file contains neither scenarios nor distributions",
        ).into()),
    };
    debug!("parsed stochastics file \"{}\"", problem_name);

    Ok(StochFile { problem_name, uncertainty, })
}

/// Check the `DISCRETE` and optional `REPLACE` tokens of an INDEP or BLOCKS header.
fn check_distribution_header<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    location: FileLocation,
) -> Result<(), Import> {
    match tokens.next() {
        Some("DISCRETE") => {},
        Some(other) => return Err(Unsupported::with_location(
            format!("random variable kind \"{}\"", other), location,
        ).into()),
        None => return Err(Format::with_location(
            "Distribution header without a random variable kind", location,
        ).into()),
    }
    // REPLACE is the default when the modification token is absent.
    match tokens.next() {
        None | Some("REPLACE") => Ok(()),
        Some(other) => Err(Unsupported::with_location(
            format!("modification \"{}\"", other), location,
        ).into()),
    }
}

fn parse_scenario_record(
    scenarios: &mut Vec<Scenario>,
    format: FieldFormat,
    location: FileLocation,
) -> Result<(), Import> {
    // The SC tag shares the bound tag set, so one tag set recognizes both record shapes.
    let [tag, first, second, value, period, _] = fields(location, format, &BOUND_KIND_TAGS)?;

    if tag == "SC" {
        let (name, parent, probability) = (first, second, value);
        if name.is_empty() || parent.is_empty() {
            return Err(Format::with_location(
                "Scenario header needs a name and a parent", location,
            ).into());
        }
        if scenarios.iter().any(|scenario| scenario.name == name) {
            return Err(Inconsistency::new(
                format!("scenario \"{}\" is declared twice", name),
            ).into());
        }
        let parent = if parent == ROOT_NAME {
            Parent::Root
        } else if scenarios.iter().any(|scenario| scenario.name == parent) {
            Parent::Scenario(parent.to_string())
        } else {
            return Err(Inconsistency::new(format!(
                "scenario \"{}\" branches off unknown scenario \"{}\"", name, parent,
            )).into());
        };

        scenarios.push(Scenario {
            name: name.to_string(),
            parent,
            probability: parse_value(probability, location)?,
            period: period.to_string(),
            overrides: Vec::new(),
        });
        return Ok(());
    }

    let scenario = scenarios.last_mut().ok_or_else(|| Format::with_location(
        "Scenario data record before the first SC header", location,
    ))?;
    if first.is_empty() || second.is_empty() {
        return Err(Format::with_location(
            "Scenario data record needs two names and a value", location,
        ).into());
    }
    scenario.overrides.push(Override {
        tag: tag.to_string(),
        first: first.to_string(),
        second: second.to_string(),
        value: parse_value(value, location)?,
    });

    Ok(())
}

fn parse_indep_record(
    independent: &mut Vec<DistributionEntry>,
    format: FieldFormat,
    location: FileLocation,
) -> Result<(), Import> {
    let [_, column, row, value, period, probability] = fields(location, format, &[])?;
    if column.is_empty() || row.is_empty() {
        return Err(Format::with_location(
            "INDEP record needs a column and a row name", location,
        ).into());
    }
    let value = parse_value(value, location)?;
    let probability = parse_value(probability, location)?;

    // Repeated keys extend the distribution of one entry.
    let entry = match independent.iter_mut().find(|entry| {
        entry.column == column && entry.row == row && entry.period == period
    }) {
        Some(entry) => entry,
        None => {
            independent.push(DistributionEntry {
                column: column.to_string(),
                row: row.to_string(),
                period: period.to_string(),
                values: Vec::new(),
                probabilities: Vec::new(),
            });
            independent.last_mut().expect("just pushed")
        },
    };
    entry.values.push(value);
    entry.probabilities.push(probability);

    Ok(())
}

fn parse_block_record(
    blocks: &mut Vec<BlockInstance>,
    format: FieldFormat,
    location: FileLocation,
) -> Result<(), Import> {
    let [tag, first, second, value, ..] = fields(location, format, &["BL"])?;

    if tag == "BL" {
        let (name, period, probability) = (first, second, value);
        if name.is_empty() {
            return Err(Format::with_location("BL header without a block name", location).into());
        }
        blocks.push(BlockInstance {
            name: name.to_string(),
            period: period.to_string(),
            probability: parse_value(probability, location)?,
            entries: Vec::new(),
        });
        return Ok(());
    }

    let block = blocks.last_mut().ok_or_else(|| Format::with_location(
        "Block data record before the first BL header", location,
    ))?;
    if first.is_empty() || second.is_empty() {
        return Err(Format::with_location(
            "Block data record needs a column and a row name", location,
        ).into());
    }
    block.entries.push((
        first.to_string(),
        second.to_string(),
        parse_value(value, location)?,
    ));

    Ok(())
}
