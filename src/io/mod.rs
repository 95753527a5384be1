//! # Reading SMPS file triplets
//!
//! An SMPS problem is spread over three files sharing a problem name: the core file (`.cor`)
//! holding the deterministic linear program, the time file (`.tim`) splitting it into periods and
//! the stochastics file (`.sto`) describing the uncertain data. This module resolves the triplet
//! on disk, parses the three files and bundles them for further processing.
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::data::linear_program::canonical::{CanonicalLp, canonicalize};
use crate::data::linear_program::two_stage::{self, TwoStage};
use crate::io::core_file::CoreFile;
use crate::io::error::{Import, Inconsistency};
use crate::io::fields::FieldFormat;
use crate::io::stoch::StochFile;
use crate::io::time::TimeFile;

pub mod core_file;
pub mod error;
pub mod fields;
pub mod stoch;
pub mod time;

/// File extension of core files.
const CORE_EXTENSION: &str = "cor";
/// File extension of time files.
const TIME_EXTENSION: &str = "tim";
/// File extension of stochastics files.
const STOCH_EXTENSION: &str = "sto";

/// Import a complete SMPS triplet, deriving the three paths from any one of them.
///
/// Records are read in the free field format, which accepts well-formed fixed-format files too
/// as long as no name contains spaces.
///
/// # Errors
///
/// An `Import` variant for IO, syntax, unsupported-feature and consistency problems.
pub fn import(path: impl AsRef<Path>) -> Result<SmpsProblem, Import> {
    FileTriplet::from_any(path).read(FieldFormat::Free)
}

/// Paths of the three files of an SMPS problem.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileTriplet {
    /// Path of the core file.
    pub core: PathBuf,
    /// Path of the time file.
    pub time: PathBuf,
    /// Path of the stochastics file.
    pub stoch: PathBuf,
}

impl FileTriplet {
    /// Derive the triplet from any one of its paths by replacing the extension.
    pub fn from_any(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self {
            core: path.with_extension(CORE_EXTENSION),
            time: path.with_extension(TIME_EXTENSION),
            stoch: path.with_extension(STOCH_EXTENSION),
        }
    }

    /// Use three explicitly given paths, for triplets not following the extension convention.
    pub fn new(
        core: impl Into<PathBuf>,
        time: impl Into<PathBuf>,
        stoch: impl Into<PathBuf>,
    ) -> Self {
        Self { core: core.into(), time: time.into(), stoch: stoch.into(), }
    }

    /// Read and parse all three files.
    ///
    /// # Errors
    ///
    /// `Import::IO` when a file can't be read, the parse errors of the three file formats, and
    /// `Inconsistency` when the files don't carry the same problem name.
    pub fn read(&self, format: FieldFormat) -> Result<SmpsProblem, Import> {
        debug!("reading SMPS triplet anchored at {}", self.core.display());
        let core = core_file::parse(&read_file(&self.core)?, format)?;
        let time = time::parse(&read_file(&self.time)?, format)?;
        let stoch = stoch::parse(&read_file(&self.stoch)?, format)?;

        // Checked before any matrix is built; a mismatch means the files don't belong together.
        if core.problem_name != time.problem_name || core.problem_name != stoch.problem_name {
            return Err(Inconsistency::new(format!(
                "files disagree on the problem name: \"{}\", \"{}\", \"{}\"",
                core.problem_name, time.problem_name, stoch.problem_name,
            )).into());
        }

        Ok(SmpsProblem { core, time, stoch, })
    }
}

fn read_file(path: &Path) -> Result<String, Import> {
    fs::read_to_string(path).map_err(Import::IO)
}

/// A parsed SMPS triplet.
#[derive(Debug, PartialEq)]
pub struct SmpsProblem {
    /// The parsed core file.
    pub core: CoreFile,
    /// The parsed time file.
    pub time: TimeFile,
    /// The parsed stochastics file.
    pub stoch: StochFile,
}

impl SmpsProblem {
    /// The canonical form of the deterministic core problem.
    ///
    /// # Errors
    ///
    /// See `canonical::canonicalize`.
    pub fn canonicalize(&self) -> Result<CanonicalLp, Import> {
        canonicalize(&self.core)
    }

    /// The two-stage scenario form of the complete problem.
    ///
    /// # Errors
    ///
    /// See `two_stage::assemble`.
    pub fn two_stage(&self) -> Result<TwoStage, Import> {
        two_stage::assemble(&self.core, &self.time, &self.stoch)
    }
}
