//! # SMPS triplets
//!
//! Complete triplets read from disk, in the fixed field columns of the SMPS convention.
use std::path::{Path, PathBuf};

/// # Reading and assembly
mod test;

/// Relative path of the folder where the triplet files are stored.
///
/// The path is relative to the project root folder.
fn problem_file_directory() -> PathBuf {
    Path::new(file!()).parent().unwrap().join("problem_files")
}

/// Compute the path of the core file of a triplet, based on the problem name.
///
/// # Arguments
///
/// * `name`: Problem name without extension.
fn get_test_file_path(name: &str) -> PathBuf {
    problem_file_directory().join(name).with_extension("cor")
}
