//! # Data structures
//!
//! Representations of the problem data after parsing: sparse matrices and the canonical and
//! two-stage forms of the linear program.
pub mod linear_algebra;
pub mod linear_program;
