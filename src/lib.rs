//! # An SMPS file reader
//!
//! Stochastic linear programs are commonly distributed in the SMPS convention: a triplet of plain
//! text files sharing a base name, consisting of a core file (`.cor`, the deterministic program in
//! MPS form), a time file (`.tim`, the decision stages) and a stochastics file (`.sto`, the
//! uncertainty). This crate reads such a triplet into explicit numeric structures that a solver
//! can consume directly, and decomposes two-stage problems in scenario form into their
//! first-stage and per-scenario second-stage blocks.
#![warn(missing_docs)]

pub mod data;
pub mod io;

#[cfg(test)]
mod tests;
