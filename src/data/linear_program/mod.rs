//! # Linear programs
//!
//! The canonical deterministic form derived from the core file, and the two-stage scenario form
//! derived from the complete triplet.
pub mod canonical;
pub mod elements;
pub mod two_stage;
