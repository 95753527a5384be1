//! # Linear algebra
pub mod matrix;
