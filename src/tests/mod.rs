//! # Integration tests that require a look inside the crate.
//!
//! Convention for function names:
//!
//! * `const CORE_LITERAL_STRING`, `TIME_LITERAL_STRING`, `STOCH_LITERAL_STRING`
//! * `fn core_file()`
//! * `fn time_file()`
//! * `fn stoch_file()`
//! * `fn canonical_lp()`
//! * `fn two_stage()`
