//! # Building blocks to describe the constraint system.
use std::fmt;
use std::str::FromStr;

use enum_map::Enum;

use crate::io::error::{Format, Import, Unsupported};

/// Classification of a row of the core file.
///
/// Exactly one `Objective` row must exist per problem.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RowKind {
    /// The cost row (`N`).
    Objective,
    /// An `a·x = b` row (`E`).
    Equality,
    /// An `a·x <= b` row (`L`).
    LessEqual,
    /// An `a·x >= b` row (`G`).
    GreaterEqual,
}

impl FromStr for RowKind {
    type Err = Format;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "N" => Ok(Self::Objective),
            "E" => Ok(Self::Equality),
            "L" => Ok(Self::LessEqual),
            "G" => Ok(Self::GreaterEqual),
            _ => Err(Format::new(format!("Row kind \"{}\" not recognized", text))),
        }
    }
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Objective => write!(f, "N"),
            Self::Equality => write!(f, "E"),
            Self::LessEqual => write!(f, "L"),
            Self::GreaterEqual => write!(f, "G"),
        }
    }
}

/// The supported bound kinds of the BOUNDS section.
///
/// The remaining MPS bound kinds (`FR`, `BV`, `UI`, `LI`, `SC`) are recognized but rejected as
/// unsupported; any other tag is a format error.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Enum)]
pub enum BoundKind {
    /// `x <= b`.
    Upper,
    /// `x >= b`.
    Lower,
    /// `x = b`.
    Fixed,
    /// `-inf < x <= 0`.
    MinusInfinity,
    /// `0 <= x < +inf`; the default, so a no-op.
    PlusInfinity,
}

/// Tags that may occupy the first field of a BOUNDS-like record, supported or not.
///
/// Needed by the free field format to recognize the first field; rejection of the unsupported
/// kinds happens when the tag is interpreted.
pub const BOUND_KIND_TAGS: [&str; 10] = ["UP", "LO", "FX", "MI", "PL", "FR", "BV", "UI", "LI", "SC"];

impl BoundKind {
    /// Interpret a bound kind tag.
    ///
    /// # Errors
    ///
    /// `Unsupported` for valid MPS kinds outside the supported subset, `Format` for unknown text.
    pub fn try_from_tag(tag: &str) -> Result<Self, Import> {
        match tag {
            "UP" => Ok(Self::Upper),
            "LO" => Ok(Self::Lower),
            "FX" => Ok(Self::Fixed),
            "MI" => Ok(Self::MinusInfinity),
            "PL" => Ok(Self::PlusInfinity),
            "FR" | "BV" | "UI" | "LI" | "SC" => Err(Unsupported::new(
                format!("bound kind \"{}\"", tag),
            ).into()),
            _ => Err(Format::new(format!("Bound kind \"{}\" not recognized", tag)).into()),
        }
    }
}

/// Which side of a two-sided (ranged) constraint a synthetic inequality row represents.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Branch {
    /// The row enforcing the lower end of the interval.
    Lower,
    /// The row enforcing the upper end of the interval.
    Upper,
}

/// Identity and storage convention of one row of the unified inequality system.
///
/// Synthetic rows produced by the RANGES section are distinguished from the row they originate
/// from by the `branch` tag, a structural key that cannot collide with any user-declared row
/// name. The `negated` flag and `rhs_shift` record how the stored row relates to the original:
/// coefficients are `sign · a` and the right-hand side is `sign · b + rhs_shift`, with `sign`
/// being `-1` when `negated`. They allow scenario overrides of `a` or `b` to be replayed onto
/// every derived row.
#[derive(Clone, Debug, PartialEq)]
pub struct InequalityRow {
    /// Name of the core file row this row was derived from.
    pub origin: String,
    /// `None` for the direct image of an L or G row, the branch tag for a ranged row.
    pub branch: Option<Branch>,
    /// Whether coefficients and rhs are stored sign-flipped relative to the original row.
    pub negated: bool,
    /// Constant added to the (possibly sign-flipped) original rhs, produced by a range value.
    pub rhs_shift: f64,
}

impl InequalityRow {
    /// Sign applied to original coefficients and rhs when storing this row.
    #[must_use]
    pub fn sign(&self) -> f64 {
        if self.negated { -1.0 } else { 1.0 }
    }
}
