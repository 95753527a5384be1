//! # Error reporting for reading of SMPS file triplets
//!
//! A hierarchy of types describing problems encountered while reading and interpreting the core,
//! time and stochastics files. All of them are fatal: a partially built numeric model is worse
//! than none, so nothing is ever downgraded to a default.
use std::error;
use std::fmt;
use std::io;

/// Top of the io error hierarchy, created when an error is encountered during IO or parsing.
#[derive(Debug)]
pub enum Import {
    /// The file to read wasn't found, or reading it couldn't start or was interrupted.
    IO(io::Error),
    /// Contents of a file could not be parsed.
    ///
    /// # Note
    ///
    /// This variant is only for syntactically incorrect files; a file that parses but describes a
    /// contradictory problem yields `Inconsistency` instead.
    Format(Format),
    /// The file uses a part of the SMPS convention this crate doesn't implement.
    Unsupported(Unsupported),
    /// There is a logical inconsistency in the problem described by the files.
    ///
    /// For example, a column section might mention a row that was never declared.
    Inconsistency(Inconsistency),
}

impl fmt::Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::IO(error) => write!(f, "IO error: {}", error),
            Self::Format(error) => error.fmt(f),
            Self::Unsupported(error) => error.fmt(f),
            Self::Inconsistency(error) => error.fmt(f),
        }
    }
}

impl error::Error for Import {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::IO(error) => Some(error),
            Self::Format(error) => Some(error),
            Self::Unsupported(error) => Some(error),
            Self::Inconsistency(error) => Some(error),
        }
    }
}

impl From<Format> for Import {
    fn from(error: Format) -> Self {
        Self::Format(error)
    }
}

impl From<Unsupported> for Import {
    fn from(error: Unsupported) -> Self {
        Self::Unsupported(error)
    }
}

impl From<Inconsistency> for Import {
    fn from(error: Inconsistency) -> Self {
        Self::Inconsistency(error)
    }
}

/// A line in a file being parsed: the line number as read from disk (counting from 1) and the
/// line contents.
pub type FileLocation<'a> = (usize, &'a str);

/// Shorthand for results of parsing steps.
pub type FormatResult<T> = Result<T, Format>;

/// All errors of a syntactic nature.
///
/// May recursively hold more `Format` errors to provide detail; at the end of the chain there may
/// be the file location at which the error was caused.
#[derive(Debug)]
pub struct Format {
    description: String,
    source: Option<FormatSource>,
}

#[derive(Debug)]
enum FormatSource {
    Location(usize, String),
    Nested(Box<Format>),
    Other(Box<dyn error::Error>),
}

impl Format {
    /// Create a new `Format` error with only a description.
    pub fn new(description: impl Into<String>) -> Self {
        Self { description: description.into(), source: None, }
    }

    /// Create a new `Format` error caused at a specific line.
    pub fn with_location(description: impl Into<String>, location: FileLocation) -> Self {
        let (number, line) = location;
        Self {
            description: description.into(),
            source: Some(FormatSource::Location(number, line.to_string())),
        }
    }

    /// Wrap this error in a new one with a higher-level description.
    #[must_use]
    pub fn wrap(self, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            source: Some(FormatSource::Nested(Box::new(self))),
        }
    }

    /// Create a new `Format` error caused by an error of a foreign type.
    pub fn wrap_other(error: impl error::Error + 'static, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            source: Some(FormatSource::Other(Box::new(error))),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Format error: {}", self.description)?;
        match &self.source {
            None => Ok(()),
            Some(FormatSource::Location(number, line)) => {
                write!(f, "\n\tCaused at line {}:\t{}", number, line)
            },
            Some(FormatSource::Nested(error)) => write!(f, "\n{}", error),
            Some(FormatSource::Other(error)) => write!(f, "\n\tCaused by: {}", error),
        }
    }
}

impl error::Error for Format {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.source {
            Some(FormatSource::Nested(error)) => Some(error.as_ref()),
            Some(FormatSource::Other(error)) => Some(error.as_ref()),
            _ => None,
        }
    }
}

/// Created when a file is syntactically valid SMPS but uses a feature outside the supported
/// subset, such as a non-DISCRETE random variable or an explicit time file fed to the two-stage
/// assembler.
#[derive(Debug)]
pub struct Unsupported {
    description: String,
}

impl Unsupported {
    /// Wrap a description of the unsupported feature, including the offending token.
    pub fn new(description: impl Into<String>) -> Self {
        Self { description: description.into(), }
    }

    /// Describe an unsupported feature encountered at a specific line.
    pub fn with_location(description: impl Into<String>, location: FileLocation) -> Self {
        let (number, line) = location;
        Self {
            description: format!("{} (line {}: \"{}\")", description.into(), number, line),
        }
    }
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Unsupported feature: {}", self.description)
    }
}

impl error::Error for Unsupported {
}

/// Created when the problem description is logically inconsistent.
///
/// This error is about the description of the problem only; it does not concern itself with
/// feasibility or boundedness.
#[derive(Debug)]
pub struct Inconsistency {
    description: String,
}

impl Inconsistency {
    /// Wrap a human-readable description of the inconsistency.
    pub fn new(description: impl Into<String>) -> Self {
        Self { description: description.into(), }
    }
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Inconsistency error: {}", self.description)
    }
}

impl error::Error for Inconsistency {
}

#[cfg(test)]
mod test {
    use std::error::Error;

    use super::*;

    #[test]
    fn format_chain_display() {
        let inner = Format::with_location("Unrecognized section \"SIMPLE\"", (3, "SIMPLE"));
        let outer = inner.wrap("Error while parsing the stochastics file");

        let text = outer.to_string();
        assert!(text.contains("stochastics file"));
        assert!(text.contains("SIMPLE"));
        assert!(text.contains("line 3"));
        assert!(outer.source().is_some());
    }

    #[test]
    fn import_from_variants() {
        let import: Import = Inconsistency::new("more than one objective row").into();
        assert!(matches!(import, Import::Inconsistency(_)));

        let import: Import = Unsupported::new("random variable kind \"NORMAL\"").into();
        assert!(matches!(import, Import::Unsupported(_)));

        let import: Import = Format::new("empty file").into();
        assert!(matches!(import, Import::Format(_)));
    }
}
