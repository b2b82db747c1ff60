// SPDX-License-Identifier: MIT

use std::fmt;

/// Errors raised by the metadata tree.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataError {
    /// A metadata node can only wrap a mapping or a sequence.
    NotAContainer { found: String },

    /// The operation is defined for mapping nodes only.
    NotAMapping { operation: &'static str },

    /// The document text could not be parsed.
    InvalidDocument { reason: String },

    /// Placeholder expansion failed while loading a document.
    Resolve(ResolveError),
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataError::NotAContainer { found } => {
                write!(f, "a metadata node must wrap a mapping or a sequence, got {}", found)
            }
            MetadataError::NotAMapping { operation } => {
                write!(f, "'{}' is only defined on mapping nodes", operation)
            }
            MetadataError::InvalidDocument { reason } => {
                write!(f, "invalid metadata document: {}", reason)
            }
            MetadataError::Resolve(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for MetadataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MetadataError::Resolve(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResolveError> for MetadataError {
    fn from(err: ResolveError) -> Self {
        MetadataError::Resolve(err)
    }
}

/// Errors raised while expanding `${resolver:args}` placeholders in a
/// metadata document.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// A `${` with no matching closing brace.
    UnterminatedPlaceholder { text: String },

    /// No resolver registered under the referenced name.
    UnknownResolver { name: String },

    /// A builtin resolver received the wrong number of arguments.
    Arity {
        name: &'static str,
        expected: usize,
        got: usize,
    },

    /// The timestamp argument did not match any accepted format.
    BadTimestamp { input: String },

    /// The timedelta argument violated the duration grammar.
    Timedelta(TimedeltaParseError),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::UnterminatedPlaceholder { text } => {
                write!(f, "unterminated '${{' placeholder in '{}'", text)
            }
            ResolveError::UnknownResolver { name } => {
                write!(f, "no resolver registered under '{}'", name)
            }
            ResolveError::Arity {
                name,
                expected,
                got,
            } => {
                write!(f, "resolver '{}' expects {} argument(s), got {}", name, expected, got)
            }
            ResolveError::BadTimestamp { input } => {
                write!(f, "'{}' is not a recognized timestamp", input)
            }
            ResolveError::Timedelta(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Timedelta(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TimedeltaParseError> for ResolveError {
    fn from(err: TimedeltaParseError) -> Self {
        ResolveError::Timedelta(err)
    }
}

/// Violations of the duration grammar `\s*(\d+)\s*(ms|us|ns|ps|fs|as|D|h|m|s)`.
///
/// Years and months are intentionally not part of the unit set; they are
/// not fixed-duration.
#[derive(Debug, Clone, PartialEq)]
pub enum TimedeltaParseError {
    /// Empty or whitespace-only input.
    Empty,

    /// A unit with no leading number, e.g. `"ms"`.
    MissingNumber { input: String },

    /// A number with no unit, e.g. `"12"`.
    MissingUnit { input: String },

    /// A unit outside the fixed set, e.g. `"12y"`.
    UnknownUnit { input: String, unit: String },

    /// A grammar-valid delta too large to represent as a duration.
    OutOfRange { input: String },
}

impl fmt::Display for TimedeltaParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimedeltaParseError::Empty => {
                write!(f, "empty timedelta; expected '<number><unit>'")
            }
            TimedeltaParseError::MissingNumber { input } => {
                write!(f, "timedelta '{}' has no leading number", input)
            }
            TimedeltaParseError::MissingUnit { input } => {
                write!(f, "timedelta '{}' has no unit", input)
            }
            TimedeltaParseError::OutOfRange { input } => {
                write!(f, "timedelta '{}' is too large to represent", input)
            }
            TimedeltaParseError::UnknownUnit { input, unit } => {
                write!(
                    f,
                    "timedelta '{}' uses unknown unit '{}' (expected one of ms, us, ns, ps, fs, as, D, h, m, s)",
                    input, unit
                )
            }
        }
    }
}

impl std::error::Error for TimedeltaParseError {}
