use std::error::Error as StdError;
use std::fmt;

/// Errors surfaced by a wrapped operation.
///
/// Every kind reaches the caller unchanged; nothing is retried or recovered
/// inside the wrapper.
#[derive(Debug)]
pub enum Error {
    /// An input check rejected the arguments before the target ran.
    InvalidInput(Rejection),
    /// An output check rejected the target's result.
    InvalidOutput(Rejection),
    /// The target itself failed.
    Target(TargetFailure),
}

impl Error {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::InvalidOutput(_) => ErrorKind::InvalidOutput,
            Error::Target(_) => ErrorKind::Target,
        }
    }

    /// Returns the rejection details for `InvalidInput` and `InvalidOutput`.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Error::InvalidInput(r) | Error::InvalidOutput(r) => Some(r),
            Error::Target(_) => None,
        }
    }

    /// Returns the target failure, if this is one.
    pub fn target_failure(&self) -> Option<&TargetFailure> {
        match self {
            Error::Target(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(r) => write!(f, "Invalid input: {}", r),
            Error::InvalidOutput(r) => write!(f, "Invalid output: {}", r),
            Error::Target(t) => write!(f, "Target failure: {}", t),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Target(t) => Some(t),
            _ => None,
        }
    }
}

/// The kind of a wrapper error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An argument failed an input check.
    InvalidInput,
    /// The result failed an output check.
    InvalidOutput,
    /// The target failed.
    Target,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput => write!(f, "invalid input"),
            Self::InvalidOutput => write!(f, "invalid output"),
            Self::Target => write!(f, "target failure"),
        }
    }
}

/// A check that refused a value.
///
/// Carries the label of the check and a rendering of the offending value
/// (the argument for input checks, the result for output checks). The
/// operation name is filled in by the wrapper that ran the check.
///
/// # Examples
///
/// ```
/// use wrap_core::Rejection;
///
/// let rejection = Rejection::new("y != 0", "0");
/// assert_eq!(rejection.check(), "y != 0");
/// assert_eq!(rejection.value(), "0");
/// assert_eq!(rejection.operation(), "");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    operation: String,
    check: String,
    value: String,
}

impl Rejection {
    /// Creates a rejection for the named check and the rendered value.
    pub fn new(check: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            operation: String::new(),
            check: check.into(),
            value: value.into(),
        }
    }

    pub(crate) fn for_operation(mut self, operation: &str) -> Self {
        if self.operation.is_empty() {
            self.operation = operation.to_string();
        }
        self
    }

    /// Returns the name of the operation whose check failed.
    ///
    /// Empty until the rejection has passed through a wrapper.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Returns the label of the failing check.
    pub fn check(&self) -> &str {
        &self.check
    }

    /// Returns the rendered offending value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operation.is_empty() {
            write!(f, "check '{}' rejected {}", self.check, self.value)
        } else {
            write!(
                f,
                "{}: check '{}' rejected {}",
                self.operation, self.check, self.value
            )
        }
    }
}

impl StdError for Rejection {}

/// A failure raised by a target operation.
///
/// The original error is kept as the `source` so callers can downcast it.
///
/// # Examples
///
/// ```
/// use std::error::Error as _;
/// use std::num::ParseIntError;
/// use wrap_core::{operation, Operation};
///
/// let parse = operation("parse", |s: &String| s.parse::<i64>());
/// let err = parse.invoke(&"x".to_string()).unwrap_err();
///
/// let failure = err.target_failure().expect("target failed");
/// assert_eq!(failure.operation(), "parse");
/// assert!(failure.downcast_ref::<ParseIntError>().is_some());
/// assert!(err.source().is_some());
/// ```
#[derive(Debug)]
pub struct TargetFailure {
    operation: String,
    source: Box<dyn StdError + Send + Sync + 'static>,
}

impl TargetFailure {
    /// Creates a failure for the named operation.
    pub fn new(
        operation: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            operation: operation.into(),
            source: source.into(),
        }
    }

    /// Returns the name of the failing operation.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Attempts to view the underlying error as a concrete type.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.source.downcast_ref::<E>()
    }

    /// Consumes the failure and returns the underlying error.
    pub fn into_source(self) -> Box<dyn StdError + Send + Sync + 'static> {
        self.source
    }
}

impl fmt::Display for TargetFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.operation, self.source)
    }
}

impl StdError for TargetFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&*self.source)
    }
}
