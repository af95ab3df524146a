//! Error types for rowmap.
//!
//! Every fallible operation in the workspace returns [`Result`]. The variants follow
//! the layer that raised them:
//!
//! - [`Error::Argument`]: invalid caller input, raised before any side effect.
//! - [`Error::Domain`]: a rule of the mapping core was violated. Execution failures are
//!   folded into this variant exactly once (kind [`DomainErrorKind::Execution`]).
//! - [`Error::Lifecycle`]: an operation was invoked on a disposed session.
//! - [`Error::Driver`]: raised by `Connection`/`Command` implementations.
//! - [`Error::Conversion`]: a value could not be converted to the requested type.

use std::fmt;

/// Boxed error used as the cause of wrapped failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type for all rowmap operations.
#[derive(Debug)]
pub enum Error {
    /// Invalid caller input.
    Argument(ArgumentError),
    /// A business rule of the mapping core was violated, or an execution failed.
    Domain(DomainError),
    /// The object has already been disposed.
    Lifecycle(LifecycleError),
    /// Failure reported by the underlying connectivity layer.
    Driver(DriverError),
    /// A value could not be converted between its database and member forms.
    Conversion(ConversionError),
}

/// Invalid caller input.
#[derive(Debug)]
pub struct ArgumentError {
    /// Name of the offending parameter.
    pub param: &'static str,
    pub message: String,
}

/// Classification of a [`DomainError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainErrorKind {
    /// The identifier of an instance is still at its default value.
    IdentifierNotSet,
    /// An `ObjectDelta` without changes was used for an update.
    EmptyDelta,
    /// A type has no usable table mapping.
    Mapping,
    /// An instance is not in a valid state for the requested operation.
    InvalidInstance,
    /// The configured dialect cannot express the requested operation.
    Unsupported,
    /// A command failed while executing; the cause is attached as `source`.
    Execution,
}

/// A business-rule violation detected by the mapping core.
#[derive(Debug)]
pub struct DomainError {
    pub kind: DomainErrorKind,
    pub message: String,
    /// Underlying cause, present for [`DomainErrorKind::Execution`].
    pub source: Option<BoxError>,
}

/// An operation was invoked after the owning object was disposed.
#[derive(Debug)]
pub struct LifecycleError {
    /// Name of the disposed object (e.g. `"Session"`).
    pub object: &'static str,
    pub message: String,
}

/// Failure raised by a `Connection` or `Command` implementation.
#[derive(Debug)]
pub struct DriverError {
    pub message: String,
    pub source: Option<BoxError>,
}

/// A value could not be converted.
#[derive(Debug)]
pub struct ConversionError {
    /// Description of the source value (usually its variant name).
    pub from: String,
    /// Name of the target type.
    pub to: &'static str,
    pub message: String,
}

impl Error {
    /// Create an argument error for `param`.
    pub fn argument(param: &'static str, message: impl Into<String>) -> Self {
        Error::Argument(ArgumentError {
            param,
            message: message.into(),
        })
    }

    /// Create a domain error without a cause.
    pub fn domain(kind: DomainErrorKind, message: impl Into<String>) -> Self {
        Error::Domain(DomainError {
            kind,
            message: message.into(),
            source: None,
        })
    }

    /// Create a mapping error.
    pub fn mapping(message: impl Into<String>) -> Self {
        Self::domain(DomainErrorKind::Mapping, message)
    }

    /// Create a lifecycle error for the named object.
    pub fn disposed(object: &'static str) -> Self {
        Error::Lifecycle(LifecycleError {
            object,
            message: format!("cannot access a disposed {object}"),
        })
    }

    /// Create a driver error.
    pub fn driver(message: impl Into<String>) -> Self {
        Error::Driver(DriverError {
            message: message.into(),
            source: None,
        })
    }

    /// Create a conversion error.
    pub fn conversion(from: impl Into<String>, to: &'static str, message: impl Into<String>) -> Self {
        Error::Conversion(ConversionError {
            from: from.into(),
            to,
            message: message.into(),
        })
    }

    /// True for errors raised deliberately by the mapping core.
    ///
    /// Domain errors are never re-wrapped by [`Error::into_execution`].
    pub fn is_domain(&self) -> bool {
        matches!(self, Error::Domain(_))
    }

    /// The domain error kind, if this is a domain error.
    pub fn domain_kind(&self) -> Option<DomainErrorKind> {
        match self {
            Error::Domain(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Fold an execution failure into a domain error carrying the original as cause.
    ///
    /// Domain errors are returned unchanged.
    #[must_use]
    pub fn into_execution(self) -> Self {
        if self.is_domain() {
            return self;
        }
        Error::Domain(DomainError {
            kind: DomainErrorKind::Execution,
            message: self.message().to_string(),
            source: Some(Box::new(self)),
        })
    }

    /// The human readable message of this error, without prefixes.
    pub fn message(&self) -> &str {
        match self {
            Error::Argument(e) => &e.message,
            Error::Domain(e) => &e.message,
            Error::Lifecycle(e) => &e.message,
            Error::Driver(e) => &e.message,
            Error::Conversion(e) => &e.message,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Argument(e) => write!(f, "invalid argument `{}`: {}", e.param, e.message),
            Error::Domain(e) => write!(f, "{}", e.message),
            Error::Lifecycle(e) => write!(f, "{}", e.message),
            Error::Driver(e) => write!(f, "driver error: {}", e.message),
            Error::Conversion(e) => write!(
                f,
                "cannot convert {} to {}: {}",
                e.from, e.to, e.message
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Domain(DomainError {
                source: Some(source),
                ..
            })
            | Error::Driver(DriverError {
                source: Some(source),
                ..
            }) => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result alias used throughout rowmap.
pub type Result<T> = std::result::Result<T, Error>;
