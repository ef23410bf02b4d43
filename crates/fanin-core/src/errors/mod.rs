pub mod diagnostic;

pub use diagnostic::Diagnostic;

use thiserror::Error;

/// Call shape accepted by root construction.
pub const CONSTRUCTOR_SIGNATURE: &str = "reporter([name: text], [target: number], callback)";

/// Call shape accepted by sub-reporter derivation.
pub const SUB_REPORTER_SIGNATURE: &str = "reporter.sub_reporter([name: text], [target: number])";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReporterErrorKind {
    MissingArguments,
    InvalidTargetUnits,
    InvalidCallback,
    UnresolvableArguments,
    ExtraCompletionReport,
}

impl ReporterErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingArguments => "missing_arguments",
            Self::InvalidTargetUnits => "invalid_target_units",
            Self::InvalidCallback => "invalid_callback",
            Self::UnresolvableArguments => "unresolvable_arguments",
            Self::ExtraCompletionReport => "extra_completion_report",
        }
    }

    /// Validation kinds are raised at construction or derivation time.
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::ExtraCompletionReport)
    }
}

/// Errors raised synchronously by reporter construction and reporting.
///
/// Failures of the coordinated work itself never show up here: those are
/// handed to the completion callback as `Err(anyhow::Error)`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReporterError {
    #[error("a reporter needs a completion callback: {}", CONSTRUCTOR_SIGNATURE)]
    MissingArguments,

    #[error("reporter {name}: target units must be a positive integer, got {value}")]
    InvalidTargetUnits { name: String, value: String },

    #[error("reporter {name}: argument {position} should be a callback, got {found}")]
    InvalidCallback {
        name: String,
        position: usize,
        found: String,
    },

    #[error("unresolvable reporter arguments [{shape}]: expected {expected}")]
    UnresolvableArguments {
        shape: String,
        expected: &'static str,
    },

    #[error("reporter {name} has reported done too many times (target: {target}, done: {done})")]
    ExtraCompletionReport {
        name: String,
        target: usize,
        done: usize,
    },
}

impl ReporterError {
    pub fn kind(&self) -> ReporterErrorKind {
        match self {
            Self::MissingArguments => ReporterErrorKind::MissingArguments,
            Self::InvalidTargetUnits { .. } => ReporterErrorKind::InvalidTargetUnits,
            Self::InvalidCallback { .. } => ReporterErrorKind::InvalidCallback,
            Self::UnresolvableArguments { .. } => ReporterErrorKind::UnresolvableArguments,
            Self::ExtraCompletionReport { .. } => ReporterErrorKind::ExtraCompletionReport,
        }
    }

    pub fn invalid_target(name: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidTargetUnits {
            name: name.into(),
            value: value.to_string(),
        }
    }

    pub fn invalid_callback(
        name: impl Into<String>,
        position: usize,
        found: impl Into<String>,
    ) -> Self {
        Self::InvalidCallback {
            name: name.into(),
            position,
            found: found.into(),
        }
    }

    pub fn unresolvable(shape: impl Into<String>, expected: &'static str) -> Self {
        Self::UnresolvableArguments {
            shape: shape.into(),
            expected,
        }
    }

    /// Multi-line rendering for terminals and logs.
    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic::from_error(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{ReporterError, ReporterErrorKind};

    #[test]
    fn kind_matches_variant() {
        assert_eq!(
            ReporterError::MissingArguments.kind(),
            ReporterErrorKind::MissingArguments
        );
        assert_eq!(
            ReporterError::invalid_target("r", 0).kind(),
            ReporterErrorKind::InvalidTargetUnits
        );
        assert_eq!(
            ReporterError::invalid_callback("r", 3, "text").kind(),
            ReporterErrorKind::InvalidCallback
        );
        assert_eq!(
            ReporterError::unresolvable("bool", super::CONSTRUCTOR_SIGNATURE).kind(),
            ReporterErrorKind::UnresolvableArguments
        );
    }

    #[test]
    fn extra_report_is_not_a_validation_error() {
        let err = ReporterError::ExtraCompletionReport {
            name: "walker".to_string(),
            target: 2,
            done: 3,
        };
        assert!(!err.kind().is_validation());
        assert!(ReporterErrorKind::InvalidCallback.is_validation());
        assert_eq!(
            err.to_string(),
            "reporter walker has reported done too many times (target: 2, done: 3)"
        );
    }

    #[test]
    fn invalid_target_message_names_reporter() {
        let err = ReporterError::invalid_target("reporter_4", "-1");
        assert_eq!(
            err.to_string(),
            "reporter reporter_4: target units must be a positive integer, got -1"
        );
    }
}
