//! Human-readable rendering of reporter errors.
//!
//! Purely cosmetic: nothing in the crate branches on the rendered text.

use super::{ReporterError, CONSTRUCTOR_SIGNATURE, SUB_REPORTER_SIGNATURE};
use std::fmt::{Display, Formatter};

pub mod codes {
    pub const E_MISSING_ARGS: &str = "E_FANIN_MISSING_ARGS";
    pub const E_TARGET_UNITS: &str = "E_FANIN_TARGET_UNITS";
    pub const E_CALLBACK: &str = "E_FANIN_CALLBACK";
    pub const E_ARGS_SHAPE: &str = "E_FANIN_ARGS_SHAPE";
    pub const E_EXTRA_DONE: &str = "E_FANIN_EXTRA_DONE";
}

const HEADER: &str = "fanin ERROR:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: &'static str,
    pub message: String,
    /// Ordered `label: value` lines shown under the message.
    pub context: Vec<(String, String)>,
    pub signature: Option<&'static str>,
    pub fix_steps: Vec<String>,
}

impl Diagnostic {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: Vec::new(),
            signature: None,
            fix_steps: Vec::new(),
        }
    }

    pub fn with_context(mut self, label: impl Into<String>, value: impl ToString) -> Self {
        self.context.push((label.into(), value.to_string()));
        self
    }

    pub fn with_signature(mut self, signature: &'static str) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn with_fix_step(mut self, step: impl Into<String>) -> Self {
        self.fix_steps.push(step.into());
        self
    }

    pub fn from_error(err: &ReporterError) -> Self {
        match err {
            ReporterError::MissingArguments => {
                Diagnostic::new(codes::E_MISSING_ARGS, "a reporter needs at least a callback")
                    .with_signature(CONSTRUCTOR_SIGNATURE)
            }
            ReporterError::InvalidTargetUnits { name, value } => {
                Diagnostic::new(codes::E_TARGET_UNITS, "'target' should be a positive integer")
                    .with_context("reporter.name", name)
                    .with_context("target", value)
                    .with_signature(CONSTRUCTOR_SIGNATURE)
            }
            ReporterError::InvalidCallback {
                name,
                position,
                found,
            } => Diagnostic::new(codes::E_CALLBACK, "'callback' should be a function")
                .with_context("reporter.name", name)
                .with_context("argument", position)
                .with_context("found", found)
                .with_signature(CONSTRUCTOR_SIGNATURE),
            ReporterError::UnresolvableArguments { shape, expected } => {
                let signature = if *expected == SUB_REPORTER_SIGNATURE {
                    SUB_REPORTER_SIGNATURE
                } else {
                    CONSTRUCTOR_SIGNATURE
                };
                Diagnostic::new(codes::E_ARGS_SHAPE, "arguments match no known call shape")
                    .with_context("arguments", format!("[{shape}]"))
                    .with_signature(signature)
            }
            ReporterError::ExtraCompletionReport { name, target, done } => Diagnostic::new(
                codes::E_EXTRA_DONE,
                "a reporter has reported \"done\" too many times",
            )
            .with_context("reporter.name", name)
            .with_context("target", target)
            .with_context("done", done)
            .with_fix_step("check that the target matches the number of branches started"),
        }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{HEADER} [{}]", self.code)?;
        writeln!(f, "    {}", self.message)?;
        for (label, value) in &self.context {
            writeln!(f, "        {label}: {value}")?;
        }
        if let Some(signature) = self.signature {
            writeln!(f, "    {signature}")?;
        }
        for step in &self.fix_steps {
            writeln!(f, "    fix: {step}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}
