//! Resolution of loosely shaped argument lists.
//!
//! Callers that receive reporter arguments from a dynamic source (scripts,
//! config, bindings) hand them over as [`RawArg`]s; the resolvers turn them
//! into a canonical name/target/callback triple or fail with a validation
//! error. Typed callers should use [`crate::ReporterBuilder`] instead.

use crate::errors::{ReporterError, CONSTRUCTOR_SIGNATURE, SUB_REPORTER_SIGNATURE};
use crate::naming::NameGenerator;
use crate::reporter::{CompletionCallback, Outcome};
use serde_json::{Number, Value};
use std::fmt;

const UNNAMED: &str = "<unnamed>";

pub enum RawArg {
    Text(String),
    Number(Number),
    Callback(CompletionCallback),
    /// Anything else. `Other(Value::Null)` counts as an absent argument.
    Other(Value),
}

impl RawArg {
    pub fn callback<F>(f: F) -> Self
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        Self::Callback(Box::new(f))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Number(_) => "number",
            Self::Callback(_) => "callback",
            Self::Other(Value::Null) => "null",
            Self::Other(Value::Bool(_)) => "bool",
            Self::Other(Value::Array(_)) => "array",
            Self::Other(Value::Object(_)) => "object",
            Self::Other(Value::String(_)) => "text",
            Self::Other(Value::Number(_)) => "number",
        }
    }

    fn is_absent(&self) -> bool {
        matches!(self, Self::Other(Value::Null))
    }
}

impl fmt::Debug for RawArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
            Self::Other(v) => f.debug_tuple("Other").field(v).finish(),
        }
    }
}

impl From<&str> for RawArg {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for RawArg {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<u64> for RawArg {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl From<i64> for RawArg {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<Value> for RawArg {
    fn from(v: Value) -> Self {
        match v {
            Value::String(s) => Self::Text(s),
            Value::Number(n) => Self::Number(n),
            other => Self::Other(other),
        }
    }
}

/// Canonical sub-reporter arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArgs {
    pub name: String,
    pub target: usize,
}

/// Canonical root reporter arguments.
pub struct ResolvedRoot {
    pub name: String,
    pub target: usize,
    pub callback: CompletionCallback,
}

impl fmt::Debug for ResolvedRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedRoot")
            .field("name", &self.name)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Leading argument of a two-slot shape: either a name or a target.
enum Head {
    Named(String),
    Units(usize),
}

impl Head {
    fn label(&self) -> &str {
        match self {
            Head::Named(name) => name,
            Head::Units(_) => UNNAMED,
        }
    }

    fn into_args(self, names: &NameGenerator) -> ResolvedArgs {
        match self {
            Head::Named(name) => ResolvedArgs { name, target: 1 },
            Head::Units(target) => ResolvedArgs {
                name: names.next_name(),
                target,
            },
        }
    }
}

fn shape_of(args: &[RawArg]) -> String {
    args.iter()
        .map(RawArg::type_name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_target(arg: RawArg, name: &str) -> Result<usize, ReporterError> {
    match arg {
        RawArg::Number(n) => n
            .as_u64()
            .filter(|&n| n > 0)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| ReporterError::invalid_target(name, &n)),
        other => Err(ReporterError::invalid_target(name, other.type_name())),
    }
}

fn parse_head(
    arg: RawArg,
    shape: &str,
    expected: &'static str,
) -> Result<Head, ReporterError> {
    match arg {
        RawArg::Text(name) => Ok(Head::Named(name)),
        number @ RawArg::Number(_) => parse_target(number, UNNAMED).map(Head::Units),
        _ => Err(ReporterError::unresolvable(shape, expected)),
    }
}

fn expect_callback(
    arg: RawArg,
    name: &str,
    position: usize,
) -> Result<CompletionCallback, ReporterError> {
    match arg {
        RawArg::Callback(cb) => Ok(cb),
        other => Err(ReporterError::invalid_callback(
            name,
            position,
            other.type_name(),
        )),
    }
}

/// Resolve `[callback]`, `[name, callback]`, `[target, callback]` or
/// `[name, target, callback]`.
pub fn resolve_root(
    args: Vec<RawArg>,
    names: &NameGenerator,
) -> Result<ResolvedRoot, ReporterError> {
    let args: Vec<RawArg> = args.into_iter().filter(|a| !a.is_absent()).collect();
    let shape = shape_of(&args);
    let mut it = args.into_iter();

    match (it.next(), it.next(), it.next(), it.next()) {
        (None, _, _, _) => Err(ReporterError::MissingArguments),
        (Some(callback), None, _, _) => {
            let callback = expect_callback(callback, UNNAMED, 1)?;
            Ok(ResolvedRoot {
                name: names.next_name(),
                target: 1,
                callback,
            })
        }
        (Some(head), Some(callback), None, _) => {
            let head = parse_head(head, &shape, CONSTRUCTOR_SIGNATURE)?;
            let callback = expect_callback(callback, head.label(), 2)?;
            let ResolvedArgs { name, target } = head.into_args(names);
            Ok(ResolvedRoot {
                name,
                target,
                callback,
            })
        }
        (Some(RawArg::Text(name)), Some(target), Some(callback), None) => {
            let target = parse_target(target, &name)?;
            let callback = expect_callback(callback, &name, 3)?;
            Ok(ResolvedRoot {
                name,
                target,
                callback,
            })
        }
        _ => Err(ReporterError::unresolvable(shape, CONSTRUCTOR_SIGNATURE)),
    }
}

/// Resolve `[]`, `[name]`, `[target]` or `[name, target]`.
pub fn resolve_sub(
    args: Vec<RawArg>,
    names: &NameGenerator,
) -> Result<ResolvedArgs, ReporterError> {
    let args: Vec<RawArg> = args.into_iter().filter(|a| !a.is_absent()).collect();
    let shape = shape_of(&args);
    let mut it = args.into_iter();

    match (it.next(), it.next(), it.next()) {
        (None, _, _) => Ok(ResolvedArgs {
            name: names.next_name(),
            target: 1,
        }),
        (Some(head), None, _) => {
            Ok(parse_head(head, &shape, SUB_REPORTER_SIGNATURE)?.into_args(names))
        }
        (Some(RawArg::Text(name)), Some(target), None) => {
            let target = parse_target(target, &name)?;
            Ok(ResolvedArgs { name, target })
        }
        _ => Err(ReporterError::unresolvable(shape, SUB_REPORTER_SIGNATURE)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ReporterErrorKind;
    use serde_json::json;

    fn noop() -> RawArg {
        RawArg::callback(|_| {})
    }

    fn root(args: Vec<RawArg>) -> Result<ResolvedRoot, ReporterError> {
        resolve_root(args, &NameGenerator::default())
    }

    fn sub(args: Vec<RawArg>) -> Result<ResolvedArgs, ReporterError> {
        resolve_sub(args, &NameGenerator::default())
    }

    #[test]
    fn bare_callback_gets_generated_name_and_one_unit() {
        let r = root(vec![noop()]).unwrap();
        assert_eq!((r.name.as_str(), r.target), ("reporter_0", 1));
    }

    #[test]
    fn two_slot_shapes() {
        let r = root(vec![3u64.into(), noop()]).unwrap();
        assert_eq!((r.name.as_str(), r.target), ("reporter_0", 3));

        let r = root(vec!["scan".into(), noop()]).unwrap();
        assert_eq!((r.name.as_str(), r.target), ("scan", 1));
    }

    #[test]
    fn full_shape() {
        let r = root(vec!["scan".into(), 4u64.into(), noop()]).unwrap();
        assert_eq!((r.name.as_str(), r.target), ("scan", 4));
    }

    #[test]
    fn nulls_are_dropped_before_matching() {
        let r = root(vec![Value::Null.into(), 2u64.into(), Value::Null.into(), noop()]).unwrap();
        assert_eq!(r.target, 2);
        let s = sub(vec![Value::Null.into()]).unwrap();
        assert_eq!(s.target, 1);
    }

    #[test]
    fn no_arguments_is_missing() {
        assert_eq!(root(vec![]).unwrap_err(), ReporterError::MissingArguments);
        assert_eq!(
            root(vec![Value::Null.into()]).unwrap_err(),
            ReporterError::MissingArguments
        );
    }

    #[test]
    fn non_callback_in_callback_slot() {
        let err = root(vec!["name".into()]).unwrap_err();
        assert_eq!(err, ReporterError::invalid_callback(UNNAMED, 1, "text"));

        let err = root(vec!["name".into(), 2u64.into()]).unwrap_err();
        assert_eq!(err, ReporterError::invalid_callback("name", 2, "number"));

        let err = root(vec!["name".into(), 2u64.into(), "not a function".into()]).unwrap_err();
        assert_eq!(err, ReporterError::invalid_callback("name", 3, "text"));
    }

    #[test]
    fn bad_targets() {
        let err = root(vec!["name".into(), "NaN".into(), noop()]).unwrap_err();
        assert_eq!(err, ReporterError::invalid_target("name", "text"));

        let err = root(vec![0u64.into(), noop()]).unwrap_err();
        assert_eq!(err.kind(), ReporterErrorKind::InvalidTargetUnits);

        let err = root(vec![(-2i64).into(), noop()]).unwrap_err();
        assert_eq!(err, ReporterError::invalid_target(UNNAMED, "-2"));

        let err = sub(vec![json!(1.5).into()]).unwrap_err();
        assert_eq!(err, ReporterError::invalid_target(UNNAMED, "1.5"));
    }

    #[test]
    fn unresolvable_shapes() {
        let err = root(vec![json!(true).into(), noop()]).unwrap_err();
        assert_eq!(
            err,
            ReporterError::unresolvable("bool, callback", CONSTRUCTOR_SIGNATURE)
        );

        let err = root(vec![1u64.into(), 2u64.into(), noop()]).unwrap_err();
        assert_eq!(err.kind(), ReporterErrorKind::UnresolvableArguments);

        let err = root(vec!["a".into(), 1u64.into(), noop(), noop()]).unwrap_err();
        assert_eq!(err.kind(), ReporterErrorKind::UnresolvableArguments);

        let err = sub(vec![noop()]).unwrap_err();
        assert_eq!(err, ReporterError::unresolvable("callback", SUB_REPORTER_SIGNATURE));

        let err = sub(vec!["a".into(), 1u64.into(), 2u64.into()]).unwrap_err();
        assert_eq!(err.kind(), ReporterErrorKind::UnresolvableArguments);
    }

    #[test]
    fn sub_shapes() {
        assert_eq!(
            sub(vec![]).unwrap(),
            ResolvedArgs {
                name: "reporter_0".to_string(),
                target: 1
            }
        );
        assert_eq!(sub(vec![5u64.into()]).unwrap().target, 5);
        assert_eq!(sub(vec!["x".into()]).unwrap().name, "x");
        assert_eq!(
            sub(vec!["x".into(), 2u64.into()]).unwrap(),
            ResolvedArgs {
                name: "x".to_string(),
                target: 2
            }
        );
    }

    #[test]
    fn names_are_not_drawn_for_rejected_shapes() {
        let names = NameGenerator::default();
        let _ = resolve_root(vec![json!([1]).into(), noop()], &names);
        let _ = resolve_sub(vec![json!({}).into()], &names);
        assert_eq!(names.issued(), 0);
    }
}
