//! Completion reporters.
//!
//! A [`Reporter`] counts completion reports from a known number of
//! asynchronous branches and fires one callback, exactly once, when the last
//! branch reports (or as soon as any branch reports a failure). Reporters
//! can derive sub-reporters whose own settlement counts as a single unit of
//! their parent, so fan-out trees of any depth fan back in to one callback.
//!
//! ```
//! use fanin_core::Reporter;
//! use std::sync::mpsc;
//!
//! let (tx, rx) = mpsc::channel();
//! let root = Reporter::with_target(2, move |outcome| {
//!     tx.send(outcome.map(|data| data.snapshot())).unwrap();
//! })
//! .unwrap();
//!
//! let child = root.derive_sub_reporter(1).unwrap();
//! child.report("answer", 42).unwrap();
//! root.report_completion().unwrap();
//!
//! let data = rx.recv().unwrap().unwrap();
//! assert_eq!(data["answer"], 42);
//! ```

pub mod args;
pub mod config;
pub mod data;
pub mod errors;
pub mod naming;
pub mod payload;
pub mod reporter;

pub use args::RawArg;
pub use config::{ChildFailurePolicy, ReporterConfig, SettledPolicy};
pub use data::DataBag;
pub use errors::{Diagnostic, ReporterError, ReporterErrorKind};
pub use naming::NameGenerator;
pub use payload::CompletionPayload;
pub use reporter::{
    CompletionCallback, Outcome, Progress, Reporter, ReporterBuilder, SubReporterBuilder,
};
