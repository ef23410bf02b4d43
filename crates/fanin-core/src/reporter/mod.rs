//! The reporter state machine.
//!
//! ```text
//!   root (target 2) ◀──── one unit ──── child (target 3) ◀── 3 × report_completion
//!        ▲
//!        └────────────── one unit ──── report_completion
//! ```
//!
//! Every node shares one [`DataBag`] with the node it was derived from.
//! A node settles exactly once: when its completed count reaches its target,
//! or on the first reported failure. Settled nodes are inert (or, with
//! [`SettledPolicy::Reject`], refuse further completion reports).

mod builder;
mod link;

pub use builder::{ReporterBuilder, SubReporterBuilder};

use crate::args::{self, RawArg};
use crate::config::{ReporterConfig, SettledPolicy};
use crate::data::DataBag;
use crate::errors::ReporterError;
use crate::naming::NameGenerator;
use crate::payload::CompletionPayload;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// What the completion callback receives: the shared data on success, the
/// reported error on failure.
pub type Outcome = Result<DataBag, anyhow::Error>;

pub type CompletionCallback = Box<dyn FnOnce(Outcome) + Send + 'static>;

/// Result of a single report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Counted; the reporter is still waiting for more units.
    Pending { completed: usize, target: usize },
    /// This report settled the reporter and fired its callback.
    Settled,
    /// The reporter was already settled; nothing changed.
    Ignored,
}

impl Progress {
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Settled)
    }
}

/// Handle to a reporter node. Clones refer to the same node.
#[derive(Clone)]
pub struct Reporter {
    node: Arc<Node>,
}

struct Node {
    name: String,
    target: usize,
    data: DataBag,
    config: ReporterConfig,
    names: Arc<NameGenerator>,
    state: Mutex<State>,
}

struct State {
    completed: usize,
    settled: Option<Settlement>,
    callback: Option<CompletionCallback>,
}

/// How a reporter reached its terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settlement {
    Completed,
    Failed,
}

impl Node {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Reporter {
    pub fn builder() -> ReporterBuilder {
        ReporterBuilder::default()
    }

    /// A single-unit reporter with a generated name.
    pub fn new<F>(on_complete: F) -> Self
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        Self::assemble(
            NameGenerator::global().next_name(),
            1,
            Box::new(on_complete),
            DataBag::new(),
            ReporterConfig::default(),
            NameGenerator::global(),
        )
    }

    /// A single-unit reporter with an explicit name.
    pub fn named<F>(name: impl Into<String>, on_complete: F) -> Self
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        Self::assemble(
            name.into(),
            1,
            Box::new(on_complete),
            DataBag::new(),
            ReporterConfig::default(),
            NameGenerator::global(),
        )
    }

    pub fn with_target<F>(target: usize, on_complete: F) -> Result<Self, ReporterError>
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        Self::builder().target(target).on_complete(on_complete).build()
    }

    /// Construct from a loosely shaped argument list.
    ///
    /// Accepts `[callback]`, `[name, callback]`, `[target, callback]` and
    /// `[name, target, callback]`. Unnamed reporters draw from the
    /// process-wide name sequence.
    pub fn from_args(args: Vec<RawArg>) -> Result<Self, ReporterError> {
        let names = NameGenerator::global();
        let resolved = args::resolve_root(args, &names)?;
        Ok(Self::assemble(
            resolved.name,
            resolved.target,
            resolved.callback,
            DataBag::new(),
            ReporterConfig::default(),
            names,
        ))
    }

    pub(crate) fn assemble(
        name: String,
        target: usize,
        callback: CompletionCallback,
        data: DataBag,
        config: ReporterConfig,
        names: Arc<NameGenerator>,
    ) -> Self {
        tracing::debug!(reporter = %name, target, "reporter created");
        Self {
            node: Arc::new(Node {
                name,
                target,
                data,
                config,
                names,
                state: Mutex::new(State {
                    completed: 0,
                    settled: None,
                    callback: Some(callback),
                }),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.node.name
    }

    pub fn target_units(&self) -> usize {
        self.node.target
    }

    pub fn completed_units(&self) -> usize {
        self.node.lock_state().completed
    }

    pub fn remaining_units(&self) -> usize {
        let state = self.node.lock_state();
        if state.settled.is_some() {
            0
        } else {
            self.node.target - state.completed
        }
    }

    pub fn is_settled(&self) -> bool {
        self.node.lock_state().settled.is_some()
    }

    /// The data bag shared with every reporter in this subtree.
    pub fn data(&self) -> &DataBag {
        &self.node.data
    }

    pub fn config(&self) -> &ReporterConfig {
        &self.node.config
    }

    /// True when both handles refer to the same node.
    pub fn same_node(&self, other: &Reporter) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    pub fn report_completion(&self) -> Result<Progress, ReporterError> {
        self.report_completion_with(CompletionPayload::None)
    }

    /// Set `key` on the shared data, then count one unit.
    pub fn report(
        &self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Progress, ReporterError> {
        self.report_completion_with(CompletionPayload::key_value(key, value))
    }

    /// Merge `patch` into the shared data, then count one unit.
    pub fn report_patch(&self, patch: Map<String, Value>) -> Result<Progress, ReporterError> {
        self.report_completion_with(CompletionPayload::Patch(patch))
    }

    /// Count one completed unit, applying `payload` first.
    ///
    /// The payload is merged under the same lock as the counter, so the data
    /// handed to the callback always includes the settling report. The
    /// callback itself runs after the lock is released.
    ///
    /// Do not call this from inside [`DataBag::update`] on the same bag.
    pub fn report_completion_with(
        &self,
        payload: CompletionPayload,
    ) -> Result<Progress, ReporterError> {
        let callback = {
            let mut state = self.node.lock_state();
            if let Some(settlement) = state.settled {
                return self.late_completion(settlement, state.completed);
            }

            payload.apply(&self.node.data);
            state.completed += 1;

            if state.completed < self.node.target {
                tracing::trace!(
                    reporter = %self.node.name,
                    completed = state.completed,
                    target = self.node.target,
                    "unit completed"
                );
                return Ok(Progress::Pending {
                    completed: state.completed,
                    target: self.node.target,
                });
            }

            state.settled = Some(Settlement::Completed);
            state.callback.take()
        };

        tracing::debug!(reporter = %self.node.name, target = self.node.target, "reporter settled");
        if let Some(callback) = callback {
            callback(Ok(self.node.data.clone()));
        }
        Ok(Progress::Settled)
    }

    /// Settle immediately with `error`, whatever the completed count.
    ///
    /// Only the first terminal event reaches the callback; failures reported
    /// after settlement are dropped.
    pub fn report_failure(&self, error: impl Into<anyhow::Error>) -> Progress {
        let error = error.into();
        let (callback, completed) = {
            let mut state = self.node.lock_state();
            if state.settled.is_some() {
                tracing::debug!(
                    reporter = %self.node.name,
                    error = %error,
                    "failure ignored: reporter already settled"
                );
                return Progress::Ignored;
            }
            state.settled = Some(Settlement::Failed);
            (state.callback.take(), state.completed)
        };

        tracing::debug!(
            reporter = %self.node.name,
            completed,
            target = self.node.target,
            error = %error,
            "reporter failed"
        );
        if let Some(callback) = callback {
            callback(Err(error));
        }
        Progress::Settled
    }

    /// A failed reporter swallows completions under either policy; only a
    /// fully counted reporter can be over-reported.
    fn late_completion(
        &self,
        settlement: Settlement,
        completed: usize,
    ) -> Result<Progress, ReporterError> {
        match (settlement, self.node.config.settled) {
            (Settlement::Failed, _) | (Settlement::Completed, SettledPolicy::Ignore) => {
                tracing::debug!(
                    reporter = %self.node.name,
                    "completion ignored: reporter already settled"
                );
                Ok(Progress::Ignored)
            }
            (Settlement::Completed, SettledPolicy::Reject) => {
                Err(ReporterError::ExtraCompletionReport {
                    name: self.node.name.clone(),
                    target: self.node.target,
                    done: completed + 1,
                })
            }
        }
    }

    /// Start deriving a sub-reporter.
    pub fn sub(&self) -> SubReporterBuilder<'_> {
        SubReporterBuilder::new(self)
    }

    /// A sub-reporter with `target` units and a generated name.
    pub fn derive_sub_reporter(&self, target: usize) -> Result<Reporter, ReporterError> {
        self.sub().target(target).build()
    }

    pub fn derive_named_sub_reporter(
        &self,
        name: impl Into<String>,
        target: usize,
    ) -> Result<Reporter, ReporterError> {
        self.sub().name(name).target(target).build()
    }

    /// Derive from a loosely shaped argument list: `[]`, `[name]`,
    /// `[target]` or `[name, target]`.
    pub fn sub_reporter_from_args(&self, args: Vec<RawArg>) -> Result<Reporter, ReporterError> {
        let resolved = args::resolve_sub(args, &self.node.names)?;
        self.sub()
            .name(resolved.name)
            .target(resolved.target)
            .build()
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.node.lock_state();
        f.debug_struct("Reporter")
            .field("name", &self.node.name)
            .field("target", &self.node.target)
            .field("completed", &state.completed)
            .field("settled", &state.settled.is_some())
            .finish()
    }
}
