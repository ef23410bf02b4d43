use super::link::ParentLink;
use super::{CompletionCallback, Outcome, Reporter};
use crate::config::ReporterConfig;
use crate::data::DataBag;
use crate::errors::ReporterError;
use crate::naming::NameGenerator;
use std::sync::Arc;

const UNNAMED: &str = "<unnamed>";

fn check_target(name: Option<&str>, target: usize) -> Result<usize, ReporterError> {
    if target == 0 {
        return Err(ReporterError::invalid_target(
            name.unwrap_or(UNNAMED),
            target,
        ));
    }
    Ok(target)
}

/// Root reporter construction with named optional fields.
///
/// `target` defaults to 1 and `name` to the next generated name. The
/// callback is required.
#[derive(Default)]
pub struct ReporterBuilder {
    name: Option<String>,
    target: Option<usize>,
    callback: Option<CompletionCallback>,
    config: ReporterConfig,
    names: Option<Arc<NameGenerator>>,
    data: Option<DataBag>,
}

impl ReporterBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn target(mut self, target: usize) -> Self {
        self.target = Some(target);
        self
    }

    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        self.callback = Some(Box::new(f));
        self
    }

    pub fn config(mut self, config: ReporterConfig) -> Self {
        self.config = config;
        self
    }

    /// Generator for unnamed reporters in this tree; defaults to the
    /// process-wide one.
    pub fn names(mut self, names: Arc<NameGenerator>) -> Self {
        self.names = Some(names);
        self
    }

    /// Start from an existing bag instead of an empty one.
    pub fn data(mut self, data: DataBag) -> Self {
        self.data = Some(data);
        self
    }

    pub fn build(self) -> Result<Reporter, ReporterError> {
        let callback = self.callback.ok_or(ReporterError::MissingArguments)?;
        let target = check_target(self.name.as_deref(), self.target.unwrap_or(1))?;
        let names = self.names.unwrap_or_else(NameGenerator::global);
        let name = self.name.unwrap_or_else(|| names.next_name());

        Ok(Reporter::assemble(
            name,
            target,
            callback,
            self.data.unwrap_or_default(),
            self.config,
            names,
        ))
    }
}

/// Derivation of a sub-reporter from an existing parent.
///
/// The child shares the parent's data bag, config and name generator. Its
/// settlement reports one unit to the parent; nothing is reported at
/// derivation time.
pub struct SubReporterBuilder<'a> {
    parent: &'a Reporter,
    name: Option<String>,
    target: Option<usize>,
}

impl<'a> SubReporterBuilder<'a> {
    pub(super) fn new(parent: &'a Reporter) -> Self {
        Self {
            parent,
            name: None,
            target: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn target(mut self, target: usize) -> Self {
        self.target = Some(target);
        self
    }

    pub fn build(self) -> Result<Reporter, ReporterError> {
        let target = check_target(self.name.as_deref(), self.target.unwrap_or(1))?;
        let parent = self.parent;
        let names = Arc::clone(&parent.node.names);
        let name = self.name.unwrap_or_else(|| names.next_name());

        let link = ParentLink::new(parent);
        let child_name = name.clone();
        let callback: CompletionCallback =
            Box::new(move |outcome| link.settle(&child_name, outcome));

        tracing::trace!(parent = %parent.name(), child = %name, "deriving sub-reporter");
        Ok(Reporter::assemble(
            name,
            target,
            callback,
            parent.data().clone(),
            parent.config().clone(),
            names,
        ))
    }
}
