use super::{Outcome, Reporter};
use crate::config::ChildFailurePolicy;

/// The capability a sub-reporter holds over its parent: settle one unit.
///
/// Consumed by value, so a link can deliver at most one unit.
pub(super) struct ParentLink {
    parent: Reporter,
}

impl ParentLink {
    pub(super) fn new(parent: &Reporter) -> Self {
        Self {
            parent: parent.clone(),
        }
    }

    pub(super) fn settle(self, child: &str, outcome: Outcome) {
        let parent = self.parent;
        match (outcome, parent.config().child_failure) {
            (Err(error), ChildFailurePolicy::Propagate) => {
                tracing::debug!(parent = %parent.name(), child, "propagating sub-reporter failure");
                parent.report_failure(error);
            }
            _ => {
                if let Err(err) = parent.report_completion() {
                    tracing::warn!(
                        parent = %parent.name(),
                        child,
                        error = %err,
                        "parent rejected sub-reporter unit"
                    );
                }
            }
        }
    }
}
