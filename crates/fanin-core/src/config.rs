use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Behavior knobs shared by a reporter and everything derived from it.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ReporterConfig {
    /// What a completion report against a settled reporter does.
    pub settled: SettledPolicy,

    /// What a sub-reporter's failure does to its parent.
    pub child_failure: ChildFailurePolicy,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SettledPolicy {
    /// Settled reporters are inert; late reports are dropped.
    #[default]
    Ignore,
    /// Late completion reports on a fully counted reporter return
    /// `ExtraCompletionReport`. A reporter settled by failure still drops them.
    Reject,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChildFailurePolicy {
    /// A child settling by failure still consumes exactly one parent unit.
    #[default]
    CountAsUnit,
    /// A child failure fails the parent with the same error.
    Propagate,
}

impl ReporterConfig {
    pub fn from_yaml_str(raw: &str) -> anyhow::Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).context("failed to parse reporter config yaml")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_yaml_str(&raw)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn with_settled(mut self, policy: SettledPolicy) -> Self {
        self.settled = policy;
        self
    }

    pub fn with_child_failure(mut self, policy: ChildFailurePolicy) -> Self {
        self.child_failure = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_inert_and_count_as_unit() {
        let cfg = ReporterConfig::default();
        assert_eq!(cfg.settled, SettledPolicy::Ignore);
        assert_eq!(cfg.child_failure, ChildFailurePolicy::CountAsUnit);
    }

    #[test]
    fn parses_snake_case_policies() {
        let cfg = ReporterConfig::from_yaml_str("settled: reject\nchild_failure: propagate\n")
            .unwrap();
        assert_eq!(cfg.settled, SettledPolicy::Reject);
        assert_eq!(cfg.child_failure, ChildFailurePolicy::Propagate);
    }

    #[test]
    fn partial_and_empty_documents_fall_back_to_defaults() {
        let cfg = ReporterConfig::from_yaml_str("settled: reject\n").unwrap();
        assert_eq!(cfg.child_failure, ChildFailurePolicy::CountAsUnit);
        assert_eq!(ReporterConfig::from_yaml_str("  \n").unwrap(), ReporterConfig::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = ReporterConfig::from_yaml_str("settle: reject\n").unwrap_err();
        assert!(format!("{err:#}").contains("unknown field"));
    }

    #[test]
    fn load_reads_file_and_reports_path_on_error() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "child_failure: propagate").unwrap();
        let cfg = ReporterConfig::load(tmp.path()).unwrap();
        assert_eq!(cfg.child_failure, ChildFailurePolicy::Propagate);

        let missing = tmp.path().with_extension("missing");
        let err = ReporterConfig::load(&missing).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
