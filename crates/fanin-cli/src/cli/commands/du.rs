//! `fanin du`: disk usage over a reporter tree.
//!
//! Each directory derives a sub-reporter with one unit per entry and every
//! entry is visited on its own task. Files add into the shared bag; the root
//! callback hands the outcome back over a oneshot channel.

use super::{bump, complete, counter};
use crate::cli::args::{DuArgs, OutputFormat};
use crate::exit_codes::{SUCCESS, TREE_FAILED};
use anyhow::Context;
use fanin_core::{ChildFailurePolicy, DataBag, Outcome, Reporter, ReporterConfig};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::sync::oneshot;

const BYTES: &str = "bytes";
const FILES: &str = "files";
const DIRS: &str = "dirs";
const ERRORS: &str = "errors";

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct DuSummary {
    pub path: String,
    pub status: &'static str,
    pub bytes: u64,
    pub files: u64,
    pub dirs: u64,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DuSummary {
    fn new(path: &Path, data: &DataBag, outcome: Outcome) -> Self {
        let errors: Vec<String> = data
            .get(ERRORS)
            .and_then(|v| match v {
                Value::Array(items) => Some(
                    items
                        .into_iter()
                        .filter_map(|i| i.as_str().map(str::to_string))
                        .collect(),
                ),
                _ => None,
            })
            .unwrap_or_default();

        let (status, error) = match outcome {
            Ok(_) if errors.is_empty() => ("ok", None),
            Ok(_) => ("partial", None),
            Err(e) => ("failed", Some(format!("{e:#}"))),
        };

        Self {
            path: path.display().to_string(),
            status,
            bytes: counter(data, BYTES),
            files: counter(data, FILES),
            dirs: counter(data, DIRS),
            errors,
            error,
        }
    }

    fn exit_code(&self) -> i32 {
        if self.status == "ok" {
            SUCCESS
        } else {
            TREE_FAILED
        }
    }
}

pub async fn run(args: DuArgs, config: ReporterConfig) -> anyhow::Result<i32> {
    let config = if args.strict {
        config.with_child_failure(ChildFailurePolicy::Propagate)
    } else {
        config
    };

    let (tx, rx) = oneshot::channel::<Outcome>();
    let root = Reporter::builder()
        .name(args.path.display().to_string())
        .config(config)
        .on_complete(move |outcome| {
            let _ = tx.send(outcome);
        })
        .build()?;

    spawn_entry(root.clone(), args.path.clone(), args.strict);
    let outcome = rx
        .await
        .context("directory walk ended without settling the root reporter")?;

    let summary = DuSummary::new(&args.path, root.data(), outcome);
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => print_text(&summary),
    }
    Ok(summary.exit_code())
}

fn print_text(summary: &DuSummary) {
    println!("{}\t{}", summary.bytes, summary.path);
    println!("files: {}  dirs: {}", summary.files, summary.dirs);
    for err in &summary.errors {
        eprintln!("warning: {err}");
    }
    if let Some(err) = &summary.error {
        eprintln!("error: {err}");
    }
}

/// Visit `path` on its own task; exactly one unit is reported on `reporter`.
fn spawn_entry(reporter: Reporter, path: PathBuf, strict: bool) {
    tokio::spawn(async move {
        if let Err(err) = visit(&reporter, &path, strict).await {
            if strict {
                reporter.report_failure(err);
            } else {
                tracing::debug!(path = %path.display(), error = %err, "recording walk error");
                reporter.data().update(|map| {
                    let entry = map
                        .entry(ERRORS)
                        .or_insert_with(|| Value::Array(Vec::new()));
                    if let Value::Array(items) = entry {
                        items.push(Value::String(format!("{err:#}")));
                    }
                });
                complete(&reporter);
            }
        }
    });
}

async fn visit(reporter: &Reporter, path: &Path, strict: bool) -> anyhow::Result<()> {
    let meta = tokio::fs::symlink_metadata(path)
        .await
        .with_context(|| format!("failed to stat {}", path.display()))?;

    if !meta.is_dir() {
        bump(reporter.data(), FILES, 1);
        bump(reporter.data(), BYTES, meta.len());
        complete(reporter);
        return Ok(());
    }

    let mut dir = tokio::fs::read_dir(path)
        .await
        .with_context(|| format!("failed to read directory {}", path.display()))?;
    let mut entries = Vec::new();
    while let Some(entry) = dir
        .next_entry()
        .await
        .with_context(|| format!("failed to list {}", path.display()))?
    {
        entries.push(entry.path());
    }
    bump(reporter.data(), DIRS, 1);

    if entries.is_empty() {
        complete(reporter);
        return Ok(());
    }

    let sub = reporter
        .sub()
        .name(path.display().to_string())
        .target(entries.len())
        .build()?;
    for entry in entries {
        spawn_entry(sub.clone(), entry, strict);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    async fn walk(path: &Path, strict: bool) -> DuSummary {
        let config = if strict {
            ReporterConfig::default().with_child_failure(ChildFailurePolicy::Propagate)
        } else {
            ReporterConfig::default()
        };
        let (tx, rx) = oneshot::channel();
        let root = Reporter::builder()
            .config(config)
            .on_complete(move |outcome| {
                let _ = tx.send(outcome);
            })
            .build()
            .unwrap();
        spawn_entry(root.clone(), path.to_path_buf(), strict);
        let outcome = rx.await.unwrap();
        DuSummary::new(path, root.data(), outcome)
    }

    #[tokio::test]
    async fn sums_nested_tree() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
        fs::write(dir.path().join("nested/b.bin"), [0u8; 7]).unwrap();
        fs::write(dir.path().join("nested/deeper/c"), [1u8; 30]).unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();

        let summary = walk(dir.path(), false).await;
        assert_eq!(summary.status, "ok");
        assert_eq!(summary.bytes, 42);
        assert_eq!(summary.files, 3);
        assert_eq!(summary.dirs, 4);
        assert!(summary.errors.is_empty());
        assert_eq!(summary.exit_code(), SUCCESS);
    }

    #[tokio::test]
    async fn single_file_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("only");
        fs::write(&file, b"abc").unwrap();

        let summary = walk(&file, false).await;
        assert_eq!((summary.bytes, summary.files, summary.dirs), (3, 1, 0));
    }

    #[tokio::test]
    async fn missing_path_is_recorded_or_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let lenient = walk(&missing, false).await;
        assert_eq!(lenient.status, "partial");
        assert_eq!(lenient.errors.len(), 1);
        assert!(lenient.errors[0].contains("failed to stat"));

        let strict = walk(&missing, true).await;
        assert_eq!(strict.status, "failed");
        assert_eq!(strict.exit_code(), TREE_FAILED);
        assert!(strict.error.as_deref().unwrap().contains("failed to stat"));
    }
}
