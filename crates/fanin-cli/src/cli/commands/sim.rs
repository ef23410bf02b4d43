use super::{bump, counter};
use crate::cli::args::{OutputFormat, SimArgs};
use crate::exit_codes::{SUCCESS, TREE_FAILED};
use anyhow::{anyhow, bail, Context};
use fanin_core::{ChildFailurePolicy, CompletionPayload, Outcome, Reporter, ReporterConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

const MAX_LEAVES: u64 = 100_000;
const ROOT: &str = "sim";
const COMPLETED: &str = "_completed";
const FAILED: &str = "_failed";

#[derive(Debug, Serialize)]
pub struct SimSummary {
    pub status: &'static str,
    pub leaves: u64,
    pub completed: u64,
    pub failed: u64,
    pub elapsed_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slowest: Option<SlowLeaf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SlowLeaf {
    pub name: String,
    pub delay_ms: u64,
}

/// A leaf's predetermined behavior, drawn up front so a seed fixes the run.
struct LeafPlan {
    name: String,
    delay_ms: u64,
    fails: bool,
}

pub async fn run(args: SimArgs, config: ReporterConfig) -> anyhow::Result<i32> {
    let summary = simulate(&args, config).await?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => {
            println!(
                "{}: {}/{} leaves completed, {} failed in {}ms",
                summary.status, summary.completed, summary.leaves, summary.failed, summary.elapsed_ms
            );
            if let Some(slow) = &summary.slowest {
                println!("slowest: {} ({}ms)", slow.name, slow.delay_ms);
            }
            if let Some(err) = &summary.error {
                eprintln!("error: {err}");
            }
        }
    }

    Ok(if summary.status == "ok" {
        SUCCESS
    } else {
        TREE_FAILED
    })
}

/// Build the tree, run every leaf, and summarize the root's outcome.
async fn simulate(args: &SimArgs, config: ReporterConfig) -> anyhow::Result<SimSummary> {
    let leaves = u64::from(args.width)
        .checked_pow(args.depth)
        .filter(|&n| n <= MAX_LEAVES)
        .ok_or_else(|| {
            anyhow!(
                "width {} at depth {} exceeds {MAX_LEAVES} leaves",
                args.width,
                args.depth
            )
        })?;

    let config = if args.propagate {
        config.with_child_failure(ChildFailurePolicy::Propagate)
    } else {
        config
    };

    let (tx, rx) = oneshot::channel::<Outcome>();
    let started = Instant::now();
    let root = Reporter::builder()
        .name(ROOT)
        .target(args.width as usize)
        .config(config)
        .on_complete(move |outcome| {
            let _ = tx.send(outcome);
        })
        .build()?;

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut plans = Vec::new();
    plan_level(&root, args.depth, args, &mut rng, ROOT, &mut plans)?;
    if plans.len() as u64 != leaves {
        bail!("planned {} leaves, expected {leaves}", plans.len());
    }
    tracing::debug!(leaves, seed = args.seed, "simulation planned");

    for (reporter, plan) in plans {
        spawn_leaf(reporter, plan);
    }

    let outcome = rx
        .await
        .context("simulation ended without settling the root reporter")?;
    Ok(summarize(&root, leaves, outcome, started.elapsed()))
}

/// Attach `args.width` units under `parent`: leaves at the last level,
/// sub-reporters above it.
fn plan_level(
    parent: &Reporter,
    depth: u32,
    args: &SimArgs,
    rng: &mut StdRng,
    prefix: &str,
    plans: &mut Vec<(Reporter, LeafPlan)>,
) -> anyhow::Result<()> {
    for i in 0..args.width {
        let name = format!("{prefix}.{i}");
        if depth <= 1 {
            let plan = LeafPlan {
                delay_ms: rng.gen_range(0..=args.max_delay_ms),
                fails: rng.gen_bool(args.fail_rate),
                name,
            };
            plans.push((parent.clone(), plan));
        } else {
            let sub = parent
                .sub()
                .name(name.clone())
                .target(args.width as usize)
                .build()?;
            plan_level(&sub, depth - 1, args, rng, &name, plans)?;
        }
    }
    Ok(())
}

fn spawn_leaf(reporter: Reporter, plan: LeafPlan) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(plan.delay_ms)).await;
        if plan.fails {
            bump(reporter.data(), FAILED, 1);
            reporter.report_failure(anyhow!(
                "leaf {} failed after {}ms",
                plan.name,
                plan.delay_ms
            ));
        } else {
            bump(reporter.data(), COMPLETED, 1);
            let payload = CompletionPayload::key_value(plan.name, plan.delay_ms);
            if let Err(err) = reporter.report_completion_with(payload) {
                tracing::warn!(reporter = %reporter.name(), error = %err, "leaf report rejected");
            }
        }
    });
}

fn summarize(root: &Reporter, leaves: u64, outcome: Outcome, elapsed: Duration) -> SimSummary {
    let data = root.data();
    let completed = counter(data, COMPLETED);
    let failed = counter(data, FAILED);

    let slowest = data
        .snapshot()
        .into_iter()
        .filter(|(key, _)| key.starts_with(ROOT))
        .filter_map(|(name, v)| v.as_u64().map(|delay_ms| SlowLeaf { name, delay_ms }))
        .max_by_key(|leaf| leaf.delay_ms);

    let (status, error) = match outcome {
        Ok(_) if failed == 0 => ("ok", None),
        Ok(_) => ("partial", None),
        Err(e) => ("failed", Some(format!("{e:#}"))),
    };

    SimSummary {
        status,
        leaves,
        completed,
        failed,
        elapsed_ms: elapsed.as_millis(),
        slowest,
        error,
    }
}
