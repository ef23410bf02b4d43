use super::args::*;
use fanin_core::ReporterConfig;

pub mod du;
pub mod sim;

use crate::exit_codes::SUCCESS;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let config = match &cli.config {
        Some(path) => ReporterConfig::load(path)?,
        None => ReporterConfig::default(),
    };
    tracing::debug!(?config, "reporter config");

    match cli.cmd {
        Command::Du(args) => du::run(args, config).await,
        Command::Sim(args) => sim::run(args, config).await,
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(SUCCESS)
        }
    }
}

/// Add `n` to the integer counter stored at `key`.
pub(crate) fn bump(data: &fanin_core::DataBag, key: &str, n: u64) {
    data.update(|map| {
        let current = map.get(key).and_then(serde_json::Value::as_u64).unwrap_or(0);
        map.insert(key.to_string(), serde_json::json!(current + n));
    });
}

pub(crate) fn counter(data: &fanin_core::DataBag, key: &str) -> u64 {
    data.get(key)
        .and_then(|v| v.as_u64())
        .unwrap_or(0)
}

/// Count one unit, logging instead of failing when the reporter refuses it.
pub(crate) fn complete(reporter: &fanin_core::Reporter) {
    if let Err(err) = reporter.report_completion() {
        tracing::warn!(reporter = %reporter.name(), error = %err, "completion rejected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fanin_core::DataBag;

    #[test]
    fn bump_accumulates() {
        let bag = DataBag::new();
        bump(&bag, "bytes", 5);
        bump(&bag, "bytes", 7);
        assert_eq!(counter(&bag, "bytes"), 12);
        assert_eq!(counter(&bag, "missing"), 0);
    }
}
