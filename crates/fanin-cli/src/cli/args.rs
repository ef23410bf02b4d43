use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fanin",
    version,
    about = "Fan-out/fan-in with completion reporters: exactly-once callbacks over trees of async work"
)]
pub struct Cli {
    /// Reporter config (YAML): `settled` and `child_failure` policies
    #[arg(long, global = true, env = "FANIN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log reporter lifecycle events to stderr (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Disk usage of a directory tree, one sub-reporter per directory
    Du(DuArgs),
    /// Simulated fan-out tree with random delays and failures
    Sim(SimArgs),
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct DuArgs {
    pub path: PathBuf,

    /// Fail the whole walk on the first I/O error instead of recording it
    #[arg(long)]
    pub strict: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SimArgs {
    /// Levels of sub-reporters below the root
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..=8))]
    pub depth: u32,

    /// Branches per node
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..=64))]
    pub width: u32,

    /// Probability that a leaf reports failure
    #[arg(long, default_value_t = 0.0, value_parser = parse_rate)]
    pub fail_rate: f64,

    #[arg(long, default_value_t = 20)]
    pub max_delay_ms: u64,

    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Forward leaf failures up the tree instead of counting them as units
    #[arg(long)]
    pub propagate: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

fn parse_rate(raw: &str) -> Result<f64, String> {
    let rate: f64 = raw
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(format!("{rate} is outside 0.0..=1.0"));
    }
    Ok(rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_must_be_a_probability() {
        assert_eq!(parse_rate("0.25"), Ok(0.25));
        assert!(parse_rate("1.5").is_err());
        assert!(parse_rate("-0.1").is_err());
        assert!(parse_rate("half").is_err());
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["fanin", "du", ".", "--verbose", "--format", "json"])
            .unwrap();
        assert!(cli.verbose);
        match cli.cmd {
            Command::Du(args) => assert_eq!(args.format, OutputFormat::Json),
            _ => panic!("expected du"),
        }
    }

    #[test]
    fn sim_depth_is_bounded() {
        assert!(Cli::try_parse_from(["fanin", "sim", "--depth", "0"]).is_err());
        assert!(Cli::try_parse_from(["fanin", "sim", "--width", "65"]).is_err());
    }
}
