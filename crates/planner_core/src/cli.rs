//! Command-line argument parser for the headless multi-agent demo binary.

use clap::Parser;

/// Flags accepted by `planner-sim`.
#[derive(Parser)]
#[clap(version, author, about)]
pub struct Cli {
    /// Specify the configuration file to use, overrides the normal
    /// configuration file resolution.
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<std::path::PathBuf>,

    /// Number of replanning ticks to simulate.
    #[arg(short, long, default_value_t = 200)]
    pub ticks: u32,

    /// Dump each agent's trajectory control points to stdout after every
    /// tick, for manual inspection.
    #[arg(long)]
    pub dump_trajectory: bool,

    /// Log verbosity passed through to the `tracing` subscriber filter.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Run with the built-in default configuration instead of resolving a
    /// config file from disk.
    #[arg(long)]
    pub default: bool,
}

#[must_use]
pub fn parse_arguments() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ticks_defaults_to_two_hundred() {
        let cli = Cli::parse_from(["planner-sim"]);
        assert_eq!(cli.ticks, 200);
    }
}
