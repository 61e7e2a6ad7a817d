use clap::Parser;
use env_logger::Env;

use imrank::Opts;
use imrank::cli::SubCommandExtend;
use imrank::config::SubCommand;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let opts = Opts::parse();

    match &opts.subcmd {
        SubCommand::Rank(config) => config.run(&opts),
        SubCommand::Match(config) => config.run(&opts),
    }
}
