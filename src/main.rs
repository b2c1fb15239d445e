use anyhow::Result;
use clap::Parser;

mod cli;
mod monitor;
mod probe;
mod send;
mod serve;
mod session;
mod stats;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = cli::Cli::parse();
    match args.cmd {
        cli::Cmd::Probe(opts) => probe::run(opts),
        cli::Cmd::Serve(opts) => serve::run(opts),
        cli::Cmd::Send(opts) => send::run(opts),
        cli::Cmd::Monitor(opts) => monitor::run(opts),
    }
}
