use clap::Parser;
use sentry_cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    sentry_cli::run(cli)
}
