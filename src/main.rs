//! Cover Scout command line tool.

use clap::Parser;
use cover_scout::{cli, logging};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    let settings = args.load_settings();
    let _log = logging::init(&settings.logging());

    cli::run_command(&args, settings)
}
