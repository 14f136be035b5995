use clap::Parser;
use restoration_io::cli::{run_command, Cli};
use restoration_io::report::init_tracing;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    run_command(cli.command)?;

    Ok(())
}
