use std::process::ExitCode;

use clap::Parser;
use semvec_cli::{Cli, run};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    semvec_telemetry::init("semvec", cli.log_format)?;
    run(cli).await
}
