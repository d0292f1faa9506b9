use clap::Parser;
use emporium::ApiResult;

use crate::{
    commands::{run_command, Cli},
    logging::init_tracing,
};

/// Parses the arguments, sets up tracing and runs the requested command.
pub async fn run() -> ApiResult<()> {
    let cli = Cli::parse();

    init_tracing(cli.json, cli.verbose);

    run_command(cli.command).await
}
