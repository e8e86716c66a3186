use std::process::ExitCode;

use echo_server::cli::Args;
use echo_server::{ModeRegistry, logging};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse_normalized();

    if let Err(e) = logging::init() {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let registry = ModeRegistry::builtin();
    let mode = match args.resolve_mode(&registry) {
        Ok(mode) => mode,
        Err(e) => {
            error!(cause = %e, "can't select server mode");
            return ExitCode::FAILURE;
        }
    };

    let addr = args.address();
    info!(mode = mode.name(), addr = %addr, "starting server");

    match mode.create().run(addr).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(cause = %e, "server stopped");
            ExitCode::FAILURE
        }
    }
}
