//! Log output of the binaries.

use std::io;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::error::StartupError;

/// Installs the process-wide subscriber: formatted output at `INFO` and above.
///
/// Fails if a subscriber is already installed.
pub fn init() -> Result<(), StartupError> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Installs the subscriber of the echo client, on stderr so replies on stdout stay readable.
///
/// `debug` lowers the level to `DEBUG`, which turns on the hex dump of every exchange.
pub fn init_client(debug: bool) -> Result<(), StartupError> {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).with_writer(io::stderr).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
