//! Command line of the binary.
//!
//! Both `--mode default` and the single dash form `-mode default` (also `-mode=default`) are
//! accepted, the same goes for `port`.

use std::ffi::OsString;
use std::net::{Ipv4Addr, SocketAddr};

use clap::Parser;

use crate::error::ModeError;
use crate::mode::{Mode, ModeRegistry};

const LONG_FLAGS: [&str; 2] = ["mode", "port"];

#[derive(Parser, Debug)]
#[command(name = "echo-server")]
#[command(version)]
#[command(about = "An HTTP server that answers every POST with its own body", long_about = None)]
pub struct Args {
    /// Server implementation to run (available: "default")
    #[arg(long, value_parser = parse_mode)]
    pub mode: Option<Mode>,

    /// Port to listen on, on every IPv4 interface
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
}

impl Args {
    /// Parses the process arguments, exiting with usage on error.
    pub fn parse_normalized() -> Self {
        Self::parse_from(normalize(std::env::args_os()))
    }

    pub fn try_parse_normalized_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize(args))
    }

    /// The selected mode; not naming one is an error.
    pub fn resolve_mode(&self, registry: &ModeRegistry) -> Result<Mode, ModeError> {
        self.mode.ok_or_else(|| registry.missing())
    }

    pub fn address(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

fn parse_mode(name: &str) -> Result<Mode, ModeError> {
    ModeRegistry::builtin().get(name)
}

/// Rewrites `-mode`/`-port` into their `--` form, leaving the program name alone.
fn normalize<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    args.next().into_iter().chain(args.map(normalize_flag)).collect()
}

fn normalize_flag(arg: OsString) -> OsString {
    let Some(flag) = arg.to_str().and_then(|arg| arg.strip_prefix('-')) else {
        return arg;
    };

    for name in LONG_FLAGS {
        if let Some(rest) = flag.strip_prefix(name)
            && (rest.is_empty() || rest.starts_with('='))
        {
            return format!("--{flag}").into();
        }
    }

    arg
}
