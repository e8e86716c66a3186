//! Server modes: named server implementations, one of which the binary runs.
//!
//! The set of modes is a static table of `name -> factory`, looked up through
//! [`ModeRegistry`]. Adding a mode means adding one entry to that table.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use echo_http::server::{Server, ServerError};

use crate::echo::EchoHandler;
use crate::error::ModeError;

/// A server that can be started on an address.
#[async_trait]
pub trait HttpServer: Send + Sync + fmt::Debug {
    /// Binds `addr` and serves until the process stops. Only returns on a startup failure.
    async fn run(&self, addr: SocketAddr) -> Result<(), ServerError>;
}

pub type ServerFactory = fn() -> Box<dyn HttpServer>;

/// A named server implementation.
#[derive(Debug, Clone, Copy)]
pub struct Mode {
    name: &'static str,
    factory: ServerFactory,
}

impl Mode {
    pub const fn new(name: &'static str, factory: ServerFactory) -> Self {
        Self { name, factory }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Builds a fresh server of this mode.
    pub fn create(&self) -> Box<dyn HttpServer> {
        (self.factory)()
    }
}

static BUILTIN_MODES: &[Mode] = &[Mode::new("default", default_server)];

fn default_server() -> Box<dyn HttpServer> {
    Box::new(DefaultServer)
}

/// Lookup table of the available modes.
#[derive(Debug, Clone, Copy)]
pub struct ModeRegistry {
    modes: &'static [Mode],
}

impl Default for ModeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ModeRegistry {
    pub const fn new(modes: &'static [Mode]) -> Self {
        Self { modes }
    }

    /// The modes this binary ships with.
    pub const fn builtin() -> Self {
        Self::new(BUILTIN_MODES)
    }

    pub fn get(&self, name: &str) -> Result<Mode, ModeError> {
        self.modes
            .iter()
            .find(|mode| mode.name == name)
            .copied()
            .ok_or_else(|| ModeError::Unknown { name: name.to_owned(), valid: self.describe() })
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.modes.iter().map(Mode::name)
    }

    /// The valid names, quoted and comma separated, e.g. `"default", "other"`.
    pub fn describe(&self) -> String {
        self.names().map(|name| format!("\"{name}\"")).collect::<Vec<_>>().join(", ")
    }

    /// The error for a command line that names no mode at all.
    pub fn missing(&self) -> ModeError {
        ModeError::Missing { valid: self.describe() }
    }
}

/// The `echo-http` server running [`EchoHandler`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultServer;

#[async_trait]
impl HttpServer for DefaultServer {
    async fn run(&self, addr: SocketAddr) -> Result<(), ServerError> {
        let server = Server::bind(addr).await?;
        server.serve(Arc::new(EchoHandler)).await;
        Ok(())
    }
}
