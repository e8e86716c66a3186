//! Listening socket and accept loop.

use std::fmt::Display;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body::Body;
use thiserror::Error;
use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::{error, info, warn};

use crate::connection::HttpConnection;
use crate::handler::Handler;
use crate::protocol::body::ReqBody;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("can't bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

/// A bound listener, ready to serve connections.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Server {
    /// Binds the listening socket. Failing here is fatal for the caller: nothing is served.
    pub async fn bind<A>(addr: A) -> Result<Self, ServerError>
    where
        A: ToSocketAddrs + Display,
    {
        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(source) => {
                error!(addr = %addr, cause = %source, "bind server error");
                return Err(ServerError::Bind { addr: addr.to_string(), source });
            }
        };
        let local_addr = listener.local_addr()?;

        info!(addr = %local_addr, "start listening");
        Ok(Self { listener, local_addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts connections forever, one task per connection.
    ///
    /// A failed accept is logged and does not stop the loop; neither does a failed connection.
    pub async fn serve<H>(self, handler: Arc<H>)
    where
        H: Handler<ReqBody> + 'static,
        H::RespBody: Body + Send + Unpin,
        <H::RespBody as Body>::Data: Send,
        <H::RespBody as Body>::Error: Display + Send,
        H::Error: Send,
    {
        loop {
            let (tcp_stream, remote_addr) = match self.listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            let handler = Arc::clone(&handler);

            tokio::spawn(async move {
                let (reader, writer) = tcp_stream.into_split();
                let connection = HttpConnection::new(reader, writer).with_remote_addr(remote_addr);
                match connection.process(handler).await {
                    Ok(()) => {
                        info!(remote_addr = %remote_addr, "finished process, connection shutdown");
                    }
                    Err(e) => {
                        error!(remote_addr = %remote_addr, cause = %e, "service has error, connection shutdown");
                    }
                }
            });
        }
    }
}
