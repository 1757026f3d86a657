pub mod config;
pub mod error;
pub mod handler;
pub mod http_status;
pub mod listener;
pub mod listing;
pub mod request;
pub mod resolve;
pub mod response;
pub mod signal;
pub mod transfer;

use log::{debug, error, info};
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::path::Path;
use std::thread;
use std::time::Duration;

use config::ServerConfig;
use error::ServerError;
use handler::RequestHandler;
use signal::ShutdownHandle;
use transfer::is_peer_disconnect;

/// How often the accept loop wakes up to check for shutdown.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct HttpServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    handler: RequestHandler,
    shutdown: ShutdownHandle,
}

impl HttpServer {
    pub fn new(config: &ServerConfig) -> Result<Self, ServerError> {
        let root_dir = config.root_directory()?;
        let root = root_dir
            .canonicalize()
            .map_err(|source| ServerError::Root {
                path: root_dir.clone(),
                source,
            })?;
        if !root.is_dir() {
            return Err(ServerError::Root {
                path: root_dir,
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            });
        }

        let listener = Self::bind(config)?;
        let local_addr = listener.local_addr()?;
        info!("Server started on {} serving {:?}", local_addr, root);

        Ok(Self {
            listener,
            local_addr,
            handler: RequestHandler::new(root),
            shutdown: ShutdownHandle::new(),
        })
    }

    /// Try every address the host resolves to; the first that binds wins.
    fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
        let addr = config.address();
        let candidates = (config.host.as_str(), config.port)
            .to_socket_addrs()
            .map_err(|_| ServerError::AddrResolve(addr.clone()))?;

        let mut last_error = None;
        for candidate in candidates {
            match listener::bind_reusable(&candidate) {
                Ok(listener) => return Ok(listener),
                Err(e) => {
                    debug!("Could not bind {}: {}", candidate, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(source) => Err(ServerError::Bind { addr, source }),
            None => Err(ServerError::AddrResolve(addr)),
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn root(&self) -> &Path {
        self.handler.root()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Accept connections until shutdown is requested, then release the
    /// listening socket. Workers still running are left to finish on their own.
    pub fn run(self) -> io::Result<()> {
        info!("Accepting connections on {}", self.local_addr);

        while !self.shutdown.is_requested() {
            if !listener::wait_for_connection(&self.listener, POLL_INTERVAL)? {
                continue;
            }

            match self.listener.accept() {
                Ok((stream, peer)) => self.dispatch(stream, peer),
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                    ) => {}
                Err(e) if is_peer_disconnect(&e) => {
                    debug!("Connection aborted before accept: {}", e);
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }

        info!("Shutting down listener on {}", self.local_addr);
        Ok(())
    }

    fn dispatch(&self, stream: TcpStream, peer: SocketAddr) {
        debug!("New connection from {}", peer);
        if let Err(e) = stream.set_nonblocking(false) {
            error!("Failed to set blocking mode for {}: {}", peer, e);
            return;
        }

        let handler = self.handler.clone();
        let spawned = thread::Builder::new()
            .name(format!("conn-{}", peer))
            .spawn(move || handler.handle_connection(stream, peer));

        if let Err(e) = spawned {
            error!("Failed to spawn worker for {}: {}", peer, e);
        }
    }
}
