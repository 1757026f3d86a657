use log::{debug, error, info, warn};
use std::fs::{File, Metadata};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use super::error::{RequestError, TransferError};
use super::http_status::HttpStatus;
use super::listing;
use super::request::{Request, read_request};
use super::resolve::{ResolvedPath, resolve};
use super::response::{Response, ResponseHead, http_date, parse_http_date};
use super::transfer::{Transfer, copy_to_client, is_peer_disconnect, send_all};

const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// Serves one request per connection from a fixed root directory.
///
/// Cheap to clone: the server keeps one and hands a clone to every worker.
#[derive(Debug, Clone)]
pub struct RequestHandler {
    root: Arc<Path>,
}

impl RequestHandler {
    pub fn new(root: impl Into<Arc<Path>>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn handle_connection(&self, stream: TcpStream, peer: SocketAddr) {
        debug!(
            "[Thread {:?}] Handling connection from {}",
            std::thread::current().id(),
            peer
        );

        let mut reader = BufReader::new(&stream);
        let mut writer = &stream;

        match self.serve(&mut reader, &mut writer, &peer.to_string()) {
            Ok(transfer) if transfer.is_disconnected() => {
                debug!("Client {} disconnected after {} bytes", peer, transfer.bytes());
            }
            Ok(transfer) => {
                debug!("Finished {} ({} bytes written)", peer, transfer.bytes());
            }
            Err(TransferError::Read(e)) => {
                error!("Error reading file for {}: {}", peer, e);
            }
            Err(TransferError::Write(e)) => {
                error!("Error sending response to {}: {}", peer, e);
            }
        }
    }

    /// Read one request from `reader` and answer it on `writer`.
    pub fn serve<R: BufRead, W: Write>(
        &self,
        reader: &mut R,
        writer: &mut W,
        peer: &str,
    ) -> Result<Transfer, TransferError> {
        let request = match read_request(reader) {
            Ok(request) => request,
            Err(e) => return self.reject(writer, e, peer),
        };

        if request.method != "GET" && request.method != "HEAD" {
            warn!("Unsupported method from {}: {}", peer, request.method);
            let detail = format!("Unsupported method ({})", request.method);
            return self.send_error(writer, &request, HttpStatus::NotImplemented, &detail, peer);
        }

        let resolved = match resolve(&self.root, &request.target) {
            Ok(resolved) => resolved,
            Err(e) => {
                let status = e.status();
                if status == HttpStatus::Forbidden {
                    warn!("Path traversal attempt from {}: {}", peer, request.target);
                }
                return self.send_error(writer, &request, status, &e.to_string(), peer);
            }
        };

        if resolved.fs_path.is_dir() {
            self.serve_directory(writer, &request, &resolved, peer)
        } else {
            self.serve_file(writer, &request, &resolved.fs_path, resolved.trailing_slash, peer)
        }
    }

    fn reject<W: Write>(
        &self,
        writer: &mut W,
        err: RequestError,
        peer: &str,
    ) -> Result<Transfer, TransferError> {
        let Some(status) = err.status() else {
            match &err {
                RequestError::Io(e) if !is_peer_disconnect(e) => {
                    error!("Error reading request from {}: {}", peer, e);
                }
                _ => debug!("No request from {}: {}", peer, err),
            }
            return Ok(Transfer::Complete { bytes: 0 });
        };

        let response = Response::error(status, &err.to_string());
        self.log_error(peer, "-", status, &err.to_string());
        self.log_request(peer, "-", status, response.content_length());
        send_all(writer, &response.head.to_bytes())?.and_then(|| send_all(writer, &response.body))
    }

    fn serve_directory<W: Write>(
        &self,
        writer: &mut W,
        request: &Request,
        resolved: &ResolvedPath,
        peer: &str,
    ) -> Result<Transfer, TransferError> {
        if !resolved.trailing_slash {
            let response = Response::redirect(resolved.with_trailing_slash());
            return self.send(writer, request, response, peer);
        }

        for index in INDEX_FILES {
            let candidate = resolved.fs_path.join(index);
            if candidate.is_file() {
                return self.serve_file(writer, request, &candidate, false, peer);
            }
        }

        match listing::read_entries(&resolved.fs_path) {
            Ok(entries) => {
                let page = listing::render(&resolved.url_path, &entries);
                self.send(writer, request, Response::html(HttpStatus::Ok, page), peer)
            }
            Err(e) => {
                let status = if e.kind() == ErrorKind::PermissionDenied {
                    HttpStatus::Forbidden
                } else {
                    HttpStatus::NotFound
                };
                self.send_error(writer, request, status, "No permission to list directory", peer)
            }
        }
    }

    fn serve_file<W: Write>(
        &self,
        writer: &mut W,
        request: &Request,
        path: &Path,
        trailing_slash: bool,
        peer: &str,
    ) -> Result<Transfer, TransferError> {
        if trailing_slash {
            return self.send_error(writer, request, HttpStatus::NotFound, "File not found", peer);
        }

        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                let (status, detail) = match e.kind() {
                    ErrorKind::NotFound => (HttpStatus::NotFound, "File not found"),
                    ErrorKind::PermissionDenied => (HttpStatus::Forbidden, "Permission denied"),
                    _ => {
                        error!("Error opening file {:?} for {}: {}", path, peer, e);
                        (HttpStatus::InternalServerError, "Cannot open file")
                    }
                };
                return self.send_error(writer, request, status, detail, peer);
            }
        };

        let metadata = match file.metadata() {
            Ok(meta) => meta,
            Err(e) => {
                error!("Error getting metadata for {:?}: {}", path, e);
                return self.send_error(
                    writer,
                    request,
                    HttpStatus::InternalServerError,
                    "Cannot read file metadata",
                    peer,
                );
            }
        };

        let modified = metadata.modified().ok();
        if let Some(modified) = modified {
            if not_modified_since(request, modified) {
                let head = ResponseHead::new(HttpStatus::NotModified)
                    .header("Last-Modified", http_date(modified));
                self.log_request(peer, request.request_line(), head.status, 0);
                return send_head(writer, request, &head);
            }
        }

        let head = file_head(path, &metadata, modified);
        self.log_request(peer, request.request_line(), head.status, metadata.len());

        let sent = send_head(writer, request, &head)?;
        if request.is_head() {
            return Ok(sent);
        }

        let sent = sent.and_then(|| copy_to_client(&mut file, writer))?;
        if let Transfer::Complete { bytes } = sent {
            debug!("Served file to {}: {:?} ({} bytes)", peer, path, bytes);
        }
        Ok(sent)
    }

    fn send<W: Write>(
        &self,
        writer: &mut W,
        request: &Request,
        response: Response,
        peer: &str,
    ) -> Result<Transfer, TransferError> {
        self.log_request(
            peer,
            request.request_line(),
            response.head.status,
            response.content_length(),
        );

        let sent = send_head(writer, request, &response.head)?;
        if request.is_head() || response.head.status.is_bodyless() {
            return Ok(sent);
        }
        sent.and_then(|| send_all(writer, &response.body))
    }

    fn send_error<W: Write>(
        &self,
        writer: &mut W,
        request: &Request,
        status: HttpStatus,
        detail: &str,
        peer: &str,
    ) -> Result<Transfer, TransferError> {
        self.log_error(peer, request.request_line(), status, detail);
        self.send(writer, request, Response::error(status, detail), peer)
    }

    fn log_error(&self, peer: &str, request_line: &str, status: HttpStatus, detail: &str) {
        if status.is_server_error() {
            error!("{} \"{}\" code {}, message {}", peer, request_line, status.code(), detail);
        } else if status == HttpStatus::Forbidden {
            warn!("{} \"{}\" code {}, message {}", peer, request_line, status.code(), detail);
        } else {
            info!("{} \"{}\" code {}, message {}", peer, request_line, status.code(), detail);
        }
    }

    fn log_request(&self, peer: &str, request_line: &str, status: HttpStatus, size: u64) {
        info!("{} \"{}\" {} {}", peer, request_line, status.code(), size);
    }
}

/// HTTP/0.9 clients get no status line or headers.
fn send_head<W: Write>(
    writer: &mut W,
    request: &Request,
    head: &ResponseHead,
) -> Result<Transfer, TransferError> {
    if request.is_http09() {
        return Ok(Transfer::Complete { bytes: 0 });
    }
    send_all(writer, &head.to_bytes())
}

fn file_head(path: &Path, metadata: &Metadata, modified: Option<SystemTime>) -> ResponseHead {
    let content_type = mime_guess::from_path(path).first_or_octet_stream();
    let head = ResponseHead::new(HttpStatus::Ok)
        .header("Content-Type", content_type.essence_str())
        .header("Content-Length", metadata.len().to_string());

    match modified {
        Some(modified) => head.header("Last-Modified", http_date(modified)),
        None => head,
    }
}

/// `If-Modified-Since` check; ignored when `If-None-Match` is present.
fn not_modified_since(request: &Request, modified: SystemTime) -> bool {
    if request.header("If-None-Match").is_some() {
        return false;
    }
    let Some(since) = request.header("If-Modified-Since").and_then(parse_http_date) else {
        return false;
    };

    let modified_secs = match modified.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs() as i64,
        Err(_) => return false,
    };
    modified_secs <= since.timestamp()
}
