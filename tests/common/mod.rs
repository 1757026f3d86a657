#![allow(dead_code)]

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::Path;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use static_devserver::server::HttpServer;
use static_devserver::server::config::ServerConfig;
use static_devserver::server::signal::ShutdownHandle;

pub struct RunningServer {
    pub addr: SocketAddr,
    shutdown: ShutdownHandle,
    thread: Option<JoinHandle<io::Result<()>>>,
}

impl RunningServer {
    pub fn start(root: &Path) -> Self {
        Self::start_on(root, 0)
    }

    pub fn start_on(root: &Path, port: u16) -> Self {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port,
            directory: Some(root.to_path_buf()),
        };
        let server = HttpServer::new(&config).expect("server should start");
        let addr = server.local_addr();
        let shutdown = server.shutdown_handle();
        let thread = thread::spawn(move || server.run());

        Self {
            addr,
            shutdown,
            thread: Some(thread),
        }
    }

    /// Stop accepting and wait until the listener is released.
    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        self.shutdown.shutdown();
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .expect("accept loop panicked")
                .expect("accept loop failed");
        }
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.halt();
        }
    }
}

pub struct Reply {
    pub status: u16,
    pub head: String,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn header(&self, name: &str) -> Option<String> {
        self.head.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }
}

pub fn connect(addr: SocketAddr) -> TcpStream {
    let stream = TcpStream::connect(addr).expect("connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    stream
        .set_write_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    stream
}

pub fn send_raw(addr: SocketAddr, raw: &str) -> Reply {
    let mut stream = connect(addr);
    stream.write_all(raw.as_bytes()).unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).unwrap();

    let split = response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|p| p + 4)
        .expect("response has a header block");
    let head = String::from_utf8_lossy(&response[..split]).into_owned();
    let status = head
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .expect("status code");

    Reply {
        status,
        head,
        body: response[split..].to_vec(),
    }
}

pub fn get(addr: SocketAddr, path: &str) -> Reply {
    send_raw(
        addr,
        &format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", path),
    )
}
