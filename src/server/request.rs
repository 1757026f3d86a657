use log::debug;
use std::io::{BufRead, Read};

use super::error::RequestError;

pub const MAX_LINE_LENGTH: usize = 65536;
pub const MAX_HEADERS: usize = 100;
pub const HTTP09: &str = "HTTP/0.9";

#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub target: String,
    pub version: String,
    pub headers: Vec<(String, String)>,
    request_line: String,
}

impl Request {
    pub fn request_line(&self) -> &str {
        &self.request_line
    }

    /// Case-insensitive header lookup; the first occurrence wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_head(&self) -> bool {
        self.method == "HEAD"
    }

    /// A bare `GET /path` line. The response is the body alone.
    pub fn is_http09(&self) -> bool {
        self.version == HTTP09
    }
}

enum Line {
    Text(String),
    TooLong,
    Eof,
}

fn read_line<R: BufRead>(reader: &mut R) -> Result<Line, RequestError> {
    let mut buf = Vec::new();
    let n = reader
        .by_ref()
        .take(MAX_LINE_LENGTH as u64 + 1)
        .read_until(b'\n', &mut buf)?;

    if n == 0 {
        return Ok(Line::Eof);
    }
    if buf.len() > MAX_LINE_LENGTH {
        return Ok(Line::TooLong);
    }

    while matches!(buf.last(), Some(b'\n') | Some(b'\r')) {
        buf.pop();
    }
    Ok(Line::Text(String::from_utf8_lossy(&buf).into_owned()))
}

fn check_version(version: &str) -> Result<(), RequestError> {
    let numbers = version
        .strip_prefix("HTTP/")
        .ok_or_else(|| RequestError::BadVersion(version.to_string()))?;

    let (major, minor) = numbers
        .split_once('.')
        .ok_or_else(|| RequestError::BadVersion(version.to_string()))?;

    let major: u32 = major
        .parse()
        .map_err(|_| RequestError::BadVersion(version.to_string()))?;
    minor
        .parse::<u32>()
        .map_err(|_| RequestError::BadVersion(version.to_string()))?;

    if major >= 2 {
        return Err(RequestError::UnsupportedVersion(version.to_string()));
    }
    Ok(())
}

/// Read one request head (request line and headers) from the connection.
pub fn read_request<R: BufRead>(reader: &mut R) -> Result<Request, RequestError> {
    let request_line = match read_line(reader)? {
        Line::Eof => return Err(RequestError::ConnectionClosed),
        Line::TooLong => return Err(RequestError::RequestLineTooLong),
        Line::Text(line) if line.trim().is_empty() => return Err(RequestError::EmptyRequestLine),
        Line::Text(line) => line,
    };

    let words: Vec<&str> = request_line.split_whitespace().collect();
    let (method, target, version) = match words[..] {
        [method, target, version] => {
            check_version(version)?;
            (method, target, version)
        }
        // HTTP/0.9 simple request: no version, no headers follow.
        [method, target] if method == "GET" => {
            debug!("Parsed HTTP/0.9 request: {}", request_line);
            return Ok(Request {
                method: method.to_string(),
                target: target.to_string(),
                version: HTTP09.to_string(),
                headers: Vec::new(),
                request_line,
            });
        }
        [method, _] => return Err(RequestError::BadHttp09Method(method.to_string())),
        _ => return Err(RequestError::MalformedRequestLine(request_line.clone())),
    };

    let mut headers = Vec::new();
    loop {
        let line = match read_line(reader)? {
            Line::Eof => break,
            Line::TooLong => return Err(RequestError::HeaderLineTooLong),
            Line::Text(line) => line,
        };
        if line.is_empty() {
            break;
        }
        if headers.len() >= MAX_HEADERS {
            return Err(RequestError::TooManyHeaders);
        }

        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| RequestError::MalformedHeader(line.clone()))?;
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }

    debug!("Parsed request: {} ({} headers)", request_line, headers.len());

    Ok(Request {
        method: method.to_string(),
        target: target.to_string(),
        version: version.to_string(),
        headers,
        request_line,
    })
}
