use chrono::{DateTime, Utc};
use std::time::SystemTime;

use super::http_status::HttpStatus;

pub const SERVER_NAME: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE_FORMAT).to_string()
}

/// Parse an RFC 7231 IMF-fixdate such as `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Status line plus headers. Every head carries `Server`, `Date` and
/// `Connection: close`.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: HttpStatus,
    headers: Vec<(&'static str, String)>,
}

impl ResponseHead {
    pub fn new(status: HttpStatus) -> Self {
        Self {
            status,
            headers: vec![
                ("Server", SERVER_NAME.to_string()),
                ("Date", http_date(SystemTime::now())),
            ],
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = self.status.as_response_line();
        for (name, value) in &self.headers {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str("Connection: close\r\n\r\n");
        head.into_bytes()
    }
}

/// A response whose body is already in memory.
#[derive(Debug, Clone)]
pub struct Response {
    pub head: ResponseHead,
    pub body: Vec<u8>,
}

impl Response {
    pub fn html(status: HttpStatus, body: String) -> Self {
        let body = body.into_bytes();
        Self {
            head: ResponseHead::new(status)
                .header("Content-Type", HTML_CONTENT_TYPE)
                .header("Content-Length", body.len().to_string()),
            body,
        }
    }

    pub fn error(status: HttpStatus, detail: &str) -> Self {
        let body = format!(
            "<html><head><title>{code} {text}</title></head><body><h1>{code} {text}</h1><p>{detail}</p></body></html>",
            code = status.code(),
            text = status.text(),
            detail = escape_html(detail),
        );
        Self::html(status, body)
    }

    pub fn redirect(location: String) -> Self {
        Self {
            head: ResponseHead::new(HttpStatus::MovedPermanently)
                .header("Location", location)
                .header("Content-Length", "0"),
            body: Vec::new(),
        }
    }

    pub fn content_length(&self) -> u64 {
        self.body.len() as u64
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn formats_and_parses_http_dates() {
        let time = UNIX_EPOCH + Duration::from_secs(784111777);
        assert_eq!(http_date(time), "Sun, 06 Nov 1994 08:49:37 GMT");

        let parsed = parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT").unwrap();
        assert_eq!(parsed.timestamp(), 784111777);
        assert_eq!(parse_http_date("yesterday"), None);
    }

    #[test]
    fn head_serialization() {
        let head = ResponseHead::new(HttpStatus::Ok)
            .header("Content-Type", "text/plain")
            .header("Content-Length", "5");
        let text = String::from_utf8(head.to_bytes()).unwrap();

        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains(&format!("Server: {}\r\n", SERVER_NAME)));
        assert!(text.contains("Date: "));
        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(text.contains("Content-Length: 5\r\n"));
        assert!(text.ends_with("Connection: close\r\n\r\n"));
    }

    #[test]
    fn error_page_escapes_detail() {
        let response = Response::error(HttpStatus::NotFound, "<script>");
        let body = String::from_utf8(response.body.clone()).unwrap();
        assert!(body.contains("<h1>404 Not Found</h1>"));
        assert!(body.contains("&lt;script&gt;"));
        let head = String::from_utf8(response.head.to_bytes()).unwrap();
        assert!(head.contains(&format!("Content-Length: {}\r\n", body.len())));
    }

    #[test]
    fn redirect_has_location_and_no_body() {
        let response = Response::redirect("/docs/".to_string());
        assert_eq!(response.head.status, HttpStatus::MovedPermanently);
        let head = String::from_utf8(response.head.to_bytes()).unwrap();
        assert!(head.starts_with("HTTP/1.1 301 Moved Permanently\r\n"));
        assert!(head.contains("Location: /docs/\r\n"));
        assert!(response.body.is_empty());
    }
}
