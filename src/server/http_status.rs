#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    Ok,
    MovedPermanently,
    NotModified,
    BadRequest,
    Forbidden,
    NotFound,
    UriTooLong,
    HeaderFieldsTooLarge,
    InternalServerError,
    NotImplemented,
    VersionNotSupported,
}

impl HttpStatus {
    pub fn code(&self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::MovedPermanently => 301,
            Self::NotModified => 304,
            Self::BadRequest => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::UriTooLong => 414,
            Self::HeaderFieldsTooLarge => 431,
            Self::InternalServerError => 500,
            Self::NotImplemented => 501,
            Self::VersionNotSupported => 505,
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::MovedPermanently => "Moved Permanently",
            Self::NotModified => "Not Modified",
            Self::BadRequest => "Bad Request",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not Found",
            Self::UriTooLong => "URI Too Long",
            Self::HeaderFieldsTooLarge => "Request Header Fields Too Large",
            Self::InternalServerError => "Internal Server Error",
            Self::NotImplemented => "Not Implemented",
            Self::VersionNotSupported => "HTTP Version Not Supported",
        }
    }

    /// Statuses that never carry a message body.
    pub fn is_bodyless(&self) -> bool {
        matches!(self, Self::NotModified)
    }

    pub fn is_server_error(&self) -> bool {
        self.code() >= 500
    }

    pub fn as_response_line(&self) -> String {
        format!("HTTP/1.1 {} {}\r\n", self.code(), self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_line_format() {
        assert_eq!(HttpStatus::Ok.as_response_line(), "HTTP/1.1 200 OK\r\n");
        assert_eq!(
            HttpStatus::VersionNotSupported.as_response_line(),
            "HTTP/1.1 505 HTTP Version Not Supported\r\n"
        );
    }

    #[test]
    fn classes() {
        assert!(HttpStatus::NotImplemented.is_server_error());
        assert!(!HttpStatus::NotFound.is_server_error());
        assert!(HttpStatus::NotModified.is_bodyless());
        assert!(!HttpStatus::MovedPermanently.is_bodyless());
    }
}
