//! The connection endpoint URL grammar (spec.md §6):
//!
//! ```text
//! url     = [proto "://"] [host [":" port]] ["/" path]
//! proto   = "file" | "cube"    ; default: file
//! port    = digits              ; default: 3300
//! ```
//!
//! A `file://` URL carries no host/port, just a path; a `cube://` URL
//! requires a host.
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proto {
    File,
    Cube,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubeUrl {
    pub proto: Proto,
    pub host: Option<String>,
    pub port: u16,
    pub path: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("unknown protocol '{0}', expected 'file' or 'cube'")]
    UnknownProto(String),

    #[error("cube:// URLs require a host")]
    MissingHost,

    #[error("invalid port '{0}'")]
    InvalidPort(String),
}

pub fn parse(url: &str) -> Result<CubeUrl, UrlError> {
    let (proto_str, rest) = match url.split_once("://") {
        Some((p, r)) => (p, r),
        None => ("file", url),
    };
    let proto = match proto_str {
        "file" => Proto::File,
        "cube" => Proto::Cube,
        other => return Err(UrlError::UnknownProto(other.to_string())),
    };
    match proto {
        Proto::File => Ok(CubeUrl { proto, host: None, port: DEFAULT_PORT, path: non_empty(rest) }),
        Proto::Cube => {
            let (hostport, path) = match rest.split_once('/') {
                Some((hp, p)) => (hp, non_empty(p)),
                None => (rest, None),
            };
            if hostport.is_empty() {
                return Err(UrlError::MissingHost);
            }
            let (host, port) = match hostport.split_once(':') {
                Some((h, p)) => {
                    let port = p.parse().map_err(|_| UrlError::InvalidPort(p.to_string()))?;
                    (h.to_string(), port)
                }
                None => (hostport.to_string(), DEFAULT_PORT),
            };
            Ok(CubeUrl { proto, host: Some(host), port, path })
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.strip_prefix('/').unwrap_or(s);
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_path_defaults_to_file_proto() {
        let url = parse("report.cubex").unwrap();
        assert_eq!(url.proto, Proto::File);
        assert_eq!(url.host, None);
        assert_eq!(url.path.as_deref(), Some("report.cubex"));
    }

    #[test]
    fn file_scheme_carries_no_host_or_port() {
        let url = parse("file:///tmp/report.cubex").unwrap();
        assert_eq!(url.proto, Proto::File);
        assert_eq!(url.host, None);
        assert_eq!(url.port, DEFAULT_PORT);
        assert_eq!(url.path.as_deref(), Some("tmp/report.cubex"));
    }

    #[test]
    fn cube_scheme_with_explicit_port() {
        let url = parse("cube://example.org:4000/profile.cubex").unwrap();
        assert_eq!(url.proto, Proto::Cube);
        assert_eq!(url.host.as_deref(), Some("example.org"));
        assert_eq!(url.port, 4000);
        assert_eq!(url.path.as_deref(), Some("profile.cubex"));
    }

    #[test]
    fn cube_scheme_defaults_port_when_omitted() {
        let url = parse("cube://example.org").unwrap();
        assert_eq!(url.port, DEFAULT_PORT);
        assert_eq!(url.path, None);
    }

    #[test]
    fn cube_scheme_without_host_is_an_error() {
        assert_eq!(parse("cube:///profile.cubex").unwrap_err(), UrlError::MissingHost);
    }

    #[test]
    fn unknown_scheme_is_an_error() {
        assert!(matches!(parse("ftp://host/path"), Err(UrlError::UnknownProto(p)) if p == "ftp"));
    }
}
