use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors that can occur while validating the backend base URL.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL names no host to connect to.
    #[error("Base URL must include a host")]
    MissingHost,
    /// Query strings and fragments would be mangled by path joining.
    #[error("Base URL must not contain a query string or fragment")]
    HasQueryOrFragment,
}

/// Validates the backend base URL and normalizes it to end without a slash.
///
/// Plain `http` is accepted: the backend is commonly reached over a local
/// network during development.
///
/// # Examples
///
/// ```
/// use onta::util::validate_base_url;
///
/// let url = validate_base_url("http://192.168.1.20:3000/api/").unwrap();
/// assert_eq!(url.as_str(), "http://192.168.1.20:3000/api");
///
/// assert!(validate_base_url("ftp://example.com").is_err());
/// assert!(validate_base_url("https://example.com/?x=1").is_err());
/// ```
pub fn validate_base_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let mut url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
    require_host(&url)?;

    if url.query().is_some() || url.fragment().is_some() {
        return Err(UrlValidationError::HasQueryOrFragment);
    }

    let trimmed = url.path().trim_end_matches('/').to_owned();
    url.set_path(&trimmed);
    Ok(url)
}

fn require_host(url: &Url) -> Result<(), UrlValidationError> {
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(UrlValidationError::MissingHost),
    }
}

/// True when the URL points at this machine (`localhost`, `127.0.0.0/8`, `::1`).
pub fn is_loopback(url: &Url) -> bool {
    match url.host_str() {
        Some("localhost") => true,
        Some(host) => {
            let host = host
                .strip_prefix('[')
                .and_then(|h| h.strip_suffix(']'))
                .unwrap_or(host);
            host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
        }
        None => false,
    }
}
