use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors that can occur while validating a bridge base URL.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
    /// Plain http pointed at something other than a loopback host.
    #[error("Insecure URL: HTTPS required for {0} (http is only accepted for localhost)")]
    InsecureScheme(String),
}

/// Validates the base URL of an RSS-Bridge instance.
///
/// Accepts `https://` URLs with a host. Plain `http://` is accepted only for
/// loopback hosts so local bridges and test servers still work.
///
/// # Errors
///
/// Returns [`UrlValidationError`] if:
/// - The URL cannot be parsed ([`UrlValidationError::InvalidUrl`])
/// - The scheme is not `http` or `https` ([`UrlValidationError::UnsupportedScheme`])
/// - There is no host ([`UrlValidationError::MissingHost`])
/// - The scheme is `http` and the host is not loopback ([`UrlValidationError::InsecureScheme`])
///
/// # Examples
///
/// ```
/// use tgsift::util::validate_bridge_url;
///
/// let url = validate_bridge_url("https://rss-bridge.org/bridge01/").unwrap();
/// assert_eq!(url.host_str(), Some("rss-bridge.org"));
///
/// assert!(validate_bridge_url("http://127.0.0.1:3000/").is_ok());
/// assert!(validate_bridge_url("http://bridge.example.com/").is_err());
/// assert!(validate_bridge_url("file:///etc/passwd").is_err());
/// ```
pub fn validate_bridge_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or(UrlValidationError::MissingHost);

    match url.scheme() {
        "https" => {
            host?;
        }
        "http" => {
            let host = host?;
            if !is_loopback_host(host) {
                return Err(UrlValidationError::InsecureScheme(host.to_owned()));
            }
        }
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    Ok(url)
}

fn is_loopback_host(host: &str) -> bool {
    if host == "localhost" {
        return true;
    }

    // Strip brackets from IPv6 addresses for parsing
    let host_for_parse = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    host_for_parse
        .parse::<IpAddr>()
        .is_ok_and(|ip| ip.is_loopback())
}
