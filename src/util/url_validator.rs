use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors that can occur while validating the assistant service URL.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// Plain HTTP to a remote host would expose the API token.
    #[error("Refusing non-HTTPS base URL {0} (HTTPS required except for localhost)")]
    InsecureBaseUrl(String),
    /// The URL has no host component.
    #[error("Base URL has no host")]
    MissingHost,
}

/// Validates the service origin that both endpoints hang off.
///
/// Accepts `https://` anywhere and `http://` only for loopback hosts, which
/// is what a local development server looks like.
///
/// # Examples
///
/// ```
/// use scholar::util::validate_base_url;
///
/// assert!(validate_base_url("https://truescholar.in").is_ok());
/// assert!(validate_base_url("http://localhost:3000").is_ok());
/// assert!(validate_base_url("http://truescholar.in").is_err());
/// assert!(validate_base_url("ftp://truescholar.in").is_err());
/// ```
pub fn validate_base_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    let host = url.host_str().ok_or(UrlValidationError::MissingHost)?;

    match url.scheme() {
        "https" => {}
        "http" => {
            if !is_loopback_host(host) {
                tracing::error!(base_url = %url, "Rejecting non-HTTPS base URL");
                return Err(UrlValidationError::InsecureBaseUrl(url.to_string()));
            }
            tracing::debug!(base_url = %url, "Using plain HTTP base URL (localhost only)");
        }
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    Ok(url)
}

/// Resolve an endpoint `path` against `base`, keeping any path prefix the
/// base carries (`https://host/app` + `/api/chat` → `https://host/app/api/chat`).
pub fn endpoint_url(base: &Url, path: &str) -> Url {
    let mut joined = base.clone();
    let prefix = base.path().trim_end_matches('/');
    let suffix = path.trim_start_matches('/');
    joined.set_path(&format!("{}/{}", prefix, suffix));
    joined.set_query(None);
    joined.set_fragment(None);
    joined
}

fn is_loopback_host(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    // Strip brackets from IPv6 addresses for parsing
    let host_for_parse = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    host_for_parse
        .parse::<IpAddr>()
        .map(|ip| ip.is_loopback())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_https_remote_accepted() {
        let url = validate_base_url("https://example.com").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_http_loopback_accepted() {
        assert!(validate_base_url("http://localhost:3000").is_ok());
        assert!(validate_base_url("http://127.0.0.1:8080").is_ok());
        assert!(validate_base_url("http://[::1]:3000").is_ok());
    }

    #[test]
    fn test_http_remote_rejected() {
        let err = validate_base_url("http://example.com").unwrap_err();
        assert!(matches!(err, UrlValidationError::InsecureBaseUrl(_)));
        assert!(matches!(
            validate_base_url("http://192.168.1.10"),
            Err(UrlValidationError::InsecureBaseUrl(_))
        ));
    }

    #[test]
    fn test_other_schemes_rejected() {
        assert!(matches!(
            validate_base_url("ftp://example.com"),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
        assert!(validate_base_url("not a url").is_err());
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let base = validate_base_url("http://localhost:3000").unwrap();
        assert_eq!(
            endpoint_url(&base, "/api/chat").as_str(),
            "http://localhost:3000/api/chat"
        );

        let prefixed = validate_base_url("https://example.com/app/").unwrap();
        assert_eq!(
            endpoint_url(&prefixed, "api/predefined-questions").as_str(),
            "https://example.com/app/api/predefined-questions"
        );
    }
}
