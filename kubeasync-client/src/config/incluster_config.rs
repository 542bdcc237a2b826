//! Loads configuration from the in-cluster service account environment: the
//! host/port environment variables Kubernetes injects into every pod, plus
//! the token and CA bundle it mounts at a fixed path.
use crate::error::ConfigError;

pub(crate) const SERVICE_HOSTENV: &str = "KUBERNETES_SERVICE_HOST";
pub(crate) const SERVICE_PORTENV: &str = "KUBERNETES_SERVICE_PORT";
const SERVICE_TOKENFILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
const SERVICE_CERTFILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";
const SERVICE_DEFAULT_NS: &str = "/var/run/secrets/kubernetes.io/serviceaccount/namespace";

/// Build the cluster URL from `KUBERNETES_SERVICE_HOST`/`KUBERNETES_SERVICE_PORT`.
///
/// Both variables must be set *and* non-empty: an empty string passes
/// `env::var` but is not a usable host or port.
pub fn kube_server() -> Option<http::Uri> {
    let host = std::env::var(SERVICE_HOSTENV).ok().filter(|s| !s.is_empty())?;
    let port = std::env::var(SERVICE_PORTENV).ok().filter(|s| !s.is_empty())?;
    format!("https://{}", join_host_port(&host, &port)).parse().ok()
}

/// Joins a host and port the way Go's `net.JoinHostPort` does: an IPv6
/// literal (one containing `:` or a zone id `%`) is bracketed so the
/// trailing `:port` stays unambiguous.
///
/// `kube-server`-style URL construction upstream only ever targets
/// DNS-named hosts and skips this; kept here because the in-cluster host
/// env var can legitimately be a bare IPv6 address.
fn join_host_port(host: &str, port: &str) -> String {
    if host.contains(':') || host.contains('%') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

/// Read the mounted service-account token. Fails if the file is missing or
/// empty.
pub fn load_token() -> Result<String, ConfigError> {
    let token = std::fs::read_to_string(SERVICE_TOKENFILE).map_err(|source| ConfigError::ReadFile {
        path: SERVICE_TOKENFILE.into(),
        source,
    })?;
    if token.is_empty() {
        return Err(ConfigError::ReadFile {
            path: SERVICE_TOKENFILE.into(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, "service account token file is empty"),
        });
    }
    Ok(token)
}

/// Read and parse the mounted CA bundle. Fails if the file is missing or
/// empty.
pub fn load_cert() -> Result<Vec<Vec<u8>>, ConfigError> {
    let bytes = std::fs::read(SERVICE_CERTFILE).map_err(|source| ConfigError::ReadFile {
        path: SERVICE_CERTFILE.into(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(ConfigError::ReadFile {
            path: SERVICE_CERTFILE.into(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, "service account CA file is empty"),
        });
    }
    super::utils::certs(&bytes).map_err(ConfigError::ParsePem)
}

/// Read the mounted default namespace.
pub fn load_default_ns() -> Result<String, ConfigError> {
    std::fs::read_to_string(SERVICE_DEFAULT_NS).map_err(|source| ConfigError::ReadFile {
        path: SERVICE_DEFAULT_NS.into(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_hostname_unbracketed() {
        assert_eq!(join_host_port("10.0.0.1", "443"), "10.0.0.1:443");
    }

    #[test]
    fn ipv6_host_bracketed() {
        assert_eq!(join_host_port("::1", "443"), "[::1]:443");
    }

    #[test]
    fn zone_id_host_bracketed() {
        assert_eq!(join_host_port("fe80::1%eth0", "443"), "[fe80::1%eth0]:443");
    }
}
