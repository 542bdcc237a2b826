//! Loads cluster connection details from `~/.kube/config`, `$KUBECONFIG`,
//! or the in-cluster service-account environment.
//!
//! Prefer [`Config::infer`] unless you need to pin a specific context or
//! pass a pre-parsed [`Kubeconfig`].
mod file_config;
mod file_loader;
mod incluster_config;
mod utils;

use crate::error::{ConfigError, Error, Result};
pub use file_config::{AuthInfo, Cluster, Context, ExecConfig, Kubeconfig, NamedAuthInfo, NamedCluster, NamedContext};
use file_loader::ConfigLoader;
pub use file_loader::KubeConfigOptions;
use secrecy::ExposeSecret;
use std::time::Duration;

/// Cluster URL, credentials, and TLS material a [`crate::Client`] is built
/// from.
#[derive(Debug, Clone)]
pub struct Config {
    /// The cluster's API server URL.
    pub cluster_url: http::Uri,
    /// Namespace used for requests that don't specify one.
    pub default_namespace: String,
    /// PEM-encoded CA certificates, if a non-default trust root was configured.
    pub root_cert: Option<Vec<Vec<u8>>>,
    /// Per-request timeout. `None` disables the timeout.
    pub timeout: Option<Duration>,
    /// Skip server certificate validation. Dangerous outside local development.
    pub accept_invalid_certs: bool,
    /// PEM-encoded client certificate + key, for mutual TLS.
    pub(crate) identity_pem: Option<Vec<u8>>,
    /// Bearer token or basic-auth credentials to send with every request.
    pub(crate) auth_info: AuthInfo,
    /// Optional HTTPS proxy.
    pub proxy_url: Option<http::Uri>,
}

/// The request builder's default per-call timeout, absent an override.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

impl Config {
    /// A config with only the cluster URL set; everything else defaulted.
    pub fn new(cluster_url: http::Uri) -> Self {
        Self {
            cluster_url,
            default_namespace: "default".into(),
            root_cert: None,
            timeout: Some(DEFAULT_TIMEOUT),
            accept_invalid_certs: false,
            identity_pem: None,
            auth_info: AuthInfo::default(),
            proxy_url: None,
        }
    }

    /// Try in-cluster environment first, then fall back to the local kubeconfig.
    pub fn infer() -> Result<Self> {
        match Self::from_cluster_env() {
            Ok(config) => Ok(config),
            Err(cluster_env_err) => {
                tracing::trace!("no in-cluster config found: {cluster_env_err}, trying kubeconfig");
                Self::from_kubeconfig(&KubeConfigOptions::default()).map_err(|kubeconfig_err| {
                    Error::Config(ConfigError::ConfigInferenceExhausted {
                        cluster_env: Box::new(cluster_env_err),
                        kubeconfig: Box::new(kubeconfig_err),
                    })
                })
            }
        }
    }

    /// Load configuration from the in-cluster service-account environment.
    pub fn from_cluster_env() -> Result<Self> {
        let cluster_url = incluster_config::kube_server().ok_or(Error::Config(
            ConfigError::MissingInClusterVariables {
                hostenv: incluster_config::SERVICE_HOSTENV,
                portenv: incluster_config::SERVICE_PORTENV,
            },
        ))?;

        let default_namespace = incluster_config::load_default_ns()?;
        let root_cert = incluster_config::load_cert()?;
        let token = incluster_config::load_token()?;

        Ok(Self {
            cluster_url,
            default_namespace,
            root_cert: Some(root_cert),
            timeout: Some(DEFAULT_TIMEOUT),
            accept_invalid_certs: false,
            identity_pem: None,
            auth_info: AuthInfo {
                token: Some(secrecy::SecretString::new(token)),
                ..Default::default()
            },
            proxy_url: None,
        })
    }

    /// Load configuration from the default kubeconfig, honoring `$KUBECONFIG`.
    pub fn from_kubeconfig(options: &KubeConfigOptions) -> Result<Self> {
        Self::from_loader(ConfigLoader::new_from_options(options)?)
    }

    /// Load configuration from an already-parsed [`Kubeconfig`].
    pub fn from_custom_kubeconfig(kubeconfig: Kubeconfig, options: &KubeConfigOptions) -> Result<Self> {
        Self::from_loader(ConfigLoader::new_from_kubeconfig(kubeconfig, options)?)
    }

    fn from_loader(loader: ConfigLoader) -> Result<Self> {
        let cluster_url = loader
            .cluster
            .server
            .as_deref()
            .unwrap_or_default()
            .parse::<http::Uri>()
            .map_err(Error::InvalidUri)?;

        let default_namespace = loader.current_context.namespace.clone().unwrap_or_else(|| "default".into());

        let mut accept_invalid_certs = false;
        let root_cert = loader.ca_bundle()?;

        let identity_pem = match loader.user.identity_pem() {
            Ok(pem) if !pem.is_empty() => Some(pem),
            _ => {
                if loader.cluster.insecure_skip_tls_verify == Some(true) {
                    accept_invalid_certs = true;
                }
                None
            }
        };

        Ok(Self {
            cluster_url,
            default_namespace,
            root_cert,
            timeout: Some(DEFAULT_TIMEOUT),
            accept_invalid_certs,
            identity_pem,
            proxy_url: loader.proxy_url()?,
            auth_info: loader.user,
        })
    }

    /// The `Authorization` header value this config implies, if any.
    pub(crate) fn auth_header(&self) -> Result<Option<http::HeaderValue>> {
        if let Some(token) = self.auth_info.resolved_token()? {
            let mut value = http::HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(ConfigError::InvalidBearerToken)?;
            value.set_sensitive(true);
            return Ok(Some(value));
        }
        if let Some(username) = &self.auth_info.username {
            let password = self.auth_info.password.as_ref().map(|p| p.expose_secret()).unwrap_or("");
            let encoded = base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                format!("{username}:{password}"),
            );
            let mut value = http::HeaderValue::from_str(&format!("Basic {encoded}"))
                .map_err(ConfigError::InvalidBasicAuth)?;
            value.set_sensitive(true);
            return Ok(Some(value));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_loading_from_kubeconfig() {
        let raw = r#"
clusters:
- name: test
  cluster:
    server: https://0.0.0.0:6443
contexts:
- name: test
  context:
    cluster: test
    user: test
current-context: test
users:
- name: test
  user:
    token: abc123
"#;
        let kubeconfig: Kubeconfig = serde_yaml::from_str(raw).unwrap();
        let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).unwrap();
        assert_eq!(config.cluster_url, "https://0.0.0.0:6443");
        assert_eq!(config.default_namespace, "default");
    }
}
