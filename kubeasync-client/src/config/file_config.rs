//! Raw kubeconfig YAML shapes, an analogue of client-go's `clientcmd/api`
//! types.
use crate::error::ConfigError;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{collections::HashMap, fs, path::Path};

/// A parsed kubeconfig file: clusters, users, and contexts, plus which
/// context is active.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Kubeconfig {
    /// Cluster definitions, keyed by name.
    #[serde(default, deserialize_with = "deserialize_null_as_default")]
    pub clusters: Vec<NamedCluster>,
    /// User/credential definitions, keyed by name.
    #[serde(rename = "users", default, deserialize_with = "deserialize_null_as_default")]
    pub auth_infos: Vec<NamedAuthInfo>,
    /// Context definitions (cluster+user pairs), keyed by name.
    #[serde(default, deserialize_with = "deserialize_null_as_default")]
    pub contexts: Vec<NamedContext>,
    /// The context to use when none is given explicitly.
    #[serde(rename = "current-context", skip_serializing_if = "Option::is_none")]
    pub current_context: Option<String>,
}

impl Kubeconfig {
    /// Read and parse the kubeconfig at `$KUBECONFIG`, falling back to
    /// `~/.kube/config`. Multiple `:`-separated paths in `$KUBECONFIG` are
    /// merged left-to-right, the same way client-go merges them.
    pub fn read() -> Result<Self, ConfigError> {
        match std::env::var_os("KUBECONFIG") {
            Some(paths) => {
                let mut merged = Kubeconfig::default();
                for path in std::env::split_paths(&paths) {
                    let piece = Self::read_from(&path)?;
                    merged.merge(piece);
                }
                Ok(merged)
            }
            None => {
                let path = super::utils::default_kube_path().ok_or(ConfigError::NoKubeconfigPath)?;
                Self::read_from(path)
            }
        }
    }

    /// Parse a kubeconfig YAML file at an arbitrary path.
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::ReadFile {
            path: path.as_ref().into(),
            source,
        })?;
        serde_yaml::from_str(&data).map_err(ConfigError::ParseYaml)
    }

    fn merge(&mut self, mut other: Kubeconfig) {
        self.clusters.append(&mut other.clusters);
        self.auth_infos.append(&mut other.auth_infos);
        self.contexts.append(&mut other.contexts);
        if self.current_context.is_none() {
            self.current_context = other.current_context;
        }
    }
}

/// Name-tagged [`Cluster`].
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct NamedCluster {
    /// The name this cluster is referenced by from contexts.
    pub name: String,
    /// Connection details, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<Cluster>,
}

/// Connection details for one cluster.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Cluster {
    /// The cluster's API server URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    /// Skip verifying the server's certificate. Makes the connection insecure.
    #[serde(rename = "insecure-skip-tls-verify", skip_serializing_if = "Option::is_none")]
    pub insecure_skip_tls_verify: Option<bool>,
    /// Path to a CA certificate bundle.
    #[serde(rename = "certificate-authority", skip_serializing_if = "Option::is_none")]
    pub certificate_authority: Option<String>,
    /// Base64-encoded CA certificate bundle; overrides `certificate_authority`.
    #[serde(rename = "certificate-authority-data", skip_serializing_if = "Option::is_none")]
    pub certificate_authority_data: Option<String>,
    /// Proxy to use for requests to this cluster.
    #[serde(rename = "proxy-url", skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
}

impl Cluster {
    pub(crate) fn load_certificate_authority(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        match (&self.certificate_authority_data, &self.certificate_authority) {
            (Some(_), _) | (_, Some(_)) => Ok(Some(super::utils::data_or_file_with_base64(
                &self.certificate_authority_data,
                &self.certificate_authority,
            )?)),
            _ => Ok(None),
        }
    }
}

/// Name-tagged [`AuthInfo`].
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct NamedAuthInfo {
    /// The name this credential set is referenced by from contexts.
    pub name: String,
    /// Credential details, if present.
    #[serde(rename = "user", skip_serializing_if = "Option::is_none")]
    pub auth_info: Option<AuthInfo>,
}

fn serialize_secret<S: Serializer>(pw: &Option<SecretString>, s: S) -> Result<S::Ok, S::Error> {
    match pw {
        Some(secret) => s.serialize_str(secret.expose_secret()),
        None => s.serialize_none(),
    }
}

fn deserialize_secret<'de, D: Deserializer<'de>>(d: D) -> Result<Option<SecretString>, D::Error> {
    Ok(Option::<String>::deserialize(d)?.map(SecretString::new))
}

fn deserialize_null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    T: Default + Deserialize<'de>,
    D: Deserializer<'de>,
{
    Ok(Option::deserialize(d)?.unwrap_or_default())
}

/// How a client identifies and authenticates itself to the cluster.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct AuthInfo {
    /// Username for HTTP basic auth.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Password for HTTP basic auth.
    #[serde(default, skip_serializing_if = "Option::is_none", serialize_with = "serialize_secret", deserialize_with = "deserialize_secret")]
    pub password: Option<SecretString>,
    /// A bearer token, used as-is in the `Authorization` header.
    #[serde(default, skip_serializing_if = "Option::is_none", serialize_with = "serialize_secret", deserialize_with = "deserialize_secret")]
    pub token: Option<SecretString>,
    /// Path to a file containing a bearer token. Ignored if `token` is set.
    #[serde(rename = "tokenFile", skip_serializing_if = "Option::is_none")]
    pub token_file: Option<String>,
    /// Path to a client certificate for mutual TLS.
    #[serde(rename = "client-certificate", skip_serializing_if = "Option::is_none")]
    pub client_certificate: Option<String>,
    /// Base64-encoded client certificate; overrides `client_certificate`.
    #[serde(rename = "client-certificate-data", skip_serializing_if = "Option::is_none")]
    pub client_certificate_data: Option<String>,
    /// Path to the client certificate's private key.
    #[serde(rename = "client-key", skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,
    /// Base64-encoded private key; overrides `client_key`.
    #[serde(default, rename = "client-key-data", skip_serializing_if = "Option::is_none", serialize_with = "serialize_secret", deserialize_with = "deserialize_secret")]
    pub client_key_data: Option<SecretString>,
    /// A credential plugin to invoke to obtain a token, if configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exec: Option<ExecConfig>,
}

impl AuthInfo {
    pub(crate) fn identity_pem(&self) -> Result<Vec<u8>, ConfigError> {
        let mut pem = self.load_client_certificate()?;
        pem.extend(self.load_client_key()?);
        Ok(pem)
    }

    /// The bearer token this user implies: `token` verbatim if set, else the
    /// contents of `token_file`, else `None`. `token` takes precedence over
    /// `token_file` when both are present, per the kubeconfig schema.
    pub(crate) fn resolved_token(&self) -> Result<Option<SecretString>, ConfigError> {
        if let Some(token) = &self.token {
            return Ok(Some(token.clone()));
        }
        let Some(path) = &self.token_file else {
            return Ok(None);
        };
        let contents = super::utils::read_file(path)?;
        let token = String::from_utf8(contents).map_err(|_| ConfigError::NoFileOrData { field: "tokenFile" })?;
        Ok(Some(SecretString::new(token.trim_end().to_string())))
    }

    fn load_client_certificate(&self) -> Result<Vec<u8>, ConfigError> {
        super::utils::data_or_file_with_base64(&self.client_certificate_data, &self.client_certificate)
    }

    fn load_client_key(&self) -> Result<Vec<u8>, ConfigError> {
        let data = self.client_key_data.as_ref().map(|s| s.expose_secret().to_string());
        super::utils::data_or_file_with_base64(&data, &self.client_key)
    }
}

/// Credential-plugin ("exec provider") configuration.
///
/// kubeasync-client does not spawn credential plugins (see
/// [`crate::error::ConfigError::AuthExecUnsupported`]); this shape is kept
/// so a kubeconfig that names one still parses instead of failing outright.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecConfig {
    /// Command to execute to obtain a token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Arguments passed to `command`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    /// Extra environment variables to expose to the process.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<HashMap<String, String>>>,
}

/// Name-tagged [`Context`].
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct NamedContext {
    /// The name this context is referenced by.
    pub name: String,
    /// Cluster/user pairing, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
}

/// Pairs a cluster with a set of user credentials and a default namespace.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Context {
    /// Name of the [`Cluster`] this context connects to.
    pub cluster: String,
    /// Name of the [`AuthInfo`] this context authenticates with.
    pub user: String,
    /// Default namespace for requests made under this context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_token_takes_precedence_over_token_file() {
        let auth = AuthInfo {
            token: Some(SecretString::new("inline".into())),
            token_file: Some("/nonexistent/path/should/not/be/read".into()),
            ..Default::default()
        };
        let token = auth.resolved_token().unwrap().unwrap();
        assert_eq!(token.expose_secret(), "inline");
    }

    #[test]
    fn token_file_is_read_when_token_is_unset() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "file-token\n").unwrap();
        let auth = AuthInfo {
            token_file: Some(file.path().to_string_lossy().into_owned()),
            ..Default::default()
        };
        let token = auth.resolved_token().unwrap().unwrap();
        assert_eq!(token.expose_secret(), "file-token");
    }

    #[test]
    fn no_token_or_token_file_resolves_to_none() {
        let auth = AuthInfo::default();
        assert!(auth.resolved_token().unwrap().is_none());
    }
}
