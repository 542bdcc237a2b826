//! Resolves a selected context/cluster/user triple out of a parsed
//! [`Kubeconfig`].
use super::file_config::{AuthInfo, Cluster, Context, Kubeconfig};
use crate::error::ConfigError;

/// Which context/cluster/user to load from a kubeconfig, overriding the
/// file's own `current-context` where given.
#[derive(Debug, Clone, Default)]
pub struct KubeConfigOptions {
    /// Named context to load; defaults to the kubeconfig's `current-context`.
    pub context: Option<String>,
    /// Named cluster to load; defaults to the context's cluster.
    pub cluster: Option<String>,
    /// Named user to load; defaults to the context's user.
    pub user: Option<String>,
}

/// The resolved cluster/user/context triple a [`crate::Config`] is built from.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub(crate) current_context: Context,
    pub(crate) cluster: Cluster,
    pub(crate) user: AuthInfo,
}

impl ConfigLoader {
    /// Load the default kubeconfig (`$KUBECONFIG` or `~/.kube/config`),
    /// resolved against `options`.
    pub fn new_from_options(options: &KubeConfigOptions) -> Result<Self, ConfigError> {
        Self::load(Kubeconfig::read()?, options)
    }

    /// Resolve `options` against an already-parsed [`Kubeconfig`].
    pub fn new_from_kubeconfig(config: Kubeconfig, options: &KubeConfigOptions) -> Result<Self, ConfigError> {
        Self::load(config, options)
    }

    fn load(config: Kubeconfig, options: &KubeConfigOptions) -> Result<Self, ConfigError> {
        let context_name = options
            .context
            .as_ref()
            .or(config.current_context.as_ref())
            .ok_or(ConfigError::CurrentContextNotSet)?;

        let current_context = config
            .contexts
            .iter()
            .find(|c| &c.name == context_name)
            .and_then(|c| c.context.clone())
            .ok_or_else(|| ConfigError::LoadClusterOfContext {
                context_name: context_name.clone(),
            })?;

        let cluster_name = options.cluster.as_ref().unwrap_or(&current_context.cluster);
        let cluster = config
            .clusters
            .iter()
            .find(|c| &c.name == cluster_name)
            .and_then(|c| c.cluster.clone())
            .ok_or_else(|| ConfigError::LoadClusterOfContext {
                context_name: cluster_name.clone(),
            })?;

        let user_name = options.user.as_ref().unwrap_or(&current_context.user);
        let user = config
            .auth_infos
            .iter()
            .find(|u| &u.name == user_name)
            .and_then(|u| u.auth_info.clone())
            .ok_or_else(|| ConfigError::FindUser {
                user_name: user_name.clone(),
            })?;

        if user.exec.is_some() {
            return Err(ConfigError::AuthExecUnsupported(user_name.clone()));
        }

        Ok(ConfigLoader {
            current_context,
            cluster,
            user,
        })
    }

    pub(crate) fn ca_bundle(&self) -> Result<Option<Vec<Vec<u8>>>, ConfigError> {
        match self.cluster.load_certificate_authority()? {
            Some(bundle) => Ok(Some(super::utils::certs(&bundle).map_err(ConfigError::ParsePem)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn proxy_url(&self) -> Result<Option<http::Uri>, ConfigError> {
        let nonempty = |o: Option<String>| o.filter(|s| !s.is_empty());
        let Some(proxy) = nonempty(self.cluster.proxy_url.clone())
            .or_else(|| nonempty(std::env::var("HTTPS_PROXY").ok()))
            .or_else(|| nonempty(std::env::var("https_proxy").ok()))
        else {
            return Ok(None);
        };
        Ok(Some(proxy.parse::<http::Uri>().map_err(|_| ConfigError::NoKubeconfigPath)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Kubeconfig {
        serde_yaml::from_str(
            r#"
clusters:
- name: test
  cluster:
    server: https://127.0.0.1:6443
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
"#,
        )
        .unwrap()
    }

    #[test]
    fn loads_default_context() {
        let loader = ConfigLoader::new_from_kubeconfig(sample(), &KubeConfigOptions::default()).unwrap();
        assert_eq!(loader.cluster.server.as_deref(), Some("https://127.0.0.1:6443"));
    }

    #[test]
    fn missing_context_errors() {
        let options = KubeConfigOptions {
            context: Some("nope".into()),
            ..Default::default()
        };
        assert!(ConfigLoader::new_from_kubeconfig(sample(), &options).is_err());
    }
}
