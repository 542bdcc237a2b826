use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// `~/.kube/config`, or `None` if the home directory can't be determined.
pub fn default_kube_path() -> Option<PathBuf> {
    home::home_dir().map(|h| h.join(".kube").join("config"))
}

/// Resolve a kubeconfig field that may be given either as inline
/// base64-encoded `data` or as a path to a file, decoding/reading
/// whichever is present. `data` takes precedence.
pub(crate) fn data_or_file_with_base64<P: AsRef<Path>>(
    data: &Option<String>,
    file: &Option<P>,
) -> Result<Vec<u8>, ConfigError> {
    use base64::Engine;
    match (data, file) {
        (Some(d), _) => base64::engine::general_purpose::STANDARD
            .decode(d)
            .map_err(ConfigError::Base64Decode),
        (_, Some(f)) => read_file(f),
        _ => Err(ConfigError::NoFileOrData { field: "certificate/key" }),
    }
}

pub(crate) fn read_file<P: AsRef<Path>>(file: P) -> Result<Vec<u8>, ConfigError> {
    std::fs::read(file.as_ref()).map_err(|source| ConfigError::ReadFile {
        path: file.as_ref().into(),
        source,
    })
}

/// Extract the `CERTIFICATE`-tagged PEM blocks from a bundle, discarding
/// any other block types (private keys, etc).
pub(crate) fn certs(data: &[u8]) -> Result<Vec<Vec<u8>>, pem::PemError> {
    Ok(pem::parse_many(data)?
        .into_iter()
        .filter(|p| p.tag() == "CERTIFICATE")
        .map(|p| p.contents().to_vec())
        .collect())
}
