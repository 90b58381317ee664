//! Peer key files
//!
//! A key file holds the Ed25519 seed of one peer identity:
//!
//! ```json
//! { "version": 1, "ed25519_seed": "<64 hex chars>" }
//! ```

use std::fs;
use std::io::Write;
use std::path::Path;

use prov_crypto::{Identity, IdentityError};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};
use zeroize::Zeroize;

/// Key file errors
#[derive(Debug, Error)]
pub enum KeyFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse key file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unsupported key file version {0}")]
    UnsupportedVersion(u32),

    #[error("Invalid key data: {0}")]
    InvalidSeed(String),

    #[error("Key file already exists: {0}")]
    AlreadyExists(String),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// Serializable key data for file storage
#[derive(Serialize, Deserialize)]
struct StoredKey {
    /// Version for future compatibility
    version: u32,
    /// Ed25519 private key seed (32 bytes, hex encoded)
    ed25519_seed: String,
}

impl StoredKey {
    const CURRENT_VERSION: u32 = 1;

    fn new(seed: &[u8; 32]) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            ed25519_seed: hex::encode(seed),
        }
    }

    fn to_identity(&self) -> Result<Identity, KeyFileError> {
        if self.version != Self::CURRENT_VERSION {
            return Err(KeyFileError::UnsupportedVersion(self.version));
        }

        let mut bytes = hex::decode(&self.ed25519_seed)
            .map_err(|e| KeyFileError::InvalidSeed(format!("seed is not hex: {e}")))?;
        if bytes.len() != 32 {
            let len = bytes.len();
            bytes.zeroize();
            return Err(KeyFileError::InvalidSeed(format!(
                "seed must be 32 bytes, got {len}"
            )));
        }

        let mut seed = [0u8; 32];
        seed.copy_from_slice(&bytes);
        bytes.zeroize();
        Ok(Identity::from_seed(seed)?)
    }
}

impl Drop for StoredKey {
    fn drop(&mut self) {
        self.ed25519_seed.zeroize();
    }
}

/// Parse key file contents into an identity.
pub fn parse_identity(contents: &str) -> Result<Identity, KeyFileError> {
    let stored: StoredKey = serde_json::from_str(contents)?;
    stored.to_identity()
}

/// Load the identity stored at `path`.
pub fn load_identity(path: &Path) -> Result<Identity, KeyFileError> {
    warn_if_readable_by_others(path);

    let mut contents = fs::read_to_string(path)?;
    let result = parse_identity(&contents);
    contents.zeroize();

    let identity = result?;
    debug!(path = %path.display(), peer_id = %identity.peer_id(), "loaded peer key");
    Ok(identity)
}

/// Generate a new key file at `path` and return its identity.
///
/// Refuses to replace an existing file unless `overwrite` is set.
pub fn generate_key_file(path: &Path, overwrite: bool) -> Result<Identity, KeyFileError> {
    if path.exists() && !overwrite {
        return Err(KeyFileError::AlreadyExists(path.display().to_string()));
    }

    let seed = Identity::generate_seed();
    let identity = Identity::from_seed(*seed)?;
    let stored = StoredKey::new(&seed);

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut json = serde_json::to_string_pretty(&stored)?;

    // Unpredictable name, created exclusively with mode 0600, removed on drop
    let mut file = NamedTempFile::new_in(dir)?;
    let written = file
        .write_all(json.as_bytes())
        .and_then(|()| file.as_file().sync_all());
    json.zeroize();
    written?;

    let persisted = if overwrite {
        file.persist(path)
    } else {
        file.persist_noclobber(path)
    };
    persisted.map_err(|e| match e.error.kind() {
        std::io::ErrorKind::AlreadyExists => {
            KeyFileError::AlreadyExists(path.display().to_string())
        }
        _ => KeyFileError::Io(e.error),
    })?;

    debug!(path = %path.display(), peer_id = %identity.peer_id(), "wrote peer key");
    Ok(identity)
}

#[cfg(unix)]
fn warn_if_readable_by_others(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(metadata) = fs::metadata(path) {
        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            warn!(
                path = %path.display(),
                mode = %format!("{:o}", mode & 0o777),
                "key file is accessible by other users"
            );
        }
    }
}

#[cfg(not(unix))]
fn warn_if_readable_by_others(_path: &Path) {}
