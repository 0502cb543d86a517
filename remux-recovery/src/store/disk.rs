//! On-disk store format
//!
//! Each store persists as a single bincode file: four magic bytes, a
//! format version, then the encoded table. Writes go to a temp file in
//! the same directory and are renamed into place, so a crash mid-write
//! leaves the previous file intact.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use remux_utils::{RemuxError, Result};

/// Magic bytes identifying a remux store file
pub const STORE_MAGIC: [u8; 4] = *b"RMXS";

/// Current store format version
pub const STORE_VERSION: u32 = 1;

/// Load a store table from `path`
///
/// Returns `Ok(None)` when the file does not exist yet.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let bytes = std::fs::read(path).map_err(|e| RemuxError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    if bytes.len() < STORE_MAGIC.len() || bytes[..STORE_MAGIC.len()] != STORE_MAGIC {
        return Err(RemuxError::persistence(format!(
            "{} is not a remux store file",
            path.display()
        )));
    }

    let (version, data): (u32, T) = bincode::deserialize(&bytes[STORE_MAGIC.len()..])
        .map_err(|e| {
            RemuxError::persistence(format!("failed to decode {}: {}", path.display(), e))
        })?;

    if version != STORE_VERSION {
        return Err(RemuxError::persistence(format!(
            "unsupported store version {} in {} (expected {})",
            version,
            path.display(),
            STORE_VERSION
        )));
    }

    Ok(Some(data))
}

/// Atomically persist a store table to `path`
pub fn save<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| RemuxError::persistence("store path has no parent directory"))?;
    std::fs::create_dir_all(parent).map_err(|e| RemuxError::FileWrite {
        path: parent.to_path_buf(),
        source: e,
    })?;

    let mut bytes = STORE_MAGIC.to_vec();
    let encoded = bincode::serialize(&(STORE_VERSION, data))
        .map_err(|e| RemuxError::persistence(format!("failed to encode store: {}", e)))?;
    bytes.extend_from_slice(&encoded);

    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, &bytes).map_err(|e| RemuxError::FileWrite {
        path: tmp.clone(),
        source: e,
    })?;
    std::fs::rename(&tmp, path).map_err(|e| RemuxError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}
