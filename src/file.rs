use std::io::ErrorKind;
use std::path::Path;

use crate::error::DotfigError;
use crate::types::FileMode;

/// Read a configuration file in full.
///
/// Returns `Ok(None)` when the file doesn't exist and `mode` is
/// [`FileMode::Optional`]. The file is closed before this returns.
pub fn read_source(path: &Path, mode: FileMode) -> Result<Option<Vec<u8>>, DotfigError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => match mode {
            FileMode::Optional => {
                tracing::debug!(path = %path.display(), "optional config file not found, skipping");
                Ok(None)
            }
            FileMode::Required => Err(DotfigError::MissingFile {
                path: path.to_path_buf(),
                source: e,
            }),
        },
        Err(e) => Err(DotfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
