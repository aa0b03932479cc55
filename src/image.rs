//! Loading ROM images from disk

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from reading an image file
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("error opening {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("error reading {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} is empty")]
    Empty { path: PathBuf },
}

/// Read a whole image file into memory
///
/// Size policy is left to the flash operations; only unreadable and empty
/// files are rejected here.
pub fn load_image(path: &Path) -> Result<Vec<u8>, ImageError> {
    let mut file = File::open(path).map_err(|source| ImageError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut data = Vec::new();
    file.read_to_end(&mut data)
        .map_err(|source| ImageError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    if data.is_empty() {
        return Err(ImageError::Empty {
            path: path.to_path_buf(),
        });
    }

    log::debug!("Read {} bytes from {}", data.len(), path.display());
    Ok(data)
}
