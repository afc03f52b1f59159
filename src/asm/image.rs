//! Program images for the TY-16.
//!
//! A `.ty` image is flat binary: the bytes of the file ARE the instruction
//! stream, executed from offset 0. No header, no alignment, no length
//! prefix.

use std::path::Path;
use thiserror::Error;

/// Load a program image from disk.
///
/// The engine never loads files itself; the host reads the buffer once and
/// hands it over. Load failures are signalled here, independently of the
/// engine.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, ImageError> {
    std::fs::read(path.as_ref()).map_err(|e| ImageError::Io(e.to_string()))
}

/// Save a program image to disk.
pub fn save_image<P: AsRef<Path>>(path: P, code: &[u8]) -> Result<(), ImageError> {
    std::fs::write(path.as_ref(), code).map_err(|e| ImageError::Io(e.to_string()))
}

/// Errors that can occur during image operations.
#[derive(Debug, Clone, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_image("no/such/image.ty").is_err());
    }
}
