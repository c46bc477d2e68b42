//! Error types for canvas operations.

use thiserror::Error;

/// Errors that can occur during canvas operations.
///
/// Programmer misuse (negative scale factors, drawing before the transform
/// is set) is a panic, not an error. These variants cover conditions the
/// caller can reasonably hit and handle at runtime.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// The requested raster surface exceeds the backend's size limit.
    #[error("requested surface {width}x{height} exceeds the backend limit of {max} pixels per side")]
    SurfaceTooLarge { width: u32, height: u32, max: u32 },

    /// A surface could not be allocated (zero-sized or out of memory).
    #[error("failed to allocate a {width}x{height} surface")]
    SurfaceAllocation { width: u32, height: u32 },

    /// No layer with the given name exists.
    #[error("no layer named {0:?}")]
    NoSuchLayer(String),

    /// Image encoding failed.
    #[error("image encoding failed: {0}")]
    Encoding(String),

    /// Filesystem error while writing output.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// There is nothing to export (no visible items).
    #[error("nothing to export: no visible items")]
    NothingToExport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CanvasError::SurfaceTooLarge {
            width: 40000,
            height: 100,
            max: 32767,
        };
        let msg = err.to_string();
        assert!(msg.contains("40000"));
        assert!(msg.contains("32767"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CanvasError = io.into();
        assert!(matches!(err, CanvasError::Io(_)));
    }
}
