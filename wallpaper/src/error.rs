use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while preparing or decoding a frame source.
///
/// None of these escape [`crate::frame_store::FrameStore::load`]: each one is
/// reported and degrades to fewer frames (or none).
#[derive(Error, Debug)]
pub enum FrameLoadError {
    #[error("failed to create source directory {}: {source}", .path.display())]
    CreateSource { path: PathBuf, source: io::Error },

    #[error("failed to write placeholder {}: {source}", .path.display())]
    Placeholder { path: PathBuf, source: io::Error },

    #[error("failed to read source directory {}: {source}", .path.display())]
    ReadDir { path: PathBuf, source: io::Error },

    #[error("failed to open frame {file}: {source}")]
    Open { file: String, source: io::Error },

    #[error("failed to decode frame {file}: {source}")]
    Decode {
        file: String,
        source: image::ImageError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_file() {
        let err = FrameLoadError::Open {
            file: "frame_0001.png".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "failed to open frame frame_0001.png: denied");

        let err = FrameLoadError::CreateSource {
            path: PathBuf::from("/nowhere/frames"),
            source: io::Error::other("read-only"),
        };
        assert!(err.to_string().contains("/nowhere/frames"));
    }
}
