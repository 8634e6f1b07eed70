//! Crate-level error types.

use std::path::PathBuf;

/// Errors produced by the vista crate.
#[derive(Debug, thiserror::Error)]
pub enum VistaError {
    /// Generic I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A model file could not be read or contained no usable geometry.
    #[error("failed to load model '{path}': {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    /// A texture image could not be decoded.
    #[error("failed to load texture '{path}'")]
    TextureLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// TOML configuration parsing/serialization failure.
    #[error("config error: {0}")]
    Config(String),

    /// A hotspot points at a room that is not in the tour table.
    #[error("hotspot '{hotspot}' targets unknown room '{room}'")]
    UnknownRoom { hotspot: String, room: String },

    /// Two rooms share the same id.
    #[error("duplicate room id '{0}'")]
    DuplicateRoom(String),

    /// The tour table has no rooms at all.
    #[error("tour has no rooms")]
    EmptyTour,

    /// GPU adapter, device or surface failure.
    #[error("GPU error: {0}")]
    Gpu(String),

    /// Window or event-loop failure.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VistaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_room_message_names_both_sides() {
        let err = VistaError::UnknownRoom {
            hotspot: "Go Left".to_owned(),
            room: "attic".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "hotspot 'Go Left' targets unknown room 'attic'"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: VistaError = io.into();
        assert!(matches!(err, VistaError::Io(_)));
    }
}
