//! Error types for every stage that can abort startup or a frame.
//!
//! Loaders return these typed errors; the application boundary in
//! [`crate::flow`] wraps them in `anyhow` with the failing resource attached.

use std::path::PathBuf;

use thiserror::Error;

/// The settings document is missing or does not match the expected schema.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unable to find settings file {path:?}")]
    Missing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings file {path:?} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Which programmable stage a shader file feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ShaderError {
    #[error("could not load {stage} shader from {path:?}")]
    Read {
        stage: ShaderStage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("compilation of {stage} shader {path:?} failed:\n{log}")]
    Compile {
        stage: ShaderStage,
        path: PathBuf,
        log: String,
    },

    #[error("shader program linking failed:\n{log}")]
    Link { log: String },
}

#[derive(Error, Debug)]
pub enum TextureError {
    #[error("failed to load texture {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode texture {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Failures while reading a vertex file or turning it into a render object.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("could not load model from {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}, field {column}: {value:?} is not a number")]
    Field {
        line: usize,
        column: usize,
        value: String,
    },

    #[error("{vertex_count} vertices cannot be grouped into triangles")]
    IncompleteTriangle { vertex_count: usize },

    #[error("model {model:?} and its shader program disagree on having a texture")]
    TextureBinding { model: String },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RenderError {
    #[error("tried to render the moved-out model {name:?}")]
    UseAfterMove { name: String },
}

/// Anything that can stop a single frame from being drawn.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
    #[error("the surface configuration is outdated")]
    SurfaceOutdated,

    #[error("the surface was lost")]
    SurfaceLost,

    #[error("acquiring the surface texture raised a validation error")]
    SurfaceValidation,

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl FrameError {
    /// The surface recovers by being configured again.
    pub fn needs_reconfigure(&self) -> bool {
        matches!(self, Self::SurfaceOutdated | Self::SurfaceLost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_stale_surfaces_are_reconfigured() {
        assert!(FrameError::SurfaceOutdated.needs_reconfigure());
        assert!(FrameError::SurfaceLost.needs_reconfigure());
        assert!(!FrameError::SurfaceValidation.needs_reconfigure());
        let moved = RenderError::UseAfterMove {
            name: "cube".to_string(),
        };
        assert!(!FrameError::from(moved).needs_reconfigure());
    }
}
