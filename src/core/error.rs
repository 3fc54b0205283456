// SPDX-License-Identifier: MIT

//! Error types for defaults-edit.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::types::PlistType;

/// Result type alias used across the library.
pub type Result<T> = std::result::Result<T, EditError>;

/// Errors that can occur while navigating, editing or persisting preferences.
#[derive(Error, Debug)]
pub enum EditError {
    // -------------------------------------------------------------------------
    // Tree editing
    // -------------------------------------------------------------------------
    /// A path does not match the shape of the tree it was applied to.
    #[error("invalid path `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },

    /// A rename target already names a different sibling entry.
    #[error("key `{key}` already exists")]
    KeyCollision { key: String },

    /// Text could not be read as a value of the requested type.
    #[error("cannot parse `{text}` as {kind}")]
    UnparsableScalar { text: String, kind: PlistType },

    #[error("Key must not be empty.")]
    EmptyKey,

    #[error("unknown property list type `{0}`")]
    UnknownType(String),

    // -------------------------------------------------------------------------
    // Storage
    // -------------------------------------------------------------------------
    #[error("expected a dictionary at the root of {0}")]
    InvalidRoot(String),

    #[error("unknown backend `{0}` (expected auto, file or command)")]
    UnknownBackend(String),

    #[error("could not determine the home directory")]
    HomeDirUnavailable,

    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported plist value: {0}")]
    UnsupportedValue(String),

    #[error("plist error: {0}")]
    Plist(#[from] plist::Error),

    #[error("`{program}` failed: {message}")]
    Command { program: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EditError {
    pub(crate) fn invalid_path(path: impl ToString, reason: impl Into<String>) -> Self {
        EditError::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
