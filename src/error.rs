// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when reading or writing the podcast document
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read document {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse document JSON in {path}: {source}")]
    JsonParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Document {path} has no episode list")]
    MissingEpisodes { path: PathBuf },

    #[error("Failed to back up {path} to {backup}: {source}")]
    BackupFailed {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write document {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize document: {0}")]
    JsonSerializeFailed(#[from] serde_json::Error),
}

/// Errors that can occur when rendering or publishing the RSS feed
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to serialize RSS feed: {0}")]
    XmlWriteFailed(#[from] rss::Error),

    #[error("Rendered feed is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write feed {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Caller-visible errors of the episode and podcast info operations
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Missing required field: {field}")]
    Validation { field: &'static str },

    #[error("An episode with GUID '{guid}' already exists")]
    Conflict { guid: String },

    #[error("No episode with GUID '{guid}'")]
    NotFound { guid: String },

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}
