// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

/// Environment variable overriding the document location
pub const DATA_FILE_ENV: &str = "PODFEED_DATA_FILE";
/// Environment variable overriding the published feed location
pub const FEED_FILE_ENV: &str = "PODFEED_FEED_FILE";

const DEFAULT_DATA_FILE: &str = "data/podcast.json";
const DEFAULT_FEED_FILE: &str = "public/feed.xml";

/// File locations used by the store and the feed generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// JSON document holding the whole podcast state
    pub data_file: PathBuf,
    /// Generated RSS feed
    pub feed_file: PathBuf,
}

impl Config {
    pub fn new(data_file: impl Into<PathBuf>, feed_file: impl Into<PathBuf>) -> Self {
        Self {
            data_file: data_file.into(),
            feed_file: feed_file.into(),
        }
    }

    /// Build a config from the environment, falling back to the defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            data_file: lookup(DATA_FILE_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data_file),
            feed_file: lookup(FEED_FILE_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.feed_file),
        }
    }

    /// Directory containing the document file
    pub fn data_dir(&self) -> &Path {
        parent_dir(&self.data_file)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_FILE, DEFAULT_FEED_FILE)
    }
}

/// Parent directory of a file path, `.` for bare file names
pub(crate) fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
