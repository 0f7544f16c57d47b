// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use crate::config::{Config, parent_dir};
use crate::error::RenderError;
use crate::model::PodcastDocument;
use crate::store::write_atomically;

use super::render::render_feed;

/// Writes the rendered feed to its published location
#[derive(Debug, Clone)]
pub struct FeedGenerator {
    path: PathBuf,
}

impl FeedGenerator {
    pub fn new(config: &Config) -> Self {
        Self {
            path: config.feed_file.clone(),
        }
    }

    /// Location of the published feed
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn render(&self, document: &PodcastDocument) -> Result<String, RenderError> {
        render_feed(document)
    }

    /// Render the document and replace the published feed.
    ///
    /// On failure the previously published feed is left as it was. Returns
    /// the number of items written.
    pub fn publish(&self, document: &PodcastDocument) -> Result<usize, RenderError> {
        let xml = self.render(document)?;

        let dir = parent_dir(&self.path);
        std::fs::create_dir_all(dir).map_err(|e| RenderError::CreateDirectoryFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

        write_atomically(&self.path, xml.as_bytes()).map_err(|e| RenderError::WriteFailed {
            path: self.path.clone(),
            source: e,
        })?;

        Ok(document.episodes.len())
    }
}
