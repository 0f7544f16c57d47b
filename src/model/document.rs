// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{Episode, PodcastInfo, lenient_string, or_default, sort_newest_first};

/// Version written into documents that do not carry one
pub const SCHEMA_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    #[serde(default, deserialize_with = "lenient_string")]
    pub created: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_modified: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: String,
}

impl DocumentMetadata {
    fn fresh() -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            created: now.clone(),
            last_modified: now,
            version: SCHEMA_VERSION.to_string(),
        }
    }
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self::fresh()
    }
}

/// The whole persisted state: show metadata plus every episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodcastDocument {
    #[serde(default, deserialize_with = "or_default")]
    pub podcast: PodcastInfo,
    pub episodes: Vec<Episode>,
    #[serde(default, deserialize_with = "or_default")]
    pub metadata: DocumentMetadata,
}

impl PodcastDocument {
    /// The document written on first run
    pub fn default_document() -> Self {
        Self {
            podcast: PodcastInfo::default(),
            episodes: Vec::new(),
            metadata: DocumentMetadata::fresh(),
        }
    }

    pub fn episode(&self, guid: &str) -> Option<&Episode> {
        self.episodes.iter().find(|e| e.guid.value == guid)
    }

    pub(crate) fn episode_index(&self, guid: &str) -> Option<usize> {
        self.episodes.iter().position(|e| e.guid.value == guid)
    }

    /// Episodes in display order, recomputed on every call
    pub fn episodes_newest_first(&self) -> Vec<Episode> {
        let mut episodes = self.episodes.clone();
        sort_newest_first(&mut episodes);
        episodes
    }
}
