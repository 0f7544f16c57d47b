// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::{Mutex, PoisonError};

use crate::config::Config;
use crate::error::{PersistenceError, RepositoryError};
use crate::events::{Event, SharedReporter};
use crate::feed::FeedGenerator;
use crate::model::{
    Episode, EpisodePatch, NewEpisode, PodcastDocument, PodcastInfo, PodcastInfoPatch,
    now_rfc2822,
};
use crate::store::Store;

/// Result of a successful mutation
#[derive(Debug, Clone, PartialEq)]
pub struct Published<T> {
    pub value: T,
    /// Whether the feed was regenerated from the saved document
    pub feed_updated: bool,
}

/// Operations over the podcast document.
///
/// Every mutation reloads the document from disk, applies the change, saves
/// it and then regenerates the feed. Mutations within one process are
/// serialised so concurrent callers cannot lose each other's updates.
pub struct Repository {
    store: Store,
    feed: FeedGenerator,
    reporter: SharedReporter,
    write_lock: Mutex<()>,
}

impl Repository {
    pub fn new(config: &Config, reporter: SharedReporter) -> Self {
        Self {
            store: Store::new(config, reporter.clone()),
            feed: FeedGenerator::new(config),
            reporter,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn feed(&self) -> &FeedGenerator {
        &self.feed
    }

    /// Create the default document if needed
    pub fn initialize(&self) -> Result<bool, PersistenceError> {
        self.store.initialize()
    }

    /// Regenerate the feed from the current document without changing it
    pub fn publish_feed(&self) -> bool {
        let document = self.store.load();
        self.publish(&document)
    }

    pub fn get_info(&self) -> PodcastInfo {
        self.store.load().podcast
    }

    pub fn update_info(
        &self,
        patch: PodcastInfoPatch,
    ) -> Result<Published<PodcastInfo>, RepositoryError> {
        self.mutate(|document| {
            patch.apply_to(&mut document.podcast);
            Ok(document.podcast.clone())
        })
    }

    /// All episodes, newest first
    pub fn list_episodes(&self) -> Vec<Episode> {
        self.store.load().episodes_newest_first()
    }

    pub fn create_episode(&self, input: NewEpisode) -> Result<Published<Episode>, RepositoryError> {
        let episode = input.into_episode()?;

        self.mutate(|document| {
            if document.episode(&episode.guid.value).is_some() {
                return Err(RepositoryError::Conflict {
                    guid: episode.guid.value.clone(),
                });
            }
            document.episodes.push(episode.clone());
            Ok(episode)
        })
    }

    pub fn get_episode(&self, guid: &str) -> Result<Episode, RepositoryError> {
        self.store
            .load()
            .episode(guid)
            .cloned()
            .ok_or_else(|| not_found(guid))
    }

    /// Shallow-merge `patch` over the stored episode
    pub fn update_episode(
        &self,
        guid: &str,
        patch: EpisodePatch,
    ) -> Result<Published<Episode>, RepositoryError> {
        if patch.guid.as_ref().is_some_and(|g| g.value.is_empty()) {
            return Err(RepositoryError::Validation {
                field: "guid.value",
            });
        }

        self.mutate(|document| {
            let index = document.episode_index(guid).ok_or_else(|| not_found(guid))?;

            if let Some(new_guid) = &patch.guid
                && new_guid.value != guid
                && document.episode(&new_guid.value).is_some()
            {
                return Err(RepositoryError::Conflict {
                    guid: new_guid.value.clone(),
                });
            }

            let episode = &mut document.episodes[index];
            patch.apply_to(episode);
            Ok(episode.clone())
        })
    }

    pub fn delete_episode(&self, guid: &str) -> Result<Published<Episode>, RepositoryError> {
        self.mutate(|document| {
            let index = document.episode_index(guid).ok_or_else(|| not_found(guid))?;
            Ok(document.episodes.remove(index))
        })
    }

    /// Load, stamp, apply `change`, save, then regenerate the feed.
    ///
    /// Nothing is saved when `change` fails, and the feed is only regenerated
    /// after a successful save.
    fn mutate<T, F>(&self, change: F) -> Result<Published<T>, RepositoryError>
    where
        F: FnOnce(&mut PodcastDocument) -> Result<T, RepositoryError>,
    {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut document = self.store.load();
        document.podcast.last_build_date = now_rfc2822();
        let value = change(&mut document)?;
        self.store.save(&mut document)?;

        let feed_updated = self.publish(&document);
        Ok(Published {
            value,
            feed_updated,
        })
    }

    fn publish(&self, document: &PodcastDocument) -> bool {
        match self.feed.publish(document) {
            Ok(items) => {
                self.reporter.report(Event::FeedPublished {
                    path: self.feed.path().to_path_buf(),
                    items,
                });
                true
            }
            Err(e) => {
                self.reporter.report(Event::FeedFailed {
                    path: self.feed.path().to_path_buf(),
                    reason: e.to_string(),
                });
                false
            }
        }
    }
}

fn not_found(guid: &str) -> RepositoryError {
    RepositoryError::NotFound {
        guid: guid.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use super::*;
    use crate::events::NoopReporter;
    use crate::events::testing::RecordingReporter;
    use crate::model::EpisodeType;
    use tempfile::tempdir;

    fn repository_in(dir: &Path) -> Repository {
        let config = Config::new(dir.join("data/podcast.json"), dir.join("public/feed.xml"));
        let repository = Repository::new(&config, NoopReporter::shared());
        repository.initialize().unwrap();
        repository
    }

    fn input(json: &str) -> NewEpisode {
        serde_json::from_str(json).unwrap()
    }

    fn dated(guid: &str, pub_date: &str) -> NewEpisode {
        input(&format!(
            r#"{{"title": "Episode {guid}", "description": "d", "pubDate": "{pub_date}",
                "audio": {{"url": "https://x/{guid}.mp3"}}, "guid": {{"value": "{guid}"}}}}"#
        ))
    }

    fn feed_guids(repository: &Repository) -> Vec<String> {
        let xml = std::fs::read_to_string(repository.feed().path()).unwrap();
        rss::Channel::read_from(xml.as_bytes())
            .unwrap()
            .items()
            .iter()
            .map(|item| item.guid().unwrap().value().to_string())
            .collect()
    }

    #[test]
    fn create_minimal_episode_fills_defaults() {
        let dir = tempdir().unwrap();
        let repository = repository_in(dir.path());

        let created = repository
            .create_episode(input(
                r#"{"title": "Ep1", "description": "d", "audio": {"url": "http://x/a.mp3"}}"#,
            ))
            .unwrap();

        assert!(created.feed_updated);
        let episode = created.value;
        assert!(!episode.guid.value.is_empty());
        assert_eq!(episode.guid.is_perma_link, "false");
        assert_eq!(episode.audio.mime_type, "audio/mpeg");
        assert_eq!(episode.audio.length, "0");
        assert_eq!(episode.episode_type, EpisodeType::Full);

        assert_eq!(repository.get_episode(&episode.guid.value).unwrap(), episode);
    }

    #[test]
    fn create_rejects_missing_fields_without_saving() {
        let dir = tempdir().unwrap();
        let repository = repository_in(dir.path());

        let result = repository.create_episode(input(r#"{"title": "Ep1", "description": "d"}"#));

        assert!(matches!(
            result,
            Err(RepositoryError::Validation { field: "audio.url" })
        ));
        assert!(repository.store().backups().unwrap().is_empty());
    }

    #[test]
    fn duplicate_guid_conflicts_and_leaves_collection_unchanged() {
        let dir = tempdir().unwrap();
        let repository = repository_in(dir.path());
        repository
            .create_episode(dated("a", "Mon, 01 Jan 2024 12:00:00 +0000"))
            .unwrap();
        let before = repository.store().load();

        let result = repository.create_episode(dated("a", "Tue, 02 Jan 2024 12:00:00 +0000"));

        assert!(matches!(result, Err(RepositoryError::Conflict { guid }) if guid == "a"));
        assert_eq!(repository.store().load(), before);
    }

    #[test]
    fn list_is_newest_first_regardless_of_insertion_order() {
        let dir = tempdir().unwrap();
        let repository = repository_in(dir.path());
        for (guid, date) in [
            ("b", "Thu, 01 Feb 2024 12:00:00 +0000"),
            ("a", "Mon, 01 Jan 2024 12:00:00 +0000"),
            ("c", "Fri, 01 Mar 2024 12:00:00 +0000"),
        ] {
            repository.create_episode(dated(guid, date)).unwrap();
        }

        let guids: Vec<_> = repository
            .list_episodes()
            .into_iter()
            .map(|e| e.guid.value)
            .collect();

        assert_eq!(guids, vec!["c", "b", "a"]);
        assert_eq!(feed_guids(&repository), guids);
    }

    #[test]
    fn update_shallow_merges_fields() {
        let dir = tempdir().unwrap();
        let repository = repository_in(dir.path());
        repository
            .create_episode(dated("a", "Mon, 01 Jan 2024 12:00:00 +0000"))
            .unwrap();

        let patch: EpisodePatch =
            serde_json::from_str(r#"{"title": "Renamed", "audio": {"url": "https://x/new.mp3"}}"#)
                .unwrap();
        let updated = repository.update_episode("a", patch).unwrap().value;

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.description, "d");
        assert_eq!(updated.audio.url, "https://x/new.mp3");
        assert_eq!(updated.audio.mime_type, "");
        assert_eq!(repository.get_episode("a").unwrap(), updated);
    }

    #[test]
    fn update_unknown_guid_is_not_found_and_saves_nothing() {
        let dir = tempdir().unwrap();
        let repository = repository_in(dir.path());
        let before = std::fs::read_to_string(repository.store().path()).unwrap();

        let result = repository.update_episode("missing", EpisodePatch::default());

        assert!(matches!(result, Err(RepositoryError::NotFound { guid }) if guid == "missing"));
        assert_eq!(
            std::fs::read_to_string(repository.store().path()).unwrap(),
            before
        );
    }

    #[test]
    fn update_to_existing_guid_conflicts() {
        let dir = tempdir().unwrap();
        let repository = repository_in(dir.path());
        repository
            .create_episode(dated("a", "Mon, 01 Jan 2024 12:00:00 +0000"))
            .unwrap();
        repository
            .create_episode(dated("b", "Tue, 02 Jan 2024 12:00:00 +0000"))
            .unwrap();

        let patch: EpisodePatch = serde_json::from_str(r#"{"guid": {"value": "a"}}"#).unwrap();
        let result = repository.update_episode("b", patch);

        assert!(matches!(result, Err(RepositoryError::Conflict { .. })));
        assert!(repository.get_episode("b").is_ok());
    }

    #[test]
    fn update_rejects_empty_replacement_guid() {
        let dir = tempdir().unwrap();
        let repository = repository_in(dir.path());
        repository
            .create_episode(dated("a", "Mon, 01 Jan 2024 12:00:00 +0000"))
            .unwrap();
        let before = repository.store().load();

        let patch: EpisodePatch =
            serde_json::from_str(r#"{"guid": {"value": ""}, "title": "Lost"}"#).unwrap();
        let result = repository.update_episode("a", patch);

        assert!(matches!(
            result,
            Err(RepositoryError::Validation {
                field: "guid.value"
            })
        ));
        assert_eq!(repository.store().load(), before);
        assert_eq!(repository.get_episode("a").unwrap().title, "Episode a");
    }

    #[test]
    fn create_keeps_existing_episodes_with_unusual_fields() {
        let dir = tempdir().unwrap();
        let repository = repository_in(dir.path());
        std::fs::write(
            repository.store().path(),
            r#"{
                "podcast": {"title": "Real Show", "explicit": null},
                "episodes": [
                    {"guid": {"value": "old-1", "isPermaLink": false}, "title": "First",
                     "episodeType": "Full", "pubDate": "Mon, 01 Jan 2024 12:00:00 +0000",
                     "audio": {"url": "https://x/old-1.mp3", "type": "audio/mpeg", "length": "1"}},
                    {"title": null, "episodeType": "Bonus", "audio": {"url": "https://x/old-2.mp3"}}
                ]
            }"#,
        )
        .unwrap();

        let created = repository
            .create_episode(dated("new", "Fri, 01 Mar 2024 12:00:00 +0000"))
            .unwrap();
        assert!(created.feed_updated);

        let document = repository.store().load();
        assert_eq!(document.podcast.title, "Real Show");
        let guids: Vec<_> = document
            .episodes
            .iter()
            .map(|e| e.guid.value.as_str())
            .collect();
        assert_eq!(guids, vec!["old-1", "", "new"]);
        assert_eq!(document.episodes[0].episode_type, EpisodeType::Full);
        assert_eq!(document.episodes[1].episode_type, EpisodeType::Bonus);
        let xml = std::fs::read_to_string(repository.feed().path()).unwrap();
        let channel = rss::Channel::read_from(xml.as_bytes()).unwrap();
        assert_eq!(channel.title(), "Real Show");
        assert_eq!(channel.items().len(), 3);
    }

    #[test]
    fn delete_returns_removed_episode() {
        let dir = tempdir().unwrap();
        let repository = repository_in(dir.path());
        repository
            .create_episode(dated("a", "Mon, 01 Jan 2024 12:00:00 +0000"))
            .unwrap();

        let removed = repository.delete_episode("a").unwrap().value;

        assert_eq!(removed.guid.value, "a");
        assert!(matches!(
            repository.get_episode("a"),
            Err(RepositoryError::NotFound { .. })
        ));
        assert!(repository.delete_episode("a").is_err());
        assert!(feed_guids(&repository).is_empty());
    }

    #[test]
    fn mutations_stamp_last_build_date() {
        let dir = tempdir().unwrap();
        let repository = repository_in(dir.path());
        let mut doc = repository.store().load();
        doc.podcast.last_build_date = "Mon, 01 Jan 2024 00:00:00 +0000".to_string();
        repository.store().save(&mut doc).unwrap();

        repository
            .create_episode(dated("a", "Mon, 01 Jan 2024 12:00:00 +0000"))
            .unwrap();

        assert_ne!(
            repository.get_info().last_build_date,
            "Mon, 01 Jan 2024 00:00:00 +0000"
        );
    }

    #[test]
    fn update_info_merges_and_republishes() {
        let dir = tempdir().unwrap();
        let repository = repository_in(dir.path());

        let patch: PodcastInfoPatch =
            serde_json::from_str(r#"{"title": "Rust Radio", "show_type": "serial"}"#).unwrap();
        let published = repository.update_info(patch).unwrap();

        assert!(published.feed_updated);
        assert_eq!(published.value.title, "Rust Radio");
        assert_eq!(published.value.language, "en-us");
        assert_eq!(repository.get_info(), published.value);

        let xml = std::fs::read_to_string(repository.feed().path()).unwrap();
        assert!(xml.contains("<title>Rust Radio</title>"));
        assert!(xml.contains("<itunes:type>serial</itunes:type>"));
    }

    #[test]
    fn feed_failure_keeps_saved_document() {
        let dir = tempdir().unwrap();
        // A regular file where the feed directory should be
        std::fs::write(dir.path().join("public"), "").unwrap();
        let reporter = Arc::new(RecordingReporter::default());
        let config = Config::new(
            dir.path().join("data/podcast.json"),
            dir.path().join("public/feed.xml"),
        );
        let repository = Repository::new(&config, reporter.clone());

        let created = repository
            .create_episode(dated("a", "Mon, 01 Jan 2024 12:00:00 +0000"))
            .unwrap();

        assert!(!created.feed_updated);
        assert!(repository.get_episode("a").is_ok());
        assert!(
            reporter
                .events()
                .iter()
                .any(|e| matches!(e, Event::FeedFailed { .. }))
        );
    }

    #[test]
    fn save_failure_skips_feed_regeneration() {
        let dir = tempdir().unwrap();
        // A regular file where the data directory should be
        std::fs::write(dir.path().join("data"), "").unwrap();
        let config = Config::new(
            dir.path().join("data/podcast.json"),
            dir.path().join("public/feed.xml"),
        );
        let repository = Repository::new(&config, NoopReporter::shared());

        let result = repository.create_episode(dated("a", "Mon, 01 Jan 2024 12:00:00 +0000"));

        assert!(matches!(result, Err(RepositoryError::Persistence(_))));
        assert!(!repository.feed().path().exists());
    }

    #[test]
    fn concurrent_creates_are_not_lost() {
        let dir = tempdir().unwrap();
        let repository = Arc::new(repository_in(dir.path()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let repository = Arc::clone(&repository);
                std::thread::spawn(move || {
                    repository
                        .create_episode(dated(
                            &format!("ep-{i}"),
                            "Mon, 01 Jan 2024 12:00:00 +0000",
                        ))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(repository.list_episodes().len(), 8);
        assert_eq!(repository.store().backups().unwrap().len(), 8);
    }

    #[test]
    fn publish_feed_renders_current_document() {
        let dir = tempdir().unwrap();
        let repository = repository_in(dir.path());

        assert!(repository.publish_feed());
        assert!(repository.feed().path().exists());
        assert!(feed_guids(&repository).is_empty());
    }
}
