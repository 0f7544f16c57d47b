// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use std::sync::Arc;

/// Observable events emitted by the store, repository and feed generator
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A fresh default document was written on first run
    DocumentInitialized { path: PathBuf },

    /// No document on disk, the default document is used instead
    DocumentMissing { path: PathBuf },

    /// Document exists but could not be read, the default document is used instead
    DocumentUnreadable { path: PathBuf, reason: String },

    /// Previous document was copied aside before overwriting
    BackupCreated { path: PathBuf },

    /// Document was durably written
    DocumentSaved { path: PathBuf, episodes: usize },

    /// Feed was rendered and written
    FeedPublished { path: PathBuf, items: usize },

    /// Feed could not be rendered or written; the previous artifact stays in place
    FeedFailed { path: PathBuf, reason: String },
}

/// Trait for reporting events.
///
/// Implementations can log them, collect them for assertions, or drop them.
pub trait EventReporter: Send + Sync {
    /// Report an event
    fn report(&self, event: Event);
}

/// A shared reference to an event reporter
pub type SharedReporter = Arc<dyn EventReporter>;

/// A reporter that silently ignores all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl EventReporter for NoopReporter {
    fn report(&self, _event: Event) {}
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedReporter {
        Arc::new(Self)
    }
}

/// A reporter forwarding events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl TracingReporter {
    pub fn shared() -> SharedReporter {
        Arc::new(Self)
    }
}

impl EventReporter for TracingReporter {
    fn report(&self, event: Event) {
        match event {
            Event::DocumentInitialized { path } => {
                tracing::info!(path = %path.display(), "initialized podcast document");
            }
            Event::DocumentMissing { path } => {
                tracing::warn!(path = %path.display(), "podcast document missing, using defaults");
            }
            Event::DocumentUnreadable { path, reason } => {
                tracing::error!(
                    path = %path.display(),
                    %reason,
                    "podcast document unreadable, using defaults"
                );
            }
            Event::BackupCreated { path } => {
                tracing::debug!(path = %path.display(), "backed up podcast document");
            }
            Event::DocumentSaved { path, episodes } => {
                tracing::info!(path = %path.display(), episodes, "saved podcast document");
            }
            Event::FeedPublished { path, items } => {
                tracing::info!(path = %path.display(), items, "published feed");
            }
            Event::FeedFailed { path, reason } => {
                tracing::error!(path = %path.display(), %reason, "failed to publish feed");
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Collects every reported event for later inspection
    #[derive(Debug, Default)]
    pub struct RecordingReporter {
        events: Mutex<Vec<Event>>,
    }

    impl RecordingReporter {
        pub fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }
    }

    impl EventReporter for RecordingReporter {
        fn report(&self, event: Event) {
            self.events.lock().unwrap().push(event);
        }
    }
}
