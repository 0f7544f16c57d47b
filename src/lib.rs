pub mod config;
pub mod error;
pub mod events;
pub mod feed;
pub mod model;
pub mod repository;
pub mod store;

// Re-export main types for convenience
pub use config::Config;
pub use error::{PersistenceError, RenderError, RepositoryError};
pub use events::{Event, EventReporter, NoopReporter, SharedReporter, TracingReporter};
pub use feed::{FeedGenerator, render_feed};
pub use model::{
    Episode, EpisodePatch, NewEpisode, PodcastDocument, PodcastInfo, PodcastInfoPatch,
};
pub use repository::{Published, Repository};
pub use store::Store;
