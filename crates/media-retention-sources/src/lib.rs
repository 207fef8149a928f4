pub mod error;
pub mod factory;
pub mod snapshot;
pub mod traits;

pub use error::SourceError;
pub use factory::{SourceFactory, SourceSet};
pub use snapshot::{SnapshotMovieCatalog, SnapshotRequestSource, SnapshotTvCatalog, SnapshotWatchHistory};
pub use traits::{MovieCatalog, RequestSource, TvCatalog, WatchHistorySource};
