pub mod candidate;
pub mod catalog;
pub mod exclusion;
pub mod job;
pub mod media;
pub mod media_ids;
pub mod request;
pub mod watch_history;

pub use candidate::DeletionCandidate;
pub use catalog::{CatalogMovie, CatalogSeries};
pub use exclusion::ExclusionRecord;
pub use job::{Job, JobKind, JobStatus};
pub use media::{MatchStatus, MediaItem, MediaType};
pub use media_ids::MediaIds;
pub use request::{MediaRequest, RequestStatus, Requester};
pub use watch_history::PlayRecord;
