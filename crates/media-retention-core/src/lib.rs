pub mod cache;
pub mod error;
pub mod exclusions;
pub mod jobs;
pub mod matching;
mod persist;
pub mod rules;
pub mod sync;

pub use cache::{SharedCache, TtlCache};
pub use error::EngineError;
pub use exclusions::ExclusionStore;
pub use jobs::JobLedger;
pub use rules::{generate_deletion_reason, parse_duration, DecisionBasis, PolicyDecision, RulesEngine};
pub use sync::{EngineStatus, SyncEngine, MAX_CANDIDATE_PREVIEW};
