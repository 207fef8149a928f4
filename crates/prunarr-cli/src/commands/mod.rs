pub mod candidates;
pub mod config;
pub mod context;
pub mod daemon;
pub mod exclude;
pub mod jobs;
pub mod leaving_soon;
pub mod sync;
pub mod sync_ui;
