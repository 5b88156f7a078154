pub mod job;
pub mod scene;
pub mod snapshot;
