//! Background job execution and the polling/progress contract.

pub mod manager;
pub mod progress;

pub use manager::{JobContext, JobManager, JobRequest, JobResult, PoolOpts, SessionId};
pub use progress::{NoProgress, ProgressBoard, ProgressObserver, Snapshot, Stage};
