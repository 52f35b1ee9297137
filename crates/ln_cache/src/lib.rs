pub mod manager;
pub mod scheduler;

pub use manager::{CacheManager, CacheState, CacheStatus, Snapshot};
pub use scheduler::{RefreshScheduler, SchedulerHandle};
