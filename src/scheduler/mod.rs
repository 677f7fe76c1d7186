//! Scheduler module
//!
//! Background tasks for the dashboard:
//! - Passive auto-refresh on the cache-TTL cadence

mod auto_refresh;

pub use auto_refresh::{AutoRefreshScheduler, SchedulerHandle};
