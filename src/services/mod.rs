//! Long-running background services.

pub mod daily_scheduler;

pub use daily_scheduler::{next_fire, DailyScheduler, SchedulerHandle};
