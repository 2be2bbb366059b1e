//! Check scheduler.
//!
//! Decides per topic when the next remote search runs:
//! - New or changed topics are due immediately
//! - Due topics are pushed to the next target hour (UTC) of their type plus jitter
//! - A single polling loop emits `TopicDue` events over a channel

mod config;
mod interval;
mod runner;
mod types;

pub use config::{SchedulerConfig, TargetHours};
pub use interval::calculate_interval;
pub use runner::CheckScheduler;
pub use types::{ScheduleEntry, SchedulerError, TopicDue};
