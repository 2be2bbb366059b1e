//! Scheduler configuration.

use serde::{Deserialize, Serialize};

use crate::topic::TopicType;

/// Configuration for the check scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// How often the loop looks for due topics (milliseconds).
    /// This is granularity, not precision.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,

    /// Upper bound of the random delay added to each computed check time (seconds).
    #[serde(default = "default_jitter")]
    pub jitter_max_secs: u64,

    /// Hour of day (UTC) at which each topic type is checked.
    #[serde(default)]
    pub target_hours: TargetHours,
}

fn default_tick_interval() -> u64 {
    5000 // 5 seconds
}

fn default_jitter() -> u64 {
    1800 // 30 minutes
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            jitter_max_secs: default_jitter(),
            target_hours: TargetHours::default(),
        }
    }
}

/// UTC target hour per topic type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetHours {
    #[serde(default = "default_tv_show_hour")]
    pub tv_show: u32,
    #[serde(default = "default_game_hour")]
    pub game: u32,
}

fn default_tv_show_hour() -> u32 {
    9
}

fn default_game_hour() -> u32 {
    19
}

impl Default for TargetHours {
    fn default() -> Self {
        Self {
            tv_show: default_tv_show_hour(),
            game: default_game_hour(),
        }
    }
}

impl TargetHours {
    pub fn hour_for(&self, kind: TopicType) -> u32 {
        match kind {
            TopicType::TvShow => self.tv_show,
            TopicType::Game => self.game,
        }
    }
}
