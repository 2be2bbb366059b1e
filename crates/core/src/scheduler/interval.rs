//! Next-check interval calculation.

use chrono::{DateTime, Duration, Timelike, Utc};

/// Time from `now` until the next check of a topic whose target hour is `target_hour` (UTC).
///
/// Both timestamps are truncated to the hour. The target is today at
/// `target_hour`, moved one day forward when the last check happened in the
/// current hour. It moves one more day when `target_hour` is not after the
/// current hour of day, so both rules together add two days. The offset is
/// measured from the truncated `now` minus the minutes already elapsed in
/// the current hour, so the result is always at least one minute.
///
/// `last_check` only takes part in the same-hour comparison.
pub fn calculate_interval(
    target_hour: u32,
    last_check: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Duration {
    let current_hour = truncate_to_hour(now);
    let mut target = current_hour - Duration::hours(i64::from(current_hour.hour()))
        + Duration::hours(i64::from(target_hour));

    if last_check.map(truncate_to_hour) == Some(current_hour) {
        target += Duration::days(1);
    }
    if target.hour() <= current_hour.hour() {
        target += Duration::days(1);
    }

    target - current_hour - Duration::minutes(i64::from(now.minute()))
}

fn truncate_to_hour(at: DateTime<Utc>) -> DateTime<Utc> {
    at - Duration::minutes(i64::from(at.minute()))
        - Duration::seconds(i64::from(at.second()))
        - Duration::nanoseconds(i64::from(at.nanosecond()))
}
