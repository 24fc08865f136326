//! Periodic check for newly published Stepik courses.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::{settings::Settings, stepik::wrappers::RemoteCourse};

/// Update dates closer than this to the last check count as the same moment.
const SIGNIFICANT_GAP_SECS: i64 = 1;

/// Courses updated since the last check that were never announced.
///
/// The returned courses are marked as shown and the check time becomes `now`.
pub fn new_courses<'a>(
    courses: &'a [RemoteCourse],
    settings: &mut Settings,
    now: DateTime<Utc>,
) -> Vec<&'a RemoteCourse> {
    let last_checked = settings.last_time_checked;
    let gap = TimeDelta::seconds(SIGNIFICANT_GAP_SECS);
    let fresh: Vec<&RemoteCourse> = courses
        .iter()
        .filter(|c| !settings.shown_course_ids.contains(&c.id))
        .filter(|c| c.update_date - last_checked > gap)
        .collect();

    debug!("{} of {} courses are new", fresh.len(), courses.len());
    settings.shown_course_ids.extend(fresh.iter().map(|c| c.id));
    settings.last_time_checked = now;
    fresh
}

/// Time left until the next check; zero when one is already due.
pub fn next_check_delay(last_checked: DateTime<Utc>, interval: Duration, now: DateTime<Utc>) -> Duration {
    let interval = TimeDelta::from_std(interval).unwrap_or(TimeDelta::MAX);
    let due = last_checked
        .checked_add_signed(interval)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    (due - now).to_std().unwrap_or(Duration::ZERO)
}
