//! Wall-clock formatting shared by the report and the notification.

use chrono::{DateTime, Duration, Utc};

/// Brasília has been UTC-3 all year since daylight saving was dropped in 2019.
const BRASILIA_UTC_OFFSET_HOURS: i64 = -3;

/// `dd/mm/yyyy, HH:MM:SS` in Brasília time.
pub fn brasilia_timestamp(now: DateTime<Utc>) -> String {
    let local = now.naive_utc() + Duration::hours(BRASILIA_UTC_OFFSET_HOURS);
    local.format("%d/%m/%Y, %H:%M:%S").to_string()
}

/// Run identifier used to bust caches on the published report,
/// e.g. `2026-10-18_14-03-05` (UTC).
pub fn execution_id(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d_%H-%M-%S").to_string()
}
