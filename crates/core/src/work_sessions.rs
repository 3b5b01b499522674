//! Working-time arithmetic for employee work sessions.

use crate::gpr::round2;
use crate::types::Timestamp;

/// Hours covered by one session. Open sessions are counted up to `now`.
pub fn session_hours(start: Timestamp, end: Option<Timestamp>, now: Timestamp) -> f64 {
    let end = end.unwrap_or(now);
    let seconds = (end - start).num_seconds().max(0);
    seconds as f64 / 3600.0
}

/// Total hours over `sessions`, rounded to two decimals.
pub fn total_hours<I>(sessions: I, now: Timestamp) -> f64
where
    I: IntoIterator<Item = (Timestamp, Option<Timestamp>)>,
{
    let total: f64 = sessions
        .into_iter()
        .map(|(start, end)| session_hours(start, end, now))
        .sum();
    round2(total)
}

/// Render a duration in hours as `"{h} h {m} min"`.
pub fn format_duration(hours: f64) -> String {
    if hours <= 0.0 {
        return "0 h 0 min".to_string();
    }
    let total_minutes = (hours * 60.0) as i64;
    format!("{} h {} min", total_minutes / 60, total_minutes % 60)
}
