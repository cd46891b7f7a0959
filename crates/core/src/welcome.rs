//! Gates for the informational overlays on the dashboard.
//!
//! Neither gate is authoritative: the inputs come from browser cookies and
//! losing them only means an overlay is shown once more.

use chrono::{DateTime, Duration, Utc};

/// Minimum time between two welcome overlays for the same user, in minutes.
pub const WELCOME_INTERVAL_MINUTES: i64 = 60;

/// Show the tips panel only on a browser's very first visit.
#[must_use]
pub const fn show_tips(has_visited: bool) -> bool {
    !has_visited
}

/// Show the welcome overlay if it was never shown to this user, or was last
/// shown more than [`WELCOME_INTERVAL_MINUTES`] ago.
#[must_use]
pub fn show_welcome(last_shown: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    last_shown.is_none_or(|at| now - at > Duration::minutes(WELCOME_INTERVAL_MINUTES))
}
