//! UTC timestamps for build stamps and install receipts.
//!
//! Timestamps are rendered as `YYYY-MM-DDThh:mm:ssZ` using only
//! `std::time::SystemTime`, so no date library is needed.

use std::time::{SystemTime, UNIX_EPOCH};

/// Environment variable that pins build timestamps for reproducible builds.
pub const SOURCE_DATE_EPOCH: &str = "SOURCE_DATE_EPOCH";

/// Return the current UTC time as an ISO 8601 string.
///
/// A clock set before 1970 yields the epoch itself.
#[must_use]
pub fn now_utc_iso8601() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs());
    format_epoch_secs(secs)
}

/// Return the date to stamp into a build.
///
/// Honours `SOURCE_DATE_EPOCH` when it holds a valid integer, and falls back
/// to the current time otherwise.
#[must_use]
pub fn build_timestamp() -> String {
    std::env::var(SOURCE_DATE_EPOCH)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map_or_else(now_utc_iso8601, format_epoch_secs)
}

/// Format a Unix epoch timestamp as `YYYY-MM-DDThh:mm:ssZ`.
///
/// # Examples
///
/// ```
/// use domaindetails_installer::timestamp::format_epoch_secs;
///
/// assert_eq!(format_epoch_secs(0), "1970-01-01T00:00:00Z");
/// ```
#[must_use]
pub fn format_epoch_secs(epoch_secs: u64) -> String {
    let (year, month, day) = civil_from_epoch(epoch_secs);
    let day_secs = epoch_secs % 86_400;
    let hour = day_secs / 3_600;
    let minute = (day_secs % 3_600) / 60;
    let second = day_secs % 60;
    format!("{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}Z")
}

/// Convert a Unix epoch timestamp to a `(year, month, day)` triple.
///
/// Uses Howard Hinnant's public-domain `civil_from_days` algorithm.
#[expect(
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    reason = "day counts and years stay far inside i64 and u32 for post-epoch dates"
)]
fn civil_from_epoch(epoch_secs: u64) -> (u32, u32, u32) {
    let z = (epoch_secs / 86_400) as i64 + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097) as u64;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = (yoe as i64) + era * 400 + i64::from(month <= 2);
    (year as u32, month as u32, day as u32)
}
