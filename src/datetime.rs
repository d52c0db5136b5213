//! Date/time display utilities for iTransfer.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Format a UTC datetime in the specified timezone.
///
/// # Arguments
///
/// * `dt` - DateTime in UTC
/// * `timezone` - Timezone name (e.g., "Europe/Paris", "UTC")
/// * `format` - Output format string (e.g., "%d/%m/%Y %H:%M:%S")
///
/// Falls back to UTC formatting when the timezone name is invalid.
pub fn format_utc_datetime(dt: &DateTime<Utc>, timezone: &str, format: &str) -> String {
    let tz: Tz = match timezone.parse() {
        Ok(tz) => tz,
        Err(_) => return dt.format(format).to_string(),
    };
    dt.with_timezone(&tz).format(format).to_string()
}

/// Format a UTC datetime the way notification emails display it.
pub fn format_for_mail(dt: &DateTime<Utc>, timezone: &str) -> String {
    format_utc_datetime(dt, timezone, "%d/%m/%Y %H:%M:%S")
}
