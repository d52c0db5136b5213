//! Human-readable size formatting for manifest summaries.

/// Binary magnitude suffixes, base 1024.
const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

/// Format a byte count as a human-readable string with two decimals.
///
/// Uses binary units (base 1024) up to petabytes: `1536` becomes `"1.50 KB"`,
/// `1073741824` becomes `"1.00 GB"`.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    for unit in UNITS {
        if value < 1024.0 {
            return format!("{value:.2} {unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.2} PB")
}
