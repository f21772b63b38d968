//! Clock-face formatting for durations.

/// `HH:MM:SS`, negative durations shown as zero
pub fn format_hms(ms: i64) -> String {
    let total = ms.max(0) / 1000;
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// `MM:SS`; minutes keep counting past the hour
pub fn format_ms(ms: i64) -> String {
    let total = ms.max(0) / 1000;
    format!("{:02}:{:02}", total / 60, total % 60)
}
