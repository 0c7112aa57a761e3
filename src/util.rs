use std::time::Duration;

/// Counts whitespace-delimited runs in `text`. Blank text counts as zero.
pub fn word_count(text: &str) -> usize {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0;
    }
    trimmed.split_whitespace().count()
}

/// Formats a duration as zero-padded `HH:MM:SS`, flooring to whole seconds.
/// Hours are not capped at 99.
pub fn format_hms(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
