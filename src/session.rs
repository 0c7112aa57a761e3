use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

use crate::document::DocumentId;

/// Longest session the setup dialog accepts
pub const MAX_SESSION_SECS: u64 = 99 * 3600;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Please enter a valid duration.")]
    InvalidDuration,

    #[error("Duration cannot exceed 99 hours.")]
    DurationTooLong { secs: u64 },

    #[error("No active document to track.")]
    MissingDocument,
}

/// A countdown length that passed setup validation: 1 second to 99 hours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionDuration(Duration);

impl SessionDuration {
    pub fn from_secs(secs: u64) -> Result<Self, SessionError> {
        if secs == 0 {
            return Err(SessionError::InvalidDuration);
        }
        if secs > MAX_SESSION_SECS {
            return Err(SessionError::DurationTooLong { secs });
        }
        Ok(Self(Duration::from_secs(secs)))
    }

    /// Builds a duration from the dialog's hour/minute/second fields.
    /// Empty fields count as zero; anything non-numeric is rejected.
    pub fn from_hms(hours: &str, minutes: &str, seconds: &str) -> Result<Self, SessionError> {
        let h = parse_field(hours)?;
        let m = parse_field(minutes)?;
        let s = parse_field(seconds)?;

        let total = h
            .checked_mul(3600)
            .and_then(|h| m.checked_mul(60).and_then(|m| h.checked_add(m)))
            .and_then(|hm| hm.checked_add(s))
            .ok_or(SessionError::DurationTooLong { secs: u64::MAX })?;

        Self::from_secs(total)
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn as_secs(&self) -> u64 {
        self.0.as_secs()
    }
}

fn parse_field(field: &str) -> Result<u64, SessionError> {
    let field = field.trim();
    if field.is_empty() {
        return Ok(0);
    }
    field
        .parse::<u64>()
        .map_err(|_| SessionError::InvalidDuration)
}

/// The document tracked by a session, captured once at start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListeningFileData {
    pub id: DocumentId,
    pub file_name: String,
    pub initial_word_count: usize,
}

/// Result of one finished session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub listening_file: ListeningFileData,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub final_word_count: usize,
}

impl SessionSummary {
    /// Net words added during the session; negative after net deletion.
    pub fn words_written(&self) -> i64 {
        self.final_word_count as i64 - self.listening_file.initial_word_count as i64
    }

    pub fn words_per_minute(&self) -> i64 {
        words_per_minute(self.words_written(), self.elapsed)
    }
}

/// Rounded WPM over `elapsed`. Returns 0 when less than half a second
/// elapsed, since the whole-second rounding leaves nothing to divide by.
pub fn words_per_minute(words_written: i64, elapsed: Duration) -> i64 {
    let elapsed_secs = elapsed.as_secs_f64();
    if elapsed_secs.round() == 0.0 {
        return 0;
    }
    (words_written as f64 / elapsed_secs * 60.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn summary(initial: usize, final_count: usize, elapsed_ms: u64) -> SessionSummary {
        SessionSummary {
            listening_file: ListeningFileData {
                id: DocumentId::new("notes/draft.md"),
                file_name: "draft.md".to_string(),
                initial_word_count: initial,
            },
            started_at: DateTime::<Utc>::UNIX_EPOCH,
            elapsed: Duration::from_millis(elapsed_ms),
            final_word_count: final_count,
        }
    }

    #[test]
    fn test_words_written_and_wpm() {
        let s = summary(100, 250, 60_000);
        assert_eq!(s.words_written(), 150);
        assert_eq!(s.words_per_minute(), 150);
    }

    #[test]
    fn test_wpm_zero_elapsed() {
        let s = summary(100, 250, 0);
        assert_eq!(s.words_per_minute(), 0);
    }

    #[test]
    fn test_wpm_sub_half_second_elapsed() {
        assert_eq!(words_per_minute(10, Duration::from_millis(400)), 0);
    }

    #[test]
    fn test_negative_words_written() {
        let s = summary(300, 240, 120_000);
        assert_eq!(s.words_written(), -60);
        assert_eq!(s.words_per_minute(), -30);
    }

    #[test]
    fn test_wpm_rounds() {
        // 10 words in 7 seconds = 85.714.. wpm
        assert_eq!(words_per_minute(10, Duration::from_secs(7)), 86);
    }

    #[test]
    fn test_duration_bounds() {
        assert_matches!(SessionDuration::from_secs(0), Err(SessionError::InvalidDuration));
        assert_eq!(SessionDuration::from_secs(1).unwrap().as_secs(), 1);
        assert_eq!(
            SessionDuration::from_secs(MAX_SESSION_SECS).unwrap().as_secs(),
            MAX_SESSION_SECS
        );
        assert_matches!(
            SessionDuration::from_secs(MAX_SESSION_SECS + 1),
            Err(SessionError::DurationTooLong { .. })
        );
    }

    #[test]
    fn test_duration_from_hms() {
        let d = SessionDuration::from_hms("1", "1", "1").unwrap();
        assert_eq!(d.as_secs(), 3661);

        let d = SessionDuration::from_hms("", "25", "").unwrap();
        assert_eq!(d.as_secs(), 25 * 60);
    }

    #[test]
    fn test_duration_from_hms_rejects_bad_input() {
        assert_matches!(
            SessionDuration::from_hms("", "", ""),
            Err(SessionError::InvalidDuration)
        );
        assert_matches!(
            SessionDuration::from_hms("a", "0", "0"),
            Err(SessionError::InvalidDuration)
        );
        assert_matches!(
            SessionDuration::from_hms("-1", "0", "0"),
            Err(SessionError::InvalidDuration)
        );
        assert_matches!(
            SessionDuration::from_hms("99", "0", "1"),
            Err(SessionError::DurationTooLong { .. })
        );
        assert_matches!(
            SessionDuration::from_hms("99999999999999999", "0", "0"),
            Err(SessionError::DurationTooLong { .. })
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SessionError::InvalidDuration.to_string(),
            "Please enter a valid duration."
        );
        assert_eq!(
            SessionError::DurationTooLong { secs: 400_000 }.to_string(),
            "Duration cannot exceed 99 hours."
        );
    }
}
