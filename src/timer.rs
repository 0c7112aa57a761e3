use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::display::{DisplayState, StatusDisplay};
use crate::document::DocumentSource;
use crate::runtime::{TickHandle, TickScheduler, TICK_PERIOD};
use crate::session::{ListeningFileData, SessionDuration, SessionError, SessionSummary};
use crate::util::{format_hms, word_count};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
    Ended,
}

/// Countdown state. Each variant carries only the fields valid for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running {
        target_end: DateTime<Utc>,
        remaining: Duration,
        elapsed: Duration,
    },
    Paused {
        remaining: Duration,
        elapsed: Duration,
    },
    Ended {
        elapsed: Duration,
    },
}

impl TimerState {
    pub fn status(&self) -> TimerStatus {
        match self {
            TimerState::Idle => TimerStatus::Idle,
            TimerState::Running { .. } => TimerStatus::Running,
            TimerState::Paused { .. } => TimerStatus::Paused,
            TimerState::Ended { .. } => TimerStatus::Ended,
        }
    }

    pub fn remaining(&self) -> Duration {
        match self {
            TimerState::Running { remaining, .. } | TimerState::Paused { remaining, .. } => {
                *remaining
            }
            TimerState::Idle | TimerState::Ended { .. } => Duration::ZERO,
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            TimerState::Running { elapsed, .. }
            | TimerState::Paused { elapsed, .. }
            | TimerState::Ended { elapsed } => *elapsed,
            TimerState::Idle => Duration::ZERO,
        }
    }
}

/// What a single tick observed
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Not running; the tick had no effect
    Inactive,
    Counting(Duration),
    Ended(SessionSummary),
}

#[derive(Debug, Clone)]
struct ActiveSession {
    listening_file: ListeningFileData,
    started_at: DateTime<Utc>,
}

/// Countdown controller for one writing session at a time.
///
/// All state changes go through `start`, `pause`, `resume`, `stop` and
/// `tick`. Calls that do not fit the current state are ignored.
#[derive(Debug)]
pub struct WritingTimer<C, D, R, S>
where
    C: Clock,
    D: DocumentSource,
    R: StatusDisplay,
    S: TickScheduler,
{
    clock: C,
    documents: D,
    display: R,
    scheduler: S,
    state: TimerState,
    session: Option<ActiveSession>,
    tick_handle: Option<TickHandle>,
    last_summary: Option<SessionSummary>,
}

impl<C, D, R, S> WritingTimer<C, D, R, S>
where
    C: Clock,
    D: DocumentSource,
    R: StatusDisplay,
    S: TickScheduler,
{
    pub fn new(clock: C, documents: D, mut display: R, scheduler: S) -> Self {
        display.render(DisplayState::Default);
        Self {
            clock,
            documents,
            display,
            scheduler,
            state: TimerState::Idle,
            session: None,
            tick_handle: None,
            last_summary: None,
        }
    }

    /// Snapshots the active document so a session can track it.
    pub fn capture_listening_file(&self) -> Result<ListeningFileData, SessionError> {
        let doc = self
            .documents
            .active_document()
            .ok_or(SessionError::MissingDocument)?;

        Ok(ListeningFileData {
            initial_word_count: word_count(&doc.text),
            id: doc.id,
            file_name: doc.display_name,
        })
    }

    /// Starts a validated session on the active document.
    /// Returns `Ok(false)` when a session is already running.
    pub fn begin(&mut self, duration: SessionDuration) -> Result<bool, SessionError> {
        let listening_file = self.capture_listening_file()?;
        Ok(self.start(duration.as_duration(), listening_file))
    }

    pub fn start(&mut self, duration: Duration, listening_file: ListeningFileData) -> bool {
        if matches!(self.state, TimerState::Running { .. }) {
            debug!("start ignored: session already running");
            return false;
        }
        if duration.is_zero() {
            debug!("start refused: empty duration");
            return false;
        }
        let now = self.clock.now();
        let Some(target_end) = TimeDelta::from_std(duration)
            .ok()
            .and_then(|span| now.checked_add_signed(span))
        else {
            debug!(?duration, "start refused: duration out of range");
            return false;
        };

        if self.session.is_some() {
            // a paused session is closed out before the new one begins
            self.stop();
        }

        self.cancel_ticking();
        debug!(
            file = %listening_file.file_name,
            secs = duration.as_secs(),
            "starting writing session"
        );

        self.state = TimerState::Running {
            target_end,
            remaining: duration,
            elapsed: Duration::ZERO,
        };
        self.session = Some(ActiveSession {
            listening_file,
            started_at: now,
        });
        self.tick_handle = Some(self.scheduler.schedule(TICK_PERIOD));
        self.display
            .render(DisplayState::Counting(format_hms(duration)));
        true
    }

    pub fn tick(&mut self) -> TickOutcome {
        let TimerState::Running {
            target_end,
            remaining,
            elapsed,
        } = self.state
        else {
            return TickOutcome::Inactive;
        };

        let diff = target_end - self.clock.now();
        let Some(left) = diff.to_std().ok().filter(|left| !left.is_zero()) else {
            return self.expire(elapsed + remaining);
        };

        // clock jumps backwards never reduce elapsed time
        let forward = remaining.saturating_sub(left);
        self.state = TimerState::Running {
            target_end,
            remaining: left,
            elapsed: elapsed + forward,
        };
        self.display.render(DisplayState::Counting(format_hms(left)));
        TickOutcome::Counting(left)
    }

    pub fn pause(&mut self) -> bool {
        let TimerState::Running {
            remaining, elapsed, ..
        } = self.state
        else {
            return false;
        };

        self.cancel_ticking();
        self.state = TimerState::Paused { remaining, elapsed };
        debug!(remaining_secs = remaining.as_secs(), "session paused");
        self.display
            .render(DisplayState::Paused(format_hms(remaining)));
        true
    }

    /// Resumes a paused session and runs one tick straight away.
    /// Returns that tick's outcome, or `None` when nothing was paused.
    pub fn resume(&mut self) -> Option<TickOutcome> {
        let TimerState::Paused { remaining, elapsed } = self.state else {
            return None;
        };
        let now = self.clock.now();
        let target_end = TimeDelta::from_std(remaining)
            .ok()
            .and_then(|span| now.checked_add_signed(span))?;

        self.cancel_ticking();
        self.state = TimerState::Running {
            target_end,
            remaining,
            elapsed,
        };
        self.tick_handle = Some(self.scheduler.schedule(TICK_PERIOD));
        debug!(remaining_secs = remaining.as_secs(), "session resumed");
        Some(self.tick())
    }

    /// Ends the current session early. Returns its summary, or `None`
    /// when no session was active.
    pub fn stop(&mut self) -> Option<SessionSummary> {
        self.cancel_ticking();

        let session = self.session.take()?;
        let elapsed = self.state.elapsed();
        self.state = TimerState::Idle;

        let summary = self.summarize(session, elapsed, "stopped");
        self.display.render(DisplayState::Default);
        Some(summary)
    }

    fn expire(&mut self, elapsed: Duration) -> TickOutcome {
        self.state = TimerState::Ended { elapsed };
        self.cancel_ticking();

        let Some(session) = self.session.take() else {
            self.state = TimerState::Idle;
            return TickOutcome::Inactive;
        };

        let summary = self.summarize(session, elapsed, "ended");
        self.display.render(DisplayState::Ended);
        self.state = TimerState::Idle;
        TickOutcome::Ended(summary)
    }

    /// Builds the summary for a finished session and keeps it as the last one.
    fn summarize(
        &mut self,
        session: ActiveSession,
        elapsed: Duration,
        how: &str,
    ) -> SessionSummary {
        let final_word_count = match self.documents.current_text(&session.listening_file.id) {
            Some(text) => word_count(&text),
            None => {
                warn!(
                    id = %session.listening_file.id,
                    "tracked document unavailable, counting 0 words"
                );
                0
            }
        };

        let summary = SessionSummary {
            listening_file: session.listening_file,
            started_at: session.started_at,
            elapsed,
            final_word_count,
        };
        info!(
            file = %summary.listening_file.file_name,
            words_written = summary.words_written(),
            wpm = summary.words_per_minute(),
            elapsed = %format_hms(summary.elapsed),
            "session {how}"
        );
        self.last_summary = Some(summary.clone());
        summary
    }

    fn cancel_ticking(&mut self) {
        if let Some(handle) = self.tick_handle.take() {
            self.scheduler.cancel(handle);
        }
    }

    pub fn status(&self) -> TimerStatus {
        self.state.status()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn remaining(&self) -> Duration {
        self.state.remaining()
    }

    pub fn elapsed(&self) -> Duration {
        self.state.elapsed()
    }

    /// True while a session is running or paused
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_ticking(&self) -> bool {
        self.tick_handle.is_some()
    }

    pub fn listening_file(&self) -> Option<&ListeningFileData> {
        self.session.as_ref().map(|s| &s.listening_file)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.session.as_ref().map(|s| s.started_at)
    }

    pub fn last_summary(&self) -> Option<&SessionSummary> {
        self.last_summary.as_ref()
    }

    pub fn display(&self) -> &R {
        &self.display
    }

    pub fn documents(&self) -> &D {
        &self.documents
    }
}
