use std::sync::mpsc;
use std::time::Duration;

use assert_matches::assert_matches;
use writing_stats::clock::ManualClock;
use writing_stats::display::{DisplayState, StatusLine};
use writing_stats::document::InMemoryDocuments;
use writing_stats::runtime::{AppEvent, FixedTicker, IntervalSchedule, Runner, TestEventSource};
use writing_stats::session::SessionDuration;
use writing_stats::timer::{TickOutcome, TimerStatus, WritingTimer};

type HeadlessTimer = WritingTimer<ManualClock, InMemoryDocuments, StatusLine, IntervalSchedule>;

fn headless(text: &str) -> (HeadlessTimer, ManualClock, InMemoryDocuments, IntervalSchedule) {
    let clock = ManualClock::default();
    let docs = InMemoryDocuments::new();
    docs.open("journal/today.md", "today.md", text);
    let schedule = IntervalSchedule::new();
    let timer = WritingTimer::new(
        clock.clone(),
        docs.clone(),
        StatusLine::new(),
        schedule.clone(),
    );
    (timer, clock, docs, schedule)
}

// Headless integration using the internal runtime without a TTY.
// Each runner tick stands in for one second of wall-clock time.
#[test]
fn headless_session_runs_to_expiry() {
    let (mut timer, clock, docs, schedule) = headless("Dear diary");
    let id = timer.capture_listening_file().unwrap().id;

    assert_matches!(
        timer.begin(SessionDuration::from_secs(5).unwrap()),
        Ok(true)
    );

    let (_tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(2)),
    );

    let mut summaries = Vec::new();
    for step in 0..50u32 {
        if let AppEvent::Tick = runner.step() {
            if !schedule.is_armed() {
                break;
            }
            clock.advance(Duration::from_secs(1));
            if step == 2 {
                docs.set_text(&id, "Dear diary, today I wrote a lot of words");
            }
            if let TickOutcome::Ended(summary) = timer.tick() {
                summaries.push(summary);
            }
        }
    }

    assert_eq!(summaries.len(), 1);
    let summary = &summaries[0];
    assert_eq!(summary.elapsed, Duration::from_secs(5));
    assert_eq!(summary.words_written(), 7);
    assert_eq!(summary.words_per_minute(), 84);
    assert_eq!(timer.status(), TimerStatus::Idle);
    assert_eq!(timer.display().current(), &DisplayState::Ended);
    assert_eq!(schedule.live_count(), 0);
}

#[test]
fn headless_pause_resume_stop() {
    let (mut timer, clock, docs, schedule) = headless("");
    let id = timer.capture_listening_file().unwrap().id;
    timer
        .begin(SessionDuration::from_hms("", "1", "").unwrap())
        .unwrap();

    for _ in 0..20 {
        clock.advance(Duration::from_secs(1));
        timer.tick();
    }
    assert!(timer.pause());
    assert_eq!(
        timer.display().current(),
        &DisplayState::Paused("00:00:40".into())
    );

    // a long break does not count as writing time
    clock.advance(Duration::from_secs(600));
    assert_eq!(timer.tick(), TickOutcome::Inactive);
    assert_matches!(timer.resume(), Some(TickOutcome::Counting(_)));
    assert_eq!(timer.remaining(), Duration::from_secs(40));

    for _ in 0..10 {
        clock.advance(Duration::from_secs(1));
        timer.tick();
    }
    docs.set_text(&id, &"word ".repeat(45));

    let summary = timer.stop().unwrap();
    assert_eq!(summary.elapsed, Duration::from_secs(30));
    assert_eq!(summary.words_written(), 45);
    assert_eq!(summary.words_per_minute(), 90);
    assert_eq!(schedule.scheduled_total(), 2);
    assert!(!schedule.is_armed());
    assert_eq!(timer.display().label(), "⌛️");
}

#[test]
fn headless_net_deletion_reports_negative_words() {
    let (mut timer, clock, docs, _schedule) = headless("one two three four five six");
    let id = timer.capture_listening_file().unwrap().id;
    timer.begin(SessionDuration::from_secs(120).unwrap()).unwrap();

    clock.advance(Duration::from_secs(60));
    timer.tick();
    docs.set_text(&id, "one two");

    let summary = timer.stop().unwrap();
    assert_eq!(summary.words_written(), -4);
    assert_eq!(summary.words_per_minute(), -4);
    assert_eq!(timer.last_summary(), Some(&summary));
}
