mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::OpenOptions,
    io::{self, stdin, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use writing_stats::{
    clock::{Clock, SystemClock},
    config::{Config, ConfigStore, FileConfigStore},
    display::StatusLine,
    document::FileDocumentSource,
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, IntervalSchedule, Runner, TICK_PERIOD},
    session::SessionDuration,
    timer::{TickOutcome, TimerStatus, WritingTimer},
};

/// Ticks a notice stays on screen
const NOTICE_TICKS: u8 = 4;
const MAX_FIELD_DIGITS: usize = 4;

/// countdown timer for focused writing sessions
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Runs a countdown writing session against a document and reports words written and words per minute when it ends."
)]
pub struct Cli {
    /// document to track during sessions
    file: PathBuf,

    /// path to the config file (defaults to the platform config dir)
    #[clap(long)]
    config: Option<PathBuf>,

    /// write logs to this file (level from RUST_LOG, default info)
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// ring the terminal bell when a session ends
    #[clap(long)]
    bell: bool,
}

pub type SessionTimer<C> = WritingTimer<C, FileDocumentSource, StatusLine, IntervalSchedule>;

/// Hours/minutes/seconds inputs of the new-session dialog
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DurationForm {
    pub fields: [String; 3],
    pub focus: usize,
}

impl DurationForm {
    pub fn push_digit(&mut self, c: char) {
        let field = &mut self.fields[self.focus];
        if c.is_ascii_digit() && field.len() < MAX_FIELD_DIGITS {
            field.push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.fields[self.focus].pop();
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    pub fn prev_field(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }

    pub fn duration(&self) -> Result<SessionDuration, writing_stats::session::SessionError> {
        SessionDuration::from_hms(&self.fields[0], &self.fields[1], &self.fields[2])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    Closed,
    NewSession(DurationForm),
    RunningSession,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub text: String,
    ticks_left: u8,
}

pub struct App<C: Clock = SystemClock> {
    pub timer: SessionTimer<C>,
    pub schedule: IntervalSchedule,
    pub dialog: Dialog,
    pub notice: Option<Notice>,
    pub config: Config,
    config_store: Option<FileConfigStore>,
    bell_pending: bool,
}

impl<C: Clock> App<C> {
    pub fn new(
        clock: C,
        documents: FileDocumentSource,
        config: Config,
        config_store: Option<FileConfigStore>,
    ) -> Self {
        let schedule = IntervalSchedule::new();
        let timer = WritingTimer::new(clock, documents, StatusLine::new(), schedule.clone());
        Self {
            timer,
            schedule,
            dialog: Dialog::Closed,
            notice: None,
            config,
            config_store,
            bell_pending: false,
        }
    }

    pub fn show_notice(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            ticks_left: NOTICE_TICKS,
        });
    }

    /// The status-line action: set up a new session, or manage the running one.
    pub fn on_status_press(&mut self) {
        self.dialog = if self.timer.is_active() {
            Dialog::RunningSession
        } else {
            Dialog::NewSession(DurationForm {
                fields: self.config.duration_fields(),
                focus: 0,
            })
        };
    }

    pub fn submit_new_session(&mut self) {
        let duration = match &self.dialog {
            Dialog::NewSession(form) => form.duration(),
            _ => return,
        };

        match duration.and_then(|d| self.timer.begin(d).map(|_| d)) {
            Ok(duration) => {
                self.dialog = Dialog::Closed;
                self.config.remember_duration(duration);
                self.save_config();
            }
            Err(err) => self.show_notice(err.to_string()),
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.timer.status() {
            TimerStatus::Paused => {
                if let Some(outcome) = self.timer.resume() {
                    self.on_tick_outcome(outcome);
                }
            }
            TimerStatus::Running => {
                self.timer.pause();
            }
            TimerStatus::Idle | TimerStatus::Ended => {}
        }
    }

    pub fn stop_session(&mut self) {
        self.timer.stop();
        if self.dialog == Dialog::RunningSession {
            self.dialog = Dialog::Closed;
        }
    }

    pub fn on_tick(&mut self) {
        if let Some(notice) = &mut self.notice {
            notice.ticks_left = notice.ticks_left.saturating_sub(1);
            if notice.ticks_left == 0 {
                self.notice = None;
            }
        }

        if !self.schedule.is_armed() {
            return;
        }

        let outcome = self.timer.tick();
        self.on_tick_outcome(outcome);
    }

    fn on_tick_outcome(&mut self, outcome: TickOutcome) {
        if let TickOutcome::Ended(_) = outcome {
            self.show_notice("Writing session ended!");
            self.bell_pending = self.config.bell_on_end;
            if self.dialog == Dialog::RunningSession {
                self.dialog = Dialog::Closed;
            }
        }
    }

    /// Returns true when the app should quit.
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }

        match self.dialog {
            Dialog::Closed => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => self.on_status_press(),
                KeyCode::Esc | KeyCode::Char('q') => return true,
                _ => {}
            },
            Dialog::NewSession(_) => self.on_form_key(key),
            Dialog::RunningSession => match key.code {
                KeyCode::Char('p') | KeyCode::Char(' ') => self.toggle_pause(),
                KeyCode::Char('s') => self.stop_session(),
                KeyCode::Esc => self.dialog = Dialog::Closed,
                _ => {}
            },
        }
        false
    }

    fn on_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.submit_new_session(),
            KeyCode::Esc => self.dialog = Dialog::Closed,
            code => {
                let Dialog::NewSession(form) = &mut self.dialog else {
                    return;
                };
                match code {
                    KeyCode::Char(c) => form.push_digit(c),
                    KeyCode::Backspace => form.backspace(),
                    KeyCode::Tab | KeyCode::Right => form.next_field(),
                    KeyCode::BackTab | KeyCode::Left => form.prev_field(),
                    _ => {}
                }
            }
        }
    }

    pub fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell_pending)
    }

    fn save_config(&self) {
        if let Some(store) = &self.config_store {
            if let Err(err) = store.save(&self.config) {
                warn!(path = %store.path().display(), %err, "failed to save config");
            }
        }
    }
}

fn init_logging(path: &Path) -> Result<(), Box<dyn Error>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let mut config = store.load();
    config.bell_on_end |= cli.bell;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(
        SystemClock,
        FileDocumentSource::new(&cli.file),
        config,
        Some(store),
    );
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, C: Clock>(
    terminal: &mut Terminal<B>,
    app: &mut App<C>,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::new(TICK_PERIOD));

    loop {
        terminal.draw(|f| ui(app, f))?;

        match runner.step() {
            AppEvent::Tick => {
                app.on_tick();
                if app.take_bell() {
                    io::stdout().write_all(b"\x07")?;
                    io::stdout().flush()?;
                }
            }
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if app.on_key(key) {
                    break;
                }
            }
        }
    }

    // an active session still gets its summary logged
    app.timer.stop();
    Ok(())
}

fn ui<C: Clock>(app: &App<C>, f: &mut Frame) {
    f.render_widget(app, f.area());
}
