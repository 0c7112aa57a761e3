use std::fmt;

/// What the status indicator should show
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DisplayState {
    #[default]
    Default,
    Counting(String),
    Paused(String),
    Ended,
}

impl fmt::Display for DisplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayState::Default => write!(f, "⌛️"),
            DisplayState::Counting(time) => write!(f, "⌛️ {time}"),
            DisplayState::Paused(time) => write!(f, "⏸ Paused {time}"),
            DisplayState::Ended => write!(f, "⏰ Session ended"),
        }
    }
}

/// One-way sink for timer display updates
pub trait StatusDisplay {
    fn render(&mut self, state: DisplayState);
}

/// Status indicator that keeps the latest state for the UI to draw
#[derive(Debug, Clone, Default)]
pub struct StatusLine {
    current: DisplayState,
    renders: usize,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &DisplayState {
        &self.current
    }

    pub fn label(&self) -> String {
        self.current.to_string()
    }

    pub fn render_count(&self) -> usize {
        self.renders
    }
}

impl StatusDisplay for StatusLine {
    fn render(&mut self, state: DisplayState) {
        self.current = state;
        self.renders += 1;
    }
}
