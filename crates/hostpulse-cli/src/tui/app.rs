//! TUI application state and event loop.
//!
//! Messages arrive from a [`Feed`] running on a background thread; the UI
//! thread drains it between frames, so a slow or stalled collector never
//! blocks key handling. The app is the dashboard's plot surface: each redraw
//! replaces the frame it keeps, and `ui::draw` renders that frame.

use std::io;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use hostpulse_core::{
    DashboardConfig, FamilyKind, Handled, LatestFrame, Navigation, Redraw, Session,
};

use super::feed::{Feed, FeedEvent};

/// Upper bound on messages applied per frame, so a replay at high speed
/// still leaves room for key handling.
const MAX_EVENTS_PER_FRAME: usize = 256;

// ---------------------------------------------------------------------------
// Key map
// ---------------------------------------------------------------------------

/// Navigation bound to `key`, if any.
pub fn key_navigation(key: KeyCode) -> Option<Navigation> {
    match key {
        KeyCode::Char(c @ '1'..='6') => c
            .to_digit(10)
            .and_then(|n| FamilyKind::from_number(n as usize))
            .map(Navigation::FamilyKey),
        KeyCode::Char('`') | KeyCode::Tab => Some(Navigation::NextFamily),
        KeyCode::Char('~') | KeyCode::BackTab => Some(Navigation::PreviousFamily),
        KeyCode::Right | KeyCode::Char(']') => Some(Navigation::NextEntity),
        KeyCode::Left | KeyCode::Char('[') => Some(Navigation::PreviousEntity),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    session: Session,
    feed: Feed,
    frame: LatestFrame,
    origin: String,
    running: bool,
    /// Stream ended; the last frame stays on screen.
    closed: bool,
    malformed: u64,
    last_note: Option<String>,
    pulse_lit_at: Option<Instant>,
}

impl App {
    pub fn new(config: DashboardConfig, feed: Feed, origin: String) -> Self {
        Self {
            session: Session::new(config),
            feed,
            frame: LatestFrame::default(),
            origin,
            running: true,
            closed: false,
            malformed: 0,
            last_note: None,
            pulse_lit_at: None,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
            original_hook(info);
        }));

        let result = self.run_loop(&mut terminal);

        let _ = std::panic::take_hook();
        self.feed.stop();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::cursor::Show
        )?;

        if self.malformed > 0 {
            eprintln!("{} malformed message(s) skipped", self.malformed);
        }
        result
    }

    fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        while self.running {
            self.pump_feed();
            self.fade_pulse(Instant::now());
            terminal.draw(|f| super::ui::draw(f, self))?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            other => {
                if let Some(nav) = key_navigation(other) {
                    self.session.navigate(nav, &mut self.frame);
                }
            }
        }
    }

    fn pump_feed(&mut self) {
        for _ in 0..MAX_EVENTS_PER_FRAME {
            let Some(event) = self.feed.try_recv() else {
                break;
            };
            self.apply(event, Instant::now());
        }
    }

    pub(super) fn apply(&mut self, event: FeedEvent, now: Instant) {
        match event {
            FeedEvent::Message(msg) => {
                if let Handled::Tick(_) = self.session.handle(msg, &mut self.frame) {
                    self.pulse_lit_at = Some(now);
                }
            }
            FeedEvent::Malformed(e) => {
                self.malformed += 1;
                self.last_note = Some(format!("skipped: {e}"));
            }
            FeedEvent::Closed(reason) => {
                self.closed = true;
                self.last_note = Some(match reason {
                    Some(e) => format!("stream closed: {e}"),
                    None => "stream ended".to_string(),
                });
            }
        }
    }

    /// Clear the alive pulse half a sample period after it was lit.
    fn fade_pulse(&mut self, now: Instant) {
        let Some(lit) = self.pulse_lit_at else {
            return;
        };
        let Some(dashboard) = self.session.dashboard_mut() else {
            return;
        };
        let half = Duration::try_from_secs_f64(dashboard.period_secs() / 2.0).unwrap_or_default();
        if now.duration_since(lit) >= half {
            dashboard.host_mut().fade();
            self.pulse_lit_at = None;
        }
    }

    // -----------------------------------------------------------------------
    // Accessors for UI
    // -----------------------------------------------------------------------

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn frame(&self) -> Option<&Redraw> {
        self.frame.0.as_ref()
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn last_note(&self) -> Option<&str> {
        self.last_note.as_deref()
    }

    pub fn active_entity(&self) -> Option<&str> {
        let d = self.session.dashboard()?;
        d.tracker(d.active_family())?.selected()
    }
}
