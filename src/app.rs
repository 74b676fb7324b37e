use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use notify_rust::{Notification, Urgency};
use tracing::{debug, info, warn};

use crate::accent::{Accent, AccentPreference, RING_ALPHA, Rgb};
use crate::config::{ConfigEditor, FieldId};
use crate::session::{Session, Transition};
use crate::ticker::{Deadline, Ticker};
use crate::tone::{Cue, CuePlayer};

pub const CELEBRATION: Duration = Duration::from_secs(3);

pub struct Options {
    pub work_minutes: u32,
    pub rest_minutes: u32,
    pub cycles: u32,
    pub notifications: bool,
}

// ============================================================================
// Application State
// ============================================================================

pub struct App {
    editor: ConfigEditor,
    session: Session,
    ticker: Ticker,
    celebration: Deadline,
    focus: FieldId,
    accent: Accent,
    accent_input: Option<String>,
    prefs: AccentPreference,
    player: Box<dyn CuePlayer>,
    notifications: bool,
}

impl App {
    pub fn new(options: Options, mut prefs: AccentPreference, player: Box<dyn CuePlayer>) -> Self {
        let editor = ConfigEditor::new(options.work_minutes, options.rest_minutes, options.cycles);
        let session = Session::new(editor.config());
        let accent = Rgb::parse_hex(&prefs.load()).map(Accent::new).unwrap_or_default();

        Self {
            editor,
            session,
            ticker: Ticker::default(),
            celebration: Deadline::default(),
            focus: FieldId::WorkMinutes,
            accent,
            accent_input: None,
            prefs,
            player,
            notifications: options.notifications,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn editor(&self) -> &ConfigEditor {
        &self.editor
    }

    pub fn focus(&self) -> FieldId {
        self.focus
    }

    pub fn accent(&self) -> Accent {
        self.accent
    }

    pub fn accent_input(&self) -> Option<&str> {
        self.accent_input.as_deref()
    }

    pub fn accent_persisted(&self) -> bool {
        self.prefs.is_persisting()
    }

    pub fn is_celebrating(&self) -> bool {
        self.celebration.is_pending()
    }

    pub fn fields_locked(&self) -> bool {
        self.session.is_running()
    }

    /// Earliest moment something is scheduled to happen.
    pub fn next_wakeup(&self) -> Option<Instant> {
        match (self.ticker.next_fire(), self.celebration.at()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // ------------------------------------------------------------------------
    // Timer controls
    // ------------------------------------------------------------------------

    /// Leaving the focused field counts as a blur, as clicking a button would.
    pub fn start(&mut self, now: Instant) {
        self.blur(self.focus);
        if self.session.is_complete() {
            self.celebration.cancel();
        }
        if self.session.start() {
            self.sync_ticker(now);
        }
    }

    pub fn pause(&mut self, now: Instant) {
        if self.session.pause() {
            self.sync_ticker(now);
        }
    }

    pub fn toggle(&mut self, now: Instant) {
        if self.session.is_running() {
            self.pause(now);
        } else {
            self.start(now);
        }
    }

    pub fn reset(&mut self) {
        self.session.reset();
        self.ticker.cancel();
        self.celebration.cancel();
    }

    /// Drives the ticker and the celebration timer.
    pub fn update(&mut self, now: Instant) {
        if self.ticker.poll(now) {
            if let Some(transition) = self.session.tick() {
                self.on_transition(transition, now);
            }
        }
        self.sync_ticker(now);

        if self.celebration.poll(now) {
            debug!("celebration dismissed");
        }
    }

    fn sync_ticker(&mut self, now: Instant) {
        let active = self.session.is_running() && self.session.remaining() > 0;
        self.ticker.sync(active, now);
    }

    fn on_transition(&mut self, transition: Transition, now: Instant) {
        match transition {
            Transition::EnteredRest { cycle } => {
                self.player.play(Cue::EnterRest);
                self.notify("Rest time ☕", &format!("Pomodoro {} done. Take a breather.", cycle));
            }
            Transition::EnteredWork { cycle } => {
                self.player.play(Cue::EnterWork);
                self.notify("Focus time 🍅", &format!("Pomodoro {} of {}.", cycle, self.session.config().total_cycles));
            }
            Transition::Completed => {
                // The last rest ends with the same chime as any other rest.
                self.player.play(Cue::EnterWork);
                self.celebration.set(now, CELEBRATION);
                self.notify("Amazing work! 🎉", "All pomodoros complete!");
            }
        }
    }

    fn notify(&self, title: &str, body: &str) {
        if !self.notifications {
            return;
        }
        let shown = Notification::new()
            .summary(title)
            .body(body)
            .appname("tomatick")
            .icon("alarm-clock")
            .urgency(Urgency::Normal)
            .show();
        if let Err(e) = shown {
            warn!(error = %e, "desktop notification failed");
        }
    }

    // ------------------------------------------------------------------------
    // Configuration editing
    // ------------------------------------------------------------------------

    /// Replaces a field's text as a keystroke would. Ignored while running.
    pub fn edit_field(&mut self, field: FieldId, text: &str) {
        if self.fields_locked() {
            return;
        }
        if self.editor.field_mut(field).set_text(text) {
            self.apply_config();
        }
    }

    pub fn blur(&mut self, field: FieldId) {
        if self.editor.field_mut(field).blur() {
            self.apply_config();
        }
    }

    pub fn focus_next(&mut self) {
        self.blur(self.focus);
        self.focus = self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.blur(self.focus);
        self.focus = self.focus.prev();
    }

    fn type_char(&mut self, c: char) {
        let mut text = self.editor.field(self.focus).raw().to_string();
        text.push(c);
        self.edit_field(self.focus, &text);
    }

    fn erase_char(&mut self) {
        let mut text = self.editor.field(self.focus).raw().to_string();
        text.pop();
        self.edit_field(self.focus, &text);
    }

    fn apply_config(&mut self) {
        let config = self.editor.config();
        debug!(?config, "configuration committed");
        self.session.reconfigure(config);
    }

    // ------------------------------------------------------------------------
    // Accent color
    // ------------------------------------------------------------------------

    /// Applies and persists a new accent. Malformed colors are ignored.
    pub fn set_accent(&mut self, color: &str) -> bool {
        match self.prefs.save(color) {
            Ok(hex) => {
                if let Ok(rgb) = Rgb::parse_hex(&hex) {
                    self.accent = Accent::new(rgb);
                    info!(accent = %hex, ring = %rgb.css_rgba(RING_ALPHA), "accent changed");
                }
                true
            }
            Err(e) => {
                debug!(error = %e, "accent rejected");
                false
            }
        }
    }

    fn handle_accent_input(&mut self, key: KeyEvent) {
        let Some(input) = self.accent_input.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Char('#') if input.is_empty() => input.push('#'),
            KeyCode::Char(c) if c.is_ascii_hexdigit() => {
                let max = if input.starts_with('#') { 7 } else { 6 };
                if input.len() < max {
                    input.push(c);
                }
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Enter => {
                let color = input.clone();
                if self.set_accent(&color) {
                    self.accent_input = None;
                }
            }
            KeyCode::Esc => self.accent_input = None,
            _ => {}
        }
    }

    // ------------------------------------------------------------------------
    // Keyboard
    // ------------------------------------------------------------------------

    /// Returns true when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }

        if self.accent_input.is_some() {
            self.handle_accent_input(key);
            return false;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle(now),
            KeyCode::Char('r') => self.reset(),
            KeyCode::Char('c') => {
                info!("accent picker opened");
                self.accent_input = Some(self.accent.base.to_hex());
            }
            KeyCode::Tab | KeyCode::Down => self.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.focus_prev(),
            KeyCode::Char(c) if c.is_ascii_digit() => self.type_char(c),
            KeyCode::Backspace => self.erase_char(),
            _ => {}
        }
        false
    }
}
