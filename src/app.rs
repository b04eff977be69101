use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::event_bus::handler;
use crate::session::{PracticeSession, SessionResult};
use crate::storage::{FileStorage, LocalStore, PersistentValue, StorageBackend};
use crate::timer::{self, Clock, SystemClock, Timer, TimerEvent, TimerSnapshot};

/// Storage key for the list of finished sessions.
pub const HISTORY_KEY: &str = "history";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Typing,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Continue,
    Quit,
}

/// Ties the timer, the practice session and storage together.
#[derive(Debug)]
pub struct App<C: Clock = SystemClock, B: StorageBackend = FileStorage> {
    pub config: Config,
    pub timer: Timer<C>,
    pub session: PracticeSession,
    pub state: AppState,
    pub history: PersistentValue<Vec<SessionResult>, B>,
    pub last_result: Option<SessionResult>,
    started: bool,
    pending: Rc<RefCell<VecDeque<TimerEvent>>>,
}

impl<C: Clock, B: StorageBackend> App<C, B> {
    pub fn new(config: Config, store: LocalStore<B>, clock: C) -> Self {
        let timer = Timer::with_clock(config.duration(), clock);
        let pending = Rc::new(RefCell::new(VecDeque::new()));

        for event in [TimerEvent::Started, TimerEvent::Elapsed, TimerEvent::Stopped] {
            let pending = pending.clone();
            timer.on(
                event,
                handler(move |_: Option<&TimerSnapshot>| {
                    pending.borrow_mut().push_back(event);
                    Ok(())
                }),
            );
        }

        Self {
            session: PracticeSession::new(config.number_of_words),
            history: PersistentValue::new(store, HISTORY_KEY, Vec::new()),
            config,
            timer,
            state: AppState::Typing,
            last_result: None,
            started: false,
            pending,
        }
    }

    /// Paused mid-run: started, not finished, not ticking.
    pub fn is_paused(&self) -> bool {
        self.started && !self.timer.is_running() && !self.timer.is_complete()
    }

    pub fn best_wpm(&self) -> Option<f64> {
        self.history
            .get()
            .iter()
            .map(|r| r.wpm)
            .max_by(|a, b| a.total_cmp(b))
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> timer::Result<AppAction> {
        if key.kind != KeyEventKind::Press {
            return Ok(AppAction::Continue);
        }
        let ctrl_c =
            key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');
        if key.code == KeyCode::Esc || ctrl_c {
            return Ok(AppAction::Quit);
        }

        match self.state {
            AppState::Typing => match key.code {
                KeyCode::Char(' ') => {
                    if let Some(response) = self.session.submit_word() {
                        debug!(correct = response.correct, "word submitted");
                    }
                }
                KeyCode::Char(c) => {
                    if !self.timer.is_running() {
                        self.timer.start_timer()?;
                    }
                    self.session.type_char(c);
                }
                KeyCode::Backspace => self.session.backspace(),
                KeyCode::Tab => {
                    if self.timer.is_running() {
                        self.timer.pause_timer()?;
                    } else if self.is_paused() {
                        self.timer.start_timer()?;
                    }
                }
                _ => {}
            },
            AppState::Results => match key.code {
                KeyCode::Char('n') | KeyCode::Enter => self.new_session()?,
                KeyCode::Char('q') => return Ok(AppAction::Quit),
                _ => {}
            },
        }

        self.drain_timer_events();
        Ok(AppAction::Continue)
    }

    /// One frame of the countdown.
    pub fn on_frame(&mut self) -> timer::Result<()> {
        self.timer.frame()?;
        self.drain_timer_events();
        Ok(())
    }

    pub fn new_session(&mut self) -> timer::Result<()> {
        self.timer.reset_timer()?;
        self.session = PracticeSession::new(self.config.number_of_words);
        self.state = AppState::Typing;
        self.last_result = None;
        self.drain_timer_events();
        self.started = false;
        Ok(())
    }

    fn drain_timer_events(&mut self) {
        let events: Vec<TimerEvent> = self.pending.borrow_mut().drain(..).collect();
        for event in events {
            match event {
                TimerEvent::Started => self.started = true,
                TimerEvent::Elapsed => self.finish_session(),
                other => debug!(event = %other, "timer"),
            }
        }
    }

    fn finish_session(&mut self) {
        let elapsed = self
            .timer
            .duration()
            .saturating_sub(self.timer.remaining_time());
        let result = self.session.result(elapsed);
        info!(
            wpm = result.wpm,
            accuracy = result.accuracy,
            words = result.words_attempted,
            "session finished"
        );

        let saved = result.clone();
        if let Err(e) = self.history.update(|history| history.push(saved)) {
            warn!(error = %e, "failed to save session history");
        }
        self.last_result = Some(result);
        self.state = AppState::Results;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::timer::ManualClock;
    use std::time::Duration;

    fn app(secs: u64) -> (App<ManualClock, MemoryStorage>, ManualClock, MemoryStorage) {
        let clock = ManualClock::new();
        let backend = MemoryStorage::new();
        let config = Config {
            duration_secs: secs,
            number_of_words: 10,
        };
        let app = App::new(config, LocalStore::new(backend.clone()), clock.clone());
        (app, clock, backend)
    }

    fn press(app: &mut App<ManualClock, MemoryStorage>, code: KeyCode) -> AppAction {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE)).unwrap()
    }

    fn type_str(app: &mut App<ManualClock, MemoryStorage>, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn first_keypress_starts_the_timer() {
        let (mut app, _, _) = app(30);
        assert!(!app.timer.is_running());

        press(&mut app, KeyCode::Char('a'));
        assert!(app.timer.is_running());
        assert_eq!(app.session.input(), "a");
    }

    #[test]
    fn tab_toggles_pause() {
        let (mut app, clock, _) = app(30);
        press(&mut app, KeyCode::Tab);
        assert!(!app.timer.is_running());

        press(&mut app, KeyCode::Char('a'));
        clock.advance(Duration::from_secs(1));
        app.on_frame().unwrap();

        press(&mut app, KeyCode::Tab);
        assert!(app.is_paused());
        press(&mut app, KeyCode::Tab);
        assert!(app.timer.is_running());
    }

    #[test]
    fn tab_resumes_a_timer_paused_before_the_first_frame() {
        let (mut app, _, _) = app(30);
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Tab);
        assert!(!app.timer.is_running());
        assert_eq!(app.timer.remaining_time(), app.timer.duration());
        assert!(app.is_paused());

        press(&mut app, KeyCode::Tab);
        assert!(app.timer.is_running());
        assert!(!app.is_paused());
    }

    #[test]
    fn new_session_is_not_paused() {
        let (mut app, clock, _) = app(1);
        press(&mut app, KeyCode::Char('x'));
        clock.advance(Duration::from_secs(2));
        app.on_frame().unwrap();
        assert!(!app.is_paused());

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.state, AppState::Typing);
        assert!(!app.is_paused());
        press(&mut app, KeyCode::Tab);
        assert!(!app.timer.is_running());
    }

    #[test]
    fn elapsed_timer_finishes_session_and_saves_history() {
        let (mut app, clock, backend) = app(10);

        let word = app.session.current_word().unwrap().to_string();
        type_str(&mut app, &word);
        press(&mut app, KeyCode::Char(' '));

        clock.advance(Duration::from_secs(4));
        app.on_frame().unwrap();
        assert_eq!(app.state, AppState::Typing);

        clock.advance(Duration::from_secs(7));
        app.on_frame().unwrap();

        assert_eq!(app.state, AppState::Results);
        let result = app.last_result.clone().unwrap();
        assert_eq!(result.words_correct, 1);
        assert_eq!(result.duration_secs, 10.0);
        assert_eq!(app.history.get().len(), 1);

        let stored: Vec<SessionResult> = LocalStore::new(backend).load(HISTORY_KEY).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(app.best_wpm(), Some(result.wpm));
    }

    #[test]
    fn results_view_starts_a_new_session() {
        let (mut app, clock, _) = app(1);
        press(&mut app, KeyCode::Char('x'));
        clock.advance(Duration::from_secs(2));
        app.on_frame().unwrap();
        assert_eq!(app.state, AppState::Results);

        // typing is ignored until a new session starts
        press(&mut app, KeyCode::Char('z'));
        assert_eq!(app.state, AppState::Results);

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.state, AppState::Typing);
        assert!(app.last_result.is_none());
        assert_eq!(app.timer.remaining_time(), Duration::from_secs(1));
        assert_eq!(app.session.words_attempted(), 0);
    }

    #[test]
    fn escape_and_ctrl_c_quit() {
        let (mut app, _, _) = app(30);
        assert_eq!(press(&mut app, KeyCode::Esc), AppAction::Quit);
        assert_eq!(
            app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL))
                .unwrap(),
            AppAction::Quit
        );
        assert_eq!(press(&mut app, KeyCode::Char('c')), AppAction::Continue);
    }

    #[test]
    fn history_survives_a_new_app() {
        let (mut app, clock, backend) = app(1);
        press(&mut app, KeyCode::Char('x'));
        clock.advance(Duration::from_secs(1));
        app.on_frame().unwrap();

        let reopened: App<ManualClock, MemoryStorage> = App::new(
            Config::default(),
            LocalStore::new(backend),
            ManualClock::new(),
        );
        assert_eq!(reopened.history.get().len(), 1);
    }
}
