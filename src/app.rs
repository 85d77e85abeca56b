// ============================================
// src/app.rs
// Connects the session to narration, recent history and keyboard input
// ============================================

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use log::{error, info};
use rand::Rng;

use crate::catalog::{self, CatalogQuery};
use crate::content::QuizMeta;
use crate::error::QuizError;
use crate::language::Language;
use crate::narration::Narrator;
use crate::recent::{RecentHistory, RecentStore};
use crate::registry::Registry;
use crate::session::{Phase, Session, SessionEvent};

/// Recent quizzes reachable by number from the catalog.
pub const RECENT_SHORTCUTS: usize = 6;

/// Quiz shortcuts pressed faster than this are dropped.
pub const KEY_DEBOUNCE: Duration = Duration::from_millis(300);

/// Whether keystrokes are commands or go into a text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Search,
    Jump,
}

/// Catalog browsing state for the quiz selection screen.
#[derive(Debug, Clone, Default)]
pub struct Browser {
    pub query: CatalogQuery,
    /// 1-based
    pub page: usize,
    /// Row highlighted on the current page
    pub cursor: usize,
}

/// One page of the catalog as shown on screen.
#[derive(Debug, Clone)]
pub struct CatalogPage<'r> {
    pub items: Vec<&'r QuizMeta>,
    pub number: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

pub struct App<'r, R> {
    pub session: Session<'r, R>,
    registry: &'r Registry,
    narrator: Box<dyn Narrator>,
    recent: RecentHistory,
    store: Option<RecentStore>,
    pub browser: Browser,
    input_mode: InputMode,
    input: String,
    /// User-facing notice, e.g. a quiz that failed to load
    message: Option<String>,
    last_shortcut: Option<Instant>,
    /// Phase seen by the last event flush
    last_phase: Phase,
    should_quit: bool,
}

impl<'r, R: Rng> App<'r, R> {
    pub fn new(
        session: Session<'r, R>,
        registry: &'r Registry,
        narrator: Box<dyn Narrator>,
        store: Option<RecentStore>,
    ) -> Self {
        let recent = store.as_ref().map(RecentStore::load).unwrap_or_default();
        let subject = catalog::subjects(registry.all_meta())
            .first()
            .map(|s| s.to_string())
            .unwrap_or_default();

        let last_phase = session.phase();
        let mut app = Self {
            session,
            registry,
            narrator,
            recent,
            store,
            browser: Browser {
                query: CatalogQuery::for_subject(subject),
                page: 1,
                cursor: 0,
            },
            input_mode: InputMode::Normal,
            input: String::new(),
            message: None,
            last_shortcut: None,
            last_phase,
            should_quit: false,
        };
        // a pinned quiz may already have started
        app.flush_events();
        app
    }

    // MARK: event plumbing

    /// Hands session side effects to the narrator and the recent history.
    fn flush_events(&mut self) {
        // text fields belong to the screen they were opened on
        let phase = self.session.phase();
        if phase != self.last_phase {
            self.last_phase = phase;
            self.input_mode = InputMode::Normal;
            self.input.clear();
        }

        for event in self.session.drain_events() {
            match event {
                SessionEvent::Narrate(narration) => narration.apply(self.narrator.as_mut()),
                SessionEvent::QuizOpened { slug } => {
                    self.recent.record(&slug);
                    if let Some(store) = &self.store {
                        store.save(&self.recent);
                    }
                }
                SessionEvent::Finished {
                    slug,
                    correct,
                    incorrect,
                    grade,
                } => {
                    info!("[app] '{slug}' done: {correct}/{} ({grade}%)", correct + incorrect);
                }
            }
        }
    }

    pub fn tick(&mut self, now: Instant) {
        self.session.tick(now);
        self.flush_events();
    }

    fn report(&mut self, result: Result<(), QuizError>) {
        let Err(e) = result else {
            self.message = None;
            return;
        };
        error!("[app] {e}");
        let language = self.session.language().unwrap_or(Language::EsMx);
        let text = match e {
            QuizError::ContentNotFound(_) => language.pick("Quiz not found", "Quiz no encontrado"),
            _ => language.pick("Quiz unavailable", "Quiz no disponible"),
        };
        self.message = Some(text.to_string());
    }

    // MARK: keyboard

    pub fn handle_key(&mut self, key: KeyCode, now: Instant) {
        match self.session.phase() {
            Phase::SelectingLanguage => self.language_key(key, now),
            Phase::SelectingQuiz => match self.input_mode {
                InputMode::Search => self.search_key(key),
                _ => self.catalog_key(key, now),
            },
            Phase::InProgress => match self.input_mode {
                InputMode::Jump => self.jump_key(key, now),
                _ => self.quiz_key(key, now),
            },
            Phase::Finished => self.finished_key(key, now),
        }
        self.flush_events();
    }

    fn language_key(&mut self, key: KeyCode, now: Instant) {
        let language = match key {
            KeyCode::Char('1') => Language::EnUs,
            KeyCode::Char('2') => Language::EsMx,
            KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            _ => return,
        };
        let result = self.session.select_language(language, now);
        self.report(result);
    }

    fn catalog_key(&mut self, key: KeyCode, now: Instant) {
        match key {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Up => self.browser.cursor = self.browser.cursor.saturating_sub(1),
            KeyCode::Down => {
                let len = self.catalog_page().items.len();
                if self.browser.cursor + 1 < len {
                    self.browser.cursor += 1;
                }
            }
            KeyCode::Char('[') => self.set_page(self.browser.page.saturating_sub(1)),
            KeyCode::Char(']') => self.set_page(self.browser.page + 1),
            KeyCode::Tab => self.next_subject(),
            KeyCode::Char('u') => self.next_unit(),
            KeyCode::Char('f') => self.next_tag(),
            KeyCode::Char('x') => {
                self.browser.query.clear_filters();
                self.set_page(1);
            }
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Search;
            }
            KeyCode::Char('c') => self.open_recent(0, now),
            KeyCode::Char(c @ '1'..='6') => self.open_recent(c as usize - '1' as usize, now),
            KeyCode::Delete => {
                self.recent.clear();
                if let Some(store) = &self.store {
                    store.save(&self.recent);
                }
            }
            KeyCode::Enter => {
                let slug = self
                    .catalog_page()
                    .items
                    .get(self.browser.cursor)
                    .map(|m| m.slug.clone());
                if let Some(slug) = slug {
                    let result = self.session.select_quiz(&slug, now);
                    self.report(result);
                }
            }
            _ => {}
        }
    }

    fn search_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Enter | KeyCode::Esc => self.input_mode = InputMode::Normal,
            KeyCode::Backspace => {
                self.browser.query.search.pop();
                self.set_page(1);
            }
            KeyCode::Char(c) => {
                self.browser.query.search.push(c);
                self.set_page(1);
            }
            _ => {}
        }
    }

    fn quiz_key(&mut self, key: KeyCode, now: Instant) {
        if key == KeyCode::Esc {
            self.should_quit = true;
            return;
        }
        if let Some(last) = self.last_shortcut {
            if now.duration_since(last) < KEY_DEBOUNCE {
                return;
            }
        }
        self.last_shortcut = Some(now);

        let s = &mut self.session;
        match key {
            KeyCode::Char(c @ '1'..='4') => {
                let index = c as usize - '1' as usize;
                s.choose_option(index, now);
            }
            KeyCode::Enter => s.repeat_question(now),
            KeyCode::Char('*') => s.reveal_answer(now),
            KeyCode::Char('-') => {
                s.submit_correct(now);
            }
            KeyCode::Char('0') => s.toggle_response_mode(),
            KeyCode::Char('e') => s.toggle_explanation(),
            KeyCode::Char('t') => s.toggle_translation(),
            KeyCode::Char('r') => s.toggle_read_aloud(),
            KeyCode::Char('m') => s.toggle_advance_mode(),
            KeyCode::Char('l') => s.switch_language(now),
            KeyCode::Char('x') => {
                if let Some(language) = s.language() {
                    s.speak_explanation(language, now);
                }
            }
            KeyCode::Char('g') => {
                self.input.clear();
                self.input_mode = InputMode::Jump;
            }
            _ => {}
        }
    }

    fn jump_key(&mut self, key: KeyCode, now: Instant) {
        match key {
            KeyCode::Char(c) if c.is_ascii_digit() => self.input.push(c),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Enter => {
                // unparsable or out of range input is simply ignored
                if let Ok(number) = self.input.parse::<usize>() {
                    self.session.jump_to_question(number, now);
                }
                self.input.clear();
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Esc => {
                self.input.clear();
                self.input_mode = InputMode::Normal;
            }
            _ => {}
        }
    }

    fn finished_key(&mut self, key: KeyCode, now: Instant) {
        match key {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('r') => {
                let result = self.session.restart(now);
                self.report(result);
                self.browser.cursor = 0;
            }
            KeyCode::Char('l') => self.session.switch_language(now),
            _ => {}
        }
    }

    // MARK: catalog helpers

    /// Opens the `index`-th most recent quiz that is still registered.
    fn open_recent(&mut self, index: usize, now: Instant) {
        if let Some(slug) = self.recent_metas().get(index).map(|m| m.slug.clone()) {
            let result = self.session.select_quiz(&slug, now);
            self.report(result);
        }
    }

    fn set_page(&mut self, page: usize) {
        self.browser.page = page.max(1);
        // clamp against the real page count
        self.browser.page = self.catalog_page().number;
        self.browser.cursor = 0;
    }

    fn next_subject(&mut self) {
        let subjects = catalog::subjects(self.registry.all_meta());
        if subjects.is_empty() {
            return;
        }
        let current = subjects
            .iter()
            .position(|s| *s == self.browser.query.subject);
        let next = current.map_or(0, |i| (i + 1) % subjects.len());
        self.browser.query = CatalogQuery::for_subject(subjects[next]);
        self.set_page(1);
    }

    /// All units → each unit in turn → all units.
    fn next_unit(&mut self) {
        let units = catalog::units_for_subject(self.registry.all_meta(), &self.browser.query.subject);
        self.browser.query.unit = match self.browser.query.unit {
            None => units.first().copied(),
            Some(u) => units.iter().copied().find(|x| *x > u),
        };
        self.set_page(1);
    }

    /// No tag → each tag in turn → no tag.
    fn next_tag(&mut self) {
        let tags = catalog::tags_for_subject(self.registry.all_meta(), &self.browser.query.subject);
        let next = match self.browser.query.tags.first() {
            None => tags.first(),
            Some(current) => tags.iter().find(|t| **t > current.as_str()),
        };
        self.browser.query.tags = next.map(|t| vec![t.to_string()]).unwrap_or_default();
        self.set_page(1);
    }

    pub fn filtered(&self) -> Vec<&'r QuizMeta> {
        catalog::filter(self.registry.all_meta(), &self.browser.query)
    }

    /// The visible slice of the filtered catalog.
    pub fn catalog_page(&self) -> CatalogPage<'r> {
        let filtered = self.filtered();
        let page = catalog::paginate(&filtered, self.browser.page);
        CatalogPage {
            items: page.items.to_vec(),
            number: page.number,
            total_pages: page.total_pages,
            total_items: filtered.len(),
        }
    }

    pub fn recent_metas(&self) -> Vec<&'r QuizMeta> {
        self.recent.resolve(self.registry)
    }
}

// MARK: read-only accessors

impl<R> App<'_, R> {
    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::tests::SAMPLE;
    use crate::narration::Narration;
    use crate::narration::tests::RecordingNarrator;
    use crate::registry::tests::sample_registry;
    use crate::session::SessionOptions;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Lets the test keep a handle on what the app narrated.
    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<RecordingNarrator>>);

    impl Narrator for Shared {
        fn speak(&mut self, text: &str, language: Language) {
            self.0.borrow_mut().speak(text, language);
        }

        fn cancel(&mut self) {
            self.0.borrow_mut().cancel();
        }
    }

    fn app(registry: &Registry, options: SessionOptions, store: Option<RecentStore>) -> (App<'_, StdRng>, Shared, Instant) {
        let t0 = Instant::now();
        let session = Session::new(registry, StdRng::seed_from_u64(5), options, t0).unwrap();
        let narrator = Shared::default();
        let app = App::new(session, registry, Box::new(narrator.clone()), store);
        (app, narrator, t0)
    }

    fn later(t: Instant, ms: u64) -> Instant {
        t + Duration::from_millis(ms)
    }

    #[test]
    fn language_then_catalog_then_quiz() {
        let registry = sample_registry();
        let dir = tempfile::TempDir::new().unwrap();
        let (mut app, narrator, t0) = app(&registry, SessionOptions::default(), Some(RecentStore::new(dir.path())));

        app.handle_key(KeyCode::Char('2'), t0);
        assert_eq!(app.session.phase(), Phase::SelectingQuiz);
        assert_eq!(app.catalog_page().total_items, 1);

        app.handle_key(KeyCode::Enter, t0);
        assert_eq!(app.session.phase(), Phase::InProgress);
        assert_eq!(app.recent_metas()[0].slug, "sample1");
        assert_eq!(RecentStore::new(dir.path()).load().list()[0].id, "sample1");

        // read-aloud is off by default in SessionOptions, so nothing was spoken
        assert!(narrator.0.borrow().spoken().is_empty());
    }

    #[test]
    fn narration_reaches_the_narrator() {
        let registry = sample_registry();
        let options = SessionOptions {
            language: Some(Language::EnUs),
            pinned_quiz: Some("sample1".into()),
            read_aloud: true,
            ..SessionOptions::default()
        };
        let (mut app, narrator, t0) = app(&registry, options, None);
        assert_eq!(narrator.0.borrow().spoken(), vec!["Pick B"]);

        app.handle_key(KeyCode::Char('-'), t0);
        app.tick(later(t0, 1000));
        let rec = narrator.0.borrow();
        assert_eq!(rec.spoken(), vec!["Pick B", "Correct!", "B", "Pick Y"]);
        assert!(rec.calls.contains(&Narration::Cancel));
    }

    #[test]
    fn quiz_shortcuts_are_debounced() {
        let registry = sample_registry();
        let options = SessionOptions {
            language: Some(Language::EnUs),
            pinned_quiz: Some("sample1".into()),
            ..SessionOptions::default()
        };
        let (mut app, _, t0) = app(&registry, options, None);

        app.handle_key(KeyCode::Char('e'), t0);
        app.handle_key(KeyCode::Char('e'), later(t0, 100));
        assert!(app.session.view().show_explanation);
        app.handle_key(KeyCode::Char('e'), later(t0, 400));
        assert!(!app.session.view().show_explanation);
    }

    #[test]
    fn jump_input() {
        let registry = sample_registry();
        let options = SessionOptions {
            language: Some(Language::EsMx),
            pinned_quiz: Some("sample1".into()),
            ..SessionOptions::default()
        };
        let (mut app, _, t0) = app(&registry, options, None);

        app.handle_key(KeyCode::Char('g'), t0);
        assert_eq!(app.input_mode(), InputMode::Jump);
        app.handle_key(KeyCode::Char('9'), t0);
        app.handle_key(KeyCode::Enter, t0);
        assert_eq!(app.session.current_index(), 0, "out of range is ignored");

        app.handle_key(KeyCode::Char('g'), later(t0, 500));
        app.handle_key(KeyCode::Char('2'), later(t0, 500));
        assert_eq!(app.input(), "2");
        app.handle_key(KeyCode::Enter, later(t0, 500));
        assert_eq!(app.session.current_index(), 1);
        assert_eq!(app.input_mode(), InputMode::Normal);
    }

    #[test]
    fn search_filters_catalog() {
        let registry = sample_registry();
        let options = SessionOptions {
            language: Some(Language::EnUs),
            ..SessionOptions::default()
        };
        let (mut app, _, t0) = app(&registry, options, None);

        app.handle_key(KeyCode::Char('/'), t0);
        for c in "zzz".chars() {
            app.handle_key(KeyCode::Char(c), t0);
        }
        assert_eq!(app.catalog_page().total_items, 0);
        app.handle_key(KeyCode::Esc, t0);
        assert_eq!(app.input_mode(), InputMode::Normal);
        assert!(!app.should_quit());

        app.handle_key(KeyCode::Char('x'), t0);
        assert_eq!(app.catalog_page().total_items, 1);

        app.handle_key(KeyCode::Char('f'), t0);
        assert_eq!(app.browser.query.tags, vec!["AES".to_string()]);
        app.handle_key(KeyCode::Char('f'), t0);
        assert!(app.browser.query.tags.is_empty());
    }

    #[test]
    fn missing_quiz_shows_message() {
        let registry = sample_registry();
        let options = SessionOptions {
            language: Some(Language::EnUs),
            ..SessionOptions::default()
        };
        let (mut app, _, t0) = app(&registry, options, None);
        // a quiz remembered from an earlier run that is no longer registered
        app.recent.record("ghost");
        app.handle_key(KeyCode::Char('c'), t0);
        assert_eq!(app.session.phase(), Phase::SelectingQuiz);
        assert!(app.message().is_none(), "unknown recents are skipped, not opened");

        let report: Result<(), QuizError> = Err(QuizError::ContentNotFound("x".into()));
        app.report(report);
        assert_eq!(app.message(), Some("Quiz not found"));
    }

    #[test]
    fn restart_from_result() {
        let registry = sample_registry();
        let options = SessionOptions {
            language: Some(Language::EnUs),
            pinned_quiz: Some("sample1".into()),
            ..SessionOptions::default()
        };
        let (mut app, _, t0) = app(&registry, options, None);
        app.handle_key(KeyCode::Char('-'), t0);
        app.tick(later(t0, 700));
        app.handle_key(KeyCode::Char('-'), later(t0, 1000));
        app.tick(later(t0, 1700));
        assert_eq!(app.session.phase(), Phase::Finished);

        app.handle_key(KeyCode::Char('r'), later(t0, 1800));
        assert_eq!(app.session.phase(), Phase::InProgress);
        assert_eq!(app.session.attempts(), 0);
    }

    #[test]
    fn jump_prompt_closes_when_the_quiz_ends() {
        let registry = sample_registry();
        let options = SessionOptions {
            language: Some(Language::EnUs),
            pinned_quiz: Some("sample1".into()),
            ..SessionOptions::default()
        };
        let (mut app, _, t0) = app(&registry, options, None);
        app.handle_key(KeyCode::Char('-'), t0);
        app.tick(later(t0, 700));
        app.handle_key(KeyCode::Char('-'), later(t0, 1000));
        assert!(app.session.is_advancing());

        // prompt opened while the last answer is still advancing
        app.handle_key(KeyCode::Char('g'), later(t0, 1400));
        app.handle_key(KeyCode::Char('2'), later(t0, 1400));
        assert_eq!(app.input_mode(), InputMode::Jump);

        app.tick(later(t0, 1700));
        assert_eq!(app.session.phase(), Phase::Finished);
        assert_eq!(app.input_mode(), InputMode::Normal);
        assert_eq!(app.input(), "");

        app.handle_key(KeyCode::Char('r'), later(t0, 1800));
        assert_eq!(app.session.phase(), Phase::InProgress);
        assert_eq!(app.input_mode(), InputMode::Normal);
    }

    #[test]
    fn numbered_keys_open_recent_quizzes() {
        let second = SAMPLE
            .replace("sample1", "sample2")
            .replace(r#""classNo": 1,"#, r#""classNo": 2,"#);
        let mut builder = Registry::builder();
        assert!(builder.register_json(SAMPLE, "sample1.json", None));
        assert!(builder.register_json(&second, "sample2.json", None));
        let registry = builder.build();

        let options = SessionOptions {
            language: Some(Language::EnUs),
            ..SessionOptions::default()
        };
        let (mut app, _, t0) = app(&registry, options, None);
        app.recent.record("sample1");
        app.recent.record("ghost");
        app.recent.record("sample2");
        let order: Vec<_> = app.recent_metas().iter().map(|m| m.slug.as_str()).collect();
        assert_eq!(order, vec!["sample2", "sample1"]);

        // nothing behind the third shortcut
        app.handle_key(KeyCode::Char('3'), t0);
        assert_eq!(app.session.phase(), Phase::SelectingQuiz);

        app.handle_key(KeyCode::Char('2'), t0);
        assert_eq!(app.session.phase(), Phase::InProgress);
        assert_eq!(app.session.meta().unwrap().slug, "sample1");
    }
}
