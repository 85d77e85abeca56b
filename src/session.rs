// ============================================
// src/session.rs
// Quiz attempt state machine: selection, answering, scoring, navigation
// ============================================

use std::time::Instant;

use log::{debug, info};
use rand::Rng;

use crate::adapter::{AdaptedQuestion, LocalizedQuestion, adapt};
use crate::content::QuizMeta;
use crate::error::Result;
use crate::language::Language;
use crate::narration::Narration;
use crate::registry::Registry;
use crate::schedule::{ADVANCE_DELAY, SPEAK_ANSWER_DELAY, Scheduler};

// --------------------------------------------------
// Types
// --------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    SelectingLanguage,
    SelectingQuiz,
    InProgress,
    Finished,
}

/// Whether a wrong answer still moves on to the next question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum AdvanceMode {
    /// Only a correct answer advances
    #[default]
    RetryUntilCorrect,
    /// Any answer advances after the feedback delay
    AdvanceAlways,
}

impl AdvanceMode {
    pub fn toggled(self) -> Self {
        match self {
            AdvanceMode::RetryUntilCorrect => AdvanceMode::AdvanceAlways,
            AdvanceMode::AdvanceAlways => AdvanceMode::RetryUntilCorrect,
        }
    }
}

/// What picking an option does: answer it, or just read it aloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    #[default]
    Answer,
    Listen,
}

/// Independent panel toggles, all off at the start of a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewFlags {
    pub show_answer: bool,
    pub show_explanation: bool,
    pub show_translation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Not in a quiz, or an advancement is already pending
    Ignored,
    Correct,
    Incorrect,
}

/// Side effects for the outside world, drained by the app after each action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Narrate(Narration),
    QuizOpened { slug: String },
    Finished {
        slug: String,
        correct: u32,
        incorrect: u32,
        grade: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timed {
    SpeakAnswer,
    Advance,
}

/// Initial settings, usually from the command line.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub language: Option<Language>,
    /// Quiz to play directly, skipping quiz selection
    pub pinned_quiz: Option<String>,
    pub advance_mode: AdvanceMode,
    pub read_aloud: bool,
}

/// The current question in the active language, plus its translation.
#[derive(Debug, Clone, Copy)]
pub struct QuestionView<'a> {
    /// 1-based
    pub number: usize,
    pub total: usize,
    pub language: Language,
    pub category: Option<&'a str>,
    pub active: &'a LocalizedQuestion,
    pub translation: &'a LocalizedQuestion,
}

/// `round(100 * correct / attempts)`, 0 before the first attempt.
pub fn grade(correct: u32, incorrect: u32) -> u32 {
    let attempts = correct + incorrect;
    if attempts == 0 {
        return 0;
    }
    (f64::from(correct) / f64::from(attempts) * 100.0).round() as u32
}

fn feedback_text(language: Language, correct: bool) -> &'static str {
    match correct {
        true => language.pick("Correct!", "¡Correcto!"),
        false => language.pick("Incorrect answer", "Respuesta incorrecta"),
    }
}

// --------------------------------------------------
// Session
// --------------------------------------------------

pub struct Session<'r, R> {
    registry: &'r Registry,
    rng: R,

    phase: Phase,
    language: Option<Language>,
    pinned_quiz: Option<String>,

    meta: Option<QuizMeta>,
    questions: Vec<AdaptedQuestion>,
    index: usize,

    /// Last wrong option picked for the current question
    selected_answer: Option<String>,
    /// Set between a correct answer and the advancement it triggers
    just_correct: bool,

    correct: u32,
    incorrect: u32,
    score: u32,

    view: ViewFlags,
    read_aloud: bool,
    advance_mode: AdvanceMode,
    response_mode: ResponseMode,

    timers: Scheduler<Timed>,
    events: Vec<SessionEvent>,
}

impl<'r, R: Rng> Session<'r, R> {
    /// Creates a session in `SelectingLanguage`, selecting the language right
    /// away when one is given (which also starts a pinned quiz).
    pub fn new(registry: &'r Registry, rng: R, options: SessionOptions, now: Instant) -> Result<Self> {
        let mut session = Self {
            registry,
            rng,
            phase: Phase::SelectingLanguage,
            language: None,
            pinned_quiz: options.pinned_quiz,
            meta: None,
            questions: Vec::new(),
            index: 0,
            selected_answer: None,
            just_correct: false,
            correct: 0,
            incorrect: 0,
            score: 0,
            view: ViewFlags::default(),
            read_aloud: options.read_aloud,
            advance_mode: options.advance_mode,
            response_mode: ResponseMode::default(),
            timers: Scheduler::default(),
            events: Vec::new(),
        };
        if let Some(language) = options.language {
            session.select_language(language, now)?;
        }
        Ok(session)
    }

    // MARK: selection

    /// Only valid while choosing a language.
    pub fn select_language(&mut self, language: Language, now: Instant) -> Result<()> {
        if self.phase != Phase::SelectingLanguage {
            debug!("[session] select_language ignored in {:?}", self.phase);
            return Ok(());
        }
        self.language = Some(language);
        self.phase = Phase::SelectingQuiz;
        info!("[session] language {language}");

        if let Some(slug) = self.pinned_quiz.clone() {
            self.start_quiz(&slug, now)?;
        }
        Ok(())
    }

    /// Loads, adapts and starts a quiz. On error the session is left unchanged.
    pub fn select_quiz(&mut self, slug: &str, now: Instant) -> Result<()> {
        if !matches!(self.phase, Phase::SelectingQuiz | Phase::Finished) {
            debug!("[session] select_quiz ignored in {:?}", self.phase);
            return Ok(());
        }
        self.start_quiz(slug, now)
    }

    fn start_quiz(&mut self, slug: &str, now: Instant) -> Result<()> {
        if self.language.is_none() {
            return Ok(());
        }
        let content = self.registry.load_content_by_id(slug)?;
        let questions = adapt(&content, &mut self.rng)?;

        self.cancel_narration();
        self.timers.invalidate();
        self.reset_progress();
        self.meta = Some(content.meta);
        self.questions = questions;
        self.phase = Phase::InProgress;
        info!("[session] started '{slug}' with {} questions", self.questions.len());
        self.events.push(SessionEvent::QuizOpened {
            slug: slug.to_string(),
        });

        if self.questions.is_empty() {
            self.finish();
        } else {
            self.narrate_question(now);
        }
        Ok(())
    }

    /// Back to quiz selection with everything zeroed, or straight into a fresh
    /// adaptation of the pinned quiz. Read-aloud and advancement mode are kept.
    pub fn restart(&mut self, now: Instant) -> Result<()> {
        if matches!(self.phase, Phase::SelectingLanguage) {
            return Ok(());
        }
        self.cancel_narration();
        self.timers.invalidate();
        self.reset_progress();
        self.meta = None;
        self.questions.clear();
        self.phase = Phase::SelectingQuiz;
        info!("[session] restart");

        if let Some(slug) = self.pinned_quiz.clone() {
            self.start_quiz(&slug, now)?;
        }
        Ok(())
    }

    fn reset_progress(&mut self) {
        self.index = 0;
        self.selected_answer = None;
        self.just_correct = false;
        self.correct = 0;
        self.incorrect = 0;
        self.score = 0;
        self.view = ViewFlags::default();
    }

    // MARK: answering

    pub fn submit_answer(&mut self, option: &str, now: Instant) -> AnswerOutcome {
        if self.phase != Phase::InProgress {
            return AnswerOutcome::Ignored;
        }
        if self.is_advancing() {
            debug!("[session] answer ignored while advancing");
            return AnswerOutcome::Ignored;
        }
        let (Some(language), Some(question)) = (self.language, self.current_localized()) else {
            return AnswerOutcome::Ignored;
        };
        let is_correct = option == question.correct_text;

        self.cancel_narration();
        self.narrate(feedback_text(language, is_correct));

        if is_correct {
            self.correct += 1;
            self.score += 1;
            self.just_correct = true;
            self.selected_answer = None;
            self.timers.schedule(now, SPEAK_ANSWER_DELAY, Timed::SpeakAnswer);
            self.timers.schedule(now, ADVANCE_DELAY, Timed::Advance);
            AnswerOutcome::Correct
        } else {
            self.incorrect += 1;
            self.selected_answer = Some(option.to_string());
            if self.advance_mode == AdvanceMode::AdvanceAlways {
                self.timers.schedule(now, ADVANCE_DELAY, Timed::Advance);
            }
            AnswerOutcome::Incorrect
        }
    }

    /// Answers with the correct option.
    pub fn submit_correct(&mut self, now: Instant) -> AnswerOutcome {
        match self.current_localized().map(|q| q.correct_text.clone()) {
            Some(text) => self.submit_answer(&text, now),
            None => AnswerOutcome::Ignored,
        }
    }

    /// Picks the option at `index` (0-based) in the active language. In listen
    /// mode the option is only read aloud.
    pub fn choose_option(&mut self, index: usize, now: Instant) -> AnswerOutcome {
        let Some(option) = self
            .current_localized()
            .and_then(|q| q.options.get(index))
            .cloned()
        else {
            return AnswerOutcome::Ignored;
        };
        match self.response_mode {
            ResponseMode::Answer => self.submit_answer(&option, now),
            ResponseMode::Listen => {
                self.speak_now(&option);
                AnswerOutcome::Ignored
            }
        }
    }

    /// Runs the timers due at `now`.
    pub fn tick(&mut self, now: Instant) {
        for action in self.timers.take_due(now) {
            match action {
                Timed::SpeakAnswer => {
                    if let Some(text) = self.current_localized().map(|q| q.correct_text.clone()) {
                        self.narrate(&text);
                    }
                }
                Timed::Advance => self.advance(now),
            }
        }
    }

    fn advance(&mut self, now: Instant) {
        self.timers.invalidate();
        self.selected_answer = None;
        self.just_correct = false;

        if self.index + 1 < self.questions.len() {
            self.index += 1;
            self.narrate_question(now);
        } else {
            self.finish();
        }
    }

    fn finish(&mut self) {
        self.phase = Phase::Finished;
        let slug = self.meta.as_ref().map(|m| m.slug.clone()).unwrap_or_default();
        info!(
            "[session] finished '{slug}': {} correct, {} incorrect, grade {}%",
            self.correct,
            self.incorrect,
            self.grade()
        );
        self.events.push(SessionEvent::Finished {
            slug,
            correct: self.correct,
            incorrect: self.incorrect,
            grade: self.grade(),
        });
    }

    // MARK: navigation

    /// Moves to question `number` (1-based). Out-of-range requests change nothing.
    pub fn jump_to_question(&mut self, number: usize, now: Instant) -> bool {
        if self.phase != Phase::InProgress || number < 1 || number > self.questions.len() {
            debug!("[session] jump to {number} ignored");
            return false;
        }
        self.cancel_narration();
        self.timers.invalidate();
        self.index = number - 1;
        self.selected_answer = None;
        self.just_correct = false;
        self.view.show_answer = false;
        self.narrate_question(now);
        true
    }

    /// Flips the active language; the adapted questions already hold both.
    pub fn switch_language(&mut self, now: Instant) {
        let Some(language) = self.language else {
            return;
        };
        if self.phase == Phase::SelectingLanguage {
            return;
        }
        self.language = Some(language.other());
        self.view.show_translation = false;
        if self.phase == Phase::InProgress {
            self.narrate_question(now);
        }
    }

    // MARK: view toggles

    /// Shows or hides the correct answer; showing it also reads it aloud.
    pub fn reveal_answer(&mut self, _now: Instant) {
        if self.phase != Phase::InProgress {
            return;
        }
        self.view.show_answer = !self.view.show_answer;
        if self.view.show_answer {
            if let Some(text) = self.current_localized().map(|q| q.correct_text.clone()) {
                self.narrate(&text);
            }
        }
    }

    pub fn toggle_explanation(&mut self) {
        self.view.show_explanation = !self.view.show_explanation;
    }

    pub fn toggle_translation(&mut self) {
        self.view.show_translation = !self.view.show_translation;
    }

    pub fn toggle_read_aloud(&mut self) {
        self.read_aloud = !self.read_aloud;
        if !self.read_aloud {
            self.cancel_narration();
        }
    }

    pub fn toggle_response_mode(&mut self) {
        self.response_mode = match self.response_mode {
            ResponseMode::Answer => ResponseMode::Listen,
            ResponseMode::Listen => ResponseMode::Answer,
        };
    }

    pub fn toggle_advance_mode(&mut self) {
        self.advance_mode = self.advance_mode.toggled();
    }

    // MARK: narration

    /// Reads the current question again, even with read-aloud off.
    pub fn repeat_question(&mut self, _now: Instant) {
        if let Some(text) = self.current_localized().map(|q| q.text.clone()) {
            self.speak_now(&text);
        }
    }

    /// Reads the paragraphs and headings of the current explanation in `language`.
    pub fn speak_explanation(&mut self, language: Language, _now: Instant) {
        let Some(question) = self.current_question() else {
            return;
        };
        let text = question
            .get(language)
            .explanation
            .iter()
            .filter_map(|b| b.spoken_text())
            .collect::<Vec<_>>()
            .join(" ");
        if !text.is_empty() {
            self.cancel_narration();
            self.events.push(SessionEvent::Narrate(Narration::Speak {
                text,
                language,
            }));
        }
    }

    fn narrate_question(&mut self, _now: Instant) {
        if let Some(text) = self.current_localized().map(|q| q.text.clone()) {
            self.narrate(&text);
        }
    }

    /// Automatic narration, only when read-aloud is on.
    fn narrate(&mut self, text: &str) {
        if self.read_aloud {
            self.speak_now(text);
        }
    }

    /// Narration explicitly asked for by the user.
    fn speak_now(&mut self, text: &str) {
        let Some(language) = self.language else {
            return;
        };
        self.cancel_narration();
        self.events.push(SessionEvent::Narrate(Narration::Speak {
            text: text.to_string(),
            language,
        }));
    }

    fn cancel_narration(&mut self) {
        self.events.push(SessionEvent::Narrate(Narration::Cancel));
    }

    /// Takes the events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }
}

// MARK: accessors

impl<R> Session<'_, R> {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn language(&self) -> Option<Language> {
        self.language
    }

    pub fn meta(&self) -> Option<&QuizMeta> {
        self.meta.as_ref()
    }

    /// 0-based
    #[cfg(test)]
    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current_question(&self) -> Option<&AdaptedQuestion> {
        match self.phase {
            Phase::InProgress => self.questions.get(self.index),
            _ => None,
        }
    }

    fn current_localized(&self) -> Option<&LocalizedQuestion> {
        let language = self.language?;
        self.current_question().map(|q| q.get(language))
    }

    pub fn current_view(&self) -> Option<QuestionView<'_>> {
        let language = self.language?;
        let question = self.current_question()?;
        Some(QuestionView {
            number: self.index + 1,
            total: self.questions.len(),
            language,
            category: question.category.as_deref(),
            active: question.get(language),
            translation: question.get(language.other()),
        })
    }

    pub fn selected_answer(&self) -> Option<&str> {
        self.selected_answer.as_deref()
    }

    pub fn just_correct(&self) -> bool {
        self.just_correct
    }

    pub fn correct(&self) -> u32 {
        self.correct
    }

    pub fn incorrect(&self) -> u32 {
        self.incorrect
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn attempts(&self) -> u32 {
        self.correct + self.incorrect
    }

    pub fn grade(&self) -> u32 {
        grade(self.correct, self.incorrect)
    }

    /// Position in the quiz as a percentage, counting the current question.
    pub fn progress_pct(&self) -> u32 {
        let total = self.questions.len().max(1);
        let position = (self.index + 1).min(total);
        (position as f64 / total as f64 * 100.0).round() as u32
    }

    pub fn view(&self) -> ViewFlags {
        self.view
    }

    pub fn read_aloud(&self) -> bool {
        self.read_aloud
    }

    pub fn advance_mode(&self) -> AdvanceMode {
        self.advance_mode
    }

    pub fn response_mode(&self) -> ResponseMode {
        self.response_mode
    }

    pub fn is_advancing(&self) -> bool {
        self.timers.has_pending(|t| *t == Timed::Advance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuizError;
    use crate::registry::tests::sample_registry;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::time::Duration;

    fn start(registry: &Registry, mode: AdvanceMode, read_aloud: bool) -> (Session<'_, StdRng>, Instant) {
        let t0 = Instant::now();
        let options = SessionOptions {
            language: Some(Language::EnUs),
            pinned_quiz: None,
            advance_mode: mode,
            read_aloud,
        };
        let mut session = Session::new(registry, StdRng::seed_from_u64(9), options, t0).unwrap();
        session.select_quiz("sample1", t0).unwrap();
        (session, t0)
    }

    fn after(t: Instant, ms: u64) -> Instant {
        t + Duration::from_millis(ms)
    }

    fn spoken(events: &[SessionEvent]) -> Vec<&str> {
        events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Narrate(Narration::Speak { text, .. }) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn grade_values() {
        assert_eq!(grade(0, 0), 0);
        assert_eq!(grade(3, 1), 75);
        assert_eq!(grade(1, 3), 25);
        assert_eq!(grade(2, 1), 67);
        assert_eq!(grade(1, 2), 33);
    }

    #[test]
    fn phases_follow_selection() {
        let registry = sample_registry();
        let t0 = Instant::now();
        let mut s = Session::new(&registry, StdRng::seed_from_u64(1), SessionOptions::default(), t0).unwrap();
        assert_eq!(s.phase(), Phase::SelectingLanguage);

        // quiz selection before a language is picked does nothing
        s.select_quiz("sample1", t0).unwrap();
        assert_eq!(s.phase(), Phase::SelectingLanguage);

        s.select_language(Language::EsMx, t0).unwrap();
        assert_eq!(s.phase(), Phase::SelectingQuiz);
        s.select_quiz("sample1", t0).unwrap();
        assert_eq!(s.phase(), Phase::InProgress);
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.current_view().unwrap().active.text, "Elige B");

        let events = s.drain_events();
        assert!(events.contains(&SessionEvent::QuizOpened { slug: "sample1".into() }));
    }

    #[test]
    fn pinned_quiz_starts_on_language_selection() {
        let registry = sample_registry();
        let t0 = Instant::now();
        let options = SessionOptions {
            pinned_quiz: Some("sample1".into()),
            ..SessionOptions::default()
        };
        let mut s = Session::new(&registry, StdRng::seed_from_u64(1), options, t0).unwrap();
        assert_eq!(s.phase(), Phase::SelectingLanguage);
        s.select_language(Language::EnUs, t0).unwrap();
        assert_eq!(s.phase(), Phase::InProgress);
    }

    #[test]
    fn unknown_quiz_leaves_state_unchanged() {
        let registry = sample_registry();
        let t0 = Instant::now();
        let options = SessionOptions {
            language: Some(Language::EnUs),
            ..SessionOptions::default()
        };
        let mut s = Session::new(&registry, StdRng::seed_from_u64(1), options, t0).unwrap();
        let err = s.select_quiz("missing", t0).unwrap_err();
        assert!(matches!(err, QuizError::ContentNotFound(_)));
        assert_eq!(s.phase(), Phase::SelectingQuiz);
    }

    #[test]
    fn all_correct_scenario_finishes_with_full_grade() {
        let registry = sample_registry();
        let (mut s, t0) = start(&registry, AdvanceMode::RetryUntilCorrect, true);

        assert_eq!(s.submit_answer("B", t0), AnswerOutcome::Correct);
        assert!(s.just_correct());
        assert_eq!(s.current_index(), 0, "advancement waits for the timer");
        s.tick(after(t0, 700));
        assert_eq!(s.current_index(), 1);
        assert!(!s.just_correct());

        let t1 = after(t0, 1000);
        assert_eq!(s.submit_answer("Y", t1), AnswerOutcome::Correct);
        s.tick(after(t1, 700));

        assert_eq!(s.phase(), Phase::Finished);
        assert_eq!((s.correct(), s.incorrect(), s.grade(), s.score()), (2, 0, 100, 2));
        let events = s.drain_events();
        assert!(events.contains(&SessionEvent::Finished {
            slug: "sample1".into(),
            correct: 2,
            incorrect: 0,
            grade: 100,
        }));
    }

    #[test]
    fn retry_mode_stays_on_wrong_answer() {
        let registry = sample_registry();
        let (mut s, t0) = start(&registry, AdvanceMode::RetryUntilCorrect, true);

        assert_eq!(s.submit_answer("A", t0), AnswerOutcome::Incorrect);
        assert_eq!(s.selected_answer(), Some("A"));
        s.tick(after(t0, 5000));
        assert_eq!(s.current_index(), 0);
        assert_eq!((s.correct(), s.incorrect()), (0, 1));

        let t1 = after(t0, 6000);
        assert_eq!(s.submit_answer("B", t1), AnswerOutcome::Correct);
        assert_eq!((s.correct(), s.incorrect()), (1, 1));
        s.tick(after(t1, 700));
        assert_eq!(s.current_index(), 1);
        assert_eq!(s.selected_answer(), None);
        assert_eq!(s.grade(), 50);
    }

    #[test]
    fn advance_always_moves_on_wrong_answers() {
        let registry = sample_registry();
        let (mut s, t0) = start(&registry, AdvanceMode::AdvanceAlways, true);

        assert_eq!(s.submit_answer("C", t0), AnswerOutcome::Incorrect);
        s.tick(after(t0, 699));
        assert_eq!(s.current_index(), 0);
        s.tick(after(t0, 700));
        assert_eq!(s.current_index(), 1);

        let t1 = after(t0, 1000);
        s.submit_answer("X", t1);
        s.tick(after(t1, 700));
        assert_eq!(s.phase(), Phase::Finished);
        assert_eq!((s.correct(), s.incorrect(), s.grade()), (0, 2, 0));
    }

    #[test]
    fn answers_during_pending_advance_are_not_counted() {
        let registry = sample_registry();
        let (mut s, t0) = start(&registry, AdvanceMode::RetryUntilCorrect, false);

        assert_eq!(s.submit_answer("B", t0), AnswerOutcome::Correct);
        assert!(s.is_advancing());
        assert_eq!(s.submit_answer("B", after(t0, 100)), AnswerOutcome::Ignored);
        assert_eq!(s.submit_answer("A", after(t0, 200)), AnswerOutcome::Ignored);
        assert_eq!((s.correct(), s.incorrect()), (1, 0));

        s.tick(after(t0, 700));
        assert_eq!(s.current_index(), 1);
        assert!(!s.is_advancing());
    }

    #[test]
    fn jump_supersedes_pending_advance() {
        let registry = sample_registry();
        let (mut s, t0) = start(&registry, AdvanceMode::RetryUntilCorrect, false);

        s.submit_answer("B", t0);
        assert!(s.jump_to_question(1, after(t0, 100)));
        s.tick(after(t0, 2000));
        assert_eq!(s.current_index(), 0, "stale advance must not fire");
        assert_eq!(s.phase(), Phase::InProgress);
    }

    #[test]
    fn restart_supersedes_pending_advance() {
        let registry = sample_registry();
        let (mut s, t0) = start(&registry, AdvanceMode::AdvanceAlways, false);
        s.submit_answer("A", t0);
        s.restart(after(t0, 100)).unwrap();
        assert_eq!(s.phase(), Phase::SelectingQuiz);

        s.select_quiz("sample1", after(t0, 200)).unwrap();
        s.tick(after(t0, 2000));
        assert_eq!(s.current_index(), 0);
        assert_eq!((s.correct(), s.incorrect()), (0, 0));
    }

    #[test]
    fn out_of_range_jumps_are_ignored() {
        let registry = sample_registry();
        let (mut s, t0) = start(&registry, AdvanceMode::RetryUntilCorrect, false);
        s.submit_answer("A", t0);

        assert!(!s.jump_to_question(0, t0));
        assert!(!s.jump_to_question(3, t0));
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.selected_answer(), Some("A"));

        assert!(s.jump_to_question(2, t0));
        assert_eq!(s.current_index(), 1);
        assert_eq!(s.selected_answer(), None);
    }

    #[test]
    fn restart_zeroes_counters_and_panels_but_keeps_preferences() {
        let registry = sample_registry();
        let (mut s, t0) = start(&registry, AdvanceMode::AdvanceAlways, false);
        s.toggle_explanation();
        s.toggle_translation();
        s.reveal_answer(t0);
        s.submit_answer("A", t0);

        s.restart(t0).unwrap();
        assert_eq!((s.correct(), s.incorrect(), s.score()), (0, 0, 0));
        assert_eq!(s.view(), ViewFlags::default());
        assert_eq!(s.advance_mode(), AdvanceMode::AdvanceAlways);
        assert!(s.meta().is_none());
    }

    #[test]
    fn pinned_restart_readapts_immediately() {
        let registry = sample_registry();
        let t0 = Instant::now();
        let options = SessionOptions {
            language: Some(Language::EnUs),
            pinned_quiz: Some("sample1".into()),
            ..SessionOptions::default()
        };
        let mut s = Session::new(&registry, StdRng::seed_from_u64(2), options, t0).unwrap();
        s.submit_answer("B", t0);
        s.tick(after(t0, 700));
        assert_eq!(s.current_index(), 1);

        s.restart(after(t0, 800)).unwrap();
        assert_eq!(s.phase(), Phase::InProgress);
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.correct(), 0);
    }

    #[test]
    fn reveal_toggles_view_only() {
        let registry = sample_registry();
        let (mut s, t0) = start(&registry, AdvanceMode::RetryUntilCorrect, true);
        s.drain_events();

        s.reveal_answer(t0);
        assert!(s.view().show_answer);
        assert_eq!(spoken(&s.drain_events()), vec!["B"]);
        s.reveal_answer(t0);
        assert!(!s.view().show_answer);
        assert_eq!((s.correct(), s.incorrect(), s.current_index()), (0, 0, 0));
    }

    #[test]
    fn narration_follows_read_aloud() {
        let registry = sample_registry();
        let (mut s, t0) = start(&registry, AdvanceMode::RetryUntilCorrect, true);
        assert_eq!(spoken(&s.drain_events()), vec!["Pick B"]);

        s.submit_answer("B", t0);
        s.tick(after(t0, 300));
        s.tick(after(t0, 700));
        assert_eq!(spoken(&s.drain_events()), vec!["Correct!", "B", "Pick Y"]);

        s.toggle_read_aloud();
        s.drain_events();
        s.submit_answer("X", after(t0, 1000));
        let events = s.drain_events();
        assert!(spoken(&events).is_empty());
        // the in-flight utterance is still cancelled before feedback
        assert_eq!(events.first(), Some(&SessionEvent::Narrate(Narration::Cancel)));

        // explicit requests speak regardless
        s.repeat_question(after(t0, 1100));
        assert_eq!(spoken(&s.drain_events()), vec!["Pick Y"]);
    }

    #[test]
    fn every_speak_is_preceded_by_cancel() {
        let registry = sample_registry();
        let (mut s, t0) = start(&registry, AdvanceMode::RetryUntilCorrect, true);
        s.submit_answer("A", t0);
        s.submit_answer("B", after(t0, 10));
        s.tick(after(t0, 1000));

        let events = s.drain_events();
        for (i, e) in events.iter().enumerate() {
            if matches!(e, SessionEvent::Narrate(Narration::Speak { .. })) {
                assert_eq!(events[i - 1], SessionEvent::Narrate(Narration::Cancel));
            }
        }
    }

    #[test]
    fn switch_language_keeps_position_and_hides_translation() {
        let registry = sample_registry();
        let (mut s, t0) = start(&registry, AdvanceMode::RetryUntilCorrect, false);
        s.toggle_translation();
        s.switch_language(t0);

        assert_eq!(s.language(), Some(Language::EsMx));
        assert!(!s.view().show_translation);
        let view = s.current_view().unwrap();
        assert_eq!(view.active.text, "Elige B");
        assert_eq!(view.translation.text, "Pick B");
        assert_eq!(s.submit_answer("B", t0), AnswerOutcome::Correct);
    }

    #[test]
    fn listen_mode_reads_instead_of_answering() {
        let registry = sample_registry();
        let (mut s, t0) = start(&registry, AdvanceMode::RetryUntilCorrect, false);
        s.toggle_response_mode();
        s.drain_events();

        assert_eq!(s.choose_option(0, t0), AnswerOutcome::Ignored);
        assert_eq!(s.attempts(), 0);
        let first = s.current_view().unwrap().active.options[0].clone();
        assert_eq!(spoken(&s.drain_events()), vec![first.as_str()]);

        s.toggle_response_mode();
        assert_eq!(s.choose_option(9, t0), AnswerOutcome::Ignored);
        assert_ne!(s.choose_option(0, t0), AnswerOutcome::Ignored);
        assert_eq!(s.attempts(), 1);
    }

    #[test]
    fn submit_correct_and_progress() {
        let registry = sample_registry();
        let (mut s, t0) = start(&registry, AdvanceMode::RetryUntilCorrect, false);
        assert_eq!(s.progress_pct(), 50);
        assert_eq!(s.submit_correct(t0), AnswerOutcome::Correct);
        s.tick(after(t0, 700));
        assert_eq!(s.progress_pct(), 100);
    }

    #[test]
    fn speak_explanation_joins_spoken_blocks() {
        let registry = sample_registry();
        let (mut s, t0) = start(&registry, AdvanceMode::RetryUntilCorrect, false);
        s.drain_events();
        s.speak_explanation(Language::EnUs, t0);
        assert_eq!(spoken(&s.drain_events()), vec!["Why B Because."]);
    }

    #[test]
    fn finished_session_ignores_answers() {
        let registry = sample_registry();
        let (mut s, t0) = start(&registry, AdvanceMode::AdvanceAlways, false);
        s.submit_answer("A", t0);
        s.tick(after(t0, 700));
        s.submit_answer("X", after(t0, 800));
        s.tick(after(t0, 1500));
        assert_eq!(s.phase(), Phase::Finished);

        assert_eq!(s.submit_answer("Y", after(t0, 1600)), AnswerOutcome::Ignored);
        assert!(!s.jump_to_question(1, after(t0, 1600)));
        assert_eq!(s.attempts(), 2);
    }
}
