// ============================================
// src/narration.rs
// Text-to-speech gateway
// ============================================

use std::path::Path;
use std::process::{Child, Command, Stdio};

use log::{debug, warn};

use crate::language::Language;

/// Speaks text aloud. At most one utterance is audible at a time.
pub trait Narrator {
    /// Cancels whatever is playing, then starts `text`. Never blocks.
    fn speak(&mut self, text: &str, language: Language);
    fn cancel(&mut self);
}

/// A narration request emitted by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Narration {
    Speak { text: String, language: Language },
    Cancel,
}

impl Narration {
    pub fn apply(&self, narrator: &mut dyn Narrator) {
        match self {
            Narration::Speak { text, language } => narrator.speak(text, *language),
            Narration::Cancel => narrator.cancel(),
        }
    }
}

/// Narrator that only logs. Used when no TTS program is configured.
#[derive(Debug, Default)]
pub struct SilentNarrator;

impl Narrator for SilentNarrator {
    fn speak(&mut self, text: &str, language: Language) {
        debug!("[narration] ({language}) {text}");
    }

    fn cancel(&mut self) {}
}

/// Speaks through an external program (`espeak-ng`, `espeak` or macOS `say`).
///
/// The child process is killed on cancel. If the program cannot be started the
/// narrator logs once and stays silent from then on.
#[derive(Debug)]
pub struct CommandNarrator {
    program: String,
    child: Option<Child>,
    unavailable: bool,
}

impl CommandNarrator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            child: None,
            unavailable: false,
        }
    }

    fn is_say(&self) -> bool {
        Path::new(&self.program)
            .file_name()
            .is_some_and(|name| name == "say")
    }

    /// Voice argument for the configured program.
    fn voice(&self, language: Language) -> &'static str {
        match (self.is_say(), language) {
            (true, Language::EnUs) => "Samantha",
            (true, Language::EsMx) => "Paulina",
            (false, Language::EnUs) => "en-us",
            (false, Language::EsMx) => "es-419",
        }
    }

    /// `program -v <voice> -- <text>`; text starting with `-` is not an option.
    fn command(&self, text: &str, language: Language) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-v").arg(self.voice(language)).arg("--").arg(text);
        cmd
    }
}

impl Narrator for CommandNarrator {
    fn speak(&mut self, text: &str, language: Language) {
        self.cancel();
        if self.unavailable || text.trim().is_empty() {
            return;
        }

        let spawned = self
            .command(text, language)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(child) => self.child = Some(child),
            Err(e) => {
                warn!("[narration] cannot run '{}': {e}; narration disabled", self.program);
                self.unavailable = true;
            }
        }
    }

    fn cancel(&mut self) {
        if let Some(mut child) = self.child.take() {
            // already exited is fine
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for CommandNarrator {
    fn drop(&mut self) {
        self.cancel();
    }
}
