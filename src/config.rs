// ============================================
// src/config.rs
// Command line and environment configuration
// ============================================

use std::path::PathBuf;

use clap::Parser;
use directories::ProjectDirs;

use crate::language::Language;
use crate::session::{AdvanceMode, SessionOptions};

/// UVA Learning · Super Quiz
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Directory scanned (recursively) for quiz JSON files
    #[arg(long, env = "SUPERQUIZ_CONTENT_DIR", default_value = "quizzes")]
    pub content_dir: PathBuf,

    /// Question language; asked interactively when omitted
    #[arg(long, value_enum)]
    pub lang: Option<Language>,

    /// Play this quiz directly instead of choosing from the catalog
    #[arg(long)]
    pub quiz: Option<String>,

    /// What happens after a wrong answer
    #[arg(long, value_enum, default_value_t = AdvanceMode::RetryUntilCorrect)]
    pub mode: AdvanceMode,

    /// Start with automatic read-aloud turned off
    #[arg(long)]
    pub no_read_aloud: bool,

    /// Text-to-speech program (espeak-ng, espeak or say)
    #[arg(long, env = "SUPERQUIZ_TTS")]
    pub tts_command: Option<String>,

    /// Log file (defaults to superquiz.log in the data directory)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Resolved settings for one run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub content_dir: PathBuf,
    pub language: Option<Language>,
    pub pinned_quiz: Option<String>,
    pub advance_mode: AdvanceMode,
    pub read_aloud: bool,
    pub tts_command: Option<String>,
    pub log_file: PathBuf,
    /// Where recent history lives
    pub data_dir: PathBuf,
}

impl AppConfig {
    pub fn from_cli(cli: Cli) -> Self {
        let data_dir = data_dir();
        let log_file = cli
            .log_file
            .unwrap_or_else(|| data_dir.join("superquiz.log"));

        Self {
            content_dir: cli.content_dir,
            language: cli.lang,
            pinned_quiz: cli.quiz.filter(|s| !s.trim().is_empty()),
            advance_mode: cli.mode,
            read_aloud: !cli.no_read_aloud,
            tts_command: cli.tts_command.filter(|s| !s.trim().is_empty()),
            log_file,
            data_dir,
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            language: self.language,
            pinned_quiz: self.pinned_quiz.clone(),
            advance_mode: self.advance_mode,
            read_aloud: self.read_aloud,
        }
    }
}

// MARK: platform data directory
fn data_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("mx", "UVA Learning", "SuperQuiz") {
        return proj_dirs.data_dir().to_path_buf();
    }
    // fall back to the working directory
    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["superquiz"]).unwrap();
        let config = AppConfig::from_cli(cli);
        assert_eq!(config.language, None);
        assert_eq!(config.advance_mode, AdvanceMode::RetryUntilCorrect);
        assert!(config.read_aloud);
        assert!(config.log_file.ends_with("superquiz.log"));
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "superquiz",
            "--content-dir",
            "data",
            "--lang",
            "es-MX",
            "--quiz",
            "criptografia1",
            "--mode",
            "advance-always",
            "--no-read-aloud",
            "--log-file",
            "/tmp/q.log",
        ])
        .unwrap();
        let config = AppConfig::from_cli(cli);
        assert_eq!(config.content_dir, PathBuf::from("data"));
        assert_eq!(config.language, Some(Language::EsMx));
        assert_eq!(config.pinned_quiz.as_deref(), Some("criptografia1"));
        assert_eq!(config.advance_mode, AdvanceMode::AdvanceAlways);
        assert!(!config.read_aloud);
        assert_eq!(config.log_file, PathBuf::from("/tmp/q.log"));

        let options = config.session_options();
        assert_eq!(options.pinned_quiz.as_deref(), Some("criptografia1"));
    }

    #[test]
    fn rejects_unknown_language() {
        assert!(Cli::try_parse_from(["superquiz", "--lang", "fr-FR"]).is_err());
    }
}
