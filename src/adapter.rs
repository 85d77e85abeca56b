// ============================================
// src/adapter.rs
// Turns validated quiz content into a randomized, playable question set
// ============================================

use log::warn;
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use crate::content::{Block, QuestionContent, QuizContent};
use crate::error::{QuizError, Result};
use crate::language::{Language, Localized};

/// One question as presented in one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedQuestion {
    /// The wording picked for this session
    pub text: String,
    /// Options in presentation order
    pub options: Vec<String>,
    pub correct_text: String,
    /// Position of `correct_text` in `options` (0 if the text is missing)
    pub correct_index: usize,
    pub explanation: Vec<Block>,
}

/// A question materialized for one session, in both languages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptedQuestion {
    pub category: Option<String>,
    pub localized: Localized<LocalizedQuestion>,
}

impl AdaptedQuestion {
    pub fn get(&self, language: Language) -> &LocalizedQuestion {
        self.localized.get(language)
    }
}

/// Adapts every question of `content`, preserving source order.
///
/// Variant picks and option orders are drawn from `rng`; each language is
/// shuffled independently. Nothing is returned unless every question adapts.
pub fn adapt<R: Rng + ?Sized>(content: &QuizContent, rng: &mut R) -> Result<Vec<AdaptedQuestion>> {
    content
        .questions
        .iter()
        .enumerate()
        .map(|(i, question)| adapt_question(&content.meta.slug, i + 1, question, rng))
        .collect()
}

fn adapt_question<R: Rng + ?Sized>(
    slug: &str,
    number: usize,
    question: &QuestionContent,
    rng: &mut R,
) -> Result<AdaptedQuestion> {
    let localized = Localized::try_build(|lang| {
        // 1. pick one wording
        let text = question
            .text_variants
            .get(lang)
            .choose(rng)
            .cloned()
            .ok_or_else(|| {
                QuizError::malformed(slug, format!("question {number}: no question text for {lang}"))
            })?;

        // 2. shuffle the options
        let mut options = question.options.get(lang).clone();
        options.shuffle(rng);

        // 3. find where the correct answer landed
        let correct_text = question.correct.get(lang).clone();
        let correct_index = match options.iter().position(|o| *o == correct_text) {
            Some(index) => index,
            None => {
                warn!(
                    "[adapter] {slug} question {number} ({lang}): correct answer \"{correct_text}\" is not among the options, defaulting to option 1"
                );
                0
            }
        };

        Ok::<_, QuizError>(LocalizedQuestion {
            text,
            options,
            correct_text,
            correct_index,
            explanation: question.explanation.get(lang).clone(),
        })
    })?;

    Ok(AdaptedQuestion {
        category: question.category.clone(),
        localized,
    })
}
