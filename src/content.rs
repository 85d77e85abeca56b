// ============================================
// src/content.rs
// Quiz file schema and load-time validation
// ============================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{QuizError, Result};
use crate::language::{Language, Localized};

// --------------------------------------------------
// Summary metadata
// --------------------------------------------------

/// Catalog entry for one quiz file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizMeta {
    pub slug: String,
    pub title: String,
    pub subject: String,
    pub unit: u32,
    pub class_no: u32,
    pub description: Option<String>,
    pub tags: Vec<String>,
    /// Sub-directory of the content root the file was found in
    pub folder: Option<String>,
}

impl QuizMeta {
    /// Key used to detect the same class registered twice.
    pub fn class_key(&self) -> (&str, u32, u32) {
        (&self.subject, self.unit, self.class_no)
    }

    /// "Subject · U1 C2 · Title"
    pub fn card_title(&self) -> String {
        format!(
            "{} · U{} C{} · {}",
            self.subject, self.unit, self.class_no, self.title
        )
    }
}

// --------------------------------------------------
// Explanation blocks
// --------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Block {
    #[serde(rename = "text")]
    Text { content: String },
    #[serde(rename = "title-h2")]
    Heading { content: String },
    #[serde(rename = "link")]
    Link { content: String },
    #[serde(rename = "code")]
    Code { content: String },
    #[serde(rename = "ul")]
    Unordered { items: Vec<String> },
    #[serde(rename = "ol")]
    Ordered { items: Vec<String> },
    #[serde(rename = "image")]
    Image {
        src: String,
        #[serde(default)]
        alt: Option<String>,
    },
    #[serde(rename = "divider")]
    Divider,
}

impl Block {
    /// Text read aloud when narrating an explanation (paragraphs and headings only).
    pub fn spoken_text(&self) -> Option<&str> {
        match self {
            Block::Text { content } | Block::Heading { content } => Some(content),
            _ => None,
        }
    }
}

// --------------------------------------------------
// Raw file shape (lenient, straight from serde)
// --------------------------------------------------

/// A quiz file as found on disk. Only `meta` is required to register the file;
/// the questions are validated when the quiz is actually loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct QuizFile {
    #[serde(default)]
    pub meta: Option<RawMeta>,
    #[serde(rename = "Questions", default)]
    pub questions: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMeta {
    #[serde(default)]
    pub slug: Option<String>,
    pub title: String,
    pub subject: String,
    pub unit: u32,
    #[serde(rename = "classNo")]
    pub class_no: u32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl QuizFile {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns the catalog entry, or `None` when the file has no usable slug.
    pub fn meta(&self, folder: Option<String>) -> Option<QuizMeta> {
        let raw = self.meta.as_ref()?;
        let slug = raw.slug.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some(QuizMeta {
            slug: slug.to_string(),
            title: raw.title.clone(),
            subject: raw.subject.clone(),
            unit: raw.unit,
            class_no: raw.class_no,
            description: raw.description.clone(),
            tags: raw.tags.clone(),
            folder,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(rename = "Category")]
    category: Option<String>,
    #[serde(rename = "Question Text")]
    text: Option<RawLocalized<Vec<String>>>,
    #[serde(rename = "Options")]
    options: Option<RawLocalized<Vec<String>>>,
    #[serde(rename = "Correct Answer")]
    correct: Option<RawLocalized<String>>,
    #[serde(rename = "Explanation")]
    explanation: Option<RawLocalized<Vec<Block>>>,
}

#[derive(Debug, Deserialize)]
struct RawLocalized<T> {
    #[serde(rename = "en-US")]
    en_us: Option<T>,
    #[serde(rename = "es-MX")]
    es_mx: Option<T>,
}

impl<T> RawLocalized<T> {
    fn get(&self, language: Language) -> Option<&T> {
        match language {
            Language::EnUs => self.en_us.as_ref(),
            Language::EsMx => self.es_mx.as_ref(),
        }
    }
}

// --------------------------------------------------
// Validated content
// --------------------------------------------------

/// One question with every required per-language field present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionContent {
    pub category: Option<String>,
    /// Alternative wordings; one is picked at random per session
    pub text_variants: Localized<Vec<String>>,
    pub options: Localized<Vec<String>>,
    pub correct: Localized<String>,
    pub explanation: Localized<Vec<Block>>,
}

/// A quiz that passed validation and can be adapted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizContent {
    pub meta: QuizMeta,
    pub questions: Vec<QuestionContent>,
}

impl QuizContent {
    /// Validates the question list of a registered file.
    ///
    /// Either the whole quiz validates or a `ContentMalformed` naming the first
    /// offending question, field and language is returned.
    pub fn validate(meta: QuizMeta, questions: Option<&[Value]>) -> Result<Self> {
        let slug = meta.slug.clone();
        let raw = questions
            .ok_or_else(|| QuizError::malformed(&slug, "missing Questions collection"))?;

        let mut validated = Vec::with_capacity(raw.len());
        for (i, value) in raw.iter().enumerate() {
            let number = i + 1;
            let question: RawQuestion = serde_json::from_value(value.clone())
                .map_err(|e| QuizError::malformed(&slug, format!("question {number}: {e}")))?;
            validated.push(validate_question(&slug, number, question)?);
        }

        Ok(Self {
            meta,
            questions: validated,
        })
    }

    /// Parses and validates a single quiz document.
    #[cfg(test)]
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file = QuizFile::from_json_str(json)?;
        let meta = file
            .meta(None)
            .ok_or_else(|| QuizError::malformed("<unknown>", "missing meta.slug"))?;
        Self::validate(meta, file.questions.as_deref())
    }
}

fn validate_question(slug: &str, number: usize, q: RawQuestion) -> Result<QuestionContent> {
    let missing = |field: &str, language: Language| {
        QuizError::malformed(slug, format!("question {number}: missing \"{field}\" for {language}"))
    };

    let text = q.text.as_ref().ok_or_else(|| {
        QuizError::malformed(slug, format!("question {number}: missing \"Question Text\""))
    })?;
    let options = q.options.as_ref().ok_or_else(|| {
        QuizError::malformed(slug, format!("question {number}: missing \"Options\""))
    })?;
    let correct = q.correct.as_ref().ok_or_else(|| {
        QuizError::malformed(slug, format!("question {number}: missing \"Correct Answer\""))
    })?;

    let text_variants = Localized::try_build(|lang| {
        let pool = text.get(lang).ok_or_else(|| missing("Question Text", lang))?;
        if pool.is_empty() {
            return Err(QuizError::malformed(
                slug,
                format!("question {number}: empty \"Question Text\" pool for {lang}"),
            ));
        }
        Ok(pool.clone())
    })?;

    let options = Localized::try_build(|lang| {
        let pool = options.get(lang).ok_or_else(|| missing("Options", lang))?;
        if pool.is_empty() {
            return Err(QuizError::malformed(
                slug,
                format!("question {number}: empty \"Options\" for {lang}"),
            ));
        }
        Ok(pool.clone())
    })?;

    let correct = Localized::try_build(|lang| {
        correct
            .get(lang)
            .cloned()
            .ok_or_else(|| missing("Correct Answer", lang))
    })?;

    // Explanations are optional; an absent language just has nothing to show.
    let explanation = match q.explanation {
        Some(expl) => Localized::new(
            expl.en_us.unwrap_or_default(),
            expl.es_mx.unwrap_or_default(),
        ),
        None => Localized::default(),
    };

    Ok(QuestionContent {
        category: q.category,
        text_variants,
        options,
        correct,
        explanation,
    })
}
