// ============================================
// src/registry.rs
// Catalog of quiz files, built once at startup and passed by reference
// ============================================

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::content::{QuizContent, QuizFile, QuizMeta};
use crate::error::{QuizError, Result};

/// Maps quiz slugs to their metadata and raw file contents.
#[derive(Debug, Default)]
pub struct Registry {
    metas: Vec<QuizMeta>,
    files: HashMap<String, QuizFile>,
}

/// Collects quiz files before the registry is frozen.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    metas: Vec<QuizMeta>,
    files: HashMap<String, QuizFile>,
    seen_classes: HashSet<(String, u32, u32)>,
}

impl RegistryBuilder {
    /// Registers one parsed file. Returns whether it was kept.
    ///
    /// The first file for a given (subject, unit, classNo) wins; later ones
    /// are dropped with a warning, as are files without a slug.
    pub fn register(&mut self, file: QuizFile, source: &str, folder: Option<String>) -> bool {
        let Some(meta) = file.meta(folder) else {
            warn!("[registry] {source}: no meta.slug, skipped");
            return false;
        };

        let (subject, unit, class_no) = meta.class_key();
        let key = (subject.to_string(), unit, class_no);
        if self.seen_classes.contains(&key) {
            warn!(
                "[registry] {source}: duplicate {}|{}|{}, skipped",
                key.0, key.1, key.2
            );
            return false;
        }
        if self.files.contains_key(&meta.slug) {
            warn!("[registry] {source}: slug '{}' already registered, skipped", meta.slug);
            return false;
        }
        self.seen_classes.insert(key);

        debug!("[registry] {source}: registered '{}'", meta.slug);
        self.files.insert(meta.slug.clone(), file);
        self.metas.push(meta);
        true
    }

    /// Parses and registers a JSON document. Unparsable documents are skipped.
    pub fn register_json(&mut self, json: &str, source: &str, folder: Option<String>) -> bool {
        match QuizFile::from_json_str(json) {
            Ok(file) => self.register(file, source, folder),
            Err(e) => {
                warn!("[registry] {source}: unreadable quiz file ({e}), skipped");
                false
            }
        }
    }

    pub fn build(mut self) -> Registry {
        // subject, then unit, then class number
        self.metas.sort_by(|a, b| {
            a.subject
                .cmp(&b.subject)
                .then(a.unit.cmp(&b.unit))
                .then(a.class_no.cmp(&b.class_no))
        });

        info!("[registry] {} quizzes registered", self.metas.len());
        for m in &self.metas {
            debug!("  - {} · U{}C{} · slug={}", m.subject, m.unit, m.class_no, m.slug);
        }

        Registry {
            metas: self.metas,
            files: self.files,
        }
    }
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registers every `*.json` file under `root`, recursively, in sorted path order.
    pub fn load_dir(root: &Path) -> Result<Self> {
        let mut paths = Vec::new();
        collect_json_files(root, &mut paths)?;
        paths.sort();
        info!("[registry] {} JSON files found under {}", paths.len(), root.display());

        let mut builder = Self::builder();
        for path in paths {
            let source = path.display().to_string();
            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    warn!("[registry] {source}: {e}, skipped");
                    continue;
                }
            };
            builder.register_json(&text, &source, folder_of(root, &path));
        }
        Ok(builder.build())
    }

    /// All catalog entries, sorted by subject, unit and class.
    pub fn all_meta(&self) -> &[QuizMeta] {
        &self.metas
    }

    pub fn meta_by_id(&self, slug: &str) -> Option<&QuizMeta> {
        self.metas.iter().find(|m| m.slug == slug)
    }

    /// Loads and validates the questions of one quiz.
    pub fn load_content_by_id(&self, slug: &str) -> Result<QuizContent> {
        let (Some(meta), Some(file)) = (self.meta_by_id(slug), self.files.get(slug)) else {
            warn!("[registry] no quiz for slug '{slug}'");
            return Err(QuizError::ContentNotFound(slug.to_string()));
        };
        QuizContent::validate(meta.clone(), file.questions.as_deref())
    }

    pub fn len(&self) -> usize {
        self.metas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_json_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            out.push(path);
        }
    }
    Ok(())
}

/// First path component below the content root, when the file is nested.
fn folder_of(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut components = relative.components();
    let first = components.next()?;
    // a file directly in the root has no folder
    components.next()?;
    Some(first.as_os_str().to_string_lossy().into_owned())
}
