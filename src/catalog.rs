// ============================================
// src/catalog.rs
// Filtering and paging over the registry's quiz list
// ============================================

use std::collections::BTreeSet;

use crate::content::QuizMeta;

pub const ITEMS_PER_PAGE: usize = 9;

/// Current browse filters. An empty subject matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub subject: String,
    /// `None` means every unit
    pub unit: Option<u32>,
    pub search: String,
    pub tags: Vec<String>,
}

impl CatalogQuery {
    /// Starts on the first subject with no other filters.
    pub fn for_subject(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Self::default()
        }
    }

    /// Filters beyond the subject that are in effect.
    pub fn active_filter_count(&self) -> usize {
        [
            !self.search.trim().is_empty(),
            self.unit.is_some(),
            !self.tags.is_empty(),
        ]
        .into_iter()
        .filter(|on| *on)
        .count()
    }

    /// Keeps the subject, drops everything else.
    pub fn clear_filters(&mut self) {
        self.unit = None;
        self.search.clear();
        self.tags.clear();
    }

    fn matches(&self, meta: &QuizMeta) -> bool {
        if meta.subject != self.subject {
            return false;
        }
        if self.unit.is_some_and(|u| u != meta.unit) {
            return false;
        }

        let needle = self.search.trim().to_lowercase();
        if !needle.is_empty() {
            let in_title = meta.title.to_lowercase().contains(&needle);
            let in_desc = meta
                .description
                .as_deref()
                .unwrap_or_default()
                .to_lowercase()
                .contains(&needle);
            let in_tags = meta.tags.join(" ").to_lowercase().contains(&needle);
            if !(in_title || in_desc || in_tags) {
                return false;
            }
        }

        self.tags.is_empty() || self.tags.iter().any(|t| meta.tags.contains(t))
    }
}

/// Subjects in first-seen order.
pub fn subjects(metas: &[QuizMeta]) -> Vec<&str> {
    let mut seen = Vec::new();
    for m in metas {
        if !seen.contains(&m.subject.as_str()) {
            seen.push(m.subject.as_str());
        }
    }
    seen
}

/// Distinct units of a subject, ascending.
pub fn units_for_subject(metas: &[QuizMeta], subject: &str) -> Vec<u32> {
    metas
        .iter()
        .filter(|m| m.subject == subject)
        .map(|m| m.unit)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct tags of a subject, sorted.
pub fn tags_for_subject<'a>(metas: &'a [QuizMeta], subject: &str) -> Vec<&'a str> {
    metas
        .iter()
        .filter(|m| m.subject == subject)
        .flat_map(|m| m.tags.iter().map(String::as_str))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Matching quizzes ordered by unit, then class number.
pub fn filter<'a>(metas: &'a [QuizMeta], query: &CatalogQuery) -> Vec<&'a QuizMeta> {
    let mut list: Vec<_> = metas.iter().filter(|m| query.matches(m)).collect();
    list.sort_by(|a, b| a.unit.cmp(&b.unit).then(a.class_no.cmp(&b.class_no)));
    list
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based, clamped to `1..=total_pages`
    pub number: usize,
    pub total_pages: usize,
}

/// Slices out page `page` (1-based). Out-of-range pages are clamped.
pub fn paginate<T>(items: &[T], page: usize) -> Page<'_, T> {
    let total_pages = items.len().div_ceil(ITEMS_PER_PAGE).max(1);
    let number = page.clamp(1, total_pages);
    let start = (number - 1) * ITEMS_PER_PAGE;
    let end = (start + ITEMS_PER_PAGE).min(items.len());
    Page {
        items: &items[start.min(end)..end],
        number,
        total_pages,
    }
}
