//! Course tree as delivered by the course API, and its flattening into the
//! single ordered lesson sequence the access gate works on.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// Publication status. Only `PUBLISHED` lessons take part in gating;
/// every other status makes a lesson invisible.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LessonStatus {
    #[default]
    Published,
    Unpublished(String),
}

impl LessonStatus {
    pub fn is_published(&self) -> bool {
        matches!(self, LessonStatus::Published)
    }
}

impl From<String> for LessonStatus {
    fn from(raw: String) -> Self {
        if raw == "PUBLISHED" {
            LessonStatus::Published
        } else {
            LessonStatus::Unpublished(raw)
        }
    }
}

impl From<LessonStatus> for String {
    fn from(status: LessonStatus) -> Self {
        match status {
            LessonStatus::Published => "PUBLISHED".to_string(),
            LessonStatus::Unpublished(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonNode {
    pub id: String,
    /// Position within its chapter.
    pub order: u32,
    #[serde(default)]
    pub status: LessonStatus,
    /// Minutes a learner must spend before the lesson counts as complete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_minutes: Option<f64>,
}

impl LessonNode {
    pub fn published(id: impl Into<String>, order: u32) -> Self {
        Self {
            id: id.into(),
            order,
            status: LessonStatus::Published,
            required_minutes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub order: u32,
    #[serde(default)]
    pub status: LessonStatus,
    #[serde(default)]
    pub lessons: Vec<LessonNode>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Course {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

impl Course {
    /// Parse and validate a course document.
    pub fn from_json(raw: &str) -> Result<Self> {
        let course: Course = serde_json::from_str(raw)?;
        course.validate()?;
        Ok(course)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Lesson ids must be unique across the whole course, and per-lesson
    /// thresholds must be positive.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();
        for lesson in self.chapters.iter().flat_map(|c| c.lessons.iter()) {
            if lesson.id.is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: "lesson.id".into(),
                    message: "must not be empty".into(),
                });
            }
            if let Some(minutes) = lesson.required_minutes {
                if !minutes.is_finite() || minutes <= 0.0 {
                    return Err(ValidationError::InvalidValue {
                        field: format!("{}.required_minutes", lesson.id),
                        message: format!("must be a positive number, got {minutes}"),
                    });
                }
            }
            if !seen.insert(lesson.id.as_str()) {
                return Err(ValidationError::DuplicateLesson(lesson.id.clone()));
            }
        }
        Ok(())
    }

    /// Published lessons ordered by chapter order, then lesson order.
    pub fn flatten(&self) -> Vec<LessonNode> {
        flatten_course(&self.chapters)
    }

    /// Tracking threshold of a published lesson, when the course sets one.
    pub fn required_minutes_for(&self, lesson_id: &str) -> Option<f64> {
        self.flatten()
            .into_iter()
            .find(|l| l.id == lesson_id)
            .and_then(|l| l.required_minutes)
    }
}

/// Build the flat, globally ordered lesson sequence.
///
/// Chapters sort by `order`, lessons by `order` within their chapter; ties
/// keep input order. Unpublished chapters hide all of their lessons.
pub fn flatten_course(chapters: &[Chapter]) -> Vec<LessonNode> {
    let mut chapters: Vec<&Chapter> = chapters
        .iter()
        .filter(|c| c.status.is_published())
        .collect();
    chapters.sort_by_key(|c| c.order);

    let mut lessons = Vec::new();
    for chapter in chapters {
        let mut in_chapter: Vec<&LessonNode> = chapter
            .lessons
            .iter()
            .filter(|l| l.status.is_published())
            .collect();
        in_chapter.sort_by_key(|l| l.order);
        lessons.extend(in_chapter.into_iter().cloned());
    }
    lessons
}
