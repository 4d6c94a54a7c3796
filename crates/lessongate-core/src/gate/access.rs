//! Sequential lesson access gate.
//!
//! Decides whether a viewer may open a lesson. Enrolled learners unlock
//! lessons in order: the first lesson is always open, completed lessons and
//! the lesson currently open stay open, and any other lesson opens only once
//! every lesson before it is completed. Instructors and admins bypass gating.
//!
//! The decision is a pure function of its inputs and never mutates them.

use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::course::LessonNode;

pub const LOCKED_TOOLTIP: &str = "Complete all previous lessons to unlock this lesson";
pub const NOT_ENROLLED_TOOLTIP: &str = "Enroll in this course to access its lessons";
pub const UNKNOWN_LESSON_TOOLTIP: &str = "This lesson is not available";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewerRole {
    Enrolled,
    InstructorOrAdmin,
    Other,
}

impl FromStr for ViewerRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "enrolled" | "student" => Ok(ViewerRole::Enrolled),
            "instructor_or_admin" | "instructor" | "admin" => Ok(ViewerRole::InstructorOrAdmin),
            "other" | "guest" => Ok(ViewerRole::Other),
            other => Err(format!(
                "unknown viewer role '{other}' (expected enrolled, instructor_or_admin or other)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantReason {
    PrivilegedViewer,
    FirstLesson,
    Completed,
    CurrentLesson,
    PredecessorsComplete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DenyReason {
    NotEnrolled,
    /// Lesson is not in the published sequence.
    UnknownLesson,
    PredecessorsIncomplete { first_incomplete: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "access", content = "detail", rename_all = "snake_case")]
pub enum AccessDecision {
    Granted(GrantReason),
    Denied(DenyReason),
}

impl AccessDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, AccessDecision::Granted(_))
    }

    /// Explanation shown on a disabled sidebar entry.
    pub fn tooltip(&self) -> Option<&'static str> {
        match self {
            AccessDecision::Granted(_) => None,
            AccessDecision::Denied(DenyReason::PredecessorsIncomplete { .. }) => Some(LOCKED_TOOLTIP),
            AccessDecision::Denied(DenyReason::NotEnrolled) => Some(NOT_ENROLLED_TOOLTIP),
            AccessDecision::Denied(DenyReason::UnknownLesson) => Some(UNKNOWN_LESSON_TOOLTIP),
        }
    }
}

/// Everything a decision depends on besides the lesson id.
#[derive(Debug, Clone)]
pub struct AccessContext<'a> {
    lessons: Vec<&'a LessonNode>,
    completed: &'a HashSet<String>,
    current_lesson_id: Option<&'a str>,
    role: ViewerRole,
}

impl<'a> AccessContext<'a> {
    /// Non-published lessons are dropped here, before any indexing.
    pub fn new(
        all_lessons: &'a [LessonNode],
        completed: &'a HashSet<String>,
        role: ViewerRole,
    ) -> Self {
        Self {
            lessons: all_lessons
                .iter()
                .filter(|l| l.status.is_published())
                .collect(),
            completed,
            current_lesson_id: None,
            role,
        }
    }

    pub fn with_current_lesson(mut self, lesson_id: &'a str) -> Self {
        self.current_lesson_id = Some(lesson_id);
        self
    }

    pub fn lessons(&self) -> &[&'a LessonNode] {
        &self.lessons
    }

    pub fn role(&self) -> ViewerRole {
        self.role
    }

    pub fn current_lesson_id(&self) -> Option<&'a str> {
        self.current_lesson_id
    }

    pub fn is_completed(&self, lesson_id: &str) -> bool {
        self.completed.contains(lesson_id)
    }

    pub fn position(&self, lesson_id: &str) -> Option<usize> {
        self.lessons.iter().position(|l| l.id == lesson_id)
    }
}

/// Decide whether the context's viewer may open `lesson_id`.
pub fn can_access(lesson_id: &str, ctx: &AccessContext<'_>) -> AccessDecision {
    match ctx.role {
        ViewerRole::InstructorOrAdmin => return AccessDecision::Granted(GrantReason::PrivilegedViewer),
        ViewerRole::Other => return AccessDecision::Denied(DenyReason::NotEnrolled),
        ViewerRole::Enrolled => {}
    }

    let Some(index) = ctx.position(lesson_id) else {
        return AccessDecision::Denied(DenyReason::UnknownLesson);
    };
    if index == 0 {
        return AccessDecision::Granted(GrantReason::FirstLesson);
    }
    if ctx.is_completed(lesson_id) {
        return AccessDecision::Granted(GrantReason::Completed);
    }
    if ctx.current_lesson_id == Some(lesson_id) {
        return AccessDecision::Granted(GrantReason::CurrentLesson);
    }

    match ctx.lessons[..index]
        .iter()
        .find(|l| !ctx.is_completed(&l.id))
    {
        Some(blocking) => AccessDecision::Denied(DenyReason::PredecessorsIncomplete {
            first_incomplete: blocking.id.clone(),
        }),
        None => AccessDecision::Granted(GrantReason::PredecessorsComplete),
    }
}
