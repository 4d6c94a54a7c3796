//! Per-lesson navigation entries and course-level progress derived from the
//! access gate.

use serde::{Deserialize, Serialize};

use super::access::{can_access, AccessContext, AccessDecision, ViewerRole};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidebarEntry {
    pub lesson_id: String,
    /// 0-based position in the published sequence.
    pub position: usize,
    pub decision: AccessDecision,
    pub is_completed: bool,
    pub is_current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
}

impl SidebarEntry {
    /// Clicking a disabled entry must not navigate.
    pub fn is_navigable(&self) -> bool {
        self.decision.is_granted()
    }
}

/// One entry per published lesson, in sequence order.
pub fn sidebar_entries(ctx: &AccessContext<'_>) -> Vec<SidebarEntry> {
    ctx.lessons()
        .iter()
        .enumerate()
        .map(|(position, lesson)| {
            let decision = can_access(&lesson.id, ctx);
            SidebarEntry {
                lesson_id: lesson.id.clone(),
                position,
                tooltip: decision.tooltip().map(str::to_string),
                decision,
                is_completed: ctx.is_completed(&lesson.id),
                is_current: ctx.current_lesson_id() == Some(lesson.id.as_str()),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseProgress {
    pub total_lessons: usize,
    pub completed_lessons: usize,
    pub percent: f64,
    /// First lesson the viewer can open that is not completed yet.
    pub next_lesson_id: Option<String>,
}

impl CourseProgress {
    /// Completed ids outside the published sequence are ignored.
    pub fn compute(ctx: &AccessContext<'_>) -> Self {
        let lessons = ctx.lessons();
        let total_lessons = lessons.len();
        let completed_lessons = lessons
            .iter()
            .filter(|l| ctx.is_completed(&l.id))
            .count();
        let percent = if total_lessons == 0 {
            0.0
        } else {
            completed_lessons as f64 / total_lessons as f64 * 100.0
        };
        let next_lesson_id = match ctx.role() {
            ViewerRole::Other => None,
            _ => lessons
                .iter()
                .find(|l| !ctx.is_completed(&l.id) && can_access(&l.id, ctx).is_granted())
                .map(|l| l.id.clone()),
        };
        Self {
            total_lessons,
            completed_lessons,
            percent,
            next_lesson_id,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.total_lessons > 0 && self.completed_lessons == self.total_lessons
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::access::LOCKED_TOOLTIP;
    use crate::gate::course::LessonNode;
    use std::collections::HashSet;

    fn lessons() -> Vec<LessonNode> {
        ["A", "B", "C", "D"]
            .iter()
            .enumerate()
            .map(|(i, id)| LessonNode::published(*id, i as u32))
            .collect()
    }

    #[test]
    fn entries_follow_the_gate() {
        let lessons = lessons();
        let completed: HashSet<String> = ["A".to_string()].into_iter().collect();
        let ctx = AccessContext::new(&lessons, &completed, ViewerRole::Enrolled).with_current_lesson("B");
        let entries = sidebar_entries(&ctx);

        assert_eq!(entries.len(), 4);
        assert!(entries[0].is_completed && entries[0].is_navigable());
        assert!(entries[1].is_current && entries[1].is_navigable());
        assert!(!entries[2].is_navigable());
        assert_eq!(entries[2].tooltip.as_deref(), Some(LOCKED_TOOLTIP));
        assert_eq!(entries[3].position, 3);
    }

    #[test]
    fn progress_counts_published_completions() {
        let lessons = lessons();
        let completed: HashSet<String> = ["A", "B", "gone"].iter().map(|s| s.to_string()).collect();
        let ctx = AccessContext::new(&lessons, &completed, ViewerRole::Enrolled);
        let progress = CourseProgress::compute(&ctx);
        assert_eq!(progress.completed_lessons, 2);
        assert_eq!(progress.percent, 50.0);
        assert_eq!(progress.next_lesson_id.as_deref(), Some("C"));
        assert!(!progress.is_finished());
    }

    #[test]
    fn finished_course_has_no_next_lesson() {
        let lessons = lessons();
        let completed: HashSet<String> = lessons.iter().map(|l| l.id.clone()).collect();
        let ctx = AccessContext::new(&lessons, &completed, ViewerRole::Enrolled);
        let progress = CourseProgress::compute(&ctx);
        assert!(progress.is_finished());
        assert!(progress.next_lesson_id.is_none());
    }

    #[test]
    fn empty_course() {
        let lessons: Vec<LessonNode> = Vec::new();
        let completed = HashSet::new();
        let ctx = AccessContext::new(&lessons, &completed, ViewerRole::Enrolled);
        let progress = CourseProgress::compute(&ctx);
        assert_eq!(progress.percent, 0.0);
        assert!(!progress.is_finished());
        assert!(sidebar_entries(&ctx).is_empty());
    }
}
