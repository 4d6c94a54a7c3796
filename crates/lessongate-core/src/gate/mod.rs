mod access;
mod course;
mod sidebar;

pub use access::{
    can_access, AccessContext, AccessDecision, DenyReason, GrantReason, ViewerRole,
    LOCKED_TOOLTIP, NOT_ENROLLED_TOOLTIP, UNKNOWN_LESSON_TOOLTIP,
};
pub use course::{flatten_course, Chapter, Course, LessonNode, LessonStatus};
pub use sidebar::{sidebar_entries, CourseProgress, SidebarEntry};
