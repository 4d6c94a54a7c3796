//! Lesson access commands for CLI.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use lessongate_core::gate::{
    can_access, sidebar_entries, AccessContext, Course, CourseProgress, LessonNode, ViewerRole,
};
use serde::Serialize;

#[derive(Args)]
pub struct GateArgs {
    /// Course JSON file (chapters with ordered lessons)
    #[arg(long)]
    course: PathBuf,
    /// Comma-separated completed lesson IDs
    #[arg(long, value_delimiter = ',')]
    completed: Vec<String>,
    /// Lesson currently open
    #[arg(long)]
    current: Option<String>,
    /// Viewer role: enrolled, instructor_or_admin or other
    #[arg(long, default_value = "enrolled")]
    role: ViewerRole,
}

#[derive(Subcommand)]
pub enum GateAction {
    /// Decide whether a lesson can be opened
    Check {
        /// Lesson ID
        lesson_id: String,
        #[command(flatten)]
        args: GateArgs,
    },
    /// Print every published lesson with its access decision
    Sidebar {
        #[command(flatten)]
        args: GateArgs,
    },
    /// Print completion percentage and the next lesson to resume
    Progress {
        #[command(flatten)]
        args: GateArgs,
    },
}

#[derive(Serialize)]
struct CheckOutput<'a> {
    lesson_id: &'a str,
    granted: bool,
    decision: lessongate_core::AccessDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    tooltip: Option<&'static str>,
}

pub(crate) fn load_course(path: &Path) -> Result<Course, Box<dyn std::error::Error>> {
    Ok(Course::load(path).map_err(|e| format!("course file {}: {e}", path.display()))?)
}

fn load_lessons(path: &Path) -> Result<Vec<LessonNode>, Box<dyn std::error::Error>> {
    Ok(load_course(path)?.flatten())
}

fn with_context<F>(args: &GateArgs, f: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(&AccessContext<'_>) -> Result<(), Box<dyn std::error::Error>>,
{
    let lessons = load_lessons(&args.course)?;
    let completed: HashSet<String> = args
        .completed
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let mut ctx = AccessContext::new(&lessons, &completed, args.role);
    if let Some(current) = args.current.as_deref() {
        ctx = ctx.with_current_lesson(current);
    }
    f(&ctx)
}

pub fn run(action: GateAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        GateAction::Check { lesson_id, args } => with_context(&args, |ctx| {
            let decision = can_access(&lesson_id, ctx);
            tracing::debug!(lesson_id = %lesson_id, ?decision, "access decision");
            let output = CheckOutput {
                lesson_id: &lesson_id,
                granted: decision.is_granted(),
                tooltip: decision.tooltip(),
                decision,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }),
        GateAction::Sidebar { args } => with_context(&args, |ctx| {
            println!("{}", serde_json::to_string_pretty(&sidebar_entries(ctx))?);
            Ok(())
        }),
        GateAction::Progress { args } => with_context(&args, |ctx| {
            println!(
                "{}",
                serde_json::to_string_pretty(&CourseProgress::compute(ctx))?
            );
            Ok(())
        }),
    }
}
