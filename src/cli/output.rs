use serde::Serialize;

use crate::controller::BulkReport;
use crate::model::filter::Stats;
use crate::model::task::{Priority, Task};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ExportJson {
    pub path: String,
    pub format: String,
    pub count: usize,
}

#[derive(Serialize)]
pub struct ImportJson {
    pub parsed: usize,
    pub created: usize,
    pub completed: usize,
    pub failed: Vec<ImportFailureJson>,
}

#[derive(Serialize)]
pub struct ImportFailureJson {
    pub title: String,
    pub error: String,
}

#[derive(Serialize)]
pub struct BulkJson {
    pub requested: usize,
    pub succeeded: usize,
    pub failed: Vec<BulkFailureJson>,
}

#[derive(Serialize)]
pub struct BulkFailureJson {
    pub id: i64,
    pub error: String,
}

pub fn bulk_to_json(report: &BulkReport) -> BulkJson {
    BulkJson {
        requested: report.requested,
        succeeded: report.succeeded,
        failed: report
            .failed
            .iter()
            .map(|(id, err)| BulkFailureJson {
                id: *id,
                error: err.to_string(),
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn priority_mark(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "!!!",
        Priority::Medium => "!! ",
        Priority::Low => "!  ",
    }
}

/// Format a single task as a one-line summary
pub fn format_task_line(task: &Task) -> String {
    let check = if task.completed { 'x' } else { ' ' };
    let due = task
        .due_at
        .map(|d| format!(" (due {})", d.format("%Y-%m-%d")))
        .unwrap_or_default();
    format!(
        "[{}] {:>4} {} {}{}",
        check,
        format!("#{}", task.id),
        priority_mark(task.priority),
        task.title,
        due
    )
}

/// Format detailed task view
pub fn format_task_detail(task: &Task) -> Vec<String> {
    let mut lines = vec![format_task_line(task)];
    if let Some(desc) = task.description.as_deref().filter(|d| !d.is_empty()) {
        for line in desc.lines() {
            lines.push(format!("    {}", line));
        }
    }
    lines
}

pub fn format_stats(stats: &Stats) -> Vec<String> {
    vec![
        format!("total:     {}", stats.total),
        format!("pending:   {}", stats.pending),
        format!("completed: {}", stats.completed),
        format!("rate:      {}%", stats.completion_rate),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_task_line() {
        let now = Utc.with_ymd_and_hms(2025, 12, 13, 10, 0, 0).unwrap();
        let mut task = Task::new(7, "u", "Write report", now);
        task.priority = Priority::High;
        assert_eq!(format_task_line(&task), "[ ]   #7 !!! Write report");

        task.completed = true;
        task.due_at = Some(Utc.with_ymd_and_hms(2025, 12, 20, 17, 0, 0).unwrap());
        assert_eq!(
            format_task_line(&task),
            "[x]   #7 !!! Write report (due 2025-12-20)"
        );
    }

    #[test]
    fn test_format_stats() {
        let stats = Stats {
            total: 3,
            pending: 2,
            completed: 1,
            completion_rate: 33,
        };
        assert_eq!(format_stats(&stats)[3], "rate:      33%");
    }
}
