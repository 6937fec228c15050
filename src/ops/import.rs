use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::model::task::{
    Priority, Task, TaskDraft, TaskId, ValidationError, validate_description, validate_title,
};
use crate::model::timestamp;

/// Error type for import parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("invalid JSON format: expected an array")]
    NotAnArray,
    #[error("invalid CSV: {0}")]
    InvalidCsv(String),
    #[error("CSV file has no header row")]
    MissingHeader,
    #[error("CSV header has no Title column")]
    NoTitleColumn,
}

/// One task read from an import file, before ids are assigned.
///
/// Missing fields take their defaults: empty description, medium priority,
/// not completed. Entries with a blank title are dropped at import time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportEntry {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_at: Option<DateTime<Utc>>,
    pub completed: bool,
}

impl ImportEntry {
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// Normalized copy checked against the task field limits
    pub fn validated(self) -> Result<ImportEntry, ValidationError> {
        Ok(ImportEntry {
            title: validate_title(&self.title)?,
            description: validate_description(self.description.as_deref())?,
            ..self
        })
    }

    /// Materialize as a local task
    pub fn into_task(self, id: TaskId, owner: &str, now: DateTime<Utc>) -> Task {
        Task {
            description: self.description.filter(|d| !d.is_empty()),
            completed: self.completed,
            priority: self.priority,
            due_at: self.due_at,
            ..Task::new(id, owner, self.title.trim(), now)
        }
    }

    /// Create-request fields for uploading this entry
    pub fn to_draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            priority: Some(self.priority),
            due_at: self.due_at,
        }
    }
}

/// Which parser an import file goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Json,
    Csv,
}

impl ImportFormat {
    /// `.json` files are JSON; anything else is treated as CSV
    pub fn from_path(path: &std::path::Path) -> ImportFormat {
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            ImportFormat::Json
        } else {
            ImportFormat::Csv
        }
    }
}

/// Parse import text in the given format
pub fn parse_import(text: &str, format: ImportFormat) -> Result<Vec<ImportEntry>, ParseError> {
    match format {
        ImportFormat::Json => parse_json_import(text),
        ImportFormat::Csv => parse_csv_import(text),
    }
}

/// Parse a JSON array of task-shaped objects.
///
/// Field values are read leniently: an unknown priority becomes medium, an
/// unparseable due date is dropped, non-object elements yield untitled entries.
pub fn parse_json_import(text: &str) -> Result<Vec<ImportEntry>, ParseError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    let items = value.as_array().ok_or(ParseError::NotAnArray)?;
    Ok(items.iter().map(entry_from_json).collect())
}

fn entry_from_json(item: &Value) -> ImportEntry {
    let text = |key: &str| item.get(key).and_then(Value::as_str).unwrap_or("");
    ImportEntry {
        title: text("title").to_string(),
        description: Some(text("description").to_string()).filter(|d| !d.is_empty()),
        priority: Priority::parse_lenient(text("priority")),
        due_at: timestamp::parse(text("due_date")),
        completed: item.get("completed").and_then(Value::as_bool).unwrap_or(false),
    }
}

/// Parse CSV with a header row.
///
/// Columns are located by header name (case-insensitive), so the export's
/// `ID,Title,Description,Priority,Due Date,Completed,Created At` layout and
/// reordered spreadsheets both work. Rows without a title are discarded.
pub fn parse_csv_import(text: &str) -> Result<Vec<ImportEntry>, ParseError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let header = rdr
        .headers()
        .map_err(|e| ParseError::InvalidCsv(e.to_string()))?
        .clone();
    if header.iter().all(|h| h.trim().is_empty()) {
        return Err(ParseError::MissingHeader);
    }
    let column = |name: &str| {
        header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };

    let title_col = column("title").ok_or(ParseError::NoTitleColumn)?;
    let description_col = column("description");
    let priority_col = column("priority");
    let due_col = column("due date");
    let completed_col = column("completed");

    let mut entries = Vec::new();
    for (index, record) in rdr.records().enumerate() {
        let row = match record {
            Ok(row) => row,
            Err(err) => {
                tracing::warn!(row = index + 1, error = %err, "skipping unreadable CSV row");
                continue;
            }
        };
        let cell = |col: Option<usize>| col.and_then(|c| row.get(c)).map_or("", str::trim);
        let entry = ImportEntry {
            title: cell(Some(title_col)).to_string(),
            description: Some(cell(description_col).to_string()).filter(|d| !d.is_empty()),
            priority: Priority::parse_lenient(cell(priority_col)),
            due_at: timestamp::parse(cell(due_col)),
            completed: is_truthy(cell(completed_col)),
        };
        if entry.has_title() {
            entries.push(entry);
        }
    }
    Ok(entries)
}

fn is_truthy(s: &str) -> bool {
    matches!(s.to_ascii_lowercase().as_str(), "yes" | "true" | "1" | "y")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_json_defaults() {
        let entries = parse_json_import(r#"[{"title": "Only title"}]"#).unwrap();
        assert_eq!(
            entries,
            vec![ImportEntry {
                title: "Only title".into(),
                ..Default::default()
            }]
        );
    }

    #[test]
    fn test_json_lenient_fields() {
        let entries = parse_json_import(
            r#"[{"title": "A", "priority": "urgent", "due_date": "soon", "completed": true},
                {"title": "B", "priority": "high", "due_date": "2025-12-20T17:00:00Z"},
                42]"#,
        )
        .unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].priority, Priority::Medium);
        assert_eq!(entries[0].due_at, None);
        assert!(entries[0].completed);
        assert_eq!(entries[1].priority, Priority::High);
        assert_eq!(
            entries[1].due_at,
            Some(Utc.with_ymd_and_hms(2025, 12, 20, 17, 0, 0).unwrap())
        );
        assert!(!entries[2].has_title());
    }

    #[test]
    fn test_json_errors() {
        assert!(matches!(
            parse_json_import("{not json"),
            Err(ParseError::InvalidJson(_))
        ));
        assert_eq!(
            parse_json_import(r#"{"tasks": []}"#),
            Err(ParseError::NotAnArray)
        );
    }

    #[test]
    fn test_csv_export_layout() {
        let csv = "\
ID,Title,Description,Priority,Due Date,Completed,Created At
1,\"Ship \"\"v2\"\", finally\",\"with, commas\",high,2025-12-20T17:00:00Z,No,2025-12-13T10:00:00Z
2,\"\",\"no title\",low,,Yes,2025-12-13T10:00:00Z
3,\"Rest\",\"\",low,,Yes,2025-12-13T10:00:00Z";
        let entries = parse_csv_import(csv).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Ship \"v2\", finally");
        assert_eq!(entries[0].description.as_deref(), Some("with, commas"));
        assert_eq!(entries[0].priority, Priority::High);
        assert!(!entries[0].completed);
        assert_eq!(entries[1].title, "Rest");
        assert_eq!(entries[1].description, None);
        assert!(entries[1].completed);
    }

    #[test]
    fn test_csv_quoted_newlines_and_blank_lines() {
        let text = "Title,Description\r\n\r\n\"line one\nline \"\"two\"\"\",x\r\n\n,\n";
        let entries = parse_csv_import(text).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "line one\nline \"two\"");
        assert_eq!(entries[0].description.as_deref(), Some("x"));
    }

    #[test]
    fn test_csv_reordered_columns() {
        let entries = parse_csv_import("completed,title\nyes,Water plants\n").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Water plants");
        assert!(entries[0].completed);
        assert_eq!(entries[0].priority, Priority::Medium);
    }

    #[test]
    fn test_csv_errors() {
        assert_eq!(parse_csv_import(""), Err(ParseError::MissingHeader));
        assert_eq!(parse_csv_import("\n\n"), Err(ParseError::MissingHeader));
        assert_eq!(
            parse_csv_import("name,notes\nx,y\n"),
            Err(ParseError::NoTitleColumn)
        );
    }

    #[test]
    fn test_format_from_path() {
        use std::path::Path;
        assert_eq!(ImportFormat::from_path(Path::new("a/tasks.JSON")), ImportFormat::Json);
        assert_eq!(ImportFormat::from_path(Path::new("tasks.csv")), ImportFormat::Csv);
        assert_eq!(ImportFormat::from_path(Path::new("tasks")), ImportFormat::Csv);
    }

    #[test]
    fn test_validated_enforces_limits() {
        use crate::model::task::{MAX_DESCRIPTION_CHARS, MAX_TITLE_CHARS};

        let ok = ImportEntry {
            title: " Fine ".into(),
            description: Some("   ".into()),
            ..Default::default()
        }
        .validated()
        .unwrap();
        assert_eq!(ok.title, "Fine");
        assert_eq!(ok.description, None);

        let long_title = ImportEntry {
            title: "t".repeat(MAX_TITLE_CHARS + 1),
            ..Default::default()
        };
        assert_eq!(
            long_title.validated(),
            Err(ValidationError::TitleTooLong(MAX_TITLE_CHARS + 1))
        );
        let long_description = ImportEntry {
            title: "ok".into(),
            description: Some("d".repeat(MAX_DESCRIPTION_CHARS + 1)),
            ..Default::default()
        };
        assert!(long_description.validated().is_err());
        assert_eq!(
            ImportEntry::default().validated(),
            Err(ValidationError::EmptyTitle)
        );
    }

    #[test]
    fn test_into_task_trims_and_stamps() {
        let now = Utc.with_ymd_and_hms(2025, 12, 13, 10, 0, 0).unwrap();
        let task = ImportEntry {
            title: "  Padded ".into(),
            priority: Priority::Low,
            ..Default::default()
        }
        .into_task(9, "owner", now);
        assert_eq!(task.id, 9);
        assert_eq!(task.title, "Padded");
        assert_eq!(task.owner, "owner");
        assert_eq!(task.created_at, now);
        assert_eq!(task.updated_at, now);
    }
}
