use chrono::NaiveDate;

use crate::model::task::Task;
use crate::model::timestamp;

/// Column headers of the CSV export, in order
pub const CSV_HEADERS: [&str; 7] = [
    "ID",
    "Title",
    "Description",
    "Priority",
    "Due Date",
    "Completed",
    "Created At",
];

/// Export file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unknown format: {other:?} (expected json or csv)")),
        }
    }
}

/// `tasks-YYYY-MM-DD.json` / `.csv`
pub fn export_filename(format: ExportFormat, date: NaiveDate) -> String {
    format!("tasks-{}.{}", date.format("%Y-%m-%d"), format.extension())
}

/// Pretty-printed JSON array of tasks
pub fn export_json<'a, I>(tasks: I) -> Result<String, serde_json::Error>
where
    I: IntoIterator<Item = &'a Task>,
{
    let tasks: Vec<&Task> = tasks.into_iter().collect();
    serde_json::to_string_pretty(&tasks)
}

/// CSV with a plain header row. Every text field is quoted with embedded
/// quotes doubled; the numeric id is left bare.
pub fn export_csv<'a, I>(tasks: I) -> Result<String, csv::Error>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut header = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    header.write_record(CSV_HEADERS)?;
    let buf = header.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;

    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::NonNumeric)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(buf);
    for task in tasks {
        wtr.write_record([
            task.id.to_string(),
            task.title.clone(),
            task.description_text().to_string(),
            task.priority.to_string(),
            task.due_at.as_ref().map(timestamp::format).unwrap_or_default(),
            if task.completed { "Yes" } else { "No" }.to_string(),
            timestamp::format(&task.created_at),
        ])?;
    }
    let buf = wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Priority;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<Task> {
        let created = Utc.with_ymd_and_hms(2025, 12, 13, 10, 0, 0).unwrap();
        let mut a = Task::new(1, "u", "Ship \"v2\", finally", created);
        a.description = Some("with, commas".into());
        a.priority = Priority::High;
        a.due_at = Some(Utc.with_ymd_and_hms(2025, 12, 20, 17, 0, 0).unwrap());
        let mut b = Task::new(2, "u", "Rest", created);
        b.completed = true;
        b.priority = Priority::Low;
        vec![a, b]
    }

    #[test]
    fn test_export_filename() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 13).unwrap();
        assert_eq!(export_filename(ExportFormat::Json, date), "tasks-2025-12-13.json");
        assert_eq!(export_filename(ExportFormat::Csv, date), "tasks-2025-12-13.csv");
    }

    #[test]
    fn test_export_csv_quotes_text_fields() {
        let out = export_csv(&sample()).unwrap();
        let mut lines = out.lines();
        assert_eq!(
            lines.next(),
            Some("ID,Title,Description,Priority,Due Date,Completed,Created At")
        );
        assert_eq!(
            lines.next(),
            Some(
                "1,\"Ship \"\"v2\"\", finally\",\"with, commas\",\"high\",\
                 \"2025-12-20T17:00:00Z\",\"No\",\"2025-12-13T10:00:00Z\""
            )
        );
        assert!(lines.next().unwrap().starts_with("2,\"Rest\","));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_export_csv_reads_back() {
        let out = export_csv(&sample()).unwrap();
        let mut rdr = csv::Reader::from_reader(out.as_bytes());
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "Ship \"v2\", finally");
        assert_eq!(&rows[0][2], "with, commas");
        assert_eq!(&rows[1][2], "");
        assert_eq!(&rows[1][4], "");
        assert_eq!(&rows[1][5], "Yes");
    }

    #[test]
    fn test_export_csv_empty_has_header_only() {
        assert_eq!(
            export_csv(&Vec::<Task>::new()).unwrap(),
            "ID,Title,Description,Priority,Due Date,Completed,Created At\n"
        );
    }

    #[test]
    fn test_export_json_is_pretty_array() {
        let json = export_json(&sample()).unwrap();
        assert!(json.starts_with("[\n  {"));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let arr = value.as_array().unwrap();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[0]["user_id"], "u");
        assert_eq!(arr[0]["priority"], "high");
        assert_eq!(arr[0]["due_date"], "2025-12-20T17:00:00Z");
        assert_eq!(arr[1]["completed"], true);
    }
}
