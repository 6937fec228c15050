pub mod export;
pub mod import;
pub mod view;

pub use export::{ExportFormat, export_csv, export_filename, export_json};
pub use import::{ImportEntry, ImportFormat, ParseError, parse_csv_import, parse_import, parse_json_import};
pub use view::{compute_filtered_view, compute_stats};
