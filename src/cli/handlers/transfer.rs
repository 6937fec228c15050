use std::path::{Path, PathBuf};

use anyhow::anyhow;

use crate::cli::commands::{ExportArgs, ImportArgs};
use crate::cli::output::*;
use crate::io::files;
use crate::ops::export::ExportFormat;
use crate::ops::import::parse_import;

use super::{Session, print_json};

pub(super) async fn cmd_export(args: ExportArgs, session: &Session) -> anyhow::Result<()> {
    let format = args.format.parse::<ExportFormat>().map_err(|e| anyhow!(e))?;
    let dir = PathBuf::from(args.out.unwrap_or_else(|| session.config.ui.export_dir.clone()));

    let ctl = session.controller()?;
    let count = ctl.load().await?;
    let body = match format {
        ExportFormat::Json => ctl.export_json()?,
        ExportFormat::Csv => ctl.export_csv()?,
    };
    let today = chrono::Local::now().date_naive();
    let path = files::write_export(&dir, format, today, &body)?;
    tracing::info!(path = %path.display(), count, "exported tasks");

    if session.json {
        return print_json(&ExportJson {
            path: path.display().to_string(),
            format: format.extension().to_string(),
            count,
        });
    }
    println!("exported {} tasks to {}", count, path.display());
    Ok(())
}

/// Upload each parsed entry through create, then toggle the completed ones.
/// Failures are collected and the rest continue.
pub(super) async fn cmd_import(args: ImportArgs, session: &Session) -> anyhow::Result<()> {
    let (text, format) = files::read_import(Path::new(&args.file))?;
    let entries = parse_import(&text, format)?;
    let parsed = entries.len();

    let ctl = session.controller()?;
    let mut summary = ImportJson {
        parsed,
        created: 0,
        completed: 0,
        failed: Vec::new(),
    };
    for entry in entries.iter().filter(|e| e.has_title()) {
        let task = match ctl.create(entry.to_draft()).await {
            Ok(task) => task,
            Err(err) => {
                summary.failed.push(ImportFailureJson {
                    title: entry.title.clone(),
                    error: err.to_string(),
                });
                continue;
            }
        };
        summary.created += 1;
        if entry.completed {
            match ctl.toggle_complete(task.id).await {
                Ok(_) => summary.completed += 1,
                Err(err) => summary.failed.push(ImportFailureJson {
                    title: entry.title.clone(),
                    error: err.to_string(),
                }),
            }
        }
    }

    if session.json {
        return print_json(&summary);
    }
    println!(
        "imported {} of {} tasks ({} completed)",
        summary.created, parsed, summary.completed
    );
    for failure in &summary.failed {
        eprintln!("  failed: {}: {}", failure.title, failure.error);
    }
    Ok(())
}
