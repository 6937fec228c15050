use std::env;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use taskdeck::cli::commands::{Cli, Commands};
use taskdeck::cli::handlers::{self, Session};
use taskdeck::io::config_io;

/// Where log output goes
enum LogTarget<'a> {
    Stderr,
    /// Append to a file; the dashboard owns the terminal
    File(&'a Path),
}

fn init_tracing(target: LogTarget<'_>) {
    let default = match (&target, env::var("DEBUG").is_ok()) {
        (_, true) => "taskdeck=debug,info",
        (LogTarget::Stderr, false) => "taskdeck=warn",
        (LogTarget::File(_), false) => "taskdeck=info,warn",
    };
    let filter = EnvFilter::try_from_env("TASKDECK_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let json = env::var("TASKDECK_LOG_FORMAT").is_ok_and(|f| f == "json");

    let registry = tracing_subscriber::registry().with(filter);
    match target {
        LogTarget::Stderr => {
            if json {
                registry
                    .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                    .init();
            } else {
                registry.with(fmt::layer().compact().with_writer(std::io::stderr)).init();
            }
        }
        LogTarget::File(path) => {
            let file = path
                .parent()
                .map_or(Ok(()), fs::create_dir_all)
                .and_then(|()| OpenOptions::new().create(true).append(true).open(path));
            // Without a log file the dashboard runs silent
            let Ok(file) = file else {
                return;
            };
            let writer = Mutex::new(file);
            if json {
                registry.with(fmt::layer().json().with_ansi(false).with_writer(writer)).init();
            } else {
                registry.with(fmt::layer().compact().with_ansi(false).with_writer(writer)).init();
            }
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = match &cli.config {
        Some(path) => PathBuf::from(path),
        None => config_io::config_path()?,
    };
    let log_path = config_path.with_file_name("taskdeck.log");
    init_tracing(match cli.command {
        None => LogTarget::File(&log_path),
        Some(_) => LogTarget::Stderr,
    });

    let mut config = match config_io::load_config(&config_path) {
        Ok(config) => config,
        // `config set` must still work to repair a broken file
        Err(e) if matches!(cli.command, Some(Commands::Config(_))) => {
            tracing::warn!(error = %e, "ignoring unreadable config");
            Default::default()
        }
        Err(e) => return Err(e.into()),
    };
    config.apply_env();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match cli.command {
        None => {
            // No subcommand → launch the dashboard
            let gateway = handlers::make_gateway(&config, cli.demo)?;
            taskdeck::tui::run(&config, gateway, runtime.handle().clone())
        }
        Some(command) => {
            let session = Session {
                config,
                config_path,
                json: cli.json,
                demo: cli.demo,
            };
            runtime.block_on(handlers::dispatch(command, &session))
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
