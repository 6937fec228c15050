mod config;
mod transfer;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, anyhow, bail};
use futures_util::StreamExt;

use crate::chat::{ChatClient, ChatEvent, ChatRequest, ChatTranscript};
use crate::cli::commands::*;
use crate::cli::output::*;
use crate::controller::TaskController;
use crate::gateway::{HttpGateway, MemoryGateway, TaskGateway};
use crate::model::config::ClientConfig;
use crate::model::filter::{FilterState, PriorityFilter, StatusFilter};
use crate::model::task::{Priority, TaskDraft, TaskPatch};
use crate::model::timestamp;
use crate::notify::LogSink;

pub type SharedGateway = Arc<dyn TaskGateway>;
pub type CliController = TaskController<SharedGateway, LogSink>;

/// Everything a command needs besides its own arguments
pub struct Session {
    pub config: ClientConfig,
    pub config_path: PathBuf,
    pub json: bool,
    pub demo: bool,
}

impl Session {
    fn controller(&self) -> anyhow::Result<CliController> {
        Ok(TaskController::new(make_gateway(&self.config, self.demo)?, LogSink))
    }
}

/// Gateway for this run: seeded memory in demo mode, else the configured server
pub fn make_gateway(config: &ClientConfig, demo: bool) -> anyhow::Result<SharedGateway> {
    if demo {
        let owner = match config.server.user_id.as_str() {
            "" => "demo",
            user => user,
        };
        return Ok(Arc::new(MemoryGateway::with_sample_tasks(owner)));
    }
    if config.server.user_id.is_empty() {
        bail!("no user configured: run `td config set server.user_id <id>`, set TASKDECK_USER, or use --demo");
    }
    Ok(Arc::new(HttpGateway::from_config(&config.server)))
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub async fn dispatch(command: Commands, session: &Session) -> anyhow::Result<()> {
    match command {
        Commands::List(args) => cmd_list(args, session).await,
        Commands::Add(args) => cmd_add(args, session).await,
        Commands::Edit(args) => cmd_edit(args, session).await,
        Commands::Toggle(args) => cmd_toggle(args, session).await,
        Commands::Rm(args) => cmd_rm(args, session).await,
        Commands::Stats => cmd_stats(session).await,
        Commands::Export(args) => transfer::cmd_export(args, session).await,
        Commands::Import(args) => transfer::cmd_import(args, session).await,
        Commands::Chat(args) => cmd_chat(args, session).await,
        Commands::Config(args) => config::cmd_config(args, session),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_priority(s: &str) -> anyhow::Result<Priority> {
    s.parse::<Priority>().map_err(|e| anyhow!(e))
}

fn parse_due(s: &str) -> anyhow::Result<chrono::DateTime<chrono::Utc>> {
    timestamp::parse(s).ok_or_else(|| anyhow!("invalid due date: {s} (expected YYYY-MM-DD)"))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

async fn cmd_list(args: ListArgs, session: &Session) -> anyhow::Result<()> {
    let filter = FilterState {
        search: args.search.unwrap_or_default(),
        status: args.status.parse::<StatusFilter>().map_err(|e| anyhow!(e))?,
        priority: args.priority.parse::<PriorityFilter>().map_err(|e| anyhow!(e))?,
    };
    let ctl = session.controller()?;
    ctl.load().await?;
    ctl.set_filter(filter);
    let tasks = ctl.filtered_view();

    if session.json {
        return print_json(&tasks);
    }
    if tasks.is_empty() {
        println!("no tasks");
    }
    for task in &tasks {
        println!("{}", format_task_line(task));
    }
    Ok(())
}

async fn cmd_stats(session: &Session) -> anyhow::Result<()> {
    let ctl = session.controller()?;
    ctl.load().await?;
    let stats = ctl.stats();
    if session.json {
        return print_json(&stats);
    }
    for line in format_stats(&stats) {
        println!("{}", line);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

async fn cmd_add(args: AddArgs, session: &Session) -> anyhow::Result<()> {
    let draft = TaskDraft {
        title: args.title,
        description: args.description,
        priority: args.priority.as_deref().map(parse_priority).transpose()?,
        due_at: args.due.as_deref().map(parse_due).transpose()?,
    };
    let ctl = session.controller()?;
    let task = ctl.create(draft).await?;
    if session.json {
        return print_json(&task);
    }
    println!("created {}", format_task_line(&task));
    Ok(())
}

async fn cmd_edit(args: EditArgs, session: &Session) -> anyhow::Result<()> {
    let patch = TaskPatch {
        title: args.title,
        description: args.description,
        completed: None,
        priority: args.priority.as_deref().map(parse_priority).transpose()?,
        due_at: args.due.as_deref().map(parse_due).transpose()?,
    };
    if patch.is_empty() {
        bail!("nothing to change: pass --title, --description, --priority or --due");
    }
    let ctl = session.controller()?;
    let task = ctl.update(args.id, patch).await?;
    if session.json {
        return print_json(&task);
    }
    for line in format_task_detail(&task) {
        println!("{}", line);
    }
    Ok(())
}

async fn cmd_toggle(args: IdArg, session: &Session) -> anyhow::Result<()> {
    let ctl = session.controller()?;
    let task = ctl.toggle_complete(args.id).await?;
    if session.json {
        return print_json(&task);
    }
    println!("{}", format_task_line(&task));
    Ok(())
}

async fn cmd_rm(args: IdArg, session: &Session) -> anyhow::Result<()> {
    let ctl = session.controller()?;
    ctl.delete(args.id).await?;
    if session.json {
        return print_json(&serde_json::json!({ "deleted": args.id }));
    }
    println!("deleted #{}", args.id);
    Ok(())
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

async fn cmd_chat(args: ChatArgs, session: &Session) -> anyhow::Result<()> {
    if session.demo {
        bail!("chat needs the task service; it is not available with --demo");
    }
    if session.config.server.user_id.is_empty() {
        bail!("no user configured: run `td config set server.user_id <id>` or set TASKDECK_USER");
    }
    let request = ChatRequest::new(&args.message, args.conversation)?;
    let client = ChatClient::from_config(&session.config.server);
    let mut stream = client.stream(&request).await?;

    let mut transcript = ChatTranscript::new();
    transcript.begin(&request.message);
    let mut stdout = std::io::stdout();
    while let Some(event) = stream.next().await {
        let event = event?;
        if !session.json {
            match &event {
                ChatEvent::Content { content } => {
                    write!(stdout, "{}", content).context("writing to stdout")?;
                    stdout.flush().context("writing to stdout")?;
                }
                ChatEvent::ToolCall { tool, parameters } => {
                    eprintln!("[tool] {} {}", tool, parameters);
                }
                _ => {}
            }
        }
        transcript.apply(&event);
    }

    let reply = transcript
        .last_reply()
        .ok_or_else(|| anyhow!("assistant sent no reply"))?;
    if let Some(err) = &reply.error {
        bail!("assistant error: {err}");
    }
    if session.json {
        let tools: Vec<&str> = reply.tools.iter().map(|t| t.tool.as_str()).collect();
        return print_json(&serde_json::json!({
            "conversation_id": transcript.conversation_id,
            "response": reply.text,
            "tools": tools,
        }));
    }
    println!();
    if let Some(id) = transcript.conversation_id {
        eprintln!("(conversation {id}; continue with --conversation {id})");
    }
    Ok(())
}
