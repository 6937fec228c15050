use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "td", about = concat!("[x] taskdeck v", env!("CARGO_PKG_VERSION"), " - tasks from the terminal"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use seeded in-memory tasks instead of the server
    #[arg(long, global = true)]
    pub demo: bool,

    /// Read configuration from this file
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List tasks
    List(ListArgs),
    /// Create a task
    Add(AddArgs),
    /// Change fields of a task
    Edit(EditArgs),
    /// Flip a task between pending and completed
    Toggle(IdArg),
    /// Delete a task
    Rm(IdArg),
    /// Show completion statistics
    Stats,
    /// Export every task to a file
    Export(ExportArgs),
    /// Upload tasks from a JSON or CSV export
    Import(ImportArgs),
    /// Ask the assistant
    Chat(ChatArgs),
    /// Show or edit configuration
    Config(ConfigCmd),
}

#[derive(Args)]
pub struct ListArgs {
    /// Filter by status (all, pending, completed)
    #[arg(long, default_value = "all")]
    pub status: String,
    /// Filter by priority (all, low, medium, high)
    #[arg(long, default_value = "all")]
    pub priority: String,
    /// Case-insensitive text search over title and description
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    /// low, medium or high
    #[arg(long)]
    pub priority: Option<String>,
    /// Due date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub due: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID
    pub id: i64,
    #[arg(long)]
    pub title: Option<String>,
    /// New description (empty string clears it)
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    /// Due date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub due: Option<String>,
}

#[derive(Args)]
pub struct IdArg {
    /// Task ID
    pub id: i64,
}

#[derive(Args)]
pub struct ExportArgs {
    /// json or csv
    #[arg(long, default_value = "json")]
    pub format: String,
    /// Output directory (default: ui.export_dir)
    #[arg(long)]
    pub out: Option<String>,
}

#[derive(Args)]
pub struct ImportArgs {
    /// File to import (.json, anything else is read as CSV)
    pub file: String,
}

#[derive(Args)]
pub struct ChatArgs {
    /// Message to send
    pub message: String,
    /// Continue an existing conversation
    #[arg(long)]
    pub conversation: Option<i64>,
}

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Set a value, e.g. `td config set ui.theme neon`
    Set {
        /// section.key
        key: String,
        value: String,
    },
    /// Print the config file location
    Path,
}
