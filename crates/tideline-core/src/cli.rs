use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand};
use tideline_shared::TaskPriority;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::features::TaskTab;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tideline",
    version,
    about = "Tideline: tasks, habits, moods and notes from the terminal",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    /// Use this rc file instead of $TIDELINERC or ~/.tidelinerc.
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the stored token.
    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Log in with a username or email.
    Login {
        identifier: String,
        /// Read from stdin when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    Signup {
        username: String,
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored token.
    Logout,
    /// Show who the stored token belongs to and when it expires.
    Whoami,
    #[command(subcommand)]
    Tasks(TasksCommand),
    #[command(subcommand)]
    Habits(HabitsCommand),
    #[command(subcommand)]
    Tags(TagsCommand),
    #[command(subcommand)]
    Moods(MoodsCommand),
    #[command(subcommand)]
    Notes(NotesCommand),
    /// Stay attached until the session expires, then show the redirect notice.
    Watch,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TasksCommand {
    List {
        #[arg(long, value_enum, default_value_t = TaskTab::Active)]
        tab: TaskTab,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<TaskPriority>,
        /// Match against title and description.
        #[arg(long)]
        search: Option<String>,
    },
    Show { id: i64 },
    Add(TaskAddArgs),
    /// Mark complete.
    Done { id: i64 },
    /// Mark not complete.
    Undo { id: i64 },
    Archive { id: i64 },
    Rename { id: i64, title: String },
    /// Change any of title, description, priority or due date.
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<TaskPriority>,
        /// YYYY-MM-DD.
        #[arg(long)]
        due: Option<String>,
    },
    Delete { id: i64 },
}

#[derive(Args, Debug, Clone)]
pub struct TaskAddArgs {
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    /// low, medium, high (or 1-3).
    #[arg(long, value_parser = parse_priority, default_value = "medium")]
    pub priority: TaskPriority,
    /// Due date, YYYY-MM-DD.
    #[arg(long)]
    pub due: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum HabitsCommand {
    List,
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Check in for today, or undo today's check-in.
    Check { id: i64 },
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug, Clone)]
pub enum TagsCommand {
    List,
    Add {
        name: String,
        #[arg(long)]
        color: Option<String>,
    },
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug, Clone)]
pub enum MoodsCommand {
    List,
    /// Record a mood: joyful, calm, focused, tired, anxious, inspired,
    /// grateful, lonely, angry or hopeful.
    Add {
        mood: String,
        #[arg(long)]
        note: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum NotesCommand {
    List,
    Show { id: i64 },
    Add {
        title: String,
        #[arg(long, default_value = "")]
        content: String,
    },
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    Delete { id: i64 },
}

impl Command {
    /// Whether the command talks to the backend under the stored token.
    pub fn needs_session(&self) -> bool {
        !matches!(
            self,
            Command::Login { .. } | Command::Signup { .. } | Command::Logout | Command::Whoami
        )
    }
}

pub fn parse_priority(raw: &str) -> anyhow::Result<TaskPriority> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "low" | "l" | "1" => Ok(TaskPriority::Low),
        "medium" | "med" | "m" | "2" => Ok(TaskPriority::Medium),
        "high" | "h" | "3" => Ok(TaskPriority::High),
        other => Err(anyhow!("unknown priority: {other}")),
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = match (quiet, verbose) {
        (q, _) if q >= 2 => "error",
        (1, _) => "warn",
        (_, v) if v >= 3 => "trace",
        (_, 2) => "debug",
        (_, 1) => "info",
        _ => "warn",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pulls positional `rc.key=value` / `rc.key:value` overrides out of the
/// argument list before clap sees it.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> PreprocessedArgs {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let parsed = arg.to_str().and_then(|s| {
            let rest = s.strip_prefix("rc.")?;
            let (k, v) = rest.split_once('=').or_else(|| rest.split_once(':'))?;
            Some((k.to_string(), v.to_string()))
        });

        match parsed {
            Some((k, v)) if !k.is_empty() => {
                debug!(key = %k, value = %v, "captured positional rc override");
                overrides.push((k, v));
            }
            _ => cleaned.push(arg),
        }
    }

    PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    }
}
