// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod commands;
mod output;

use clap::{error::ErrorKind, ArgAction, Parser, Subcommand};
use keepsake_client::{ClientError, ClientErrorCode};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode as ProcessExitCode;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";
const DEFAULT_STATE: &str = ".keepsake/state.json";

#[derive(Parser)]
#[command(name = "keepsake")]
#[command(about = "Browse and curate a keepsake photo gallery")]
#[command(
    after_help = "Environment:\n  KEEPSAKE_SERVER   Gallery server base URL\n  KEEPSAKE_STATE    Preference file\n  RUST_LOG          Log filter override"
)]
struct Cli {
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    /// Gallery server base URL.
    #[arg(long, global = true, env = "KEEPSAKE_SERVER", default_value = DEFAULT_SERVER)]
    server: String,
    /// Keep items in this directory instead of talking to a server.
    #[arg(long, global = true)]
    local: Option<PathBuf>,
    /// Preference file for theme, filter labels and hidden cards.
    #[arg(long, global = true, env = "KEEPSAKE_STATE", default_value = DEFAULT_STATE)]
    state: PathBuf,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List items newest first.
    List {
        /// `all` or a tag.
        #[arg(long, default_value = "all")]
        filter: String,
        #[arg(long, default_value_t = keepsake_client::grid::DEFAULT_COLUMNS)]
        columns: u8,
    },
    /// Upload image files.
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, conflicts_with = "choice")]
        tag: Option<String>,
        /// Category prompt answer: 1, 2 or 3.
        #[arg(long)]
        choice: Option<String>,
        #[arg(long)]
        caption: Option<String>,
        #[arg(long)]
        alt: Option<String>,
    },
    /// Change caption, tag or alt text of an item.
    Update {
        id: String,
        #[arg(long)]
        caption: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        alt: Option<String>,
    },
    Delete {
        id: String,
    },
    /// Show or toggle the theme.
    Theme {
        #[arg(long, default_value_t = false)]
        toggle: bool,
    },
    /// Show filter labels, or rename one.
    Labels {
        tag: Option<String>,
        label: Option<String>,
    },
    /// Print the upload category prompt.
    Categories,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum ExitCode {
    Success = 0,
    Usage = 2,
    Validation = 3,
    DependencyFailure = 4,
    Internal = 10,
}

#[derive(Clone, Copy)]
pub(crate) struct OutputMode {
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct MachineError {
    code: String,
    message: String,
}

#[derive(Debug)]
pub(crate) struct CliError {
    exit_code: ExitCode,
    machine: MachineError,
}

impl CliError {
    fn new(exit_code: ExitCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            machine: MachineError {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }

    pub(crate) fn internal(message: String) -> Self {
        Self::new(ExitCode::Internal, "internal_error", message)
    }

    pub(crate) fn usage(message: impl Into<String>) -> Self {
        Self::new(ExitCode::Usage, "usage_error", message)
    }
}

impl From<ClientError> for CliError {
    fn from(err: ClientError) -> Self {
        let exit_code = match err.code {
            ClientErrorCode::Network | ClientErrorCode::Storage | ClientErrorCode::Decode => {
                ExitCode::DependencyFailure
            }
            ClientErrorCode::Rejected | ClientErrorCode::NotFound | ClientErrorCode::Invalid => {
                ExitCode::Validation
            }
            _ => ExitCode::Internal,
        };
        Self::new(exit_code, err.code.as_str(), err.message)
    }
}

fn emit_error(error: &CliError, machine_json: bool) {
    if machine_json {
        match serde_json::to_string(&error.machine) {
            Ok(payload) => eprintln!("{payload}"),
            Err(_) => eprintln!(
                "{{\"code\":\"internal_error\",\"message\":\"failed to encode structured error\"}}"
            ),
        }
    } else {
        eprintln!("{}", error.machine.message);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn main_entry() -> ProcessExitCode {
    let wants_json = std::env::args().any(|arg| arg == "--json");
    match run() {
        Ok(()) => ProcessExitCode::from(ExitCode::Success as u8),
        Err(err) => {
            emit_error(&err, wants_json);
            ProcessExitCode::from(err.exit_code as u8)
        }
    }
}

fn run() -> Result<(), CliError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{err}");
                return Ok(());
            }
            _ => return Err(CliError::usage(err.to_string())),
        },
    };
    init_logging(cli.verbose);
    let output_mode = OutputMode { json: cli.json };
    let command = cli
        .command
        .ok_or_else(|| CliError::usage("missing command; see --help"))?;
    let ctx = commands::Context {
        server: cli.server,
        local: cli.local,
        state: cli.state,
        output_mode,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::internal(format!("failed to start runtime: {e}")))?;

    match command {
        Commands::List { filter, columns } => {
            runtime.block_on(commands::list(&ctx, &filter, columns))
        }
        Commands::Upload {
            files,
            tag,
            choice,
            caption,
            alt,
        } => runtime.block_on(commands::upload(
            &ctx,
            files,
            commands::UploadArgs {
                tag,
                choice,
                caption,
                alt,
            },
        )),
        Commands::Update {
            id,
            caption,
            tag,
            alt,
        } => runtime.block_on(commands::update(&ctx, &id, caption, tag, alt)),
        Commands::Delete { id } => runtime.block_on(commands::delete(&ctx, &id)),
        Commands::Theme { toggle } => commands::theme(&ctx, toggle),
        Commands::Labels { tag, label } => commands::labels(&ctx, tag.as_deref(), label.as_deref()),
        Commands::Categories => commands::categories(&ctx),
    }
}
