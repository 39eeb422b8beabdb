use std::env;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use claude_cli::api::configs::session::SessionConfig;
use claude_cli::chat::{chat, ChatOptions};
use claude_cli::commands;
use claude_cli::errors::{ChatError, ChatResult};
use claude_cli::store::{default_state_path, StateFile};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Session cookie value (can also be set via CLAUDE_SESSION_KEY environment variable)
    #[arg(long, global = true)]
    session_key: Option<String>,

    /// Organization id (can also be set via CLAUDE_ORG_ID environment variable)
    #[arg(long, global = true)]
    org_id: Option<String>,

    /// Service host (can also be set via CLAUDE_HOST environment variable)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Conversation state file (can also be set via CLAUDE_CLI_STATE environment variable)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send a message in the active conversation
    Chat {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Save output to file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output raw markdown without formatting
        #[arg(long)]
        raw: bool,
    },
    /// Create a new conversation and make it active
    New {
        /// Name for the new conversation
        #[arg(long, default_value = "")]
        name: String,
    },
    /// View or rename the active conversation
    Name { new_name: Vec<String> },
    /// Delete a conversation (the active one by default)
    Delete {
        conversation_id: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Print the web link to the active conversation
    Link,
    /// Point the active conversation at its latest message
    Sync,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        report(&e);
    }
}

fn run(cli: Cli) -> ChatResult<()> {
    let session = SessionConfig::resolve(cli.session_key, cli.org_id, cli.host)?;
    let state_path = match cli.state.or_else(|| env::var_os("CLAUDE_CLI_STATE").map(PathBuf::from)) {
        Some(path) => path,
        None => default_state_path()?,
    };
    let mut store = StateFile::load(state_path, session)?;
    tracing::debug!(path = %store.path().display(), "loaded conversation state");

    match cli.command {
        Command::Chat { text, output, raw } => {
            chat(&mut store, &text.join(" "), &ChatOptions { raw, output }).map(|_| ())
        }
        Command::New { name } => commands::handle_new(&mut store, &name).map(|_| ()),
        Command::Name { new_name } => {
            let new_name = new_name.join(" ");
            commands::handle_name(&store, Some(new_name.as_str())).map(|_| ())
        }
        Command::Delete {
            conversation_id,
            yes,
        } => commands::handle_delete(&mut store, conversation_id, yes).map(|_| ()),
        Command::Link => {
            println!("{}", commands::conversation_link(&store));
            Ok(())
        }
        Command::Sync => commands::handle_sync(&mut store).map(|_| ()),
    }
}

fn report(error: &ChatError) {
    tracing::debug!(?error, "command failed");
    eprintln!("{}", style(error_message(error)).red());
}

fn error_message(error: &ChatError) -> String {
    match error {
        ChatError::Other(e) => format!("Error: {:#}", e),
        ChatError::NoSession
        | ChatError::NoConversation
        | ChatError::HttpStatus { .. }
        | ChatError::AuthenticationFailed
        | ChatError::FilesNotFound(_) => error.to_string(),
        other => format!("Error: {}", other),
    }
}
