// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! h2: supervise interactive agents and the message bus between them.

mod client;
mod commands;
mod exit_error;
mod role;

use clap::{Parser, Subcommand};

use h2_core::Priority;

use crate::exit_error::ExitError;

#[derive(Parser)]
#[command(name = "h2", version, about = "Supervise interactive agents and route messages between them")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialise the current directory as an h2 directory
    Init {
        /// Directory to initialise (default: current directory)
        path: Option<std::path::PathBuf>,
        /// Route prefix to register (default: directory basename)
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Launch a supervised agent
    Run {
        /// Agent name
        name: String,
        /// Role to materialise (ignored when a command is given)
        #[arg(long, default_value = "default")]
        role: String,
        /// Pod tag for bulk operations
        #[arg(long)]
        pod: Option<String>,
        /// Explicit command (bypasses the role), after `--`
        #[arg(last = true)]
        command: Vec<String>,
    },

    /// Queue a message for an agent
    Send {
        /// Target agent name
        agent: String,
        /// Message body
        body: Vec<String>,
        #[arg(long, default_value = "normal")]
        priority: Priority,
        /// Type the body verbatim, without the sender envelope
        #[arg(long)]
        raw: bool,
        /// Sender identity (default: $H2_ACTOR, else "user")
        #[arg(long)]
        from: Option<String>,
        /// Allow sending a message to yourself
        #[arg(long)]
        allow_self: bool,
    },

    /// Show an agent's status
    Status {
        agent: String,
    },

    /// Stop an agent's supervisor
    Stop {
        agent: String,
    },

    /// Attach to an agent's terminal (detach with Ctrl+\)
    Attach {
        agent: String,
    },

    /// Show one queued or delivered message
    Show {
        agent: String,
        message_id: String,
    },

    /// List agents in the active h2 directory
    List,

    /// Post a hook event to an agent's supervisor
    Hook {
        /// Hook event name (e.g. UserPromptSubmit, PreToolUse)
        event_name: String,
        /// Target agent (default: $H2_ACTOR)
        #[arg(long)]
        agent: Option<String>,
        /// Tool name associated with the event
        #[arg(long)]
        tool: Option<String>,
    },

    /// Internal: run the supervisor daemon in this process
    #[command(name = "_daemon", hide = true)]
    Daemon {
        /// h2 directory root
        #[arg(long)]
        dir: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = dispatch(cli).await {
        eprintln!("{}", e.message);
        std::process::exit(e.code);
    }
}

async fn dispatch(cli: Cli) -> Result<(), ExitError> {
    match cli.command {
        Command::Init { path, prefix } => commands::init::run(path, prefix.as_deref()),
        Command::Run { name, role, pod, command } => {
            commands::run::run(&name, &role, pod, command).await
        }
        Command::Send { agent, body, priority, raw, from, allow_self } => {
            commands::send::run(&agent, &body.join(" "), priority, raw, from, allow_self).await
        }
        Command::Status { agent } => commands::status::run(&agent).await,
        Command::Stop { agent } => commands::stop::run(&agent).await,
        Command::Attach { agent } => commands::attach::run(&agent).await,
        Command::Show { agent, message_id } => commands::show::run(&agent, &message_id).await,
        Command::List => commands::list::run().await,
        Command::Hook { event_name, agent, tool } => {
            commands::hook::run(&event_name, agent, tool).await
        }
        Command::Daemon { dir } => commands::daemon::run(&dir).await,
    }
}
