// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

// Custom help template that groups commands into sections
const HELP_TEMPLATE: &str = "{about-with-newline}
{usage-heading} {usage}

{before-help}Options:
{options}{after-help}";

const COMMANDS_HELP: &str = "\
Sync:
  push        Push a document snapshot (queued while offline)
  pull        Pull a document from the remote store
  flush       Send queued changes to the remote store

Inspect:
  status      Show connectivity, queue and document states
  show        Show a document's local snapshot

Setup:
  init        Initialize a sync directory
  clear       Discard every queued change";

const QUICKSTART_HELP: &str = "\
Get started:
  tether init https://sync.example.com     Point at a remote store
  tether push canvas canvas.json           Push a document
  tether status                            See what is queued";

#[derive(Parser)]
#[command(name = "tether")]
#[command(about = "Local-first document sync with an offline queue")]
#[command(
    long_about = "Local-first document sync with an offline queue.\n\n\
    Pushes go straight to the remote store while it is reachable and are \
    queued durably while it is not; queued changes are replayed in order \
    once it comes back."
)]
#[command(help_template = HELP_TEMPLATE)]
#[command(before_help = COMMANDS_HELP)]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a sync directory (.tether/)
    #[command(after_help = "Examples:\n  \
        tether init http://localhost:8080          Use a local store\n  \
        tether init https://api.example.com -p ..   Initialize the parent directory")]
    Init {
        /// Base URL of the remote document store
        url: String,

        /// Directory to initialize (default: current directory)
        #[arg(long, short)]
        path: Option<String>,
    },

    /// Push a document snapshot
    #[command(after_help = "Examples:\n  \
        tether push canvas canvas.json                 Push the file's JSON content\n  \
        tether push canvas canvas.json --offline       Queue without contacting the store\n  \
        tether push canvas canvas.json -a cover.png    Upload and reference an attachment")]
    Push {
        /// Document ID
        document: String,

        /// JSON file holding the document content ('-' for stdin)
        file: String,

        /// Binary attachment to upload and reference from the change
        #[arg(long, short)]
        attachment: Option<String>,

        /// Treat the remote store as unreachable
        #[arg(long)]
        offline: bool,
    },

    /// Pull a document from the remote store
    Pull {
        /// Document ID
        document: String,

        /// Treat the remote store as unreachable
        #[arg(long)]
        offline: bool,
    },

    /// Send queued changes to the remote store
    Flush,

    /// Show connectivity, queue and document states
    Status {
        /// Output format
        #[arg(long = "output", short = 'o', value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,

        /// Do not probe the remote store
        #[arg(long)]
        offline: bool,
    },

    /// Show a document's local snapshot
    Show {
        /// Document ID
        document: String,

        /// Output format
        #[arg(long = "output", short = 'o', value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Discard every queued change
    Clear,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
