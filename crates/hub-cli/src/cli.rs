//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// hubsync - Keep local app and driver sources in sync with a hub
#[derive(Parser, Debug)]
#[command(name = "hubsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print the result as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Project root holding hubsync.toml and the manifest (defaults to the
    /// current directory)
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Download apps and drivers from the hub
    ///
    /// Local files with uncommitted edits are never overwritten.
    ///
    /// Examples:
    ///   hubsync pull              # Everything
    ///   hubsync pull drivers      # Every driver
    ///   hubsync pull app 12       # One app
    Pull {
        /// Resource type (app or driver)
        #[arg(value_name = "TYPE")]
        kind: Option<String>,

        /// Numeric resource id
        id: Option<String>,
    },

    /// Upload locally edited apps and drivers to the hub
    ///
    /// A file is pushed only when the hub still has the version it was last
    /// synced at; otherwise pull first.
    Push {
        /// Resource type (app or driver)
        #[arg(value_name = "TYPE")]
        kind: Option<String>,

        /// Numeric resource id
        id: Option<String>,
    },

    /// Create a new app or driver on the hub from a source file
    ///
    /// Examples:
    ///   hubsync install driver drivers/acme-door.groovy
    ///   hubsync install driver git:acme/drivers/door.groovy
    Install {
        /// Resource type (app or driver)
        #[arg(value_name = "TYPE")]
        kind: String,

        /// Path to a .groovy file, or git:<org>/<repo>/<path> for a vendored file
        path: String,
    },

    /// List resources on the hub
    List {
        /// app, driver, device or installedapp
        #[arg(value_name = "TYPE")]
        kind: String,
    },
}
