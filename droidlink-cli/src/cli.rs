//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// `DroidLink` command-line interface for remote Android sessions
#[derive(Parser)]
#[command(name = "droidlink")]
#[command(author, version, about = "DroidLink command-line interface")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration directory
    #[arg(short, long, global = true, env = "DROIDLINK_CONFIG_DIR")]
    pub config: Option<PathBuf>,

    /// Device serial or host:port (defaults to the only connected device)
    #[arg(short = 's', long, global = true, env = "ANDROID_SERIAL")]
    pub device: Option<String>,

    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log filter directives (e.g. `droidlink_core=debug`), overriding -v and RUST_LOG
    #[arg(long, global = true, value_name = "DIRECTIVES")]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List attached devices
    #[command(about = "List devices reported by the debug bridge")]
    Devices {
        /// Output format for the device list
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Attach a device over TCP/IP
    #[command(about = "Connect to a device over the network")]
    Connect {
        /// Host name or IP address, optionally with :port
        host: String,

        /// TCP port (default: 5555)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Detach a network device
    #[command(about = "Disconnect a network device")]
    Disconnect {
        /// Device identifier (host:port)
        id: String,
    },

    /// List a remote directory
    #[command(about = "List a directory on the device")]
    Ls {
        /// Remote directory path
        #[arg(default_value = "/")]
        path: String,

        /// Output format for the listing
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Print a remote file
    #[command(about = "Print the contents of a file on the device")]
    Cat {
        /// Remote file path
        path: String,
    },

    /// Copy a file from the device
    #[command(about = "Copy a file from the device to this machine")]
    Pull {
        /// Remote file path
        remote: String,

        /// Local destination (default: current directory)
        #[arg(default_value = ".")]
        local: String,
    },

    /// Copy a file to the device
    #[command(about = "Copy a file from this machine to the device")]
    Push {
        /// Local file path
        local: String,

        /// Remote destination path
        remote: String,
    },

    /// Run a one-shot shell command
    #[command(about = "Run a shell command and print its output")]
    Shell {
        /// Command line to run on the device
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Run a long-running command, streaming its output
    #[command(about = "Run a long-running command; Ctrl-C terminates it on the device")]
    Run {
        /// Command line to run on the device
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Print telemetry snapshots
    #[command(about = "Poll CPU, memory, battery and network of the device")]
    Monitor {
        /// Stop after this many snapshots (default: until Ctrl-C)
        #[arg(short = 'n', long)]
        count: Option<u32>,

        /// Polling interval in milliseconds (overrides the configuration)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Output format for snapshots
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    #[command(about = "Generate shell completion scripts")]
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Configuration subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective settings as TOML
    Show,

    /// Print the path of the settings file
    Path,

    /// Write the default settings file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Output format for lists and snapshots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON, one document per invocation or snapshot
    Json,
}
