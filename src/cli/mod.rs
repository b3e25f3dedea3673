//! Command-line surface of the dashboard.

pub mod output;
pub mod run;
pub mod shell;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::commands::ExportFormat;
use crate::models::StatusFilter;

/// Trades Tracker - journal token trades and track P/L from market-cap moves.
#[derive(Parser, Debug)]
#[command(name = "trades-tracker")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Data directory (overrides TRADES_TRACKER_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// One line typed into the interactive shell.
#[derive(Parser, Debug)]
#[command(name = "tracker", no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log a new trade
    Add(AddArgs),

    /// Close an open trade at an exit market cap
    Close {
        id: String,
        /// Exit market cap, e.g. 450k or 1.2m
        #[arg(allow_hyphen_values = true)]
        exit: String,
    },

    /// Edit a trade; omitted fields keep their current value
    Edit(EditArgs),

    /// Delete a trade
    Delete {
        id: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// List trades
    List {
        #[arg(long, value_enum, default_value = "all")]
        status: StatusArg,
    },

    /// Show one trade
    Show { id: String },

    /// Dashboard statistics
    Stats {
        /// today, week, month, 3months, 6months or year
        #[arg(long)]
        range: Option<String>,
    },

    /// Cumulative realized P/L by exit date
    Curve {
        #[arg(long)]
        range: Option<String>,
    },

    /// Fetch current market caps and recompute unrealized P/L
    Refresh,

    /// Look up token metadata
    Lookup { address: String },

    /// Show or change settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Switch between demo data and your trade collection
    Mode {
        #[arg(value_enum)]
        mode: ModeArg,
    },

    /// Sign in
    Login { user: String },

    /// Sign out
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Manage the widget grid
    #[command(subcommand)]
    Widgets(WidgetsCommand),

    /// Export the active trades
    Export {
        path: PathBuf,
        #[arg(long, value_enum, default_value = "csv")]
        format: FormatArg,
    },

    /// Manage the market data API key
    #[command(subcommand)]
    ApiKey(ApiKeyCommand),

    /// Interactive dashboard with live refresh
    Shell,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Token mint address
    pub address: String,

    /// Entry market cap, e.g. 150k
    #[arg(long, allow_hyphen_values = true)]
    pub entry: String,

    /// Position size in SOL
    #[arg(long, allow_hyphen_values = true)]
    pub size: String,

    /// Exit market cap for an already closed trade
    #[arg(long, allow_hyphen_values = true)]
    pub exit: Option<String>,

    /// Ticker (looked up from the token when omitted)
    #[arg(long)]
    pub ticker: Option<String>,

    /// SOL price in USD (fetched when omitted)
    #[arg(long)]
    pub sol_price: Option<f64>,

    #[arg(long, default_value = "")]
    pub note: String,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub id: String,

    #[arg(long, allow_hyphen_values = true)]
    pub entry: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    pub size: Option<String>,

    #[arg(long, allow_hyphen_values = true, conflicts_with = "reopen")]
    pub exit: Option<String>,

    /// Clear the exit market cap
    #[arg(long)]
    pub reopen: bool,

    #[arg(long)]
    pub note: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Print current settings
    Show,
    /// Change refresh settings
    Set {
        /// Seconds between unrealized P/L refreshes
        #[arg(long)]
        interval: Option<i64>,
        /// Trades fetched per group
        #[arg(long)]
        batch_size: Option<i64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum WidgetsCommand {
    /// Print the layout
    List,
    /// Add a trades tracker widget
    Add,
    /// Remove a widget
    Remove {
        id: String,
        #[arg(long)]
        yes: bool,
    },
    /// Move a widget on the grid
    Move { id: String, x: u32, y: u32 },
}

#[derive(Subcommand, Debug)]
pub enum ApiKeyCommand {
    /// Store the key (encrypted)
    Set { key: String },
    /// Remove the stored key
    Clear,
    /// Show whether a key is stored
    Show,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum StatusArg {
    All,
    Open,
    Closed,
}

impl From<StatusArg> for StatusFilter {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::All => StatusFilter::All,
            StatusArg::Open => StatusFilter::Open,
            StatusArg::Closed => StatusFilter::Closed,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ModeArg {
    /// Test mode with sample trades
    Demo,
    /// Your persisted trade collection
    Live,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}
