use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "spotter", version, about = "Import, review and send client training programs")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Emit machine-readable JSON instead of colorful text.
    #[arg(global = true, long)]
    pub json: bool,

    /// Show debug logs on stderr.
    #[arg(global = true, short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Program imports: add, review and send
    #[command(subcommand, visible_alias = "i")]
    Import(ImportCmd),

    /// Client management
    #[command(subcommand, visible_alias = "c")]
    Client(ClientCmd),

    /// View or edit spotter config
    #[command(subcommand)]
    Config(ConfigCmd),
}

//
// Commands
//

#[derive(Subcommand)]
pub enum ImportCmd {
    /// Store a converted program (JSON) for review
    #[command(visible_alias = "a")]
    Add {
        /// Path to a JSON file with a `program` object, or a bare program
        file: String,

        /// Label for this import (wins over the program's own name)
        #[arg(short, long)]
        name: Option<String>,

        /// Source Google Sheets URL
        #[arg(long)]
        sheets_url: Option<String>,

        /// Source spreadsheet id
        #[arg(long)]
        spreadsheet_id: Option<String>,
    },

    /// List imports
    #[command(visible_alias = "l")]
    List,

    /// Normalize an import and show its weeks, routines and exercises
    #[command(visible_alias = "s")]
    Show {
        /// Import index (from `import list`) or id
        import: String,

        /// Only show this week
        #[arg(short, long)]
        week: Option<u32>,
    },

    /// Send an import to a client
    #[command(override_usage = "import send <IMPORT> --client <CLIENT> [--message <MESSAGE>]")]
    Send {
        /// Import index (from `import list`) or id
        import: String,

        /// Client index (from `client list`), id or exact name
        #[arg(short, long)]
        client: String,

        /// Note shown to the client with the program
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Delete an import
    #[command(visible_alias = "d")]
    Delete {
        /// Import index (from `import list`) or id
        import: String,
    },
}

#[derive(Subcommand)]
pub enum ClientCmd {
    /// Add a client
    #[command(visible_alias = "a")]
    Add {
        /// Client name
        name: String,

        #[arg(short, long)]
        email: Option<String>,

        /// Add the client as inactive
        #[arg(long)]
        inactive: bool,

        /// Client has not linked their account yet
        #[arg(long)]
        unlinked: bool,
    },

    /// List clients
    #[command(visible_alias = "l")]
    List {
        /// Include inactive and unlinked clients
        #[arg(short, long)]
        all: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Show all config keys
    List,

    /// Get the value of a key
    Get { key: String },

    /// Set or override a key
    Set { key: String, val: String },

    /// Remove a key
    Unset { key: String },
}
