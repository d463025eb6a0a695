use clap::{Args, Parser, Subcommand, ValueEnum};

use stockbook_core::{Field, Source, VERSION};

/// Stockbook - an inventory book with an automatic transaction trail
#[derive(Parser)]
#[command(name = "stockbook")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file
    #[arg(short, long, global = true, env = "STOCKBOOK_CONFIG")]
    pub config: Option<String>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Comma-separated text files
    FlatFile,
    /// Document collections with a JSON snapshot
    Document,
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Storage backend
    #[arg(long, value_enum, default_value_t = BackendKind::FlatFile)]
    pub backend: BackendKind,

    /// Data directory for the flat-file backend
    #[arg(long)]
    pub directory: Option<String>,

    /// Snapshot file for the document backend
    #[arg(long)]
    pub snapshot: Option<String>,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `search` command
#[derive(Args)]
pub struct SearchArgs {
    /// Source to search (items, transactions)
    #[arg(value_name = "SOURCE")]
    pub source: Source,

    /// Field to match against
    #[arg(value_name = "FIELD")]
    pub field: Field,

    /// Substring to look for; empty matches every record with the field
    #[arg(value_name = "VALUE", default_value = "")]
    pub value: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a config file and create empty storage
    Init(InitArgs),

    /// List the configured sources
    Sources,

    /// Show the fields of the first record in a source
    Headers {
        #[arg(value_name = "SOURCE")]
        source: Source,
    },

    /// Print every record in a source
    List {
        #[arg(value_name = "SOURCE")]
        source: Source,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find records whose field contains a value
    Search(SearchArgs),

    /// Add an item
    Add {
        #[arg(value_name = "DESCRIPTION")]
        description: String,

        #[arg(value_name = "UNIT_PRICE")]
        unit_price: String,

        #[arg(value_name = "QTY_IN_STOCK")]
        qty_in_stock: String,
    },

    /// Change one field of an item
    Update {
        #[arg(value_name = "ID")]
        id: String,

        #[arg(value_name = "FIELD")]
        field: Field,

        #[arg(value_name = "VALUE")]
        value: String,
    },

    /// Remove an item
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Print the id the next item would receive
    NextId,

    /// Print every item id
    Ids,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_rejects_unknown_field() {
        let result = Cli::try_parse_from(["stockbook", "update", "00001", "colour", "red"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_search_value_defaults_to_empty() {
        let cli = Cli::try_parse_from(["stockbook", "search", "items", "id"]).unwrap();
        match cli.command {
            Commands::Search(args) => {
                assert_eq!(args.source, Source::Items);
                assert_eq!(args.field, Field::Id);
                assert!(args.value.is_empty());
            }
            _ => panic!("expected search"),
        }
    }
}
