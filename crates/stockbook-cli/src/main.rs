//! Stockbook CLI - inventory records with an automatic transaction trail
//!
//! Thin command-line front end over `stockbook-core`. Every command opens the
//! store named in the config file, runs one operation, and exits.

use clap::Parser;

mod app;
mod cli;
mod commands;
mod config;
mod logging;
mod output;

use app::AppContext;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    if let Err(err) = run(&cli) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if let Commands::Init(args) = &cli.command {
        return commands::handle_init(cli, args);
    }

    let mut ctx = AppContext::open(cli)?;
    match &cli.command {
        Commands::Init(_) => Ok(()),
        Commands::Sources => commands::handle_sources(&ctx),
        Commands::Headers { source } => commands::handle_headers(&ctx, *source),
        Commands::List { source, json } => commands::handle_list(&ctx, *source, *json),
        Commands::Search(args) => commands::handle_search(&ctx, args),
        Commands::Add {
            description,
            unit_price,
            qty_in_stock,
        } => commands::handle_add(&mut ctx, description, unit_price, qty_in_stock),
        Commands::Update { id, field, value } => {
            commands::handle_update(&mut ctx, id, *field, value)
        }
        Commands::Delete { id } => commands::handle_delete(&mut ctx, id),
        Commands::NextId => commands::handle_next_id(&ctx),
        Commands::Ids => commands::handle_ids(&ctx),
    }
}
