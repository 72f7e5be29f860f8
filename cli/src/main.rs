mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_add, cmd_budget_disable, cmd_budget_enable, cmd_budget_reset, cmd_budget_set,
    cmd_budget_status, cmd_budget_sync, cmd_clear_purchased, cmd_db_clear, cmd_db_load,
    cmd_db_save, cmd_db_stats, cmd_db_users, cmd_db_vacuum, cmd_export_csv, cmd_import_csv,
    cmd_list, cmd_purchase, cmd_remove, cmd_search, cmd_stats, cmd_unpurchase,
};
use crate::config::Config;
use wishlist_core::file_store::FileStore;
use wishlist_core::manager::WishlistManager;

#[derive(Parser)]
#[command(
    name = "wishlist",
    version,
    about = "A simple wishlist and budget tracker CLI",
    long_about = "A local-first wishlist: track items you want, what they cost, \
and how the purchases add up against a budget."
)]
struct Cli {
    /// Owner of the wishlist (default: the owner stored in the data file)
    #[arg(long, global = true)]
    owner: Option<String>,

    /// Override the wishlist data file
    #[arg(long, global = true, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Override the SQLite database path
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add an item to the wishlist
    Add {
        /// Item name
        name: String,
        /// Item price
        price: f64,
        /// Category: toys, books, electronics, clothing, sports, other
        #[arg(short, long, default_value = "other")]
        category: String,
        /// Priority: low, medium, high, urgent
        #[arg(short, long, default_value = "medium")]
        priority: String,
        /// Optional notes
        #[arg(long)]
        notes: Option<String>,
        /// Optional link
        #[arg(long)]
        link: Option<String>,
        /// Add even when the budget check advises against it
        #[arg(long)]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List items
    List {
        /// Only items not yet purchased
        #[arg(long)]
        pending: bool,
        /// Only purchased items
        #[arg(long)]
        purchased: bool,
        /// Group items by category
        #[arg(long)]
        by_category: bool,
        /// Sort order: priority, price-asc, price-desc, name, category, id
        #[arg(short, long)]
        sort: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search items by name (case-sensitive substring), category, or price
    Search {
        /// Name substring to match
        name: Option<String>,
        /// Filter by category
        #[arg(long)]
        category: Option<String>,
        /// Minimum price
        #[arg(long)]
        min: Option<f64>,
        /// Maximum price
        #[arg(long)]
        max: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark an item as purchased
    Purchase {
        /// Item id
        id: Option<i64>,
        /// Mark every item as purchased
        #[arg(long)]
        all: bool,
    },
    /// Mark an item as not purchased
    Unpurchase {
        /// Item id
        id: i64,
    },
    /// Remove every purchased item from the list
    ClearPurchased,
    /// Remove an item by id
    Remove {
        /// Item id
        id: i64,
    },
    /// Show collection statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export the wishlist to a CSV file
    ExportCsv {
        /// Destination CSV file
        file: PathBuf,
    },
    /// Import items from a CSV file
    ImportCsv {
        /// Source CSV file
        file: PathBuf,
    },
    /// Manage the spending budget
    Budget {
        #[command(subcommand)]
        command: BudgetCommands,
    },
    /// Sync with the SQLite database
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Subcommand)]
enum BudgetCommands {
    /// Set the maximum budget (enables tracking)
    Set {
        /// Budget ceiling
        amount: f64,
    },
    /// Show budget status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Enable budget tracking
    Enable,
    /// Disable budget tracking
    Disable,
    /// Reset the spent amount to zero
    Reset,
    /// Recompute the spent amount from purchased items
    Sync,
}

#[derive(Subcommand)]
enum DbCommands {
    /// Save the current wishlist and budget to the database
    Save,
    /// Load the wishlist and budget from the database
    Load,
    /// List all users in the database
    Users {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show per-user aggregate statistics from the database
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete all of the owner's items from the database
    Clear,
    /// Optimize the database file
    Vacuum,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let file_path = cli.file.unwrap_or(config.list_path);
    let db_path = cli.db.unwrap_or(config.db_path);
    let store = FileStore::new(file_path);
    debug!("data file: {}", store.path().display());

    let mut manager = WishlistManager::new(cli.owner.as_deref().unwrap_or("Default"));
    if store.path().exists() {
        store.load(&mut manager)?;
    }
    *manager.budget_mut() = store.load_budget()?;
    // An explicit --owner wins over the owner recorded in the file.
    if let Some(owner) = &cli.owner {
        manager.set_owner(owner.clone());
    }

    let dirty = match cli.command {
        Commands::Add {
            name,
            price,
            category,
            priority,
            notes,
            link,
            force,
            json,
        } => {
            cmd_add(
                &mut manager,
                &name,
                price,
                &category,
                &priority,
                notes,
                link,
                force,
                json,
            )?;
            true
        }
        Commands::List {
            pending,
            purchased,
            by_category,
            sort,
            json,
        } => {
            cmd_list(
                &mut manager,
                pending,
                purchased,
                by_category,
                sort.as_deref(),
                json,
            )?;
            false
        }
        Commands::Search {
            name,
            category,
            min,
            max,
            json,
        } => {
            cmd_search(&manager, name.as_deref(), category.as_deref(), min, max, json)?;
            false
        }
        Commands::Purchase { id, all } => {
            cmd_purchase(&mut manager, id, all)?;
            true
        }
        Commands::Unpurchase { id } => {
            cmd_unpurchase(&mut manager, id)?;
            true
        }
        Commands::ClearPurchased => {
            cmd_clear_purchased(&mut manager)?;
            true
        }
        Commands::Remove { id } => {
            cmd_remove(&mut manager, id)?;
            true
        }
        Commands::Stats { json } => {
            cmd_stats(&manager, json)?;
            false
        }
        Commands::ExportCsv { file } => {
            cmd_export_csv(&manager, &file)?;
            false
        }
        Commands::ImportCsv { file } => {
            cmd_import_csv(&mut manager, &file)?;
            true
        }
        Commands::Budget { command } => match command {
            BudgetCommands::Set { amount } => {
                cmd_budget_set(&mut manager, amount)?;
                true
            }
            BudgetCommands::Status { json } => {
                cmd_budget_status(&manager, json)?;
                false
            }
            BudgetCommands::Enable => {
                cmd_budget_enable(&mut manager)?;
                true
            }
            BudgetCommands::Disable => {
                cmd_budget_disable(&mut manager)?;
                true
            }
            BudgetCommands::Reset => {
                cmd_budget_reset(&mut manager)?;
                true
            }
            BudgetCommands::Sync => {
                cmd_budget_sync(&mut manager)?;
                true
            }
        },
        Commands::Db { command } => match command {
            DbCommands::Save => {
                cmd_db_save(&mut manager, &db_path)?;
                false
            }
            DbCommands::Load => {
                cmd_db_load(&mut manager, &db_path)?;
                true
            }
            DbCommands::Users { json } => {
                cmd_db_users(&db_path, json)?;
                false
            }
            DbCommands::Stats { json } => {
                cmd_db_stats(&db_path, manager.owner(), json)?;
                false
            }
            DbCommands::Clear => {
                cmd_db_clear(&db_path, manager.owner())?;
                false
            }
            DbCommands::Vacuum => {
                cmd_db_vacuum(&db_path)?;
                false
            }
        },
    };

    if dirty {
        store.save(&manager)?;
        store.save_budget(manager.budget())?;
    }
    Ok(())
}
