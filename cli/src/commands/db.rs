use std::path::Path;
use std::process;

use anyhow::Result;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use wishlist_core::db::Database;
use wishlist_core::manager::WishlistManager;

pub(crate) fn cmd_db_save(manager: &mut WishlistManager, db_path: &Path) -> Result<()> {
    let db = Database::open(db_path)?;
    manager.attach_backend(Box::new(db));
    manager.save_to_database()?;
    println!(
        "Saved {} item(s) and the budget to the database",
        manager.total_items()
    );
    Ok(())
}

pub(crate) fn cmd_db_load(manager: &mut WishlistManager, db_path: &Path) -> Result<()> {
    let db = Database::open(db_path)?;
    manager.attach_backend(Box::new(db));
    manager.load_from_database()?;
    println!(
        "Loaded {} item(s) from the database for {}",
        manager.total_items(),
        manager.owner()
    );
    Ok(())
}

pub(crate) fn cmd_db_users(db_path: &Path, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct UserRow {
        #[tabled(rename = "Username")]
        username: String,
    }

    let db = Database::open(db_path)?;
    let users = db.get_all_users()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    if users.is_empty() {
        eprintln!("No users in the database");
        process::exit(2);
    }

    let rows: Vec<UserRow> = users.into_iter().map(|username| UserRow { username }).collect();
    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_db_stats(db_path: &Path, owner: &str, json: bool) -> Result<()> {
    #[derive(Serialize)]
    struct DbStats<'a> {
        owner: &'a str,
        total_items: i64,
        total_value: f64,
    }

    let db = Database::open(db_path)?;
    let stats = DbStats {
        owner,
        total_items: db.total_items_count(owner)?,
        total_value: db.total_value(owner)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Owner: {}", stats.owner);
    println!("Items in database: {}", stats.total_items);
    println!("Total value: €{:.2}", stats.total_value);
    Ok(())
}

pub(crate) fn cmd_db_clear(db_path: &Path, owner: &str) -> Result<()> {
    let db = Database::open(db_path)?;
    if db.clear_all_data(owner)? {
        println!("Cleared all database items for {owner}");
    } else {
        println!("Nothing to clear for {owner}");
    }
    Ok(())
}

pub(crate) fn cmd_db_vacuum(db_path: &Path) -> Result<()> {
    let db = Database::open(db_path)?;
    db.vacuum()?;
    println!("Database optimized");
    Ok(())
}
