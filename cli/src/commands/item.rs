use std::process;

use anyhow::{Result, bail};

use wishlist_core::manager::WishlistManager;
use wishlist_core::models::{Category, Priority, WishItem};

#[allow(clippy::too_many_arguments, clippy::fn_params_excessive_bools)]
pub(crate) fn cmd_add(
    manager: &mut WishlistManager,
    name: &str,
    price: f64,
    category: &str,
    priority: &str,
    notes: Option<String>,
    link: Option<String>,
    force: bool,
    json: bool,
) -> Result<()> {
    if !manager.check_budget_before_add(price) && !force {
        eprintln!(
            "Budget warning: adding this item would exceed your budget. \
             Use --force to add it anyway."
        );
        process::exit(2);
    }

    let mut item = WishItem::new(manager.ids_mut(), name, price, Category::parse(category));
    item.priority = Priority::parse(priority);
    if let Some(notes) = notes {
        item.notes = notes;
    }
    if let Some(link) = link {
        item.link = link;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        println!("Added {item}");
    }
    manager.add_item(item);
    Ok(())
}

pub(crate) fn cmd_remove(manager: &mut WishlistManager, id: i64) -> Result<()> {
    if manager.remove_item(id) {
        println!("Removed item {id}");
        Ok(())
    } else {
        eprintln!("Item {id} not found");
        process::exit(2);
    }
}

pub(crate) fn cmd_purchase(
    manager: &mut WishlistManager,
    id: Option<i64>,
    all: bool,
) -> Result<()> {
    if all {
        manager.mark_all_purchased();
        println!("Marked all {} items as purchased", manager.total_items());
        return Ok(());
    }

    let Some(id) = id else {
        bail!("Provide an item id or --all");
    };
    match manager.find_by_id_mut(id) {
        Some(item) => {
            item.purchased = true;
            println!("Marked item {id} as purchased");
            Ok(())
        }
        None => {
            eprintln!("Item {id} not found");
            process::exit(2);
        }
    }
}

pub(crate) fn cmd_unpurchase(manager: &mut WishlistManager, id: i64) -> Result<()> {
    match manager.find_by_id_mut(id) {
        Some(item) => {
            item.purchased = false;
            println!("Marked item {id} as pending");
            Ok(())
        }
        None => {
            eprintln!("Item {id} not found");
            process::exit(2);
        }
    }
}

pub(crate) fn cmd_clear_purchased(manager: &mut WishlistManager) -> Result<()> {
    let before = manager.total_items();
    manager.clear_all_purchased();
    println!("Removed {} purchased item(s)", before - manager.total_items());
    Ok(())
}
