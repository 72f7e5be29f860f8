use std::process;

use anyhow::Result;
use serde::Serialize;

use wishlist_core::manager::WishlistManager;
use wishlist_core::models::{Category, WishItem};

use super::helpers::{parse_sort_order, print_item_table};

const ALL_CATEGORIES: [Category; 6] = [
    Category::Toys,
    Category::Books,
    Category::Electronics,
    Category::Clothing,
    Category::Sports,
    Category::Other,
];

#[allow(clippy::fn_params_excessive_bools)]
pub(crate) fn cmd_list(
    manager: &mut WishlistManager,
    pending: bool,
    purchased: bool,
    by_category: bool,
    sort: Option<&str>,
    json: bool,
) -> Result<()> {
    if let Some(order) = sort {
        manager.sort(parse_sort_order(order)?);
    }

    let items: Vec<&WishItem> = if pending {
        manager.filter(|item| !item.purchased)
    } else if purchased {
        manager.filter(|item| item.purchased)
    } else {
        manager.items().iter().collect()
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        eprintln!("Wishlist is empty");
        process::exit(2);
    }

    if by_category {
        for category in ALL_CATEGORIES {
            let group: Vec<&WishItem> = items
                .iter()
                .copied()
                .filter(|item| item.category == category)
                .collect();
            if group.is_empty() {
                continue;
            }
            println!("\n{category}:");
            print_item_table(&group);
        }
    } else {
        print_item_table(&items);
    }
    Ok(())
}

pub(crate) fn cmd_search(
    manager: &WishlistManager,
    name: Option<&str>,
    category: Option<&str>,
    min: Option<f64>,
    max: Option<f64>,
    json: bool,
) -> Result<()> {
    let mut results: Vec<&WishItem> = if let Some(needle) = name {
        manager.find_by_name(needle)
    } else if let Some(category) = category {
        manager.find_by_category(Category::parse(category))
    } else if min.is_some() || max.is_some() {
        manager.find_by_price_range(
            min.unwrap_or(f64::NEG_INFINITY),
            max.unwrap_or(f64::INFINITY),
        )
    } else {
        manager.items().iter().collect()
    };

    // Narrow a name search further when extra filters are given.
    if name.is_some() {
        if let Some(category) = category {
            let category = Category::parse(category);
            results.retain(|item| item.category == category);
        }
        if min.is_some() || max.is_some() {
            let lo = min.unwrap_or(f64::NEG_INFINITY);
            let hi = max.unwrap_or(f64::INFINITY);
            results.retain(|item| item.price >= lo && item.price <= hi);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        eprintln!("No matching items");
        process::exit(2);
    }
    print_item_table(&results);
    Ok(())
}

pub(crate) fn cmd_stats(manager: &WishlistManager, json: bool) -> Result<()> {
    #[derive(Serialize)]
    struct Stats<'a> {
        owner: &'a str,
        total_items: usize,
        purchased: usize,
        pending: usize,
        total_value: f64,
        purchased_value: f64,
        remaining_value: f64,
    }

    let stats = Stats {
        owner: manager.owner(),
        total_items: manager.total_items(),
        purchased: manager.purchased_count(),
        pending: manager.total_items() - manager.purchased_count(),
        total_value: manager.total_value(),
        purchased_value: manager.purchased_value(),
        remaining_value: manager.remaining_value(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("=== STATISTICS ===");
    println!("Owner: {}", stats.owner);
    println!("Total Items: {}", stats.total_items);
    println!("Purchased: {}", stats.purchased);
    println!("Pending: {}", stats.pending);
    println!("Total Value: €{:.2}", stats.total_value);
    println!("Purchased Value: €{:.2}", stats.purchased_value);
    println!("Remaining Value: €{:.2}", stats.remaining_value);
    Ok(())
}
