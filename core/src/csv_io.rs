use std::path::Path;

use anyhow::{Context, Result};
use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use tracing::{info, warn};

use crate::manager::WishlistManager;
use crate::models::{Category, Priority, WishItem};

/// Column order of the CSV layout. Fields are written without quoting, so
/// commas inside text corrupt columns (documented limitation).
pub const CSV_HEADER: [&str; 8] = [
    "ID",
    "Name",
    "Price",
    "Purchased",
    "Category",
    "Priority",
    "Notes",
    "Link",
];

/// Write the manager's items as CSV: the fixed 8-column header, then one
/// row per item with category/priority as display labels and purchased as
/// `Yes`/`No`.
pub fn export_csv(manager: &WishlistManager, path: &Path) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .from_path(path)
        .with_context(|| format!("Could not open file for writing: {}", path.display()))?;

    writer.write_record(CSV_HEADER)?;
    for item in manager.items() {
        writer.write_record([
            item.id.to_string(),
            item.name.clone(),
            item.price.to_string(),
            if item.purchased { "Yes" } else { "No" }.to_string(),
            item.category.label().to_string(),
            item.priority.label().to_string(),
            item.notes.clone(),
            item.link.clone(),
        ])?;
    }
    writer.flush()?;

    info!("exported {} items to {}", manager.total_items(), path.display());
    Ok(())
}

/// Import items from a CSV file into the manager.
///
/// The header row is skipped. Each row needs at least 4 columns
/// (id, name, price, purchased); the id column is ignored and a fresh id
/// is assigned. Category, priority, notes, and link are optional trailing
/// columns. Rows that fail numeric parsing are skipped with a warning.
/// Returns the number of items imported.
pub fn import_csv(manager: &mut WishlistManager, path: &Path) -> Result<usize> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .quoting(false)
        .from_path(path)
        .with_context(|| format!("Could not open CSV file: {}", path.display()))?;

    let mut imported = 0;
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                warn!("skipping unreadable row: {err}");
                continue;
            }
        };
        if record.len() < 4 {
            warn!("skipping invalid row: {:?}", record);
            continue;
        }

        let name = record.get(1).unwrap_or_default();
        let Ok(price) = record.get(2).unwrap_or_default().trim().parse::<f64>() else {
            warn!("skipping row with unparsable price: {:?}", record);
            continue;
        };
        let purchased = matches!(
            record.get(3).unwrap_or_default().trim().to_lowercase().as_str(),
            "yes" | "1" | "true"
        );

        let mut item = WishItem::new(
            manager.ids_mut(),
            name,
            price,
            record.get(4).map(Category::parse).unwrap_or_default(),
        );
        item.purchased = purchased;
        if let Some(priority) = record.get(5) {
            item.priority = Priority::parse(priority);
        }
        if let Some(notes) = record.get(6) {
            item.notes = notes.to_string();
        }
        if let Some(link) = record.get(7) {
            item.link = link.to_string();
        }

        manager.add_item(item);
        imported += 1;
    }

    info!("imported {imported} items from {}", path.display());
    Ok(imported)
}
