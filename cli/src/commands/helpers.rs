use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use wishlist_core::manager::SortOrder;
use wishlist_core::models::WishItem;

#[derive(Tabled)]
pub(crate) struct ItemRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Priority")]
    priority: String,
}

impl From<&WishItem> for ItemRow {
    fn from(item: &WishItem) -> Self {
        ItemRow {
            id: item.id,
            name: item.name.clone(),
            price: format!("€{:.2}", item.price),
            status: if item.purchased { "Purchased" } else { "Pending" }.to_string(),
            category: item.category.label().to_string(),
            priority: item.priority.label().to_string(),
        }
    }
}

pub(crate) fn print_item_table(items: &[&WishItem]) {
    let rows: Vec<ItemRow> = items.iter().map(|item| ItemRow::from(*item)).collect();
    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..3)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn parse_sort_order(s: &str) -> Result<SortOrder> {
    Ok(match s.to_lowercase().as_str() {
        "priority" => SortOrder::Priority,
        "price-asc" => SortOrder::PriceAsc,
        "price-desc" => SortOrder::PriceDesc,
        "name" => SortOrder::Name,
        "category" => SortOrder::Category,
        "id" => SortOrder::Id,
        _ => bail!(
            "Unknown sort order '{s}'. Use: priority, price-asc, price-desc, name, category, id"
        ),
    })
}
