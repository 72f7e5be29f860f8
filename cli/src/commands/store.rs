use std::path::Path;
use std::process;

use anyhow::Result;

use wishlist_core::csv_io;
use wishlist_core::manager::WishlistManager;

pub(crate) fn cmd_export_csv(manager: &WishlistManager, file: &Path) -> Result<()> {
    csv_io::export_csv(manager, file)?;
    println!(
        "Exported {} item(s) to {}",
        manager.total_items(),
        file.display()
    );
    Ok(())
}

pub(crate) fn cmd_import_csv(manager: &mut WishlistManager, file: &Path) -> Result<()> {
    let imported = csv_io::import_csv(manager, file)?;
    if imported == 0 {
        eprintln!("No items imported from {}", file.display());
        process::exit(2);
    }
    println!("Imported {imported} item(s) from {}", file.display());
    Ok(())
}
