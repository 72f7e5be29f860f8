use anyhow::Result;

use wishlist_core::manager::WishlistManager;

pub(crate) fn cmd_budget_set(manager: &mut WishlistManager, amount: f64) -> Result<()> {
    manager.set_budget(amount);
    println!("Budget set to €{amount:.2}");
    print_status(manager);
    Ok(())
}

pub(crate) fn cmd_budget_status(manager: &WishlistManager, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(manager.budget())?);
        return Ok(());
    }
    print_status(manager);
    Ok(())
}

pub(crate) fn cmd_budget_enable(manager: &mut WishlistManager) -> Result<()> {
    manager.enable_budget();
    println!("Budget tracking enabled");
    print_status(manager);
    Ok(())
}

pub(crate) fn cmd_budget_disable(manager: &mut WishlistManager) -> Result<()> {
    manager.disable_budget();
    println!("Budget tracking disabled");
    Ok(())
}

pub(crate) fn cmd_budget_reset(manager: &mut WishlistManager) -> Result<()> {
    manager.reset_budget();
    println!("Budget spent amount reset");
    print_status(manager);
    Ok(())
}

pub(crate) fn cmd_budget_sync(manager: &mut WishlistManager) -> Result<()> {
    manager.sync_budget_with_purchases();
    println!("Budget synced with purchased items");
    print_status(manager);
    Ok(())
}

fn print_status(manager: &WishlistManager) {
    let budget = manager.budget();
    if !budget.is_enabled() {
        println!("Budget tracking is currently disabled.");
        return;
    }

    println!("=== BUDGET STATUS ===");
    println!("Max Budget: €{:.2}", budget.max_budget());
    println!("Spent:      €{:.2}", budget.spent_amount());
    println!("Remaining:  €{:.2}", budget.remaining());
    println!("Used:       {:.2}%", budget.spending_percentage());
    println!("Status:     {}", budget.status_message());

    let bar_width = 40usize;
    #[allow(clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let progress =
        ((budget.spending_percentage() / 100.0 * bar_width as f64).max(0.0) as usize).min(bar_width);
    let bar: String = (0..bar_width)
        .map(|i| if i < progress { '▓' } else { '░' })
        .collect();
    println!("Progress:   [{bar}]");
}
